use crate::errors::internal::{CredentialError, InternalError, NoteError, UserError};
use crate::types::dto::common::ErrorResponse;
use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

/// Standardized API error type
///
/// Every endpoint returns `Result<_, ApiError>`. The status mapping follows
/// the original contract: validation failures AND missing entities are 400
/// (not 404), duplicate unique fields are 409, credential failures are 401.
#[derive(ApiResponse, Debug)]
pub enum ApiError {
    /// Missing or malformed fields, or a referenced entity that does not exist
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    /// Duplicate value for a unique field (username or note title)
    #[oai(status = 409)]
    Conflict(Json<ErrorResponse>),

    /// Invalid credentials, inactive user, or a bad/expired token
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

impl ApiError {
    /// Create a BadRequest error for missing or malformed fields
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest(Json(ErrorResponse {
            error: "validation_error".to_string(),
            message: message.into(),
            status_code: 400,
        }))
    }

    /// Create a BadRequest error for a missing entity
    ///
    /// Reported as 400 rather than 404, matching the original contract.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::BadRequest(Json(ErrorResponse {
            error: "not_found".to_string(),
            message: message.into(),
            status_code: 400,
        }))
    }

    /// Create a Conflict error for a duplicate unique field
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(Json(ErrorResponse {
            error: "conflict".to_string(),
            message: message.into(),
            status_code: 409,
        }))
    }

    /// Create an Unauthorized error
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(Json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: "Unauthorized".to_string(),
            status_code: 401,
        }))
    }

    /// Create a generic internal server error
    ///
    /// Always returns a generic message without exposing internal details.
    fn internal_server_error() -> Self {
        ApiError::InternalError(Json(ErrorResponse {
            error: "internal_error".to_string(),
            message: "An internal error occurred".to_string(),
            status_code: 500,
        }))
    }

    /// Convert InternalError to ApiError
    ///
    /// This is the explicit conversion point from internal errors to API
    /// errors, and the single place internal error details are logged.
    pub fn from_internal(err: InternalError) -> Self {
        match &err {
            // Infrastructure errors - always log and return a generic error
            InternalError::Database(_) => {
                tracing::error!("Database error: {}", err);
                Self::internal_server_error()
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::internal_server_error()
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::internal_server_error()
            }

            // Domain errors - convert to specific API errors
            InternalError::User(UserError::DuplicateUsername { username }) => {
                tracing::warn!("Duplicate username attempt: {}", username);
                Self::conflict("Duplicate username")
            }
            InternalError::User(UserError::NotFound { id }) => {
                tracing::debug!("User not found: {}", id);
                Self::not_found("User not found")
            }
            InternalError::User(UserError::NoUsersFound) => Self::not_found("No users found"),
            InternalError::User(UserError::HasAssignedNotes { id }) => {
                tracing::debug!("Refusing to delete user {} with assigned notes", id);
                Self::validation("User has assigned notes")
            }

            InternalError::Note(NoteError::DuplicateTitle { title }) => {
                tracing::warn!("Duplicate note title attempt: {}", title);
                Self::conflict("Duplicate note title")
            }
            InternalError::Note(NoteError::NotFound { id }) => {
                tracing::debug!("Note not found: {}", id);
                Self::not_found("Note not found")
            }
            InternalError::Note(NoteError::NoNotesFound) => Self::not_found("No notes found"),
            InternalError::Note(NoteError::OwnerNotFound { user_id }) => {
                tracing::debug!("Note owner not found: {}", user_id);
                Self::not_found("User not found")
            }

            InternalError::Credential(CredentialError::InvalidCredentials) => {
                tracing::debug!("Invalid credentials attempt");
                Self::unauthorized()
            }
            InternalError::Credential(CredentialError::UserInactive) => {
                tracing::debug!("Login attempt against inactive user");
                Self::unauthorized()
            }
            InternalError::Credential(CredentialError::InvalidToken { token_type, reason }) => {
                tracing::debug!("Invalid token: {} - {}", token_type, reason);
                Self::unauthorized()
            }
            InternalError::Credential(CredentialError::ExpiredToken(token_type)) => {
                tracing::debug!("Expired token: {}", token_type);
                Self::unauthorized()
            }
            InternalError::Credential(CredentialError::PasswordHashingFailed(_)) => {
                tracing::error!("Password hashing failed: {}", err);
                Self::internal_server_error()
            }
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(json) => json.0.message.clone(),
            ApiError::Conflict(json) => json.0.message.clone(),
            ApiError::Unauthorized(json) => json.0.message.clone(),
            ApiError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<InternalError> for ApiError {
    fn from(err: InternalError) -> Self {
        Self::from_internal(err)
    }
}
