use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::db::user;
use crate::types::dto::common::MessageResponse;

/// A user record as returned by the API
///
/// The password hash is never serialized; this projection simply does not
/// carry it.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID (UUID)
    pub id: String,

    /// Unique username (case-insensitive)
    pub username: String,

    /// Role labels assigned to the user
    pub roles: Vec<String>,

    /// Whether the account is active
    pub active: bool,

    /// Creation time (Unix timestamp)
    pub created_at: i64,

    /// Last modification time (Unix timestamp)
    pub updated_at: i64,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        let roles = u.role_labels();
        Self {
            id: u.id,
            username: u.username,
            roles,
            active: u.active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Request model for creating a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Username for the new user
    pub username: String,

    /// Plaintext password, hashed before persisting
    pub password: String,

    /// Optional role labels; defaults to the baseline role when absent or empty
    pub roles: Option<Vec<String>>,
}

/// Request model for updating a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// ID of the user to update
    pub id: String,

    /// New username
    pub username: String,

    /// New role labels (must not be empty)
    pub roles: Vec<String>,

    /// New active flag
    pub active: bool,

    /// New plaintext password; re-hashed only when supplied
    pub password: Option<String>,
}

/// Request model for deleting a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    /// ID of the user to delete
    pub id: String,
}

/// API response for user creation
#[derive(ApiResponse)]
pub enum CreateUserApiResponse {
    /// User created
    #[oai(status = 201)]
    Created(Json<MessageResponse>),
}
