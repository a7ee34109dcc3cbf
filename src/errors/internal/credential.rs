use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login attempted against a deactivated account.
    #[error("User is inactive")]
    UserInactive,

    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),

    #[error("Invalid token: {token_type} - {reason}")]
    InvalidToken { token_type: String, reason: String },

    #[error("Expired token: {0}")]
    ExpiredToken(String),
}
