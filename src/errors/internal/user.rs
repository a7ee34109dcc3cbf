use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Duplicate username: {username}")]
    DuplicateUsername { username: String },

    #[error("User not found: {id}")]
    NotFound { id: String },

    #[error("No users found")]
    NoUsersFound,

    #[error("User {id} has assigned notes")]
    HasAssignedNotes { id: String },
}
