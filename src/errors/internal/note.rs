use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Duplicate note title: {title}")]
    DuplicateTitle { title: String },

    #[error("Note not found: {id}")]
    NotFound { id: String },

    #[error("No notes found")]
    NoNotesFound,

    /// The user a note references (or would reference) does not exist.
    #[error("Note owner not found: {user_id}")]
    OwnerNotFound { user_id: String },
}
