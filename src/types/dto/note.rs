use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::stores::note_store::NoteWithOwner;
use crate::types::dto::common::MessageResponse;

/// A note record as returned by the API, enriched with the owner's username
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    /// Note ID (UUID)
    pub id: String,

    /// ID of the owning user
    pub user: String,

    /// Username of the owning user (derived, not stored on the note)
    pub username: String,

    /// Unique note title (case-insensitive)
    pub title: String,

    /// Free-text body
    pub text: String,

    /// Whether the note is completed
    pub completed: bool,

    /// Creation time (Unix timestamp)
    pub created_at: i64,

    /// Last modification time (Unix timestamp)
    pub updated_at: i64,
}

impl From<NoteWithOwner> for NoteResponse {
    fn from(n: NoteWithOwner) -> Self {
        Self {
            id: n.note.id,
            user: n.note.user_id,
            username: n.username,
            title: n.note.title,
            text: n.note.text,
            completed: n.note.completed,
            created_at: n.note.created_at,
            updated_at: n.note.updated_at,
        }
    }
}

/// Request model for creating a note
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    /// ID of the owning user
    pub user: String,

    /// Note title
    pub title: String,

    /// Free-text body
    pub text: String,
}

/// Request model for updating a note
///
/// Full overwrite of the mutable fields.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    /// ID of the note to update
    pub id: String,

    /// ID of the owning user
    pub user: String,

    /// New title
    pub title: String,

    /// New body
    pub text: String,

    /// New completed flag
    pub completed: bool,
}

/// Request model for deleting a note
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeleteNoteRequest {
    /// ID of the note to delete
    pub id: String,
}

/// API response for note creation
#[derive(ApiResponse)]
pub enum CreateNoteApiResponse {
    /// Note created
    #[oai(status = 201)]
    Created(Json<MessageResponse>),
}
