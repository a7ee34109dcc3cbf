use std::sync::Arc;

use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::errors::ApiError;
use crate::stores::NoteStore;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::note::{
    CreateNoteApiResponse, CreateNoteRequest, DeleteNoteRequest, NoteResponse, UpdateNoteRequest,
};
use crate::AppData;

/// Note management API endpoints
pub struct NotesApi {
    notes: Arc<NoteStore>,
}

impl NotesApi {
    pub fn new(app_data: &Arc<AppData>) -> Self {
        Self {
            notes: Arc::clone(&app_data.note_store),
        }
    }
}

/// API tags for note endpoints
#[derive(Tags)]
enum ApiTags {
    /// Note management endpoints
    Notes,
}

#[OpenApi(prefix_path = "/notes")]
impl NotesApi {
    /// List all notes
    ///
    /// Each note is enriched with the owning user's username. An empty note
    /// table is reported as a client error, not an empty list.
    #[oai(path = "/", method = "get", tag = "ApiTags::Notes")]
    async fn list_notes(&self) -> Result<Json<Vec<NoteResponse>>, ApiError> {
        let notes = self.notes.list_with_owners().await?;
        Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
    }

    /// Create a new note
    #[oai(path = "/", method = "post", tag = "ApiTags::Notes")]
    async fn create_note(
        &self,
        body: Json<CreateNoteRequest>,
    ) -> Result<CreateNoteApiResponse, ApiError> {
        let req = body.0;
        if req.user.trim().is_empty() || req.title.trim().is_empty() || req.text.trim().is_empty()
        {
            return Err(ApiError::validation("All fields are required"));
        }

        self.notes.create(&req.user, &req.title, &req.text).await?;

        Ok(CreateNoteApiResponse::Created(Json(MessageResponse::new(
            "New note created",
        ))))
    }

    /// Update a note
    ///
    /// Full overwrite of the owner, title, text and completed flag.
    #[oai(path = "/", method = "patch", tag = "ApiTags::Notes")]
    async fn update_note(
        &self,
        body: Json<UpdateNoteRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let req = body.0;
        if req.id.trim().is_empty()
            || req.user.trim().is_empty()
            || req.title.trim().is_empty()
            || req.text.trim().is_empty()
        {
            return Err(ApiError::validation("All fields are required"));
        }

        let note = self
            .notes
            .update(&req.id, &req.user, &req.title, &req.text, req.completed)
            .await?;

        Ok(Json(MessageResponse::new(format!(
            "Note with userId {} updated",
            note.user_id
        ))))
    }

    /// Delete a note
    #[oai(path = "/", method = "delete", tag = "ApiTags::Notes")]
    async fn delete_note(
        &self,
        body: Json<DeleteNoteRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let req = body.0;
        if req.id.trim().is_empty() {
            return Err(ApiError::validation("Note ID required"));
        }

        let note = self.notes.delete(&req.id).await?;

        Ok(Json(MessageResponse::new(format!(
            "Note '{}' with ID {} deleted",
            note.title, note.id
        ))))
    }
}
