use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::internal::NoteError;
use crate::errors::InternalError;
use crate::types::db::note::{self, Entity as Note};
use crate::types::db::user::{self, Entity as User};

/// A note paired with its owner's username
///
/// The username is derived at read time; it is never stored on the note.
#[derive(Debug)]
pub struct NoteWithOwner {
    pub note: note::Model,
    pub username: String,
}

/// NoteStore manages note records in the database
///
/// Enforces case-insensitive title uniqueness and the rule that every note
/// references an existing user.
pub struct NoteStore {
    db: DatabaseConnection,
}

impl NoteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List all notes, each enriched with the owner's username
    ///
    /// The owner is resolved with one lookup per note, preserving the
    /// original access pattern.
    ///
    /// # Returns
    /// * `Ok(Vec<NoteWithOwner>)` - All notes with owner usernames
    /// * `Err(NoteError::NoNotesFound)` - The table is empty
    pub async fn list_with_owners(&self) -> Result<Vec<NoteWithOwner>, InternalError> {
        let notes = Note::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_notes", e))?;

        if notes.is_empty() {
            return Err(NoteError::NoNotesFound.into());
        }

        let mut enriched = Vec::with_capacity(notes.len());
        for note in notes {
            let owner = User::find_by_id(&note.user_id)
                .one(&self.db)
                .await
                .map_err(|e| InternalError::database("find_note_owner", e))?
                .ok_or_else(|| NoteError::OwnerNotFound {
                    user_id: note.user_id.clone(),
                })?;

            enriched.push(NoteWithOwner {
                note,
                username: owner.username,
            });
        }

        Ok(enriched)
    }

    /// Find a note by title, compared case-insensitively
    pub async fn find_by_title_ci(
        &self,
        title: &str,
    ) -> Result<Option<note::Model>, InternalError> {
        Note::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((note::Entity, note::Column::Title))))
                    .eq(title.to_lowercase()),
            )
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_title_ci", e))
    }

    /// Create a new note owned by the given user
    ///
    /// # Returns
    /// * `Ok(note::Model)` - The created note
    /// * `Err(NoteError::OwnerNotFound)` - The referenced user does not exist
    /// * `Err(NoteError::DuplicateTitle)` - Case-insensitive title collision
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        text: &str,
    ) -> Result<note::Model, InternalError> {
        self.ensure_owner_exists(user_id).await?;

        if self.find_by_title_ci(title).await?.is_some() {
            return Err(NoteError::DuplicateTitle {
                title: title.to_string(),
            }
            .into());
        }

        let now = Utc::now().timestamp();
        let new_note = note::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            text: Set(text.to_string()),
            completed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        new_note.insert(&self.db).await.map_err(|e| {
            // The unique index backs up the check-then-write above
            if e.to_string().contains("UNIQUE") {
                InternalError::Note(NoteError::DuplicateTitle {
                    title: title.to_string(),
                })
            } else {
                InternalError::database("create_note", e)
            }
        })
    }

    /// Update a note, overwriting all mutable fields
    ///
    /// Renaming a note to its own current title is allowed; colliding with a
    /// different note's title is not.
    ///
    /// # Returns
    /// * `Ok(note::Model)` - The updated note
    /// * `Err(NoteError::NotFound)` - No note with this id
    /// * `Err(NoteError::DuplicateTitle)` - Title collides with another note
    /// * `Err(NoteError::OwnerNotFound)` - The new owner does not exist
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        title: &str,
        text: &str,
        completed: bool,
    ) -> Result<note::Model, InternalError> {
        let existing = Note::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_note_by_id", e))?
            .ok_or(NoteError::NotFound { id: id.to_string() })?;

        if let Some(duplicate) = self.find_by_title_ci(title).await? {
            if duplicate.id != id {
                return Err(NoteError::DuplicateTitle {
                    title: title.to_string(),
                }
                .into());
            }
        }

        self.ensure_owner_exists(user_id).await?;

        let mut active_model: note::ActiveModel = existing.into();
        active_model.user_id = Set(user_id.to_string());
        active_model.title = Set(title.to_string());
        active_model.text = Set(text.to_string());
        active_model.completed = Set(completed);
        active_model.updated_at = Set(Utc::now().timestamp());

        active_model
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_note", e))
    }

    /// Delete a note
    ///
    /// # Returns
    /// * `Ok(note::Model)` - The deleted note, for the confirmation message
    /// * `Err(NoteError::NotFound)` - No note with this id
    pub async fn delete(&self, id: &str) -> Result<note::Model, InternalError> {
        let note = Note::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_note_by_id", e))?
            .ok_or(NoteError::NotFound { id: id.to_string() })?;

        Note::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_note", e))?;

        Ok(note)
    }

    async fn ensure_owner_exists(&self, user_id: &str) -> Result<(), InternalError> {
        User::find()
            .filter(user::Column::Id.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_note_owner", e))?
            .ok_or(NoteError::OwnerNotFound {
                user_id: user_id.to_string(),
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("db", &"<connection>")
            .finish()
    }
}
