use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::errors::internal::{CredentialError, UserError};
use crate::errors::InternalError;
use crate::services::PasswordService;
use crate::types::db::note;
use crate::types::db::user::{self, Entity as User};

/// Baseline role assigned when a create request carries no roles
pub const DEFAULT_ROLE: &str = "Employee";

/// UserStore manages user records in the database
///
/// Enforces the two user-side invariants: usernames are unique
/// case-insensitively, and a user that still owns notes cannot be deleted.
pub struct UserStore {
    db: DatabaseConnection,
    passwords: Arc<PasswordService>,
}

impl UserStore {
    pub fn new(db: DatabaseConnection, passwords: Arc<PasswordService>) -> Self {
        Self { db, passwords }
    }

    /// List all users
    ///
    /// # Returns
    /// * `Ok(Vec<user::Model>)` - All user records
    /// * `Err(UserError::NoUsersFound)` - The table is empty
    pub async fn list(&self) -> Result<Vec<user::Model>, InternalError> {
        let users = User::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_users", e))?;

        if users.is_empty() {
            return Err(UserError::NoUsersFound.into());
        }
        Ok(users)
    }

    /// Find a user by username, compared case-insensitively
    pub async fn find_by_username_ci(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    user::Entity,
                    user::Column::Username,
                ))))
                .eq(username.to_lowercase()),
            )
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_username_ci", e))
    }

    /// Create a new user
    ///
    /// Hashes the password before persisting. An absent or empty role list
    /// falls back to the baseline role.
    ///
    /// # Returns
    /// * `Ok(user::Model)` - The created user
    /// * `Err(UserError::DuplicateUsername)` - Case-insensitive username collision
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        roles: Option<Vec<String>>,
    ) -> Result<user::Model, InternalError> {
        if self.find_by_username_ci(username).await?.is_some() {
            return Err(UserError::DuplicateUsername {
                username: username.to_string(),
            }
            .into());
        }

        let roles = match roles {
            Some(r) if !r.is_empty() => r,
            _ => vec![DEFAULT_ROLE.to_string()],
        };

        let password_hash = self.passwords.hash(password)?;
        let now = Utc::now().timestamp();

        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            roles: Set(encode_roles(&roles)?),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        new_user
            .insert(&self.db)
            .await
            .map_err(|e| {
                // The unique index backs up the check-then-write above
                if e.to_string().contains("UNIQUE") {
                    InternalError::User(UserError::DuplicateUsername {
                        username: username.to_string(),
                    })
                } else {
                    InternalError::database("create_user", e)
                }
            })
    }

    /// Update a user's username, roles and active flag
    ///
    /// Re-hashes the password only when a non-empty one is supplied. Renaming
    /// a user to their own current username is allowed; colliding with a
    /// different user's name is not.
    ///
    /// # Returns
    /// * `Ok(user::Model)` - The updated user
    /// * `Err(UserError::NotFound)` - No user with this id
    /// * `Err(UserError::DuplicateUsername)` - Username collides with another user
    pub async fn update(
        &self,
        id: &str,
        username: &str,
        roles: Vec<String>,
        active: bool,
        password: Option<&str>,
    ) -> Result<user::Model, InternalError> {
        let existing = User::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))?
            .ok_or(UserError::NotFound { id: id.to_string() })?;

        if let Some(duplicate) = self.find_by_username_ci(username).await? {
            if duplicate.id != id {
                return Err(UserError::DuplicateUsername {
                    username: username.to_string(),
                }
                .into());
            }
        }

        let mut active_model: user::ActiveModel = existing.into();
        active_model.username = Set(username.to_string());
        active_model.roles = Set(encode_roles(&roles)?);
        active_model.active = Set(active);
        active_model.updated_at = Set(Utc::now().timestamp());

        if let Some(password) = password {
            if !password.trim().is_empty() {
                active_model.password_hash = Set(self.passwords.hash(password)?);
            }
        }

        active_model
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_user", e))
    }

    /// Delete a user
    ///
    /// Refuses to delete a user that still owns notes.
    ///
    /// # Returns
    /// * `Ok(user::Model)` - The deleted user, for the confirmation message
    /// * `Err(UserError::HasAssignedNotes)` - At least one note references the user
    /// * `Err(UserError::NotFound)` - No user with this id
    pub async fn delete(&self, id: &str) -> Result<user::Model, InternalError> {
        let note_count = note::Entity::find()
            .filter(note::Column::UserId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_user_notes", e))?;

        if note_count > 0 {
            return Err(UserError::HasAssignedNotes { id: id.to_string() }.into());
        }

        let user = User::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))?
            .ok_or(UserError::NotFound { id: id.to_string() })?;

        User::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;

        Ok(user)
    }

    /// Verify login credentials and return the matching user
    ///
    /// Any lookup or password mismatch collapses to `InvalidCredentials`, so
    /// the caller cannot distinguish an unknown username from a wrong
    /// password. A deactivated account is rejected even with a correct
    /// password.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, InternalError> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user_for_login", e))?
            .ok_or(CredentialError::InvalidCredentials)?;

        if !user.active {
            return Err(CredentialError::UserInactive.into());
        }

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(CredentialError::InvalidCredentials.into());
        }

        Ok(user)
    }
}

fn encode_roles(roles: &[String]) -> Result<String, InternalError> {
    serde_json::to_string(roles).map_err(|e| InternalError::parse("roles", e.to_string()))
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("db", &"<connection>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::NoteError;
    use crate::stores::NoteStore;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup_test_store() -> UserStore {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let passwords = Arc::new(PasswordService::new(
            "test-pepper-for-unit-tests".to_string(),
        ));
        UserStore::new(db, passwords)
    }

    fn is_duplicate_username(err: &InternalError) -> bool {
        matches!(
            err,
            InternalError::User(UserError::DuplicateUsername { .. })
        )
    }

    #[tokio::test]
    async fn test_create_user_persists_and_hashes() {
        let store = setup_test_store().await;

        let user = store
            .create("alice", "password123", None)
            .await
            .expect("create failed");

        assert_eq!(user.username, "alice");
        assert!(user.active);
        assert_ne!(user.password_hash, "password123");
        assert_eq!(user.role_labels(), vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_create_user_keeps_explicit_roles() {
        let store = setup_test_store().await;

        let user = store
            .create(
                "alice",
                "password123",
                Some(vec!["Manager".to_string(), "Admin".to_string()]),
            )
            .await
            .unwrap();

        assert_eq!(user.role_labels(), vec!["Manager", "Admin"]);
    }

    #[tokio::test]
    async fn test_empty_role_list_falls_back_to_default() {
        let store = setup_test_store().await;

        let user = store
            .create("alice", "password123", Some(vec![]))
            .await
            .unwrap();

        assert_eq!(user.role_labels(), vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_case_insensitive() {
        let store = setup_test_store().await;

        store.create("Bob", "password123", None).await.unwrap();
        let err = store
            .create("bob", "password456", None)
            .await
            .expect_err("expected duplicate username error");

        assert!(is_duplicate_username(&err));
    }

    #[tokio::test]
    async fn test_update_rejects_collision_with_other_user() {
        let store = setup_test_store().await;

        store.create("alice", "pw-alice", None).await.unwrap();
        let bob = store.create("bob", "pw-bob", None).await.unwrap();

        let err = store
            .update(&bob.id, "ALICE", vec![DEFAULT_ROLE.to_string()], true, None)
            .await
            .expect_err("expected duplicate username error");

        assert!(is_duplicate_username(&err));
    }

    #[tokio::test]
    async fn test_update_to_own_username_succeeds() {
        let store = setup_test_store().await;

        let alice = store.create("alice", "pw-alice", None).await.unwrap();
        let updated = store
            .update(
                &alice.id,
                "alice",
                vec!["Manager".to_string()],
                false,
                None,
            )
            .await
            .expect("update failed");

        assert_eq!(updated.username, "alice");
        assert_eq!(updated.role_labels(), vec!["Manager"]);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn test_update_rehashes_only_when_password_supplied() {
        let store = setup_test_store().await;

        let alice = store.create("alice", "old-password", None).await.unwrap();
        let original_hash = alice.password_hash.clone();

        let unchanged = store
            .update(
                &alice.id,
                "alice",
                vec![DEFAULT_ROLE.to_string()],
                true,
                None,
            )
            .await
            .unwrap();
        assert_eq!(unchanged.password_hash, original_hash);

        let rehashed = store
            .update(
                &alice.id,
                "alice",
                vec![DEFAULT_ROLE.to_string()],
                true,
                Some("new-password"),
            )
            .await
            .unwrap();
        assert_ne!(rehashed.password_hash, original_hash);

        let verified = store
            .verify_credentials("alice", "new-password")
            .await
            .expect("new password should verify");
        assert_eq!(verified.id, alice.id);
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let store = setup_test_store().await;

        let err = store
            .update(
                "no-such-id",
                "ghost",
                vec![DEFAULT_ROLE.to_string()],
                true,
                None,
            )
            .await
            .expect_err("expected not found error");

        assert!(matches!(
            err,
            InternalError::User(UserError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_user_with_notes_is_refused() {
        let store = setup_test_store().await;
        let notes = NoteStore::new(store.db.clone());

        let alice = store.create("alice", "password123", None).await.unwrap();
        notes
            .create(&alice.id, "Shopping list", "milk, eggs")
            .await
            .unwrap();

        let err = store
            .delete(&alice.id)
            .await
            .expect_err("expected assigned notes error");
        assert!(matches!(
            err,
            InternalError::User(UserError::HasAssignedNotes { .. })
        ));

        // Deleting the note unblocks the user
        let note = notes
            .find_by_title_ci("shopping LIST")
            .await
            .unwrap()
            .expect("note should exist");
        notes.delete(&note.id).await.unwrap();

        let deleted = store.delete(&alice.id).await.expect("delete failed");
        assert_eq!(deleted.username, "alice");

        let err = notes
            .create(&alice.id, "Orphan", "owner is gone")
            .await
            .expect_err("expected owner not found");
        assert!(matches!(
            err,
            InternalError::Note(NoteError::OwnerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_empty_table_is_an_error() {
        let store = setup_test_store().await;

        let err = store.list().await.expect_err("expected no users error");
        assert!(matches!(err, InternalError::User(UserError::NoUsersFound)));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = setup_test_store().await;
        let alice = store.create("alice", "password123", None).await.unwrap();

        let ok = store
            .verify_credentials("alice", "password123")
            .await
            .expect("verification failed");
        assert_eq!(ok.id, alice.id);

        let wrong_password = store.verify_credentials("alice", "wrong").await;
        assert!(matches!(
            wrong_password,
            Err(InternalError::Credential(
                CredentialError::InvalidCredentials
            ))
        ));

        let unknown_user = store.verify_credentials("nobody", "password123").await;
        assert!(matches!(
            unknown_user,
            Err(InternalError::Credential(
                CredentialError::InvalidCredentials
            ))
        ));
    }

    #[tokio::test]
    async fn test_verify_credentials_rejects_inactive_user() {
        let store = setup_test_store().await;
        let alice = store.create("alice", "password123", None).await.unwrap();

        store
            .update(
                &alice.id,
                "alice",
                vec![DEFAULT_ROLE.to_string()],
                false,
                None,
            )
            .await
            .unwrap();

        let result = store.verify_credentials("alice", "password123").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::UserInactive))
        ));
    }
}
