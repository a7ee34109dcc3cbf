use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::errors::internal::CredentialError;
use crate::errors::InternalError;
use crate::types::db::refresh_token::{self, Entity as RefreshToken};

/// TokenStore persists hashed refresh tokens
///
/// Only HMAC-SHA256 hashes are stored; the plaintext token lives solely with
/// the client.
pub struct TokenStore {
    db: DatabaseConnection,
}

impl TokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a refresh token hash for a user
    pub async fn store_refresh_token(
        &self,
        token_hash: String,
        user_id: String,
        expires_at: i64,
    ) -> Result<(), InternalError> {
        let new_token = refresh_token::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            token_hash: Set(token_hash),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now().timestamp()),
        };

        new_token
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("store_refresh_token", e))?;

        Ok(())
    }

    /// Validate a refresh token hash and return the associated user ID
    ///
    /// # Returns
    /// * `Ok(String)` - The user ID, when the token exists and has not expired
    /// * `Err(CredentialError::InvalidToken)` - Unknown token hash
    /// * `Err(CredentialError::ExpiredToken)` - Token found but expired
    pub async fn validate_refresh_token(&self, token_hash: &str) -> Result<String, InternalError> {
        let token = RefreshToken::find()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("validate_refresh_token", e))?
            .ok_or(CredentialError::InvalidToken {
                token_type: "refresh_token".to_string(),
                reason: "not found".to_string(),
            })?;

        if token.expires_at < Utc::now().timestamp() {
            return Err(CredentialError::ExpiredToken("refresh_token".to_string()).into());
        }

        Ok(token.user_id)
    }

    /// Revoke a refresh token by deleting it
    ///
    /// Does not verify user ownership - the refresh token itself is the
    /// authority.
    pub async fn revoke_refresh_token(&self, token_hash: &str) -> Result<String, InternalError> {
        let token = RefreshToken::find()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("revoke_refresh_token", e))?
            .ok_or(CredentialError::InvalidToken {
                token_type: "refresh_token".to_string(),
                reason: "not found".to_string(),
            })?;

        let user_id = token.user_id.clone();

        RefreshToken::delete_many()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("revoke_refresh_token", e))?;

        Ok(user_id)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("db", &"<connection>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PasswordService;
    use crate::stores::UserStore;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Arc;

    async fn setup() -> (TokenStore, String) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let users = UserStore::new(
            db.clone(),
            Arc::new(PasswordService::new("test-pepper".to_string())),
        );
        let user_id = users
            .create("alice", "password123", None)
            .await
            .expect("seed user failed")
            .id;

        (TokenStore::new(db), user_id)
    }

    #[tokio::test]
    async fn test_store_and_validate_refresh_token() {
        let (store, user_id) = setup().await;
        let expires_at = Utc::now().timestamp() + 3600;

        store
            .store_refresh_token("some-hash".to_string(), user_id.clone(), expires_at)
            .await
            .expect("store failed");

        let resolved = store
            .validate_refresh_token("some-hash")
            .await
            .expect("validation failed");
        assert_eq!(resolved, user_id);
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let (store, _user_id) = setup().await;

        let result = store.validate_refresh_token("never-stored").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::InvalidToken {
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (store, user_id) = setup().await;
        let expired = Utc::now().timestamp() - 60;

        store
            .store_refresh_token("stale-hash".to_string(), user_id, expired)
            .await
            .unwrap();

        let result = store.validate_refresh_token("stale-hash").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::ExpiredToken(_)))
        ));
    }

    #[tokio::test]
    async fn test_revoked_token_no_longer_validates() {
        let (store, user_id) = setup().await;
        let expires_at = Utc::now().timestamp() + 3600;

        store
            .store_refresh_token("revoke-me".to_string(), user_id.clone(), expires_at)
            .await
            .unwrap();

        let revoked_user = store
            .revoke_refresh_token("revoke-me")
            .await
            .expect("revoke failed");
        assert_eq!(revoked_user, user_id);

        assert!(store.validate_refresh_token("revoke-me").await.is_err());
    }
}
