use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Settings;
use crate::services::{PasswordService, TokenService};
use crate::stores::{NoteStore, TokenStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once in main.rs and shared across the API
/// endpoints, so handlers never reach for global state.
pub struct AppData {
    pub db: DatabaseConnection,
    pub user_store: Arc<UserStore>,
    pub note_store: Arc<NoteStore>,
    pub token_store: Arc<TokenStore>,
    pub token_service: Arc<TokenService>,
}

impl AppData {
    /// Initialize all application data
    ///
    /// The database connection should be connected and migrated before
    /// calling this.
    pub fn init(db: DatabaseConnection, settings: &Settings) -> Arc<Self> {
        tracing::debug!("Creating stores...");

        let passwords = Arc::new(PasswordService::new(settings.password_pepper.clone()));

        let user_store = Arc::new(UserStore::new(db.clone(), passwords));
        let note_store = Arc::new(NoteStore::new(db.clone()));
        let token_store = Arc::new(TokenStore::new(db.clone()));

        let token_service = Arc::new(TokenService::new(
            settings.jwt_secret.clone(),
            settings.refresh_token_secret.clone(),
        ));

        tracing::debug!("Stores created");

        Arc::new(Self {
            db,
            user_store,
            note_store,
            token_store,
            token_service,
        })
    }
}
