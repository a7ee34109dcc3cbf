use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::middleware::{LOGIN_ATTEMPT_LIMIT, LOGIN_WINDOW};

/// Application settings, loaded once at startup and injected explicitly
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub refresh_token_secret: String,
    pub password_pepper: String,
    pub login_attempt_limit: u32,
    pub login_window: Duration,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Required environment variable not set: {0}")]
    MissingVar(&'static str),
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// Secrets have no defaults and must be provided; everything else falls
    /// back to a development-friendly value.
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://technotes.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let jwt_secret = required("JWT_SECRET")?;
        let refresh_token_secret = required("REFRESH_TOKEN_SECRET")?;
        let password_pepper = required("PASSWORD_PEPPER")?;

        let login_attempt_limit = env::var("LOGIN_ATTEMPT_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LOGIN_ATTEMPT_LIMIT);

        let login_window = env::var("LOGIN_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(LOGIN_WINDOW);

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            refresh_token_secret,
            password_pepper,
            login_attempt_limit,
            login_window,
        })
    }
}

fn required(name: &'static str) -> Result<String, SettingsError> {
    env::var(name).map_err(|_| SettingsError::MissingVar(name))
}
