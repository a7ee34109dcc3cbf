// Common test utilities for integration tests

use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use poem::test::TestClient;
use poem::Endpoint;
use sea_orm::{Database, DatabaseConnection};

use technotes_backend::api::build_app;
use technotes_backend::config::Settings;
use technotes_backend::middleware::LoginRateLimiter;
use technotes_backend::AppData;

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Settings for tests; the database URL and bind address are never used
/// because tests connect to in-memory SQLite and drive the app in-process.
pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "test-jwt-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        password_pepper: "test-pepper-for-integration-tests".to_string(),
        login_attempt_limit: 5,
        login_window: Duration::from_secs(60),
    }
}

/// Creates the full application endpoint over a fresh in-memory database
pub async fn test_app() -> (TestClient<impl Endpoint>, Arc<AppData>) {
    let db = setup_test_db().await;
    let settings = test_settings();
    let app_data = AppData::init(db, &settings);

    let limiter = LoginRateLimiter::new(settings.login_attempt_limit, settings.login_window);
    let client = TestClient::new(build_app(&app_data, limiter));

    (client, app_data)
}
