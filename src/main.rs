use poem::{listener::TcpListener, Server};
use sea_orm::Database;

use migration::{Migrator, MigratorTrait};
use technotes_backend::api::build_app;
use technotes_backend::config::{init_logging, Settings};
use technotes_backend::middleware::LoginRateLimiter;
use technotes_backend::AppData;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let settings = Settings::from_env().expect("Failed to load settings");

    // Connect to database
    let db = Database::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database: {}", settings.database_url);

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database migrations completed");

    let app_data = AppData::init(db, &settings);

    let login_limiter =
        LoginRateLimiter::new(settings.login_attempt_limit, settings.login_window);

    let app = build_app(&app_data, login_limiter);

    tracing::info!("Starting server on http://{}", settings.bind_addr);
    tracing::info!("Swagger UI available under /swagger");

    Server::new(TcpListener::bind(settings.bind_addr))
        .run(app)
        .await
}
