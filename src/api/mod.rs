// API layer - HTTP endpoints
pub mod auth;
pub mod health;
pub mod note;
pub mod user;

use std::sync::Arc;

use poem::{Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use note::NotesApi;
pub use user::UsersApi;

use crate::middleware::LoginRateLimiter;
use crate::AppData;

/// Assemble the full application endpoint
///
/// Nests the OpenAPI service under `/api` and the Swagger UI under
/// `/swagger`, with the login rate limiter wrapped around everything (it
/// only acts on the login route).
pub fn build_app(app_data: &Arc<AppData>, login_limiter: LoginRateLimiter) -> impl Endpoint {
    let api_service = OpenApiService::new(
        (
            HealthApi,
            UsersApi::new(app_data),
            NotesApi::new(app_data),
            AuthApi::new(app_data),
        ),
        "TechNotes API",
        env!("CARGO_PKG_VERSION"),
    )
    .server("http://localhost:3000/api");

    let ui = api_service.swagger_ui();

    Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui)
        .with(login_limiter)
}
