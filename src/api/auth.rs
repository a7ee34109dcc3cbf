use std::sync::Arc;

use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::errors::ApiError;
use crate::services::TokenService;
use crate::stores::{TokenStore, UserStore};
use crate::types::dto::auth::{
    LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest, RefreshResponse, TokenResponse,
};
use crate::AppData;

/// Authentication API endpoints
///
/// Login traffic is rate-limited per client address by the
/// [`LoginRateLimiter`](crate::middleware::LoginRateLimiter) middleware
/// before these handlers run.
pub struct AuthApi {
    users: Arc<UserStore>,
    tokens: Arc<TokenStore>,
    token_service: Arc<TokenService>,
}

impl AuthApi {
    pub fn new(app_data: &Arc<AppData>) -> Self {
        Self {
            users: Arc::clone(&app_data.user_store),
            tokens: Arc::clone(&app_data.token_store),
            token_service: Arc::clone(&app_data.token_service),
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum ApiTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with username and password to receive authentication tokens
    #[oai(path = "/login", method = "post", tag = "ApiTags::Authentication")]
    async fn login(&self, body: Json<LoginRequest>) -> Result<Json<TokenResponse>, ApiError> {
        let req = body.0;
        if req.username.trim().is_empty() || req.password.trim().is_empty() {
            return Err(ApiError::validation("All fields are required"));
        }

        let user = self
            .users
            .verify_credentials(&req.username, &req.password)
            .await?;

        let access_token = self.token_service.generate_jwt(&user.id)?;
        let refresh_token = self.token_service.generate_refresh_token();

        self.tokens
            .store_refresh_token(
                self.token_service.hash_refresh_token(&refresh_token),
                user.id.clone(),
                self.token_service.refresh_token_expiry(),
            )
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Json(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_token_ttl_seconds(),
        }))
    }

    /// Exchange a refresh token for a new access token
    #[oai(path = "/refresh", method = "post", tag = "ApiTags::Authentication")]
    async fn refresh(&self, body: Json<RefreshRequest>) -> Result<Json<RefreshResponse>, ApiError> {
        let token_hash = self.token_service.hash_refresh_token(&body.0.refresh_token);
        let user_id = self.tokens.validate_refresh_token(&token_hash).await?;

        let access_token = self.token_service.generate_jwt(&user_id)?;

        Ok(Json(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_token_ttl_seconds(),
        }))
    }

    /// Logout by revoking a refresh token
    #[oai(path = "/logout", method = "post", tag = "ApiTags::Authentication")]
    async fn logout(&self, body: Json<LogoutRequest>) -> Result<Json<LogoutResponse>, ApiError> {
        let token_hash = self.token_service.hash_refresh_token(&body.0.refresh_token);
        let user_id = self.tokens.revoke_refresh_token(&token_hash).await?;

        tracing::info!(user_id = %user_id, "User logged out");

        Ok(Json(LogoutResponse {
            message: "Logged out".to_string(),
        }))
    }
}
