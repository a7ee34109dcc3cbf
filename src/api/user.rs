use std::sync::Arc;

use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::errors::ApiError;
use crate::stores::UserStore;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::{
    CreateUserApiResponse, CreateUserRequest, DeleteUserRequest, UpdateUserRequest, UserResponse,
};
use crate::AppData;

/// User management API endpoints
pub struct UsersApi {
    users: Arc<UserStore>,
}

impl UsersApi {
    pub fn new(app_data: &Arc<AppData>) -> Self {
        Self {
            users: Arc::clone(&app_data.user_store),
        }
    }
}

/// API tags for user endpoints
#[derive(Tags)]
enum ApiTags {
    /// User management endpoints
    Users,
}

#[OpenApi(prefix_path = "/users")]
impl UsersApi {
    /// List all users
    ///
    /// The password hash is never part of the response. An empty user table
    /// is reported as a client error, not an empty list.
    #[oai(path = "/", method = "get", tag = "ApiTags::Users")]
    async fn list_users(&self) -> Result<Json<Vec<UserResponse>>, ApiError> {
        let users = self.users.list().await?;
        Ok(Json(users.into_iter().map(UserResponse::from).collect()))
    }

    /// Create a new user
    #[oai(path = "/", method = "post", tag = "ApiTags::Users")]
    async fn create_user(
        &self,
        body: Json<CreateUserRequest>,
    ) -> Result<CreateUserApiResponse, ApiError> {
        let req = body.0;
        if req.username.trim().is_empty() || req.password.trim().is_empty() {
            return Err(ApiError::validation("All fields are required"));
        }

        let user = self
            .users
            .create(&req.username, &req.password, req.roles)
            .await?;

        Ok(CreateUserApiResponse::Created(Json(MessageResponse::new(
            format!("New user {} created", user.username),
        ))))
    }

    /// Update a user
    ///
    /// Full overwrite of username, roles and active flag; the password is
    /// re-hashed only when a new one is supplied.
    #[oai(path = "/", method = "patch", tag = "ApiTags::Users")]
    async fn update_user(
        &self,
        body: Json<UpdateUserRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let req = body.0;
        if req.id.trim().is_empty() || req.username.trim().is_empty() || req.roles.is_empty() {
            return Err(ApiError::validation("All fields are required"));
        }

        let user = self
            .users
            .update(
                &req.id,
                &req.username,
                req.roles,
                req.active,
                req.password.as_deref(),
            )
            .await?;

        Ok(Json(MessageResponse::new(format!(
            "{} updated",
            user.username
        ))))
    }

    /// Delete a user
    ///
    /// Refused while any note still references the user.
    #[oai(path = "/", method = "delete", tag = "ApiTags::Users")]
    async fn delete_user(
        &self,
        body: Json<DeleteUserRequest>,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let req = body.0;
        if req.id.trim().is_empty() {
            return Err(ApiError::validation("User ID required"));
        }

        let user = self.users.delete(&req.id).await?;

        Ok(Json(MessageResponse::new(format!(
            "Username {} with ID {} deleted",
            user.username, user.id
        ))))
    }
}
