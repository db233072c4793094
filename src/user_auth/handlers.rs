use axum::{Extension, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use super::service::TokenPair;
use super::token::Claims;
use crate::gateway::extract::{ApiPath, ValidatedJson};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, ApiResult, MessageResponse, created, ok};
use crate::models::{User, UserId};

/// Register / login body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[validate(length(min = 1, max = 80, message = "Username must not be empty"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    #[schema(example = "pw1")]
    pub password: String,
}

/// Public view of a user (no password hash)
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    request_body = Credentials,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserView>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already exists")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<Credentials>,
) -> ApiResult<UserView> {
    let user = state.user_auth.register(&req.username, &req.password).await?;
    created(user.into())
}

/// Login user
///
/// Issues a fresh access token and a refresh token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<Credentials>,
) -> ApiResult<TokenPair> {
    let pair = state.user_auth.login(&req.username, &req.password).await?;
    ok(pair)
}

/// Revoke the presented access token
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Token revoked", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Missing, invalid or revoked token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<MessageResponse> {
    state.user_auth.logout(&claims);
    ok(MessageResponse::new("Successfully logged out"))
}

/// Exchange a refresh token for a non-fresh access token
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "New access token", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<AccessTokenResponse> {
    let access_token = state.user_auth.refresh(&claims)?;
    ok(AccessTokenResponse { access_token })
}

#[utoipa::path(
    get,
    path = "/user/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserView>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> ApiResult<UserView> {
    let user = state.user_auth.get_user(user_id).await?;
    ok(user.into())
}

/// Admin only
#[utoipa::path(
    delete,
    path = "/user/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Admin privilege required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(user_id): ApiPath<UserId>,
) -> ApiResult<MessageResponse> {
    claims.require_admin()?;
    state.user_auth.delete_user(user_id).await?;
    ok(MessageResponse::new("User deleted"))
}
