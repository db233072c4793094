//! Store endpoints

use std::sync::Arc;

use axum::{Extension, extract::State};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::helpers::{StoreView, find_store, store_view};
use crate::gateway::extract::{ApiPath, ValidatedJson};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, ApiResult, MessageResponse, created, ok};
use crate::models::StoreId;
use crate::user_auth::Claims;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StoreRequest {
    #[validate(length(min = 1, max = 80, message = "Store name must not be empty"))]
    #[schema(example = "Corner Shop")]
    pub name: String,
}

/// List all stores with their items and tags
#[utoipa::path(
    get,
    path = "/store",
    responses(
        (status = 200, description = "All stores", body = ApiResponse<Vec<StoreView>>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn list_stores(State(state): State<Arc<AppState>>) -> ApiResult<Vec<StoreView>> {
    let store = state.store.as_ref();
    let mut views = Vec::new();
    for row in store.list_stores().await? {
        views.push(store_view(store, row).await?);
    }
    ok(views)
}

/// Create a store. Requires a fresh token.
#[utoipa::path(
    post,
    path = "/store",
    request_body = StoreRequest,
    responses(
        (status = 201, description = "Store created", body = ApiResponse<StoreView>),
        (status = 400, description = "Invalid name or name already taken"),
        (status = 401, description = "Missing, invalid or stale token")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn create_store(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(req): ValidatedJson<StoreRequest>,
) -> ApiResult<StoreView> {
    claims.require_fresh()?;

    let row = state.store.create_store(&req.name).await?;
    tracing::info!(store_id = row.id, name = %row.name, "Store created");
    created(store_view(state.store.as_ref(), row).await?)
}

#[utoipa::path(
    get,
    path = "/store/{store_id}",
    params(("store_id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store", body = ApiResponse<StoreView>),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    ApiPath(store_id): ApiPath<StoreId>,
) -> ApiResult<StoreView> {
    let store = state.store.as_ref();
    let row = find_store(store, store_id).await?;
    ok(store_view(store, row).await?)
}

/// Delete a store with its items and tags. Admin only.
#[utoipa::path(
    delete,
    path = "/store/{store_id}",
    params(("store_id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store deleted", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Admin privilege required"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn delete_store(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(store_id): ApiPath<StoreId>,
) -> ApiResult<MessageResponse> {
    claims.require_admin()?;

    state.store.delete_store(store_id).await?;
    tracing::info!(store_id, "Store deleted");
    ok(MessageResponse::new("Store deleted"))
}
