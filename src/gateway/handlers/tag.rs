//! Tag endpoints and item/tag links

use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::helpers::{TagLinkResponse, TagView, find_item, find_store, find_tag, tag_view};
use crate::gateway::extract::{ApiPath, ValidatedJson};
use crate::gateway::state::AppState;
use crate::gateway::types::{
    ApiResponse, ApiResult, MessageResponse, created, ok, with_status,
};
use crate::models::{ItemId, StoreId, TagId};
use crate::user_auth::Claims;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 80, message = "Tag name must not be empty"))]
    #[schema(example = "furniture")]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/store/{store_id}/tag",
    params(("store_id" = i64, Path, description = "Store id")),
    responses(
        (status = 200, description = "Tags of the store", body = ApiResponse<Vec<TagView>>),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn list_store_tags(
    State(state): State<Arc<AppState>>,
    ApiPath(store_id): ApiPath<StoreId>,
) -> ApiResult<Vec<TagView>> {
    let store = state.store.as_ref();
    find_store(store, store_id).await?;

    let mut views = Vec::new();
    for row in store.list_tags_in_store(store_id).await? {
        views.push(tag_view(store, row).await?);
    }
    ok(views)
}

/// Create a tag in a store. Requires a fresh token.
#[utoipa::path(
    post,
    path = "/store/{store_id}/tag",
    params(("store_id" = i64, Path, description = "Store id")),
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = ApiResponse<TagView>),
        (status = 400, description = "Invalid name or name already used in this store"),
        (status = 401, description = "Missing, invalid or stale token"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(store_id): ApiPath<StoreId>,
    ValidatedJson(req): ValidatedJson<TagRequest>,
) -> ApiResult<TagView> {
    claims.require_fresh()?;

    let row = state.store.create_tag(store_id, &req.name).await?;
    tracing::info!(tag_id = row.id, store_id, "Tag created");
    created(tag_view(state.store.as_ref(), row).await?)
}

#[utoipa::path(
    get,
    path = "/tag/{tag_id}",
    params(("tag_id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = ApiResponse<TagView>),
        (status = 404, description = "Tag not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    ApiPath(tag_id): ApiPath<TagId>,
) -> ApiResult<TagView> {
    let store = state.store.as_ref();
    let row = find_tag(store, tag_id).await?;
    ok(tag_view(store, row).await?)
}

/// Delete an unused tag. Admin only.
///
/// Answers 202 on success and 400 while any item still carries the tag.
#[utoipa::path(
    delete,
    path = "/tag/{tag_id}",
    params(("tag_id" = i64, Path, description = "Tag id")),
    responses(
        (status = 202, description = "Tag deleted", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Tag is linked to items"),
        (status = 401, description = "Admin privilege required"),
        (status = 404, description = "Tag not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(tag_id): ApiPath<TagId>,
) -> ApiResult<MessageResponse> {
    claims.require_admin()?;

    state.store.delete_tag(tag_id).await?;
    tracing::info!(tag_id, "Tag deleted");
    with_status(StatusCode::ACCEPTED, MessageResponse::new("Tag deleted."))
}

/// Attach an existing tag to an existing item
#[utoipa::path(
    post,
    path = "/item/{item_id}/tag/{tag_id}",
    params(
        ("item_id" = i64, Path, description = "Item id"),
        ("tag_id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 201, description = "Tag linked", body = ApiResponse<TagView>),
        (status = 404, description = "Item or tag not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn link_tag(
    State(state): State<Arc<AppState>>,
    ApiPath((item_id, tag_id)): ApiPath<(ItemId, TagId)>,
) -> ApiResult<TagView> {
    let store = state.store.as_ref();
    store.link_tag(item_id, tag_id).await?;
    tracing::info!(item_id, tag_id, "Tag linked to item");

    let tag = find_tag(store, tag_id).await?;
    created(tag_view(store, tag).await?)
}

/// Detach a tag from an item. Admin only.
#[utoipa::path(
    delete,
    path = "/item/{item_id}/tag/{tag_id}",
    params(
        ("item_id" = i64, Path, description = "Item id"),
        ("tag_id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Tag unlinked", body = ApiResponse<TagLinkResponse>),
        (status = 401, description = "Admin privilege required"),
        (status = 404, description = "Item or tag not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn unlink_tag(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath((item_id, tag_id)): ApiPath<(ItemId, TagId)>,
) -> ApiResult<TagLinkResponse> {
    claims.require_admin()?;

    let store = state.store.as_ref();
    let item = find_item(store, item_id).await?;
    let tag = find_tag(store, tag_id).await?;
    store.unlink_tag(item_id, tag_id).await?;
    tracing::info!(item_id, tag_id, "Tag unlinked from item");

    ok(TagLinkResponse {
        message: "Item removed from tag".to_string(),
        item,
        tag,
    })
}
