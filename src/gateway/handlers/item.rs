//! Item endpoints

use std::sync::Arc;

use axum::{Extension, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::helpers::{ItemView, find_item, item_view};
use crate::gateway::error::ApiError;
use crate::gateway::extract::{ApiPath, ValidatedJson};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, ApiResult, MessageResponse, created, ok};
use crate::models::{ItemId, ItemUpdate, MAX_EXPLICIT_ITEM_ID, NewItem, StoreId};
use crate::user_auth::Claims;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 80, message = "Item name must not be empty"))]
    #[schema(example = "Chair")]
    pub name: String,
    #[validate(custom(function = non_negative_price))]
    #[schema(value_type = f64, example = 15.99)]
    pub price: Decimal,
    #[schema(example = 1)]
    pub store_id: StoreId,
}

/// `PUT /item/{id}` body; `store_id` only matters when the item is new
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ItemUpdateRequest {
    #[validate(length(min = 1, max = 80, message = "Item name must not be empty"))]
    #[schema(example = "Chair")]
    pub name: String,
    #[validate(custom(function = non_negative_price))]
    #[schema(value_type = f64, example = 17.99)]
    pub price: Decimal,
    #[serde(default)]
    pub store_id: Option<StoreId>,
}

/// Largest magnitude `NUMERIC(12, 2)` can hold is just under this
const PRICE_LIMIT: i64 = 10_000_000_000;

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    let reject = |code: &'static str, message: &'static str| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        Err(err)
    };

    if price.is_sign_negative() && !price.is_zero() {
        return reject("non_negative", "Price must not be negative");
    }
    if price.normalize().scale() > 2 {
        return reject("scale", "Price must have at most two decimal places");
    }
    if price.abs() >= Decimal::from(PRICE_LIMIT) {
        return reject("range", "Price must be below 10000000000");
    }
    Ok(())
}

/// List all items with their tags
#[utoipa::path(
    get,
    path = "/item",
    responses(
        (status = 200, description = "All items", body = ApiResponse<Vec<ItemView>>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn list_items(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ItemView>> {
    let store = state.store.as_ref();
    let mut views = Vec::new();
    for row in store.list_items().await? {
        views.push(item_view(store, row).await?);
    }
    ok(views)
}

/// Create an item in an existing store. Requires a fresh token.
#[utoipa::path(
    post,
    path = "/item",
    request_body = ItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemView>),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Missing, invalid or stale token"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(req): ValidatedJson<ItemRequest>,
) -> ApiResult<ItemView> {
    claims.require_fresh()?;

    let row = state
        .store
        .create_item(NewItem {
            name: req.name,
            price: req.price,
            store_id: req.store_id,
        })
        .await?;
    tracing::info!(item_id = row.id, store_id = row.store_id, "Item created");
    created(item_view(state.store.as_ref(), row).await?)
}

#[utoipa::path(
    get,
    path = "/item/{item_id}",
    params(("item_id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = ApiResponse<ItemView>),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ApiPath(item_id): ApiPath<ItemId>,
) -> ApiResult<ItemView> {
    let store = state.store.as_ref();
    let row = find_item(store, item_id).await?;
    ok(item_view(store, row).await?)
}

/// Update name and price, or create the item under this id
#[utoipa::path(
    put,
    path = "/item/{item_id}",
    params(("item_id" = i64, Path, description = "Item id")),
    request_body = ItemUpdateRequest,
    responses(
        (status = 200, description = "Item updated or created", body = ApiResponse<ItemView>),
        (status = 400, description = "Invalid body or id, or store_id missing for a new item"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn put_item(
    State(state): State<Arc<AppState>>,
    ApiPath(item_id): ApiPath<ItemId>,
    ValidatedJson(req): ValidatedJson<ItemUpdateRequest>,
) -> ApiResult<ItemView> {
    if !(1..=MAX_EXPLICIT_ITEM_ID).contains(&item_id) {
        return Err(ApiError::BadRequest(format!(
            "Item id must be between 1 and {MAX_EXPLICIT_ITEM_ID}"
        )));
    }

    let (row, was_created) = state
        .store
        .upsert_item(
            item_id,
            ItemUpdate {
                name: req.name,
                price: req.price,
                store_id: req.store_id,
            },
        )
        .await?;
    tracing::info!(item_id, created = was_created, "Item upserted");
    ok(item_view(state.store.as_ref(), row).await?)
}

/// Admin only
#[utoipa::path(
    delete,
    path = "/item/{item_id}",
    params(("item_id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Admin privilege required"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiPath(item_id): ApiPath<ItemId>,
) -> ApiResult<MessageResponse> {
    claims.require_admin()?;

    state.store.delete_item(item_id).await?;
    tracing::info!(item_id, "Item deleted");
    ok(MessageResponse::new("Item deleted"))
}
