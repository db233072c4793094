//! Response views and shared handler utilities
//!
//! Rows come back flat from the store; these views attach one level of
//! relations (a store's items and tags, an item's tags, a tag's items).

use rust_decimal::Decimal;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use utoipa::ToSchema;

use crate::gateway::error::ApiError;
use crate::models::{Item, ItemId, Store, StoreId, Tag, TagId};
use crate::store::DataStore;

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreView {
    #[schema(example = 1)]
    pub id: StoreId,
    #[schema(example = "Corner Shop")]
    pub name: String,
    pub items: Vec<Item>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemView {
    #[schema(example = 1)]
    pub id: ItemId,
    #[schema(example = "Chair")]
    pub name: String,
    #[schema(value_type = String, example = "15.99")]
    pub price: Decimal,
    #[schema(example = 1)]
    pub store_id: StoreId,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagView {
    #[schema(example = 1)]
    pub id: TagId,
    #[schema(example = "furniture")]
    pub name: String,
    #[schema(example = 1)]
    pub store_id: StoreId,
    pub items: Vec<Item>,
}

/// Result of linking or unlinking a tag
#[derive(Debug, Serialize, ToSchema)]
pub struct TagLinkResponse {
    #[schema(example = "Item removed from tag")]
    pub message: String,
    pub item: Item,
    pub tag: Tag,
}

pub async fn store_view(store: &dyn DataStore, row: Store) -> Result<StoreView, ApiError> {
    let items = store.list_items_in_store(row.id).await?;
    let tags = store.list_tags_in_store(row.id).await?;
    Ok(StoreView {
        id: row.id,
        name: row.name,
        items,
        tags,
    })
}

pub async fn item_view(store: &dyn DataStore, row: Item) -> Result<ItemView, ApiError> {
    let tags = store.list_tags_of_item(row.id).await?;
    Ok(ItemView {
        id: row.id,
        name: row.name,
        price: row.price,
        store_id: row.store_id,
        tags,
    })
}

pub async fn tag_view(store: &dyn DataStore, row: Tag) -> Result<TagView, ApiError> {
    let items = store.list_items_of_tag(row.id).await?;
    Ok(TagView {
        id: row.id,
        name: row.name,
        store_id: row.store_id,
        items,
    })
}

pub async fn find_store(store: &dyn DataStore, id: StoreId) -> Result<Store, ApiError> {
    store
        .get_store(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Store not found".to_string()))
}

pub async fn find_item(store: &dyn DataStore, id: ItemId) -> Result<Item, ApiError> {
    store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))
}

pub async fn find_tag(store: &dyn DataStore, id: TagId) -> Result<Tag, ApiError> {
    store
        .get_tag(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))
}

/// Current time in milliseconds since UNIX epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
