//! Persisted entities
//!
//! Rows map 1:1 onto the tables created by `migrations/`. Relations are not
//! embedded here; handlers assemble them through the association queries on
//! [`crate::store::DataStore`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub type StoreId = i64;
pub type ItemId = i64;
pub type TagId = i64;
pub type UserId = i64;

/// Largest id a client may pick through `PUT /item/{id}`. Leaves the rest of
/// the `i64` range to the serial counters.
pub const MAX_EXPLICIT_ITEM_ID: ItemId = i32::MAX as ItemId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Store {
    #[schema(example = 1)]
    pub id: StoreId,
    #[schema(example = "Corner Shop")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    #[schema(example = 1)]
    pub id: ItemId,
    #[schema(example = "Chair")]
    pub name: String,
    #[schema(value_type = String, example = "15.99")]
    pub price: Decimal,
    #[schema(example = 1)]
    pub store_id: StoreId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tag {
    #[schema(example = 1)]
    pub id: TagId,
    #[schema(example = "furniture")]
    pub name: String,
    #[schema(example = 1)]
    pub store_id: StoreId,
}

/// Join row between items and tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ItemTag {
    pub id: i64,
    pub item_id: ItemId,
    pub tag_id: TagId,
}

/// Registered account. The hash never leaves the service layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Unsaved item; `id` is assigned by the store
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub price: Decimal,
    pub store_id: StoreId,
}

/// Fields touched by `PUT /item/{id}`
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub name: String,
    pub price: Decimal,
    /// Only used when the item does not exist yet
    pub store_id: Option<StoreId>,
}
