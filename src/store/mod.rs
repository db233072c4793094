//! Data store layer
//!
//! [`DataStore`] is the only persistence seam the handlers see. Two backends:
//! - [`PgStore`]: PostgreSQL via sqlx (production)
//! - [`MemoryStore`]: process-local tables (no `postgres_url` configured, tests)
//!
//! Relations are exposed as explicit association queries instead of being
//! traversed implicitly.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    Item, ItemId, ItemUpdate, NewItem, Store, StoreId, Tag, TagId, User, UserId,
};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations backing every handler.
///
/// Each method is atomic: multi-statement writes run in one transaction
/// (Postgres) or under one write lock (memory).
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;

    // === Stores ===
    async fn list_stores(&self) -> StoreResult<Vec<Store>>;
    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>>;
    /// Fails with [`StoreError::Conflict`] when the name is taken
    async fn create_store(&self, name: &str) -> StoreResult<Store>;
    /// Removes the store together with its items, tags and links
    async fn delete_store(&self, id: StoreId) -> StoreResult<()>;

    // === Items ===
    async fn list_items(&self) -> StoreResult<Vec<Item>>;
    async fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>>;
    async fn create_item(&self, item: NewItem) -> StoreResult<Item>;
    /// Update in place, or insert under `id`. Returns `(item, created)`.
    async fn upsert_item(&self, id: ItemId, update: ItemUpdate) -> StoreResult<(Item, bool)>;
    async fn delete_item(&self, id: ItemId) -> StoreResult<()>;
    async fn list_items_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Item>>;

    // === Tags ===
    async fn get_tag(&self, id: TagId) -> StoreResult<Option<Tag>>;
    async fn list_tags_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Tag>>;
    /// Fails with [`StoreError::Conflict`] when `(store_id, name)` exists
    async fn create_tag(&self, store_id: StoreId, name: &str) -> StoreResult<Tag>;
    /// Fails with [`StoreError::Conflict`] while any item is linked to the tag
    async fn delete_tag(&self, id: TagId) -> StoreResult<()>;

    // === Item <-> Tag links ===
    /// Idempotent: linking an already linked pair is a no-op
    async fn link_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()>;
    async fn unlink_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()>;
    async fn list_tags_of_item(&self, item_id: ItemId) -> StoreResult<Vec<Tag>>;
    async fn list_items_of_tag(&self, tag_id: TagId) -> StoreResult<Vec<Item>>;

    // === Users ===
    /// Fails with [`StoreError::Conflict`] when the username is taken
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;
}

/// Conflict messages shared by both backends
pub mod messages {
    pub const STORE_EXISTS: &str = "A store with that name already exists.";
    pub const TAG_EXISTS: &str = "A tag with that name already exists in that store.";
    pub const USER_EXISTS: &str = "A user with that username already exists.";
    pub const TAG_IN_USE: &str =
        "Could not delete tag. Make sure tag is not associated with any item(s), then try again.";
    pub const ITEM_STORE_REQUIRED: &str = "store_id is required when creating an item.";
}
