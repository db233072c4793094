//! In-process data store
//!
//! All tables live behind a single `RwLock`, so every trait method observes and
//! mutates a consistent snapshot. Used when no PostgreSQL URL is configured and
//! by the test suites.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{DataStore, StoreError, StoreResult, messages};
use crate::models::{
    Item, ItemId, ItemTag, ItemUpdate, NewItem, Store, StoreId, Tag, TagId, User, UserId,
};

/// Monotonic id source per table, mimicking a serial column
#[derive(Debug)]
struct Sequence(i64);

impl Default for Sequence {
    fn default() -> Self {
        Self(1)
    }
}

impl Sequence {
    fn next(&mut self) -> i64 {
        let id = self.0;
        self.0 += 1;
        id
    }

    /// Keep future ids clear of an explicitly supplied one
    fn observe(&mut self, id: i64) {
        match id.checked_add(1) {
            Some(next) if next > self.0 => self.0 = next,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    stores: BTreeMap<StoreId, Store>,
    items: BTreeMap<ItemId, Item>,
    tags: BTreeMap<TagId, Tag>,
    item_tags: BTreeMap<i64, ItemTag>,
    users: BTreeMap<UserId, User>,
    store_seq: Sequence,
    item_seq: Sequence,
    tag_seq: Sequence,
    item_tag_seq: Sequence,
    user_seq: Sequence,
}

impl Tables {
    fn tag_ids_of_item(&self, item_id: ItemId) -> Vec<TagId> {
        self.item_tags
            .values()
            .filter(|link| link.item_id == item_id)
            .map(|link| link.tag_id)
            .collect()
    }

    fn item_ids_of_tag(&self, tag_id: TagId) -> Vec<ItemId> {
        self.item_tags
            .values()
            .filter(|link| link.tag_id == tag_id)
            .map(|link| link.item_id)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_stores(&self) -> StoreResult<Vec<Store>> {
        Ok(self.tables.read().await.stores.values().cloned().collect())
    }

    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        Ok(self.tables.read().await.stores.get(&id).cloned())
    }

    async fn create_store(&self, name: &str) -> StoreResult<Store> {
        let mut t = self.tables.write().await;
        if t.stores.values().any(|s| s.name == name) {
            return Err(StoreError::conflict(messages::STORE_EXISTS));
        }
        let store = Store {
            id: t.store_seq.next(),
            name: name.to_string(),
        };
        t.stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn delete_store(&self, id: StoreId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.stores.remove(&id).is_none() {
            return Err(StoreError::NotFound("Store"));
        }
        t.items.retain(|_, item| item.store_id != id);
        t.tags.retain(|_, tag| tag.store_id != id);
        let Tables {
            items,
            tags,
            item_tags,
            ..
        } = &mut *t;
        item_tags.retain(|_, link| {
            items.contains_key(&link.item_id) && tags.contains_key(&link.tag_id)
        });
        Ok(())
    }

    async fn list_items(&self) -> StoreResult<Vec<Item>> {
        Ok(self.tables.read().await.items.values().cloned().collect())
    }

    async fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn create_item(&self, item: NewItem) -> StoreResult<Item> {
        let mut t = self.tables.write().await;
        if !t.stores.contains_key(&item.store_id) {
            return Err(StoreError::NotFound("Store"));
        }
        let item = Item {
            id: t.item_seq.next(),
            name: item.name,
            price: item.price,
            store_id: item.store_id,
        };
        t.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn upsert_item(&self, id: ItemId, update: ItemUpdate) -> StoreResult<(Item, bool)> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.items.get_mut(&id) {
            existing.name = update.name;
            existing.price = update.price;
            return Ok((existing.clone(), false));
        }

        let store_id = update
            .store_id
            .ok_or_else(|| StoreError::conflict(messages::ITEM_STORE_REQUIRED))?;
        if !t.stores.contains_key(&store_id) {
            return Err(StoreError::NotFound("Store"));
        }
        t.item_seq.observe(id);
        let item = Item {
            id,
            name: update.name,
            price: update.price,
            store_id,
        };
        t.items.insert(id, item.clone());
        Ok((item, true))
    }

    async fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.items.remove(&id).is_none() {
            return Err(StoreError::NotFound("Item"));
        }
        t.item_tags.retain(|_, link| link.item_id != id);
        Ok(())
    }

    async fn list_items_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Item>> {
        let t = self.tables.read().await;
        Ok(t.items
            .values()
            .filter(|item| item.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn get_tag(&self, id: TagId) -> StoreResult<Option<Tag>> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn list_tags_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Tag>> {
        let t = self.tables.read().await;
        Ok(t.tags
            .values()
            .filter(|tag| tag.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn create_tag(&self, store_id: StoreId, name: &str) -> StoreResult<Tag> {
        let mut t = self.tables.write().await;
        if !t.stores.contains_key(&store_id) {
            return Err(StoreError::NotFound("Store"));
        }
        if t.tags
            .values()
            .any(|tag| tag.store_id == store_id && tag.name == name)
        {
            return Err(StoreError::conflict(messages::TAG_EXISTS));
        }
        let tag = Tag {
            id: t.tag_seq.next(),
            name: name.to_string(),
            store_id,
        };
        t.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: TagId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.tags.contains_key(&id) {
            return Err(StoreError::NotFound("Tag"));
        }
        if t.item_tags.values().any(|link| link.tag_id == id) {
            return Err(StoreError::conflict(messages::TAG_IN_USE));
        }
        t.tags.remove(&id);
        Ok(())
    }

    async fn link_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.items.contains_key(&item_id) {
            return Err(StoreError::NotFound("Item"));
        }
        if !t.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound("Tag"));
        }
        if t.tag_ids_of_item(item_id).contains(&tag_id) {
            return Ok(());
        }
        let link = ItemTag {
            id: t.item_tag_seq.next(),
            item_id,
            tag_id,
        };
        t.item_tags.insert(link.id, link);
        Ok(())
    }

    async fn unlink_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.items.contains_key(&item_id) {
            return Err(StoreError::NotFound("Item"));
        }
        if !t.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound("Tag"));
        }
        t.item_tags
            .retain(|_, link| !(link.item_id == item_id && link.tag_id == tag_id));
        Ok(())
    }

    async fn list_tags_of_item(&self, item_id: ItemId) -> StoreResult<Vec<Tag>> {
        let t = self.tables.read().await;
        Ok(t.tag_ids_of_item(item_id)
            .into_iter()
            .filter_map(|id| t.tags.get(&id).cloned())
            .collect())
    }

    async fn list_items_of_tag(&self, tag_id: TagId) -> StoreResult<Vec<Item>> {
        let t = self.tables.read().await;
        Ok(t.item_ids_of_tag(tag_id)
            .into_iter()
            .filter_map(|id| t.items.get(&id).cloned())
            .collect())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == username) {
            return Err(StoreError::conflict(messages::USER_EXISTS));
        }
        let user = User {
            id: t.user_seq.next(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("User"))
    }
}
