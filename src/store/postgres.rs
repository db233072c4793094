//! PostgreSQL data store
//!
//! Schema lives in `migrations/`. Multi-statement writes run in a transaction;
//! uniqueness is enforced by the schema and surfaced as [`StoreError::Conflict`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::{DataStore, StoreError, StoreResult, messages};
use crate::db::Database;
use crate::models::{
    Item, ItemId, ItemUpdate, NewItem, Store, StoreId, Tag, TagId, User, UserId,
};

const ITEM_COLUMNS: &str = "id, name, price, store_id";
const TAG_COLUMNS: &str = "id, name, store_id";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db = Database::connect(database_url).await?;
        db.migrate().await?;
        Ok(Self::new(db.pool().clone()))
    }
}

/// Translate constraint violations into domain errors
fn map_constraint(e: sqlx::Error, conflict_msg: &str, missing: &'static str) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::conflict(conflict_msg),
        Some(db) if db.is_foreign_key_violation() => StoreError::NotFound(missing),
        _ => StoreError::from(e),
    }
}

fn require_row(rows_affected: u64, entity: &'static str) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound(entity));
    }
    Ok(())
}

#[async_trait]
impl DataStore for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_stores(&self) -> StoreResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, Store>("SELECT id, name FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        let row = sqlx::query_as::<_, Store>("SELECT id, name FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_store(&self, name: &str) -> StoreResult<Store> {
        sqlx::query_as::<_, Store>("INSERT INTO stores (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint(e, messages::STORE_EXISTS, "Store"))
    }

    async fn delete_store(&self, id: StoreId) -> StoreResult<()> {
        // items, tags and their links cascade
        let res = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_row(res.rows_affected(), "Store")
    }

    async fn list_items(&self) -> StoreResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id");
        Ok(sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        Ok(sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_item(&self, item: NewItem) -> StoreResult<Item> {
        let sql = format!(
            "INSERT INTO items (name, price, store_id) VALUES ($1, $2, $3) RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, Item>(&sql)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.store_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "Item already exists.", "Store"))
    }

    async fn upsert_item(&self, id: ItemId, update: ItemUpdate) -> StoreResult<(Item, bool)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("UPDATE items SET name = $2, price = $3 WHERE id = $1 RETURNING {ITEM_COLUMNS}");
        let updated = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(update.price)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(item) = updated {
            tx.commit().await?;
            return Ok((item, false));
        }

        let store_id = update
            .store_id
            .ok_or_else(|| StoreError::conflict(messages::ITEM_STORE_REQUIRED))?;
        let sql = format!(
            "INSERT INTO items (id, name, price, store_id) VALUES ($1, $2, $3, $4) RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(update.price)
            .bind(store_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "Item already exists.", "Store"))?;

        // Explicit ids do not advance the serial; never move it backwards
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('items', 'id'), \
             GREATEST((SELECT MAX(id) FROM items), (SELECT last_value FROM items_id_seq)))",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((item, true))
    }

    async fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_row(res.rows_affected(), "Item")
    }

    async fn list_items_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE store_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Item>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_tag(&self, id: TagId) -> StoreResult<Option<Tag>> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1");
        Ok(sqlx::query_as::<_, Tag>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_tags_in_store(&self, store_id: StoreId) -> StoreResult<Vec<Tag>> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE store_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Tag>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_tag(&self, store_id: StoreId, name: &str) -> StoreResult<Tag> {
        let sql = format!("INSERT INTO tags (name, store_id) VALUES ($1, $2) RETURNING {TAG_COLUMNS}");
        sqlx::query_as::<_, Tag>(&sql)
            .bind(name)
            .bind(store_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint(e, messages::TAG_EXISTS, "Store"))
    }

    async fn delete_tag(&self, id: TagId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("Tag"));
        }

        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM items_tags WHERE tag_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if in_use {
            return Err(StoreError::conflict(messages::TAG_IN_USE));
        }

        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn link_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        ensure_link_ends(&mut tx, item_id, tag_id).await?;

        sqlx::query(
            r#"INSERT INTO items_tags (item_id, tag_id) VALUES ($1, $2)
               ON CONFLICT (item_id, tag_id) DO NOTHING"#,
        )
        .bind(item_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn unlink_tag(&self, item_id: ItemId, tag_id: TagId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        ensure_link_ends(&mut tx, item_id, tag_id).await?;

        sqlx::query("DELETE FROM items_tags WHERE item_id = $1 AND tag_id = $2")
            .bind(item_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_tags_of_item(&self, item_id: ItemId) -> StoreResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, Tag>(
            r#"SELECT t.id, t.name, t.store_id
               FROM tags t JOIN items_tags it ON it.tag_id = t.id
               WHERE it.item_id = $1
               ORDER BY t.id"#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_items_of_tag(&self, tag_id: TagId) -> StoreResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>(
            r#"SELECT i.id, i.name, i.price, i.store_id
               FROM items i JOIN items_tags it ON it.item_id = i.id
               WHERE it.tag_id = $1
               ORDER BY i.id"#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash) VALUES ($1, $2)
               RETURNING id, username, password_hash"#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, messages::USER_EXISTS, "User"))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_row(res.rows_affected(), "User")
    }
}

/// Both sides of a link must exist before it is touched
async fn ensure_link_ends(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: ItemId,
    tag_id: TagId,
) -> StoreResult<()> {
    let item = sqlx::query_scalar::<_, i64>("SELECT id FROM items WHERE id = $1 FOR KEY SHARE")
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
    if item.is_none() {
        return Err(StoreError::NotFound("Item"));
    }

    let tag = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE id = $1 FOR KEY SHARE")
        .bind(tag_id)
        .fetch_optional(&mut **tx)
        .await?;
    if tag.is_none() {
        return Err(StoreError::NotFound("Tag"));
    }
    Ok(())
}
