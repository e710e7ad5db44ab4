use super::{ensure_affected, DbError};
use crate::models::{InventoryEntry, InventoryItem};
use sqlx::{SqliteExecutor, SqlitePool};

pub struct InventoryItemRepository {
    pool: SqlitePool,
}

impl InventoryItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, item_id: i64) -> Result<InventoryItem, DbError> {
        insert(&self.pool, user_id, item_id, chrono::Utc::now().timestamp()).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<InventoryItem>, DbError> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn owns(&self, user_id: i64, item_id: i64) -> Result<bool, DbError> {
        let owned = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE user_id = ? AND item_id = ?)"
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(owned)
    }

    /// Everything `user_id` owns, with catalog details, most recent first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<InventoryEntry>, DbError> {
        let entries = sqlx::query_as::<_, InventoryEntry>(
            "SELECT inv.id, inv.item_id, inv.acquired_at, s.name, s.category, s.icon, s.rarity
             FROM inventory_items inv
             JOIN shop_items s ON s.id = inv.item_id
             WHERE inv.user_id = ?
             ORDER BY inv.acquired_at DESC, inv.id DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn delete(&self, user_id: i64, item_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE user_id = ? AND item_id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn count_owners(&self, item_id: i64) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE item_id = ?")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn insert<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: i64,
    item_id: i64,
    acquired_at: i64,
) -> Result<InventoryItem, DbError> {
    let item = sqlx::query_as::<_, InventoryItem>(
        "INSERT INTO inventory_items (user_id, item_id, acquired_at) VALUES (?, ?, ?) RETURNING *"
    )
    .bind(user_id)
    .bind(item_id)
    .bind(acquired_at)
    .fetch_one(executor)
    .await?;
    Ok(item)
}
