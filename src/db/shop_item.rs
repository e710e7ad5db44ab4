use super::{ensure_affected, DbError};
use crate::models::{CategoryStats, NewShopItem, ShopItem};
use sqlx::types::Json;
use sqlx::SqlitePool;

pub struct ShopItemRepository {
    pool: SqlitePool,
}

impl ShopItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, item: &NewShopItem) -> Result<ShopItem, DbError> {
        let item = sqlx::query_as::<_, ShopItem>(
            "INSERT INTO shop_items (name, category, price, icon, rarity, value)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price)
        .bind(&item.icon)
        .bind(&item.rarity)
        .bind(item.value.clone().map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<ShopItem>, DbError> {
        let item = sqlx::query_as::<_, ShopItem>("SELECT * FROM shop_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<ShopItem>, DbError> {
        let item = sqlx::query_as::<_, ShopItem>("SELECT * FROM shop_items WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn list(&self) -> Result<Vec<ShopItem>, DbError> {
        let items = sqlx::query_as::<_, ShopItem>("SELECT * FROM shop_items ORDER BY category, price, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn list_by_category(&self, category: &str) -> Result<Vec<ShopItem>, DbError> {
        let items = sqlx::query_as::<_, ShopItem>(
            "SELECT * FROM shop_items WHERE category = ? ORDER BY price, id"
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn update(&self, id: i64, item: &NewShopItem) -> Result<ShopItem, DbError> {
        sqlx::query_as::<_, ShopItem>(
            "UPDATE shop_items
             SET name = ?, category = ?, price = ?, icon = ?, rarity = ?, value = ?
             WHERE id = ?
             RETURNING *"
        )
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price)
        .bind(&item.icon)
        .bind(&item.rarity)
        .bind(item.value.clone().map(Json))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    /// Remove a catalog entry. Fails with a foreign key violation while anyone owns it.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM shop_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>, DbError> {
        let stats = sqlx::query_as::<_, CategoryStats>(
            "SELECT category,
                    COUNT(*) AS item_count,
                    MIN(price) AS min_price,
                    MAX(price) AS max_price,
                    AVG(price) AS avg_price
             FROM shop_items
             GROUP BY category
             ORDER BY category"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}
