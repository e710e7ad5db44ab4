use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub acquired_at: i64,
}

/// An owned item joined with its catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryEntry {
    pub id: i64,
    pub item_id: i64,
    pub acquired_at: i64,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub rarity: String,
}
