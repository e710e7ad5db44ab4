use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShopItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub icon: String,
    pub rarity: String,
    /// Free-form payload interpreted by the client (colour, frame style, ...)
    pub value: Option<Json<serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShopItem {
    pub name: String,
    pub category: String,
    pub price: i64,
    pub icon: String,
    pub rarity: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Price statistics for one catalog category
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CategoryStats {
    pub category: String,
    pub item_count: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub avg_price: f64,
}
