use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Village {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub icon: String,
    pub total_xp: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVillage {
    pub name: String,
    pub region: String,
    pub icon: String,
}
