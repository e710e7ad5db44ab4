use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DirectMessage {
    pub id: i64,
    pub text: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub read: bool,
    pub created_at: i64,
}

impl DirectMessage {
    pub fn new(sender_id: i64, receiver_id: i64, text: String) -> Self {
        Self {
            id: 0, // Will be set by database
            text,
            sender_id,
            receiver_id,
            read: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}
