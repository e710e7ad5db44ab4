use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub quest_type: String,
    pub reward_xp: i64,
    pub reward_coins: i64,
    pub target: i64,
    pub progress: i64,
    pub completed: bool,
    pub claimed: bool,
    pub user_id: i64,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

impl Quest {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_claimable(&self) -> bool {
        self.completed && !self.claimed
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuest {
    pub title: String,
    pub description: String,
    pub quest_type: String,
    pub reward_xp: i64,
    pub reward_coins: i64,
    pub target: i64,
    pub expires_at: Option<i64>,
}

/// Per-user quest aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct QuestSummary {
    pub total: i64,
    pub completed: i64,
    pub claimed: i64,
    pub xp_earned: i64,
    pub coins_earned: i64,
}
