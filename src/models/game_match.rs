use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: i64,
    pub game_type: String,
    pub winner_id: Option<i64>,
    pub stake: i64,
    pub is_ranked: bool,
    pub score: i64,
    pub duration: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMatch {
    pub game_type: String,
    pub winner_id: Option<i64>,
    #[serde(default)]
    pub stake: i64,
    #[serde(default)]
    pub is_ranked: bool,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub duration: i64,
}

/// Lifetime match statistics for one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct MatchStats {
    pub played: i64,
    pub wins: i64,
    pub ranked_played: i64,
    pub total_stake: i64,
    pub avg_score: f64,
    pub best_score: i64,
    pub total_duration: i64,
}
