use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Presence shown to friends and village members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Online,
    Offline,
    InGame,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "ONLINE",
            UserStatus::Offline => "OFFLINE",
            UserStatus::InGame => "IN_GAME",
        }
    }
}

/// A single unlocked achievement, stored inside the user's JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub key: String,
    pub unlocked_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub title: Option<String>,
    pub level: i64,
    pub xp: i64,
    pub coins: i64,
    pub bio: Option<String>,
    pub status: UserStatus,
    #[serde(skip_serializing)]
    pub recovery_token: Option<String>,
    #[serde(skip_serializing)]
    pub recovery_token_expires_at: Option<i64>,
    pub last_login_at: Option<i64>,
    pub login_streak: i64,
    pub achievements: Json<Vec<Achievement>>,
    pub village_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn has_achievement(&self, key: &str) -> bool {
        self.achievements.iter().any(|a| a.key == key)
    }
}

/// Fields supplied when inserting a user; everything else takes its column default
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub coins: i64,
}

impl NewUser {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
            avatar: None,
            title: None,
            bio: None,
            coins: 0,
        }
    }
}

/// Partial profile edit. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub avatar: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
}

/// Next login streak value given the previous login and the current time.
///
/// Same UTC day keeps the streak, the following day extends it, anything
/// else starts over at 1.
pub fn next_login_streak(last_login_at: Option<i64>, current_streak: i64, now: i64) -> i64 {
    let Some(last) = last_login_at else {
        return 1;
    };
    let day = |ts: i64| chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive());
    match (day(last), day(now)) {
        (Some(prev), Some(today)) if prev == today => current_streak.max(1),
        (Some(prev), Some(today)) if prev.succ_opt() == Some(today) => current_streak + 1,
        _ => 1,
    }
}
