use super::{ensure_affected, DbError};
use crate::models::{next_login_streak, Achievement, NewUser, ProfileUpdate, User, UserStatus};
use sqlx::{SqliteExecutor, SqlitePool};

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, DbError> {
        let now = chrono::Utc::now().timestamp();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, avatar, title, bio, coins, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(&user.title)
        .bind(&user.bio)
        .bind(user.coins)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Like `get_by_id`, but a missing row is an error
    pub async fn require(&self, id: i64) -> Result<User, DbError> {
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET avatar = COALESCE(?, avatar), title = COALESCE(?, title), bio = COALESCE(?, bio),
                 updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
        .bind(&update.avatar)
        .bind(&update.title)
        .bind(&update.bio)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    pub async fn set_status(&self, id: i64, status: UserStatus) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn set_village(&self, id: i64, village_id: Option<i64>) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("UPDATE users SET village_id = ?, updated_at = ? WHERE id = ?")
            .bind(village_id)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn set_level(&self, id: i64, level: i64) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("UPDATE users SET level = ?, updated_at = ? WHERE id = ?")
            .bind(level)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn add_xp(&self, id: i64, amount: i64) -> Result<i64, DbError> {
        add_xp(&self.pool, id, amount).await
    }

    pub async fn add_coins(&self, id: i64, amount: i64) -> Result<i64, DbError> {
        add_coins(&self.pool, id, amount).await
    }

    /// Debit coins; `None` when the balance is too low (or the user is gone)
    pub async fn spend_coins(&self, id: i64, amount: i64) -> Result<Option<i64>, DbError> {
        spend_coins(&self.pool, id, amount).await
    }

    /// Stamp a login and return the updated user with its new streak
    pub async fn record_login(&self, id: i64, now: i64) -> Result<User, DbError> {
        let mut tx = super::begin_write(&self.pool).await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let streak = next_login_streak(user.last_login_at, user.login_streak, now);
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET last_login_at = ?, login_streak = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
        .bind(now)
        .bind(streak)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn set_recovery_token(&self, id: i64, token: &str, expires_at: i64) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE users SET recovery_token = ?, recovery_token_expires_at = ? WHERE id = ?"
        )
        .bind(token)
        .bind(expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        ensure_affected(result.rows_affected())
    }

    /// Find the user holding `token`, ignoring expired tokens
    pub async fn get_by_recovery_token(&self, token: &str, now: i64) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE recovery_token = ? AND recovery_token_expires_at > ?"
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn clear_recovery_token(&self, id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET recovery_token = NULL, recovery_token_expires_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append an achievement unless one with the same key is already present.
    /// Returns `true` when it was newly unlocked.
    pub async fn unlock_achievement(&self, id: i64, key: &str, now: i64) -> Result<bool, DbError> {
        let achievement = Achievement {
            key: key.to_string(),
            unlocked_at: now,
        };
        let encoded = serde_json::to_string(&achievement)
            .map_err(|e| DbError::Other(sqlx::Error::Encode(Box::new(e))))?;

        let result = sqlx::query(
            "UPDATE users
             SET achievements = json_insert(achievements, '$[#]', json(?)), updated_at = ?
             WHERE id = ?
               AND NOT EXISTS (
                   SELECT 1 FROM json_each(users.achievements) WHERE json_extract(value, '$.key') = ?
               )"
        )
        .bind(encoded)
        .bind(now)
        .bind(id)
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        self.require(id).await?;
        Ok(false)
    }

    /// Delete a user. Their xp leaves their village's total; friendships,
    /// messages, quests, inventory and match membership go with them;
    /// matches they won keep a NULL winner.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let mut tx = super::begin_write(&self.pool).await?;

        sqlx::query(
            "UPDATE villages
             SET total_xp = MAX(total_xp - (SELECT xp FROM users WHERE id = ?), 0), updated_at = ?
             WHERE id = (SELECT village_id FROM users WHERE id = ?)"
        )
        .bind(id)
        .bind(chrono::Utc::now().timestamp())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        ensure_affected(result.rows_affected())?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self) -> Result<Vec<(UserStatus, i64)>, DbError> {
        let rows = sqlx::query_as::<_, (UserStatus, i64)>(
            "SELECT status, COUNT(*) FROM users GROUP BY status ORDER BY status"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Top players by xp, ties broken by who registered first
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY xp DESC, id ASC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

pub(crate) async fn add_xp<'e, E: SqliteExecutor<'e>>(executor: E, id: i64, amount: i64) -> Result<i64, DbError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query_scalar("UPDATE users SET xp = xp + ?, updated_at = ? WHERE id = ? RETURNING xp")
        .bind(amount)
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

pub(crate) async fn add_coins<'e, E: SqliteExecutor<'e>>(executor: E, id: i64, amount: i64) -> Result<i64, DbError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query_scalar("UPDATE users SET coins = coins + ?, updated_at = ? WHERE id = ? RETURNING coins")
        .bind(amount)
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

pub(crate) async fn spend_coins<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
    amount: i64,
) -> Result<Option<i64>, DbError> {
    let now = chrono::Utc::now().timestamp();
    let balance = sqlx::query_scalar(
        "UPDATE users SET coins = coins - ?, updated_at = ? WHERE id = ? AND coins >= ? RETURNING coins"
    )
    .bind(amount)
    .bind(now)
    .bind(id)
    .bind(amount)
    .fetch_optional(executor)
    .await?;
    Ok(balance)
}
