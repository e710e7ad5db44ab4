use super::{ensure_affected, DbError};
use crate::models::{Friendship, FriendshipStatus, User};
use sqlx::{SqliteExecutor, SqlitePool};

pub struct FriendshipRepository {
    pool: SqlitePool,
}

impl FriendshipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        friend_id: i64,
        status: FriendshipStatus,
    ) -> Result<Friendship, DbError> {
        insert(&self.pool, user_id, friend_id, status).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Friendship>, DbError> {
        let friendship = sqlx::query_as::<_, Friendship>("SELECT * FROM friendships WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(friendship)
    }

    /// The directed row `user_id -> friend_id`, if any
    pub async fn get_between(&self, user_id: i64, friend_id: i64) -> Result<Option<Friendship>, DbError> {
        let friendship = sqlx::query_as::<_, Friendship>(
            "SELECT * FROM friendships WHERE user_id = ? AND friend_id = ?"
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(friendship)
    }

    /// A row between the two users in either direction
    pub async fn find_either(&self, a: i64, b: i64) -> Result<Option<Friendship>, DbError> {
        find_either(&self.pool, a, b).await
    }

    pub async fn set_status(&self, id: i64, status: FriendshipStatus) -> Result<Friendship, DbError> {
        set_status(&self.pool, id, status).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM friendships WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    /// Remove any row between the two users, whichever side created it
    pub async fn delete_between(&self, a: i64, b: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "DELETE FROM friendships
             WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)"
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rows touching `user_id` on either side with the given status
    pub async fn list_for_user(&self, user_id: i64, status: FriendshipStatus) -> Result<Vec<Friendship>, DbError> {
        let rows = sqlx::query_as::<_, Friendship>(
            "SELECT * FROM friendships
             WHERE (user_id = ? OR friend_id = ?) AND status = ?
             ORDER BY created_at, id"
        )
        .bind(user_id)
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Users with an accepted friendship to `user_id`, whichever side asked
    pub async fn friends_of(&self, user_id: i64) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN friendships f
               ON (f.user_id = ? AND f.friend_id = u.id) OR (f.friend_id = ? AND f.user_id = u.id)
             WHERE f.status = 'accepted'
             ORDER BY u.username"
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Incoming requests awaiting `user_id`'s answer
    pub async fn pending_for(&self, user_id: i64) -> Result<Vec<Friendship>, DbError> {
        let rows = sqlx::query_as::<_, Friendship>(
            "SELECT * FROM friendships WHERE friend_id = ? AND status = 'pending' ORDER BY created_at, id"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub(crate) async fn insert<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: i64,
    friend_id: i64,
    status: FriendshipStatus,
) -> Result<Friendship, DbError> {
    let friendship = sqlx::query_as::<_, Friendship>(
        "INSERT INTO friendships (user_id, friend_id, status, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING *"
    )
    .bind(user_id)
    .bind(friend_id)
    .bind(status)
    .bind(chrono::Utc::now().timestamp())
    .fetch_one(executor)
    .await?;
    Ok(friendship)
}

pub(crate) async fn find_either<'e, E: SqliteExecutor<'e>>(executor: E, a: i64, b: i64) -> Result<Option<Friendship>, DbError> {
    let friendship = sqlx::query_as::<_, Friendship>(
        "SELECT * FROM friendships
         WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
         ORDER BY id LIMIT 1"
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_optional(executor)
    .await?;
    Ok(friendship)
}

pub(crate) async fn set_status<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
    status: FriendshipStatus,
) -> Result<Friendship, DbError> {
    sqlx::query_as::<_, Friendship>("UPDATE friendships SET status = ? WHERE id = ? RETURNING *")
        .bind(status)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}
