use super::{ensure_affected, DbError};
use crate::models::DirectMessage;
use sqlx::SqlitePool;

pub struct DirectMessageRepository {
    pool: SqlitePool,
}

impl DirectMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: &DirectMessage) -> Result<DirectMessage, DbError> {
        let message = sqlx::query_as::<_, DirectMessage>(
            "INSERT INTO direct_messages (text, sender_id, receiver_id, read, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *"
        )
        .bind(&message.text)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.read)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<DirectMessage>, DbError> {
        let message = sqlx::query_as::<_, DirectMessage>("SELECT * FROM direct_messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    /// The most recent `limit` messages between two users, oldest first
    pub async fn conversation(&self, a: i64, b: i64, limit: i64) -> Result<Vec<DirectMessage>, DbError> {
        let messages = sqlx::query_as::<_, DirectMessage>(
            "SELECT * FROM (
                 SELECT * FROM direct_messages
                 WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?
             ) ORDER BY created_at ASC, id ASC"
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Messages received by `user_id`, newest first
    pub async fn inbox(&self, user_id: i64, limit: i64) -> Result<Vec<DirectMessage>, DbError> {
        let messages = sqlx::query_as::<_, DirectMessage>(
            "SELECT * FROM direct_messages WHERE receiver_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Mark one message read; only its receiver may do so
    pub async fn mark_read(&self, id: i64, receiver_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE direct_messages SET read = 1 WHERE id = ? AND receiver_id = ?")
            .bind(id)
            .bind(receiver_id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    /// Mark everything `sender_id` sent to `receiver_id` as read
    pub async fn mark_conversation_read(&self, receiver_id: i64, sender_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE direct_messages SET read = 1 WHERE receiver_id = ? AND sender_id = ? AND read = 0"
        )
        .bind(receiver_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, DbError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM direct_messages WHERE receiver_id = ? AND read = 0")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM direct_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::user::UserRepository;
    use crate::models::NewUser;

    async fn two_users(pool: &SqlitePool) -> (i64, i64) {
        let users = UserRepository::new(pool.clone());
        let a = users.create(&NewUser::new("a".into(), "a@example.com".into(), "h".into())).await.unwrap();
        let b = users.create(&NewUser::new("b".into(), "b@example.com".into(), "h".into())).await.unwrap();
        (a.id, b.id)
    }

    fn message_at(sender: i64, receiver: i64, text: &str, at: i64) -> DirectMessage {
        let mut message = DirectMessage::new(sender, receiver, text.to_string());
        message.created_at = at;
        message
    }

    #[tokio::test]
    async fn test_round_trip() {
        let pool = test_pool().await;
        let (a, b) = two_users(&pool).await;
        let repo = DirectMessageRepository::new(pool);

        let sent = repo.create(&message_at(a, b, "hi there", 50)).await.unwrap();
        let fetched = repo.get_by_id(sent.id).await.unwrap().unwrap();
        assert_eq!(fetched.text, "hi there");
        assert_eq!(fetched.sender_id, a);
        assert_eq!(fetched.receiver_id, b);
        assert!(!fetched.read);
        assert_eq!(fetched.created_at, 50);
    }

    #[tokio::test]
    async fn test_conversation_keeps_latest_in_order() {
        let pool = test_pool().await;
        let (a, b) = two_users(&pool).await;
        let repo = DirectMessageRepository::new(pool);

        repo.create(&message_at(a, b, "one", 1)).await.unwrap();
        repo.create(&message_at(b, a, "two", 2)).await.unwrap();
        repo.create(&message_at(a, b, "three", 3)).await.unwrap();

        let texts: Vec<String> = repo
            .conversation(b, a, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn test_read_tracking() {
        let pool = test_pool().await;
        let (a, b) = two_users(&pool).await;
        let repo = DirectMessageRepository::new(pool);

        let first = repo.create(&message_at(a, b, "one", 1)).await.unwrap();
        repo.create(&message_at(a, b, "two", 2)).await.unwrap();
        repo.create(&message_at(a, b, "three", 3)).await.unwrap();
        assert_eq!(repo.unread_count(b).await.unwrap(), 3);

        // Sender cannot mark the receiver's copy as read
        assert!(matches!(repo.mark_read(first.id, a).await, Err(DbError::NotFound)));
        repo.mark_read(first.id, b).await.unwrap();
        assert_eq!(repo.unread_count(b).await.unwrap(), 2);

        assert_eq!(repo.mark_conversation_read(b, a).await.unwrap(), 2);
        assert_eq!(repo.unread_count(b).await.unwrap(), 0);
        assert_eq!(repo.inbox(b, 10).await.unwrap()[0].text, "three");
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let pool = test_pool().await;
        let (a, b) = two_users(&pool).await;
        let users = UserRepository::new(pool.clone());
        let c = users.create(&NewUser::new("c".into(), "c@example.com".into(), "h".into())).await.unwrap().id;
        let repo = DirectMessageRepository::new(pool);

        let sent = repo.create(&message_at(a, b, "from a", 1)).await.unwrap();
        let received = repo.create(&message_at(b, a, "to a", 2)).await.unwrap();
        let unrelated = repo.create(&message_at(b, c, "b to c", 3)).await.unwrap();

        users.delete(a).await.unwrap();
        assert!(repo.get_by_id(sent.id).await.unwrap().is_none());
        assert!(repo.get_by_id(received.id).await.unwrap().is_none());
        assert!(repo.get_by_id(unrelated.id).await.unwrap().is_some());
        assert_eq!(repo.inbox(b, 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_message_to_self_rejected() {
        let pool = test_pool().await;
        let (a, _) = two_users(&pool).await;
        let repo = DirectMessageRepository::new(pool);

        let err = repo.create(&message_at(a, a, "echo", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation(_)), "got {err:?}");
    }
}
