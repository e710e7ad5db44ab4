use super::{ensure_affected, DbError};
use crate::models::{NewQuest, Quest, QuestSummary};
use sqlx::{SqliteExecutor, SqlitePool};

pub struct QuestRepository {
    pool: SqlitePool,
}

impl QuestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, quest: &NewQuest) -> Result<Quest, DbError> {
        let quest = sqlx::query_as::<_, Quest>(
            "INSERT INTO quests (title, description, quest_type, reward_xp, reward_coins, target, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
        .bind(&quest.title)
        .bind(&quest.description)
        .bind(&quest.quest_type)
        .bind(quest.reward_xp)
        .bind(quest.reward_coins)
        .bind(quest.target)
        .bind(user_id)
        .bind(quest.expires_at)
        .bind(chrono::Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await?;
        Ok(quest)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Quest>, DbError> {
        let quest = sqlx::query_as::<_, Quest>("SELECT * FROM quests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quest)
    }

    pub async fn list_for_user(&self, user_id: i64, include_claimed: bool) -> Result<Vec<Quest>, DbError> {
        let quests = sqlx::query_as::<_, Quest>(
            "SELECT * FROM quests WHERE user_id = ? AND (? OR claimed = 0) ORDER BY created_at, id"
        )
        .bind(user_id)
        .bind(include_claimed)
        .fetch_all(&self.pool)
        .await?;
        Ok(quests)
    }

    /// Add `amount` to the quest's progress, capped at its target, and flag it
    /// completed once the target is reached. Returns `None` if the quest is
    /// missing, already completed or expired at `now`.
    pub async fn advance(&self, id: i64, amount: i64, now: i64) -> Result<Option<Quest>, DbError> {
        let quest = sqlx::query_as::<_, Quest>(
            "UPDATE quests
             SET progress = MIN(target, progress + ?),
                 completed = (progress + ? >= target)
             WHERE id = ? AND completed = 0 AND (expires_at IS NULL OR expires_at > ?)
             RETURNING *"
        )
        .bind(amount)
        .bind(amount)
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quest)
    }

    pub async fn mark_claimed(&self, id: i64) -> Result<Option<Quest>, DbError> {
        mark_claimed(&self.pool, id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM quests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    /// Drop unclaimed quests whose deadline has passed
    pub async fn delete_expired(&self, now: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "DELETE FROM quests WHERE claimed = 0 AND expires_at IS NOT NULL AND expires_at <= ?"
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn summary_for_user(&self, user_id: i64) -> Result<QuestSummary, DbError> {
        let summary = sqlx::query_as::<_, QuestSummary>(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(completed), 0) AS completed,
                    COALESCE(SUM(claimed), 0) AS claimed,
                    COALESCE(SUM(CASE WHEN claimed = 1 THEN reward_xp ELSE 0 END), 0) AS xp_earned,
                    COALESCE(SUM(CASE WHEN claimed = 1 THEN reward_coins ELSE 0 END), 0) AS coins_earned
             FROM quests WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}

/// Flip `claimed` on a completed, unclaimed quest. `None` when it is not claimable.
pub(crate) async fn mark_claimed<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Quest>, DbError> {
    let quest = sqlx::query_as::<_, Quest>(
        "UPDATE quests SET claimed = 1 WHERE id = ? AND completed = 1 AND claimed = 0 RETURNING *"
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(quest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::user::UserRepository;
    use crate::models::NewUser;

    fn new_quest(target: i64, expires_at: Option<i64>) -> NewQuest {
        NewQuest {
            title: "Win games".to_string(),
            description: "Win a few games".to_string(),
            quest_type: "daily".to_string(),
            reward_xp: 50,
            reward_coins: 10,
            target,
            expires_at,
        }
    }

    async fn setup() -> (QuestRepository, i64) {
        let pool = test_pool().await;
        let user = UserRepository::new(pool.clone())
            .create(&NewUser::new("q".into(), "q@example.com".into(), "h".into()))
            .await
            .unwrap();
        (QuestRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (repo, user_id) = setup().await;
        let created = repo.create(user_id, &new_quest(3, Some(500))).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Win games");
        assert_eq!(fetched.description, "Win a few games");
        assert_eq!(fetched.quest_type, "daily");
        assert_eq!(fetched.reward_xp, 50);
        assert_eq!(fetched.reward_coins, 10);
        assert_eq!(fetched.target, 3);
        assert_eq!(fetched.progress, 0);
        assert!(!fetched.completed);
        assert!(!fetched.claimed);
        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.expires_at, Some(500));
    }

    #[tokio::test]
    async fn test_advance_clamps_and_completes() {
        let (repo, user_id) = setup().await;
        let quest = repo.create(user_id, &new_quest(3, None)).await.unwrap();

        let quest_after = repo.advance(quest.id, 2, 0).await.unwrap().unwrap();
        assert_eq!(quest_after.progress, 2);
        assert!(!quest_after.completed);

        let quest_after = repo.advance(quest.id, 5, 0).await.unwrap().unwrap();
        assert_eq!(quest_after.progress, 3);
        assert!(quest_after.completed);

        // Completed quests no longer move
        assert!(repo.advance(quest.id, 1, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_advance_refuses_expired() {
        let (repo, user_id) = setup().await;
        let quest = repo.create(user_id, &new_quest(3, Some(100))).await.unwrap();

        assert!(repo.advance(quest.id, 1, 99).await.unwrap().is_some());
        assert!(repo.advance(quest.id, 1, 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_once() {
        let (repo, user_id) = setup().await;
        let quest = repo.create(user_id, &new_quest(1, None)).await.unwrap();

        assert!(repo.mark_claimed(quest.id).await.unwrap().is_none());
        repo.advance(quest.id, 1, 0).await.unwrap();
        assert!(repo.mark_claimed(quest.id).await.unwrap().unwrap().claimed);
        assert!(repo.mark_claimed(quest.id).await.unwrap().is_none());

        assert!(repo.list_for_user(user_id, false).await.unwrap().is_empty());
        assert_eq!(repo.list_for_user(user_id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_and_expiry_sweep() {
        let (repo, user_id) = setup().await;
        let done = repo.create(user_id, &new_quest(1, None)).await.unwrap();
        repo.create(user_id, &new_quest(5, None)).await.unwrap();
        repo.create(user_id, &new_quest(5, Some(10))).await.unwrap();

        repo.advance(done.id, 1, 0).await.unwrap();
        repo.mark_claimed(done.id).await.unwrap();

        let summary = repo.summary_for_user(user_id).await.unwrap();
        assert_eq!(
            summary,
            QuestSummary { total: 3, completed: 1, claimed: 1, xp_earned: 50, coins_earned: 10 }
        );

        assert_eq!(repo.delete_expired(10).await.unwrap(), 1);
        assert_eq!(repo.summary_for_user(user_id).await.unwrap().total, 2);
        assert_eq!(repo.summary_for_user(9999).await.unwrap(), QuestSummary::default());
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let (repo, user_id) = setup().await;
        let first = repo.create(user_id, &new_quest(3, None)).await.unwrap();
        let second = repo.create(user_id, &new_quest(1, Some(500))).await.unwrap();

        UserRepository::new(repo.pool.clone()).delete(user_id).await.unwrap();
        assert!(repo.get_by_id(first.id).await.unwrap().is_none());
        assert!(repo.get_by_id(second.id).await.unwrap().is_none());
        assert!(repo.list_for_user(user_id, true).await.unwrap().is_empty());
    }
}
