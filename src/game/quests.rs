use super::progression::{award_in, Balance};
use super::{GameError, GameResult};
use crate::db::begin_write;
use crate::db::quest::{mark_claimed, QuestRepository};
use crate::db::user::UserRepository;
use crate::models::{NewQuest, Quest};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize)]
pub struct ClaimedQuest {
    pub quest: Quest,
    pub balance: Balance,
}

pub async fn assign_quest(pool: &SqlitePool, user_id: i64, new_quest: &NewQuest) -> GameResult<Quest> {
    if new_quest.title.trim().is_empty() {
        return Err(GameError::Validation("quest title is empty".to_string()));
    }
    if new_quest.target <= 0 {
        return Err(GameError::Validation("quest target must be positive".to_string()));
    }
    if new_quest.reward_xp < 0 || new_quest.reward_coins < 0 {
        return Err(GameError::Validation("quest rewards cannot be negative".to_string()));
    }
    UserRepository::new(pool.clone())
        .get_by_id(user_id)
        .await?
        .ok_or(GameError::NotFound("user"))?;

    let quest = QuestRepository::new(pool.clone()).create(user_id, new_quest).await?;
    tracing::debug!("Assigned quest {} '{}' to user {}", quest.id, quest.title, user_id);
    Ok(quest)
}

async fn owned_quest(repo: &QuestRepository, user_id: i64, quest_id: i64) -> GameResult<Quest> {
    let quest = repo.get_by_id(quest_id).await?.ok_or(GameError::NotFound("quest"))?;
    if quest.user_id != user_id {
        return Err(GameError::NotQuestOwner);
    }
    Ok(quest)
}

/// Record `amount` units of progress on one of the user's quests
pub async fn progress_quest(pool: &SqlitePool, user_id: i64, quest_id: i64, amount: i64, now: i64) -> GameResult<Quest> {
    if amount <= 0 {
        return Err(GameError::Validation("progress amount must be positive".to_string()));
    }
    let repo = QuestRepository::new(pool.clone());
    let quest = owned_quest(&repo, user_id, quest_id).await?;
    if quest.completed || quest.is_expired(now) {
        return Err(GameError::QuestClosed);
    }

    let quest = repo.advance(quest_id, amount, now).await?.ok_or(GameError::QuestClosed)?;
    if quest.completed {
        tracing::info!("User {} completed quest {} '{}'", user_id, quest.id, quest.title);
    }
    Ok(quest)
}

/// Claim a completed quest's rewards. The claim flag and the payout commit together.
pub async fn claim_quest(pool: &SqlitePool, user_id: i64, quest_id: i64) -> GameResult<ClaimedQuest> {
    let repo = QuestRepository::new(pool.clone());
    let quest = owned_quest(&repo, user_id, quest_id).await?;
    if quest.claimed {
        return Err(GameError::QuestAlreadyClaimed);
    }
    if !quest.completed {
        return Err(GameError::QuestNotCompleted);
    }

    let mut tx = begin_write(pool).await?;
    let quest = mark_claimed(&mut *tx, quest_id)
        .await?
        .ok_or(GameError::QuestAlreadyClaimed)?;
    let balance = award_in(&mut tx, user_id, quest.reward_xp, quest.reward_coins).await?;
    tx.commit().await?;

    tracing::info!(
        "User {} claimed quest {}: +{} xp, +{} coins",
        user_id,
        quest.id,
        quest.reward_xp,
        quest.reward_coins
    );
    Ok(ClaimedQuest { quest, balance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::NewUser;

    fn daily(target: i64, expires_at: Option<i64>) -> NewQuest {
        NewQuest {
            title: "Play matches".to_string(),
            description: "Play some matches today".to_string(),
            quest_type: "daily".to_string(),
            reward_xp: 30,
            reward_coins: 20,
            target,
            expires_at,
        }
    }

    async fn user(pool: &SqlitePool, name: &str) -> i64 {
        UserRepository::new(pool.clone())
            .create(&NewUser::new(name.into(), format!("{name}@example.com"), "h".into()))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_progress_then_claim_pays_once() {
        let pool = test_pool().await;
        let owner = user(&pool, "owner").await;
        let quest = assign_quest(&pool, owner, &daily(2, None)).await.unwrap();

        assert!(matches!(claim_quest(&pool, owner, quest.id).await, Err(GameError::QuestNotCompleted)));
        progress_quest(&pool, owner, quest.id, 1, 0).await.unwrap();
        let done = progress_quest(&pool, owner, quest.id, 1, 0).await.unwrap();
        assert!(done.completed);
        assert!(matches!(progress_quest(&pool, owner, quest.id, 1, 0).await, Err(GameError::QuestClosed)));

        let claimed = claim_quest(&pool, owner, quest.id).await.unwrap();
        assert!(claimed.quest.claimed);
        assert_eq!(claimed.balance.xp, 30);
        assert_eq!(claimed.balance.coins, 20);
        assert!(matches!(claim_quest(&pool, owner, quest.id).await, Err(GameError::QuestAlreadyClaimed)));

        let owner = UserRepository::new(pool).require(owner).await.unwrap();
        assert_eq!((owner.xp, owner.coins), (30, 20));
    }

    #[tokio::test]
    async fn test_other_users_cannot_touch_quest() {
        let pool = test_pool().await;
        let owner = user(&pool, "owner").await;
        let intruder = user(&pool, "intruder").await;
        let quest = assign_quest(&pool, owner, &daily(1, None)).await.unwrap();

        assert!(matches!(progress_quest(&pool, intruder, quest.id, 1, 0).await, Err(GameError::NotQuestOwner)));
        progress_quest(&pool, owner, quest.id, 1, 0).await.unwrap();
        assert!(matches!(claim_quest(&pool, intruder, quest.id).await, Err(GameError::NotQuestOwner)));
    }

    #[tokio::test]
    async fn test_expired_and_invalid_quests() {
        let pool = test_pool().await;
        let owner = user(&pool, "owner").await;
        let quest = assign_quest(&pool, owner, &daily(3, Some(100))).await.unwrap();

        assert!(matches!(progress_quest(&pool, owner, quest.id, 1, 100).await, Err(GameError::QuestClosed)));
        assert!(matches!(progress_quest(&pool, owner, quest.id, 0, 0).await, Err(GameError::Validation(_))));
        assert!(matches!(assign_quest(&pool, owner, &daily(0, None)).await, Err(GameError::Validation(_))));
        assert!(matches!(assign_quest(&pool, 999, &daily(1, None)).await, Err(GameError::NotFound("user"))));
    }
}
