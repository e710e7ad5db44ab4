use super::{GameError, GameResult};
use crate::db::village::VillageRepository;
use crate::db::{begin_write, user, village, DbError};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

/// Balances after an award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub xp: i64,
    pub coins: i64,
    pub village_total_xp: Option<i64>,
}

/// Credit xp and coins to a user, and the xp to their village, atomically
pub async fn award(pool: &SqlitePool, user_id: i64, xp: i64, coins: i64) -> GameResult<Balance> {
    let mut tx = begin_write(pool).await?;
    let balance = award_in(&mut tx, user_id, xp, coins).await?;
    tx.commit().await?;
    Ok(balance)
}

pub(crate) async fn award_in(conn: &mut SqliteConnection, user_id: i64, xp: i64, coins: i64) -> GameResult<Balance> {
    if xp < 0 || coins < 0 {
        return Err(GameError::Validation("rewards cannot be negative".to_string()));
    }

    let village_id: Option<i64> = sqlx::query_scalar("SELECT village_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GameError::NotFound("user"))?;

    let new_xp = user::add_xp(&mut *conn, user_id, xp).await?;
    let new_coins = user::add_coins(&mut *conn, user_id, coins).await?;
    let village_total_xp = match village_id {
        Some(id) if xp > 0 => Some(village::add_total_xp(&mut *conn, id, xp).await?),
        _ => None,
    };

    tracing::debug!("Awarded user {} {} xp and {} coins", user_id, xp, coins);
    Ok(Balance {
        xp: new_xp,
        coins: new_coins,
        village_total_xp,
    })
}

/// Move a user into `village_id`, carrying their xp out of any previous village
pub async fn join_village(pool: &SqlitePool, user_id: i64, village_id: i64) -> GameResult<()> {
    let mut tx = begin_write(pool).await?;

    let (xp, previous): (i64, Option<i64>) = sqlx::query_as("SELECT xp, village_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GameError::NotFound("user"))?;

    if previous == Some(village_id) {
        return Ok(());
    }
    if let Some(old) = previous {
        village::add_total_xp(&mut *tx, old, -xp).await?;
    }
    village::add_total_xp(&mut *tx, village_id, xp)
        .await
        .map_err(|e| match e {
            DbError::NotFound => GameError::NotFound("village"),
            other => other.into(),
        })?;

    sqlx::query("UPDATE users SET village_id = ?, updated_at = ? WHERE id = ?")
        .bind(village_id)
        .bind(chrono::Utc::now().timestamp())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("User {} joined village {}", user_id, village_id);
    Ok(())
}

pub async fn leave_village(pool: &SqlitePool, user_id: i64) -> GameResult<()> {
    let mut tx = begin_write(pool).await?;

    let (xp, previous): (i64, Option<i64>) = sqlx::query_as("SELECT xp, village_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GameError::NotFound("user"))?;

    let Some(old) = previous else {
        return Ok(());
    };
    village::add_total_xp(&mut *tx, old, -xp).await?;
    sqlx::query("UPDATE users SET village_id = NULL, updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().timestamp())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("User {} left village {}", user_id, old);
    Ok(())
}

/// Village totals after repairing drift, for admin tooling
pub async fn recompute_village(pool: &SqlitePool, village_id: i64) -> GameResult<i64> {
    VillageRepository::new(pool.clone())
        .recompute_total_xp(village_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => GameError::NotFound("village"),
            other => other.into(),
        })
}
