use super::{GameError, GameResult};
use crate::db::user::UserRepository;
use crate::db::{begin_write, game_match, user, DbError};
use crate::models::{Match, NewMatch};
use sqlx::SqlitePool;
use std::collections::HashSet;

pub const FIRST_WIN_ACHIEVEMENT: &str = "first_win";

fn missing_user(err: DbError) -> GameError {
    match err {
        DbError::NotFound | DbError::ForeignKeyViolation(_) => GameError::NotFound("user"),
        other => other.into(),
    }
}

fn validate(new_match: &NewMatch, players: &[i64]) -> GameResult<()> {
    if new_match.game_type.trim().is_empty() {
        return Err(GameError::Validation("game type is empty".to_string()));
    }
    if new_match.stake < 0 || new_match.duration < 0 {
        return Err(GameError::Validation("stake and duration cannot be negative".to_string()));
    }
    let distinct: HashSet<i64> = players.iter().copied().collect();
    if distinct.len() != players.len() {
        return Err(GameError::Validation("a player is listed twice".to_string()));
    }
    if players.len() < 2 {
        return Err(GameError::Validation("a match needs at least two players".to_string()));
    }
    if let Some(winner) = new_match.winner_id {
        if !distinct.contains(&winner) {
            return Err(GameError::Validation("winner did not play in the match".to_string()));
        }
    }
    Ok(())
}

/// Record a finished match. With a stake and a winner, every other player
/// pays the stake to the winner; the match is only stored if all of them can.
pub async fn record_match(pool: &SqlitePool, new_match: &NewMatch, players: &[i64], now: i64) -> GameResult<Match> {
    validate(new_match, players)?;

    let mut tx = begin_write(pool).await?;

    if let (Some(winner), true) = (new_match.winner_id, new_match.stake > 0) {
        let mut pot: i64 = 0;
        for &loser in players.iter().filter(|&&p| p != winner) {
            if user::spend_coins(&mut *tx, loser, new_match.stake).await?.is_none() {
                let available: Option<i64> = sqlx::query_scalar("SELECT coins FROM users WHERE id = ?")
                    .bind(loser)
                    .fetch_optional(&mut *tx)
                    .await?;
                tracing::warn!("Match stake refused: player {} cannot cover {}", loser, new_match.stake);
                return Err(match available {
                    Some(available) => GameError::InsufficientCoins { needed: new_match.stake, available },
                    None => GameError::NotFound("user"),
                });
            }
            pot = pot
                .checked_add(new_match.stake)
                .ok_or_else(|| GameError::Validation("stake pot is too large".to_string()))?;
        }
        user::add_coins(&mut *tx, winner, pot).await.map_err(missing_user)?;
    }

    let recorded = game_match::insert(&mut tx, new_match, players, now)
        .await
        .map_err(missing_user)?;
    tx.commit().await?;

    if let Some(winner) = recorded.winner_id {
        UserRepository::new(pool.clone())
            .unlock_achievement(winner, FIRST_WIN_ACHIEVEMENT, now)
            .await?;
    }
    tracing::info!(
        "Match {} ({}) recorded: {} players, winner {:?}, stake {}",
        recorded.id,
        recorded.game_type,
        players.len(),
        recorded.winner_id,
        recorded.stake
    );
    Ok(recorded)
}
