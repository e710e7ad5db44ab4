use super::{ensure_affected, DbError};
use crate::models::{Match, MatchStats, NewMatch};
use sqlx::{SqliteConnection, SqlitePool};

pub struct MatchRepository {
    pool: SqlitePool,
}

impl MatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a match together with its player list
    pub async fn create(&self, new_match: &NewMatch, players: &[i64]) -> Result<Match, DbError> {
        let mut tx = super::begin_write(&self.pool).await?;
        let created = insert(&mut *tx, new_match, players, chrono::Utc::now().timestamp()).await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Match>, DbError> {
        let found = sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    pub async fn players(&self, match_id: i64) -> Result<Vec<i64>, DbError> {
        let players = sqlx::query_scalar("SELECT user_id FROM match_players WHERE match_id = ? ORDER BY user_id")
            .bind(match_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(players)
    }

    /// Matches `user_id` played in, newest first
    pub async fn list_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Match>, DbError> {
        let matches = sqlx::query_as::<_, Match>(
            "SELECT m.* FROM matches m
             JOIN match_players mp ON mp.match_id = m.id
             WHERE mp.user_id = ?
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT ?"
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(matches)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn stats_for_user(&self, user_id: i64) -> Result<MatchStats, DbError> {
        let stats = sqlx::query_as::<_, MatchStats>(
            "SELECT COUNT(*) AS played,
                    COALESCE(SUM(CASE WHEN m.winner_id = mp.user_id THEN 1 ELSE 0 END), 0) AS wins,
                    COALESCE(SUM(m.is_ranked), 0) AS ranked_played,
                    COALESCE(SUM(m.stake), 0) AS total_stake,
                    COALESCE(AVG(m.score), 0.0) AS avg_score,
                    COALESCE(MAX(m.score), 0) AS best_score,
                    COALESCE(SUM(m.duration), 0) AS total_duration
             FROM matches m
             JOIN match_players mp ON mp.match_id = m.id
             WHERE mp.user_id = ?"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    new_match: &NewMatch,
    players: &[i64],
    created_at: i64,
) -> Result<Match, DbError> {
    let created = sqlx::query_as::<_, Match>(
        "INSERT INTO matches (game_type, winner_id, stake, is_ranked, score, duration, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING *"
    )
    .bind(&new_match.game_type)
    .bind(new_match.winner_id)
    .bind(new_match.stake)
    .bind(new_match.is_ranked)
    .bind(new_match.score)
    .bind(new_match.duration)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;

    for player_id in players {
        sqlx::query("INSERT INTO match_players (match_id, user_id) VALUES (?, ?)")
            .bind(created.id)
            .bind(player_id)
            .execute(&mut *conn)
            .await?;
    }

    tracing::debug!("Recorded {} match {} with {} players", created.game_type, created.id, players.len());
    Ok(created)
}
