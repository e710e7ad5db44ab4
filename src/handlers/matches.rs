use super::{now, ApiResult, Page};
use crate::db::game_match::MatchRepository;
use crate::db::quest::QuestRepository;
use crate::game::matches;
use crate::models::{Match, MatchStats, NewMatch, QuestSummary};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RecordMatch {
    #[serde(flatten)]
    pub result: NewMatch,
    pub players: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct PlayerStats {
    pub matches: MatchStats,
    pub quests: QuestSummary,
}

pub async fn record(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordMatch>,
) -> ApiResult<(StatusCode, Json<Match>)> {
    let recorded = matches::record_match(&state.db_pool, &req.result, &req.players, now()).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<Match>>> {
    let history = MatchRepository::new(state.db_pool.clone())
        .list_for_user(id, page.limit())
        .await?;
    Ok(Json(history))
}

pub async fn stats(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<PlayerStats>> {
    let matches = MatchRepository::new(state.db_pool.clone()).stats_for_user(id).await?;
    let quests = QuestRepository::new(state.db_pool.clone()).summary_for_user(id).await?;
    Ok(Json(PlayerStats { matches, quests }))
}
