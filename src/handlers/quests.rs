use super::{now, ApiResult};
use crate::db::quest::QuestRepository;
use crate::game::quests::{self, ClaimedQuest};
use crate::models::{NewQuest, Quest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub amount: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestFilter {
    #[serde(default)]
    pub include_claimed: bool,
}

pub async fn assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(new_quest): Json<NewQuest>,
) -> ApiResult<(StatusCode, Json<Quest>)> {
    let quest = quests::assign_quest(&state.db_pool, id, &new_quest).await?;
    Ok((StatusCode::CREATED, Json(quest)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(filter): Query<QuestFilter>,
) -> ApiResult<Json<Vec<Quest>>> {
    let quests = QuestRepository::new(state.db_pool.clone())
        .list_for_user(id, filter.include_claimed)
        .await?;
    Ok(Json(quests))
}

pub async fn progress(
    State(state): State<Arc<AppState>>,
    Path((id, quest_id)): Path<(i64, i64)>,
    Json(req): Json<ProgressRequest>,
) -> ApiResult<Json<Quest>> {
    let quest = quests::progress_quest(&state.db_pool, id, quest_id, req.amount, now()).await?;
    Ok(Json(quest))
}

pub async fn claim(
    State(state): State<Arc<AppState>>,
    Path((id, quest_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ClaimedQuest>> {
    let claimed = quests::claim_quest(&state.db_pool, id, quest_id).await?;
    Ok(Json(claimed))
}
