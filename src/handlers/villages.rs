use super::ApiResult;
use crate::db::village::VillageRepository;
use crate::game::{progression, GameError};
use crate::models::{NewVillage, User, Village};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub village_id: i64,
}

#[derive(Debug, Serialize)]
pub struct VillageDetail {
    #[serde(flatten)]
    pub village: Village,
    pub members: Vec<User>,
}

pub async fn create_village(
    State(state): State<Arc<AppState>>,
    Json(new_village): Json<NewVillage>,
) -> ApiResult<(StatusCode, Json<Village>)> {
    if new_village.name.trim().is_empty() {
        return Err(GameError::Validation("village name is empty".to_string()).into());
    }
    let village = VillageRepository::new(state.db_pool.clone()).create(&new_village).await?;
    tracing::info!("Founded village {} ({})", village.name, village.id);
    Ok((StatusCode::CREATED, Json(village)))
}

/// All villages, by name
pub async fn list_villages(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Village>>> {
    let villages = VillageRepository::new(state.db_pool.clone()).list().await?;
    Ok(Json(villages))
}

pub async fn get_village(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<VillageDetail>> {
    let repo = VillageRepository::new(state.db_pool.clone());
    let village = repo.get_by_id(id).await?.ok_or(GameError::NotFound("village"))?;
    let members = repo.members(id).await?;
    Ok(Json(VillageDetail { village, members }))
}

pub async fn join_village(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<JoinRequest>,
) -> ApiResult<StatusCode> {
    progression::join_village(&state.db_pool, user_id, req.village_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_village(State(state): State<Arc<AppState>>, Path(user_id): Path<i64>) -> ApiResult<StatusCode> {
    progression::leave_village(&state.db_pool, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
