use super::{now, ApiResult, Page};
use crate::db::user::UserRepository;
use crate::game::{accounts, GameError};
use crate::models::{ProfileUpdate, User};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRecoveryRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = accounts::register(&state.db_pool, &req.username, &req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(State(state): State<Arc<AppState>>, Json(req): Json<LoginRequest>) -> ApiResult<Json<User>> {
    let user = accounts::login(&state.db_pool, &req.identifier, &req.password, now()).await?;
    Ok(Json(user))
}

pub async fn logout(State(state): State<Arc<AppState>>, Path(user_id): Path<i64>) -> ApiResult<StatusCode> {
    accounts::logout(&state.db_pool, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<User>> {
    let user = UserRepository::new(state.db_pool.clone())
        .get_by_id(id)
        .await?
        .ok_or(GameError::NotFound("user"))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let user = UserRepository::new(state.db_pool.clone()).update_profile(id, &update).await?;
    Ok(Json(user))
}

pub async fn delete_user(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    UserRepository::new(state.db_pool.clone()).delete(id).await?;
    tracing::info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leaderboard(State(state): State<Arc<AppState>>, Query(page): Query<Page>) -> ApiResult<Json<Vec<User>>> {
    let users = UserRepository::new(state.db_pool.clone()).leaderboard(page.limit()).await?;
    Ok(Json(users))
}

/// Always answers 202 so the endpoint cannot be used to probe for accounts.
/// Tokens are handed to the delivery channel, which for now is the log.
pub async fn begin_recovery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecoveryRequest>,
) -> ApiResult<StatusCode> {
    if let Some(token) = accounts::begin_recovery(&state.db_pool, &req.email, now()).await? {
        tracing::debug!(target: "villagehub::recovery", "Recovery token for {}: {}", req.email, token);
    }
    Ok(StatusCode::ACCEPTED)
}

pub async fn complete_recovery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRecoveryRequest>,
) -> ApiResult<StatusCode> {
    accounts::complete_recovery(&state.db_pool, &req.token, &req.new_password, now()).await?;
    Ok(StatusCode::NO_CONTENT)
}
