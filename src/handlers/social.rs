use super::{now, ApiResult, Page};
use crate::db::direct_message::DirectMessageRepository;
use crate::game::social;
use crate::models::{DirectMessage, Friendship, User};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct FriendRequest {
    pub friend_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub receiver_id: i64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct FriendList {
    pub friends: Vec<User>,
    pub pending: Vec<Friendship>,
}

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub unread: i64,
    pub messages: Vec<DirectMessage>,
}

pub async fn send_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<FriendRequest>,
) -> ApiResult<(StatusCode, Json<Friendship>)> {
    let friendship = social::send_friend_request(&state.db_pool, id, req.friend_id).await?;
    Ok((StatusCode::CREATED, Json(friendship)))
}

pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Path((id, other)): Path<(i64, i64)>,
) -> ApiResult<Json<Friendship>> {
    let friendship = social::accept_friend_request(&state.db_pool, id, other).await?;
    Ok(Json(friendship))
}

pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Path((id, other)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    social::remove_friend(&state.db_pool, id, other).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_friends(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<FriendList>> {
    let friends = social::friends(&state.db_pool, id).await?;
    let pending = social::pending_requests(&state.db_pool, id).await?;
    Ok(Json(FriendList { friends, pending }))
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SendMessage>,
) -> ApiResult<(StatusCode, Json<DirectMessage>)> {
    let message = social::send_message(&state.db_pool, id, req.receiver_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Conversation between `id` and `other`; marks what `id` received as read
pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Path((id, other)): Path<(i64, i64)>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<DirectMessage>>> {
    let messages = social::read_conversation(&state.db_pool, id, other, page.limit()).await?;
    Ok(Json(messages))
}

pub async fn inbox(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Inbox>> {
    let repo = DirectMessageRepository::new(state.db_pool.clone());
    let unread = repo.unread_count(id).await?;
    let messages = repo.inbox(id, page.limit()).await?;
    Ok(Json(Inbox { unread, messages }))
}
