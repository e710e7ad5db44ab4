//! JSON API. Handlers stay thin: parse the request, call into `game` or a
//! repository, and let `ApiError` pick the status code.

mod matches;
mod quests;
mod shop;
mod social;
mod users;
mod villages;

use crate::db::DbError;
use crate::game::GameError;
use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(users::register))
        .route("/sessions", post(users::login))
        .route("/sessions/:user_id", delete(users::logout))
        .route(
            "/users/:id",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/leaderboard", get(users::leaderboard))
        .route("/recovery", post(users::begin_recovery))
        .route("/recovery/complete", post(users::complete_recovery))
        .route("/villages", post(villages::create_village).get(villages::list_villages))
        .route("/villages/:id", get(villages::get_village))
        .route(
            "/users/:id/village",
            put(villages::join_village).delete(villages::leave_village),
        )
        .route("/users/:id/friends", post(social::send_request).get(social::list_friends))
        .route("/users/:id/friends/:other/accept", post(social::accept_request))
        .route("/users/:id/friends/:other", delete(social::remove_friend))
        .route("/users/:id/messages", post(social::send_message))
        .route("/users/:id/messages/:other", get(social::conversation))
        .route("/users/:id/inbox", get(social::inbox))
        .route("/users/:id/quests", post(quests::assign).get(quests::list))
        .route("/users/:id/quests/:quest/progress", post(quests::progress))
        .route("/users/:id/quests/:quest/claim", post(quests::claim))
        .route("/shop", get(shop::list_items))
        .route("/users/:id/purchases", post(shop::purchase))
        .route("/users/:id/inventory", get(shop::inventory))
        .route("/matches", post(matches::record))
        .route("/users/:id/matches", get(matches::history))
        .route("/users/:id/stats", get(matches::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(GameError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError(GameError::Db(err))
    }
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            GameError::NotFound(_) | GameError::RequestNotFound | GameError::NotQuestOwner => {
                (StatusCode::NOT_FOUND, "NotFound")
            }
            GameError::Db(DbError::NotFound) => (StatusCode::NOT_FOUND, "NotFound"),
            GameError::Conflict(_)
            | GameError::AlreadyOwned
            | GameError::AlreadyFriends
            | GameError::RequestAlreadySent
            | GameError::Db(DbError::UniqueViolation(_))
            | GameError::Db(DbError::ForeignKeyViolation(_)) => (StatusCode::CONFLICT, "Conflict"),
            GameError::Validation(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            GameError::QuestNotCompleted
            | GameError::QuestAlreadyClaimed
            | GameError::QuestClosed
            | GameError::Db(DbError::CheckViolation(_)) => (StatusCode::UNPROCESSABLE_ENTITY, "RuleViolation"),
            GameError::InsufficientCoins { .. } => (StatusCode::PAYMENT_REQUIRED, "InsufficientCoins"),
            GameError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "InvalidCredentials"),
            GameError::Hashing(_) | GameError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        router(Arc::new(AppState { db_pool: test_pool().await }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, name: &str) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/users",
            Some(json!({ "username": name, "email": format!("{name}@example.com"), "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |e: GameError| ApiError(e).into_response().status();
        assert_eq!(status(GameError::NotFound("user")), StatusCode::NOT_FOUND);
        assert_eq!(status(GameError::Db(DbError::UniqueViolation("x".into()))), StatusCode::CONFLICT);
        assert_eq!(status(GameError::AlreadyOwned), StatusCode::CONFLICT);
        assert_eq!(status(GameError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(GameError::QuestNotCompleted), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(GameError::InsufficientCoins { needed: 5, available: 1 }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(status(GameError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(GameError::Hashing("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(Page::default().limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Page { limit: Some(0) }.limit(), 1);
        assert_eq!(Page { limit: Some(10_000) }.limit(), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_account_flow() {
        let app = app().await;
        let id = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(json!({ "username": "alice", "email": "other@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Conflict");

        let (status, body) = send(
            &app,
            "POST",
            "/sessions",
            Some(json!({ "identifier": "alice", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ONLINE");
        assert!(body.get("password_hash").is_none());

        let (status, _) = send(
            &app,
            "POST",
            "/sessions",
            Some(json!({ "identifier": "alice", "password": "nope-nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, "PATCH", &format!("/users/{id}"), Some(json!({ "bio": "hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "hi");

        let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "GET", &format!("/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_friends_and_messages() {
        let app = app().await;
        let a = register(&app, "anna").await;
        let b = register(&app, "ben").await;

        let (status, _) = send(&app, "POST", &format!("/users/{a}/friends"), Some(json!({ "friend_id": b }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", &format!("/users/{a}/friends"), Some(json!({ "friend_id": b }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "POST", &format!("/users/{b}/friends/{a}/accept"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", &format!("/users/{a}/friends"), None).await;
        assert_eq!(body["friends"][0]["id"], b);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/users/{a}/messages"),
            Some(json!({ "receiver_id": b, "text": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = send(&app, "GET", &format!("/users/{b}/inbox"), None).await;
        assert_eq!(body["unread"], 1);
        let (_, body) = send(&app, "GET", &format!("/users/{b}/messages/{a}"), None).await;
        assert_eq!(body[0]["text"], "hello");
        let (_, body) = send(&app, "GET", &format!("/users/{b}/inbox"), None).await;
        assert_eq!(body["unread"], 0);
    }

    #[tokio::test]
    async fn test_shop_and_matches() {
        let app = app().await;
        let a = register(&app, "cara").await;
        let b = register(&app, "dan").await;

        let (status, body) = send(
            &app,
            "POST",
            "/matches",
            Some(json!({ "game_type": "duel", "winner_id": a, "players": [a, b], "score": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let (_, body) = send(&app, "GET", &format!("/users/{a}/stats"), None).await;
        assert_eq!(body["matches"]["wins"], 1);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/users/{a}/purchases"),
            Some(json!({ "item_id": 424242 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
