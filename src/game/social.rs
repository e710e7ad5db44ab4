use super::{GameError, GameResult};
use crate::db::direct_message::DirectMessageRepository;
use crate::db::friendship::FriendshipRepository;
use crate::db::user::UserRepository;
use crate::db::{begin_write, friendship, DbError};
use crate::models::{DirectMessage, Friendship, FriendshipStatus, User};
use sqlx::SqlitePool;

pub const MAX_MESSAGE_LEN: usize = 1_000;

async fn ensure_user_exists(pool: &SqlitePool, user_id: i64) -> GameResult<()> {
    UserRepository::new(pool.clone())
        .get_by_id(user_id)
        .await?
        .map(|_| ())
        .ok_or(GameError::NotFound("user"))
}

/// Ask `to_id` to be friends. If they already asked us, their request is
/// accepted instead of creating a second row.
pub async fn send_friend_request(pool: &SqlitePool, from_id: i64, to_id: i64) -> GameResult<Friendship> {
    if from_id == to_id {
        return Err(GameError::Validation("you cannot befriend yourself".to_string()));
    }
    ensure_user_exists(pool, to_id).await?;

    // Crossing requests serialize here; the later one sees the earlier row
    let mut tx = begin_write(pool).await?;
    let row = match friendship::find_either(&mut *tx, from_id, to_id).await? {
        Some(existing) if existing.is_accepted() => return Err(GameError::AlreadyFriends),
        Some(existing) if existing.user_id == from_id => return Err(GameError::RequestAlreadySent),
        Some(existing) => {
            let accepted = friendship::set_status(&mut *tx, existing.id, FriendshipStatus::Accepted).await?;
            tracing::info!("Mutual requests: {} and {} are now friends", from_id, to_id);
            accepted
        }
        None => match friendship::insert(&mut *tx, from_id, to_id, FriendshipStatus::Pending).await {
            Ok(request) => {
                tracing::debug!("Friend request {} -> {}", from_id, to_id);
                request
            }
            Err(DbError::UniqueViolation(_)) => return Err(GameError::RequestAlreadySent),
            Err(DbError::ForeignKeyViolation(_)) => return Err(GameError::NotFound("user")),
            Err(e) => return Err(e.into()),
        },
    };
    tx.commit().await?;
    Ok(row)
}

/// Accept the pending request `requester_id -> recipient_id`. Only the recipient may accept.
pub async fn accept_friend_request(pool: &SqlitePool, recipient_id: i64, requester_id: i64) -> GameResult<Friendship> {
    let repo = FriendshipRepository::new(pool.clone());
    let request = repo
        .get_between(requester_id, recipient_id)
        .await?
        .ok_or(GameError::RequestNotFound)?;

    if request.is_accepted() {
        return Err(GameError::AlreadyFriends);
    }
    let accepted = repo.set_status(request.id, FriendshipStatus::Accepted).await?;
    tracing::info!("{} accepted friend request from {}", recipient_id, requester_id);
    Ok(accepted)
}

/// Unfriend, cancel an outgoing request or decline an incoming one
pub async fn remove_friend(pool: &SqlitePool, user_id: i64, other_id: i64) -> GameResult<()> {
    let removed = FriendshipRepository::new(pool.clone())
        .delete_between(user_id, other_id)
        .await?;
    if removed == 0 {
        return Err(GameError::NotFound("friendship"));
    }
    Ok(())
}

pub async fn friends(pool: &SqlitePool, user_id: i64) -> GameResult<Vec<User>> {
    Ok(FriendshipRepository::new(pool.clone()).friends_of(user_id).await?)
}

pub async fn pending_requests(pool: &SqlitePool, user_id: i64) -> GameResult<Vec<Friendship>> {
    Ok(FriendshipRepository::new(pool.clone()).pending_for(user_id).await?)
}

pub async fn send_message(pool: &SqlitePool, sender_id: i64, receiver_id: i64, text: &str) -> GameResult<DirectMessage> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GameError::Validation("message is empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(GameError::Validation(format!(
            "message is longer than {MAX_MESSAGE_LEN} characters"
        )));
    }
    if sender_id == receiver_id {
        return Err(GameError::Validation("you cannot message yourself".to_string()));
    }
    ensure_user_exists(pool, sender_id).await?;
    ensure_user_exists(pool, receiver_id).await?;

    let message = DirectMessageRepository::new(pool.clone())
        .create(&DirectMessage::new(sender_id, receiver_id, text.to_string()))
        .await?;
    tracing::debug!("Message {} from {} to {}", message.id, sender_id, receiver_id);
    Ok(message)
}

/// Read the conversation with `other_id`, marking what they sent as read
pub async fn read_conversation(pool: &SqlitePool, reader_id: i64, other_id: i64, limit: i64) -> GameResult<Vec<DirectMessage>> {
    let repo = DirectMessageRepository::new(pool.clone());
    let messages = repo.conversation(reader_id, other_id, limit).await?;
    repo.mark_conversation_read(reader_id, other_id).await?;
    Ok(messages)
}
