//! Game rules layered over the repositories. Every operation that touches
//! more than one row runs inside a single transaction.

pub mod accounts;
pub mod progression;
pub mod social;
pub mod quests;
pub mod shop;
pub mod matches;

use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: i64, available: i64 },

    #[error("Item already owned")]
    AlreadyOwned,

    #[error("Already friends")]
    AlreadyFriends,

    #[error("Friend request already sent")]
    RequestAlreadySent,

    #[error("No pending friend request")]
    RequestNotFound,

    #[error("Quest belongs to another player")]
    NotQuestOwner,

    #[error("Quest is not completed yet")]
    QuestNotCompleted,

    #[error("Quest reward already claimed")]
    QuestAlreadyClaimed,

    #[error("Quest is completed or expired")]
    QuestClosed,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        GameError::Db(err.into())
    }
}

pub type GameResult<T> = Result<T, GameError>;
