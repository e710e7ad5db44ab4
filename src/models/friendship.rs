use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

/// Directed edge from the requester (`user_id`) to the recipient (`friend_id`).
/// Once accepted the row counts as a friendship for both sides.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Friendship {
    pub id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub status: FriendshipStatus,
    pub created_at: i64,
}

impl Friendship {
    /// The user on the other side of this edge, seen from `user_id`
    pub fn other_side(&self, user_id: i64) -> i64 {
        if self.user_id == user_id {
            self.friend_id
        } else {
            self.user_id
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FriendshipStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_side() {
        let edge = Friendship {
            id: 1,
            user_id: 10,
            friend_id: 20,
            status: FriendshipStatus::Pending,
            created_at: 0,
        };
        assert_eq!(edge.other_side(10), 20);
        assert_eq!(edge.other_side(20), 10);
        assert!(!edge.is_accepted());
    }
}
