pub mod user;
pub mod village;
pub mod friendship;
pub mod direct_message;
pub mod quest;
pub mod shop_item;
pub mod inventory_item;
pub mod game_match;

pub use user::{next_login_streak, Achievement, NewUser, ProfileUpdate, User, UserStatus};
pub use village::{NewVillage, Village};
pub use friendship::{Friendship, FriendshipStatus};
pub use direct_message::DirectMessage;
pub use quest::{NewQuest, Quest, QuestSummary};
pub use shop_item::{CategoryStats, NewShopItem, ShopItem};
pub use inventory_item::{InventoryEntry, InventoryItem};
pub use game_match::{Match, MatchStats, NewMatch};
