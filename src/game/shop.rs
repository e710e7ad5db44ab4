use super::{GameError, GameResult};
use crate::db::shop_item::ShopItemRepository;
use crate::db::user::UserRepository;
use crate::db::{begin_write, inventory_item, user, DbError};
use crate::models::InventoryItem;
use serde::Serialize;
use sqlx::SqlitePool;

pub const FIRST_PURCHASE_ACHIEVEMENT: &str = "first_purchase";

#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub item: InventoryItem,
    pub coins_left: i64,
}

/// Buy a catalog item. Ownership check, coin debit and inventory insert
/// commit together or not at all.
pub async fn purchase(pool: &SqlitePool, user_id: i64, item_id: i64, now: i64) -> GameResult<Purchase> {
    let item = ShopItemRepository::new(pool.clone())
        .get_by_id(item_id)
        .await?
        .ok_or(GameError::NotFound("item"))?;

    let mut tx = begin_write(pool).await?;

    let owned: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE user_id = ? AND item_id = ?)"
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_one(&mut *tx)
    .await?;
    if owned {
        return Err(GameError::AlreadyOwned);
    }

    let Some(coins_left) = user::spend_coins(&mut *tx, user_id, item.price).await? else {
        let available: Option<i64> = sqlx::query_scalar("SELECT coins FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        return Err(match available {
            Some(available) => GameError::InsufficientCoins { needed: item.price, available },
            None => GameError::NotFound("user"),
        });
    };

    let owned_item = match inventory_item::insert(&mut *tx, user_id, item_id, now).await {
        Ok(owned_item) => owned_item,
        Err(DbError::UniqueViolation(_)) => return Err(GameError::AlreadyOwned),
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    tracing::info!("User {} bought '{}' for {} coins", user_id, item.name, item.price);
    UserRepository::new(pool.clone())
        .unlock_achievement(user_id, FIRST_PURCHASE_ACHIEVEMENT, now)
        .await?;

    Ok(Purchase {
        item: owned_item,
        coins_left,
    })
}
