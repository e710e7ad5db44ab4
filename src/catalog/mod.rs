use crate::db::shop_item::ShopItemRepository;
use crate::db::DbError;
use crate::models::NewShopItem;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

// Default shop catalog, embedded at build time
pub static DEFAULT_CATALOG: Lazy<Vec<NewShopItem>> = Lazy::new(|| {
    let content = include_str!("../../resources/shop_catalog.json");
    parse_catalog(content).unwrap_or_else(|e| {
        tracing::error!("Embedded shop catalog is malformed: {}", e);
        Vec::new()
    })
});

pub fn parse_catalog(content: &str) -> Result<Vec<NewShopItem>, serde_json::Error> {
    serde_json::from_str(content)
}

/// Insert catalog entries whose name is not in the shop yet.
/// Returns how many were added.
pub async fn seed_catalog(pool: &SqlitePool, items: &[NewShopItem]) -> Result<usize, DbError> {
    let repo = ShopItemRepository::new(pool.clone());
    let mut inserted = 0;

    for item in items {
        if repo.get_by_name(&item.name).await?.is_some() {
            continue;
        }
        match repo.create(item).await {
            Ok(_) => inserted += 1,
            // Another instance seeded it between the lookup and the insert
            Err(e) if e.is_unique_violation() => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        tracing::info!("Seeded {} shop item(s)", inserted);
    } else {
        tracing::debug!("Shop catalog already up to date");
    }
    Ok(inserted)
}
