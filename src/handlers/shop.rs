use super::{now, ApiResult};
use crate::db::inventory_item::InventoryItemRepository;
use crate::db::shop_item::ShopItemRepository;
use crate::game::shop::{self, Purchase};
use crate::models::{InventoryEntry, ShopItem};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ShopFilter {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: i64,
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShopFilter>,
) -> ApiResult<Json<Vec<ShopItem>>> {
    let repo = ShopItemRepository::new(state.db_pool.clone());
    let items = match filter.category {
        Some(category) => repo.list_by_category(&category).await?,
        None => repo.list().await?,
    };
    Ok(Json(items))
}

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<(StatusCode, Json<Purchase>)> {
    let purchase = shop::purchase(&state.db_pool, id, req.item_id, now()).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn inventory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<InventoryEntry>>> {
    let entries = InventoryItemRepository::new(state.db_pool.clone()).list_for_user(id).await?;
    Ok(Json(entries))
}
