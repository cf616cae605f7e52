//! Inventory categories, items and the stock report.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use innkeep_core::{
    InventoryCategory, InventoryCategoryInput, InventoryItem, InventoryItemInput,
    NewStockMovement, StockMovement,
};
use innkeep_db::StockReceipt;
use serde::Deserialize;

use super::{deleted, ok, ApiResult, Deleted};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/InventoryCategory", get(list_categories).post(create_category))
        .route(
            "/api/InventoryCategory/{id}",
            put(rename_category).delete(delete_category),
        )
        .route("/api/InventoryList", get(list_items).post(create_item))
        .route(
            "/api/InventoryList/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/stockreport", get(stock_report).post(record_movement))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReportQuery {
    pub item_id: Option<String>,
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<InventoryCategory>> {
    ok(state.db.inventory().list_categories(&user.tenant).await?)
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<InventoryCategoryInput>,
) -> ApiResult<InventoryCategory> {
    ok(state.db.inventory().create_category(&user.tenant, input).await?)
}

async fn rename_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<InventoryCategoryInput>,
) -> ApiResult<InventoryCategory> {
    ok(state.db.inventory().rename_category(&user.tenant, &id, input).await?)
}

/// Fails with 409 while items still reference the category.
async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.inventory().delete_category(&user.tenant, &id).await?;
    deleted(id)
}

async fn list_items(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<InventoryItem>> {
    ok(state.db.inventory().list_items(&user.tenant).await?)
}

async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<InventoryItem> {
    ok(state.db.inventory().get_item(&user.tenant, &id).await?)
}

async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<InventoryItemInput>,
) -> ApiResult<InventoryItem> {
    ok(state.db.inventory().create_item(&user.tenant, input).await?)
}

async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<InventoryItemInput>,
) -> ApiResult<InventoryItem> {
    ok(state.db.inventory().update_item(&user.tenant, &id, input).await?)
}

async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.inventory().delete_item(&user.tenant, &id).await?;
    deleted(id)
}

async fn stock_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StockReportQuery>,
) -> ApiResult<Vec<StockMovement>> {
    let movements = state
        .db
        .inventory()
        .list_movements(&user.tenant, query.item_id.as_deref())
        .await?;
    ok(movements)
}

/// Records a purchase or sell; a sell larger than the stock is rejected
/// with 422.
async fn record_movement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(movement): Json<NewStockMovement>,
) -> ApiResult<StockReceipt> {
    ok(state.db.inventory().record_movement(&user.tenant, movement).await?)
}
