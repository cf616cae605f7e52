//! Menu, tables and restaurant orders.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use innkeep_core::{
    DiningTable, DiningTableInput, MenuItem, MenuItemInput, NewRestaurantOrder, RestaurantOrder,
};

use super::{deleted, ok, ApiResult, Deleted};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menuItem", get(list_menu).post(create_menu_item))
        .route("/api/menuItem/{id}", put(update_menu_item).delete(delete_menu_item))
        .route("/api/tables", get(list_tables).post(create_table))
        .route("/api/tables/{id}", put(update_table).delete(delete_table))
        .route("/api/RestaurantBooking", get(list_orders).post(create_order))
        .route("/api/RestaurantBooking/{id}", get(get_order).delete(delete_order))
}

// =============================================================================
// Menu
// =============================================================================

async fn list_menu(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<MenuItem>> {
    ok(state.db.restaurant().list_menu(&user.tenant).await?)
}

async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<MenuItemInput>,
) -> ApiResult<MenuItem> {
    ok(state.db.restaurant().create_menu_item(&user.tenant, input).await?)
}

async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<MenuItemInput>,
) -> ApiResult<MenuItem> {
    ok(state.db.restaurant().update_menu_item(&user.tenant, &id, input).await?)
}

async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.restaurant().delete_menu_item(&user.tenant, &id).await?;
    deleted(id)
}

// =============================================================================
// Tables
// =============================================================================

async fn list_tables(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<DiningTable>> {
    ok(state.db.restaurant().list_tables(&user.tenant).await?)
}

async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<DiningTableInput>,
) -> ApiResult<DiningTable> {
    ok(state.db.restaurant().create_table(&user.tenant, input).await?)
}

async fn update_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<DiningTableInput>,
) -> ApiResult<DiningTable> {
    ok(state.db.restaurant().update_table(&user.tenant, &id, input).await?)
}

async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.restaurant().delete_table(&user.tenant, &id).await?;
    deleted(id)
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<RestaurantOrder>> {
    ok(state.db.restaurant().list_orders(&user.tenant).await?)
}

async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<RestaurantOrder> {
    ok(state.db.restaurant().get_order(&user.tenant, &id).await?)
}

/// Places an order; with `roomBillId` the lines are also charged to that
/// room's ledger.
async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(order): Json<NewRestaurantOrder>,
) -> ApiResult<RestaurantOrder> {
    ok(state.db.restaurant().create_order(&user.tenant, order).await?)
}

async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.restaurant().delete_order(&user.tenant, &id).await?;
    deleted(id)
}
