//! Room categories and rooms.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use innkeep_core::{Room, RoomCategory, RoomCategoryInput, RoomInput, WaitlistArrays};

use super::{deleted, ok, ApiResult, Deleted};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/roomCategories", get(list_categories).post(create_category))
        .route("/api/roomCategories/{id}", put(update_category))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route(
            "/api/rooms/{id}",
            get(get_room).put(update_room).delete(delete_room),
        )
        .route("/api/rooms/{id}/legacy", get(legacy_waitlist))
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<RoomCategory>> {
    ok(state.db.rooms().list_categories(&user.tenant).await?)
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RoomCategoryInput>,
) -> ApiResult<RoomCategory> {
    ok(state.db.rooms().create_category(&user.tenant, input).await?)
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<RoomCategoryInput>,
) -> ApiResult<RoomCategory> {
    ok(state.db.rooms().update_category(&user.tenant, &id, input).await?)
}

/// Rooms with their waitlists, head first.
async fn list_rooms(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Room>> {
    ok(state.db.rooms().list(&user.tenant).await?)
}

async fn get_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Room> {
    ok(state.db.rooms().get(&user.tenant, &id).await?)
}

/// Guest, bill, check-in and check-out sequences for clients that predate
/// queued stays.
async fn legacy_waitlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<WaitlistArrays> {
    let room = state.db.rooms().get(&user.tenant, &id).await?;
    ok(room.waitlist_arrays())
}

async fn create_room(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RoomInput>,
) -> ApiResult<Room> {
    ok(state.db.rooms().create(&user.tenant, input).await?)
}

async fn update_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<RoomInput>,
) -> ApiResult<Room> {
    ok(state.db.rooms().update(&user.tenant, &id, input).await?)
}

async fn delete_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.rooms().delete(&user.tenant, &id).await?;
    deleted(id)
}
