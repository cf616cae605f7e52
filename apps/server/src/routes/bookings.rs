//! Booking lifecycle.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use innkeep_core::{Booking, BookingUpdate, Ledger, NewBooking};
use innkeep_db::BookingReceipt;

use super::{ok, today, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/NewBooking", get(list).post(create))
        .route("/api/NewBooking/{id}", get(get_one).put(update))
        .route("/api/NewBooking/{id}/checkin", post(check_in))
        .route("/api/NewBooking/{id}/cancel", post(cancel))
}

async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Booking>> {
    ok(state.db.bookings().list(&user.tenant).await?)
}

async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    ok(state.db.bookings().get(&user.tenant, &id).await?)
}

/// Creates the booking, its ledger and the room waitlist entries in one
/// transaction.
async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<NewBooking>,
) -> ApiResult<BookingReceipt> {
    ok(state.db.bookings().create(&user.tenant, request, today()).await?)
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<BookingUpdate>,
) -> ApiResult<Booking> {
    ok(state.db.bookings().update(&user.tenant, &id, update).await?)
}

async fn check_in(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    ok(state.db.bookings().check_in(&user.tenant, &id).await?)
}

async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Ledger> {
    ok(state.db.bookings().cancel(&user.tenant, &id).await?)
}
