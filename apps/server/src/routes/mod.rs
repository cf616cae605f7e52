//! Axum router and the response envelope.
//!
//! `build_router` is the single entry point; `main.rs` attaches the
//! middleware layers so tests can drive the bare router.
//!
//! ```text
//! /health
//! /api/roomCategories   /api/rooms
//! /api/NewBooking       /api/Billing
//! /api/InventoryCategory /api/InventoryList /api/stockreport
//! /api/menuItem         /api/tables        /api/RestaurantBooking
//! /api/Expense          /api/Profile/{userId}
//! ```

use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub mod billing;
pub mod bookings;
pub mod expenses;
pub mod health;
pub mod inventory;
pub mod profile;
pub mod restaurant;
pub mod rooms;

/// Build the complete application router wired to the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(rooms::router())
        .merge(bookings::router())
        .merge(billing::router())
        .merge(inventory::router())
        .merge(restaurant::router())
        .merge(expenses::router())
        .merge(profile::router())
        .with_state(state)
}

// =============================================================================
// Envelope
// =============================================================================

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        data,
    }))
}

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
}

pub fn deleted(id: String) -> ApiResult<Deleted> {
    ok(Deleted { id })
}

/// The front desk's calendar date.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
