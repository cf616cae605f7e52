//! # Repository Module
//!
//! Database repository implementations for Innkeep.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  db.bookings().create(tenant, request, today)                   │
//! │       ▼                                                                 │
//! │  BookingRepository                                                      │
//! │  ├── begin transaction                                                  │
//! │  ├── load rooms + categories      (room::load_room_by_number)           │
//! │  ├── Booking / Ledger / Room rules (innkeep-core, no I/O)               │
//! │  ├── write booking, ledger, rooms (version-checked)                     │
//! │  └── commit                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Load/save helpers shared across repositories take a plain
//! `&mut SqliteConnection`, so the same helper works on a pooled
//! connection or inside a transaction (`&mut *tx`).
//!
//! ## Available Repositories
//!
//! - [`room::RoomRepository`] - Room categories, rooms and waitlists
//! - [`booking::BookingRepository`] - Booking lifecycle
//! - [`ledger::LedgerRepository`] - Line items, payments, bill completion
//! - [`inventory::InventoryRepository`] - Categories, items, stock movements
//! - [`restaurant::RestaurantRepository`] - Menu, tables, orders
//! - [`admin::ExpenseRepository`] / [`admin::ProfileRepository`]

pub mod admin;
pub mod booking;
pub mod inventory;
pub mod ledger;
pub mod restaurant;
pub mod room;

use innkeep_core::TaxRate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteQueryResult;

use crate::error::{DbError, DbResult};

/// Encodes a value for a JSON text column.
pub(crate) fn to_json<T: Serialize>(column: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::json(column, e))
}

/// Decodes a JSON text column.
pub(crate) fn from_json<T: DeserializeOwned>(column: &str, text: &str) -> DbResult<T> {
    serde_json::from_str(text).map_err(|e| DbError::json(column, e))
}

/// Basis points as stored (INTEGER) to a [`TaxRate`]. Negative values never
/// pass the CHECK constraints, but clamp anyway.
pub(crate) fn tax_rate(bps: i64) -> TaxRate {
    TaxRate::from_bps(u32::try_from(bps).unwrap_or(0))
}

/// Fails with `Conflict` when a client-supplied version is stale.
pub(crate) fn expect_version(
    entity: &str,
    id: &str,
    expected: Option<i64>,
    actual: i64,
) -> DbResult<()> {
    match expected {
        Some(v) if v != actual => Err(DbError::conflict(entity, id)),
        _ => Ok(()),
    }
}

/// Turns a version-guarded UPDATE that touched nothing into `Conflict`.
pub(crate) fn expect_written(result: SqliteQueryResult, entity: &str, id: &str) -> DbResult<()> {
    if result.rows_affected() == 0 {
        return Err(DbError::conflict(entity, id));
    }
    Ok(())
}

// =============================================================================
// Test Fixtures
// =============================================================================
