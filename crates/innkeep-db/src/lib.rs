//! # innkeep-db: Database Layer for Innkeep
//!
//! SQLite persistence for rooms, bookings, ledgers, inventory, restaurant
//! orders, expenses and tenant profiles, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Innkeep Data Flow                                │
//! │                                                                         │
//! │  axum handler (POST /api/Billing/{id}/complete)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    innkeep-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ RoomRepo       │   │ 001_init.sql │   │   │
//! │  │   │ SqlitePool    │◄───│ BookingRepo    │   │ 002_inv.sql  │   │   │
//! │  │   │ WAL, FKs on   │    │ LedgerRepo ... │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   Rules come from innkeep-core; this crate loads the records,  │   │
//! │  │   applies the rule and writes everything back in one tx.       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (innkeep.db)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (rooms, bookings, ledgers, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use innkeep_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("innkeep.db")).await?;
//!
//! let rooms = db.rooms().list("grand-hotel").await?;
//! let ledger = db.ledgers().complete_bill("grand-hotel", &bill_id, today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::admin::{ExpenseRepository, ProfileRepository};
pub use repository::booking::{BookingReceipt, BookingRepository};
pub use repository::inventory::{InventoryRepository, StockReceipt};
pub use repository::ledger::LedgerRepository;
pub use repository::restaurant::RestaurantRepository;
pub use repository::room::RoomRepository;
