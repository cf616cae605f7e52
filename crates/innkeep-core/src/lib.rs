//! # innkeep-core: Pure Business Logic for Innkeep
//!
//! This crate is the **heart** of Innkeep. It contains the billing ledger,
//! room waitlist and stock rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Innkeep Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Browser client (forms & tables)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 innkeep-server (axum routes)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ innkeep-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │   tax   │ │  room   │ │ ledger  │ │inventory│  │   │
//! │  │   │  Money  │ │ GstRate │ │waitlist │ │LineItem │ │  stock  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  innkeep-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, transactional flows        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer paise arithmetic
//! - [`tax`] - Tax rates, GST split and intra/inter-state regime
//! - [`room`] - Room occupancy and waitlist promotion
//! - [`booking`] - Guest stay rules
//! - [`ledger`] - Billing ledger: line items, payments, completion
//! - [`inventory`] - Stock movements and derived stock
//! - [`restaurant`] - Menu, tables and order pricing
//! - [`admin`] - Expenses and tenant profile
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use innkeep_core::money::Money;
//! use innkeep_core::tax::{GstRate, TaxRate, TaxRegime};
//!
//! // ₹100.00 × 2 at 6% SGST + 6% CGST
//! let base = Money::from_paise(10_000).multiply_quantity(2);
//! let gst = GstRate::new(TaxRate::from_bps(600), TaxRate::from_bps(600));
//! let breakdown = gst.apply(base, TaxRegime::IntraState);
//!
//! assert_eq!(breakdown.total.paise(), 22_400); // ₹224.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod admin;
pub mod booking;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod restaurant;
pub mod room;
pub mod tax;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use admin::{Expense, ExpenseSummary, NewExpense, Profile, ProfileUpdate};
pub use booking::{Booking, BookingStatus, BookingUpdate, NewBooking};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{
    InventoryCategory, InventoryCategoryInput, InventoryItem, InventoryItemInput,
    NewStockMovement, StockDirection, StockMovement,
};
pub use ledger::{ChargeKind, Ledger, LegacyLedgerArrays, LineItem, NewLineItem, PaymentEntry};
pub use money::Money;
pub use restaurant::{
    DiningTable, DiningTableInput, MenuItem, MenuItemInput, NewOrderLine, NewRestaurantOrder,
    OrderLine, RestaurantOrder, TableStatus,
};
pub use room::{
    CheckoutOutcome, Occupancy, QueuedStay, Room, RoomCategory, RoomCategoryInput, RoomInput,
    WaitlistArrays,
};
pub use tax::{GstRate, TaxBreakdown, TaxRate, TaxRegime};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single ledger or order line.
///
/// Guards against typing 1000 instead of 10 at the billing desk.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest unit price, tariff or expense accepted, in paise (₹10 crore).
///
/// Keeps `price × quantity` and ledger sums far inside `i64`.
pub const MAX_PRICE_PAISE: i64 = 1_000_000_000;

/// Largest quantity a single stock movement may carry.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Maximum rooms a single booking may hold.
pub const MAX_ROOMS_PER_BOOKING: usize = 50;
