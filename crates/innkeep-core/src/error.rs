//! # Error Types
//!
//! Domain-specific error types for innkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  innkeep-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  innkeep-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures (wraps CoreError raised      │
//! │                         inside a transaction)                          │
//! │                                                                         │
//! │  innkeep-server errors                                                 │
//! │  └── ApiError         - What the client sees (JSON envelope)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent reconciliation rule violations: a payment larger than
/// the due amount, a checkout for a bill the room never queued, and so on.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout or release for a bill the room's waitlist doesn't hold.
    ///
    /// ## When This Occurs
    /// - Room was already checked out for this bill
    /// - Ledger lists a room the booking never enqueued on
    ///
    /// The room is left untouched when this is returned.
    #[error("No matching bill {bill_id} in waitlist of room {room}")]
    NoMatchingBill { room: String, bill_id: String },

    /// Stay already queued on this room.
    #[error("Bill {bill_id} is already queued on room {room}")]
    DuplicateStay { room: String, bill_id: String },

    /// Room cannot be deleted or renumbered while stays are queued on it.
    #[error("Room {room} has {queued} queued stays")]
    RoomInUse { room: String, queued: usize },

    /// Line item targets a room position the ledger doesn't cover.
    #[error("Room index {index} out of range (ledger covers {rooms} rooms)")]
    RoomIndexOutOfRange { index: usize, rooms: usize },

    /// Payment larger than the outstanding balance.
    #[error("Payment {amount} exceeds due amount {due}")]
    PaymentExceedsDue { amount: Money, due: Money },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Bill cannot be completed while money is still owed.
    #[error("Bill {bill_id} still has {due} due")]
    BillNotSettled { bill_id: String, due: Money },

    /// Ledger already completed.
    #[error("Bill {0} is already paid")]
    BillAlreadyPaid(String),

    /// Ledger was cancelled.
    #[error("Bill {0} is cancelled")]
    BillCancelled(String),

    /// Bill completion before the stay has begun.
    #[error("Stay starts on {check_in}, cannot complete bill before then")]
    StayNotStarted { check_in: NaiveDate },

    /// Booking is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Checking in a booking that was already checked out
    /// - Checking in twice
    /// - Amending a stay that has ended
    #[error("Booking {booking_id}: {reason}")]
    InvalidBookingState { booking_id: String, reason: String },

    /// Insufficient stock to record a sell movement.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 5 × Rice (kg)
    ///      │
    ///      ▼
    /// Derived stock: 3
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Rice", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// A running total or stock count left the representable range.
    #[error("{0} exceeds the supported range")]
    Overflow(String),

    /// Restaurant order already posted to a room ledger.
    #[error("Order {0} is charged to a room bill and cannot be deleted")]
    OrderChargedToRoom(String),

    /// Menu item is inactive and can't be ordered.
    #[error("Menu item {0} is not available")]
    MenuItemUnavailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid GSTIN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date range is inverted or otherwise invalid.
    #[error("{field}: {reason}")]
    InvalidDateRange { field: String, reason: String },

    /// Duplicate value within one request.
    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PaymentExceedsDue {
            amount: Money::from_paise(150_000),
            due: Money::from_paise(100_000),
        };
        assert_eq!(
            err.to_string(),
            "Payment ₹1500.00 exceeds due amount ₹1000.00"
        );

        let err = CoreError::NoMatchingBill {
            room: "101".to_string(),
            bill_id: "b-1".to_string(),
        };
        assert_eq!(err.to_string(), "No matching bill b-1 in waitlist of room 101");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "guest_name".to_string(),
        };
        assert_eq!(validation_err.to_string(), "guest_name is required");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
