//! # Validation Module
//!
//! Input validation for Innkeep.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  ├── Immediate feedback only, never trusted                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Server handler (Rust)                                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Domain rules (ledger / room / stock)                         │
//! │  ├── due-amount cap, waitlist membership, stock floor                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── UNIQUE (room number, order number per tenant)                     │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use innkeep_core::validation::{validate_quantity, validate_required};
//!
//! validate_required("guest_name", "Asha Rao").unwrap();
//! validate_quantity(2).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_PAISE, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a text field is non-blank and at most 200 characters.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    validate_text(field, value, 200)
}

/// Validates a non-blank text field with a custom maximum length.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a room number.
///
/// ## Rules
/// - Must not be empty, at most 20 characters
/// - Letters, digits, hyphens only (`101`, `A-12`, `PH1`)
///
/// ```rust
/// use innkeep_core::validation::validate_room_number;
///
/// assert!(validate_room_number("101").is_ok());
/// assert!(validate_room_number("A-12").is_ok());
/// assert!(validate_room_number("1 01").is_err());
/// ```
pub fn validate_room_number(number: &str) -> ValidationResult<()> {
    validate_text("room number", number, 20)?;

    if !number.trim().chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "room number".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a guest mobile number.
///
/// ## Rules
/// - Optional leading `+`
/// - 10 to 15 digits, spaces ignored
pub fn validate_mobile_no(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();
    if mobile.is_empty() {
        return Err(ValidationError::Required {
            field: "mobile number".to_string(),
        });
    }

    let digits = mobile.strip_prefix('+').unwrap_or(mobile).replace(' ', "");
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "mobile number".to_string(),
            reason: "must be 10 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a GSTIN (15 alphanumeric characters).
///
/// Only the shape is checked; the checksum digit is the tax portal's job.
pub fn validate_gstin(gstin: &str) -> ValidationResult<()> {
    let gstin = gstin.trim();
    if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: "must be 15 letters and digits".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock movement quantity (positive, no line cap).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in paise. Zero is allowed (complimentary items).
pub fn validate_price_paise(paise: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_PAISE).contains(&paise) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_PAISE,
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive (payments, expenses).
pub fn validate_positive_amount(field: &str, paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if paise > MAX_PRICE_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_PRICE_PAISE,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a stay's date range: check-out on or after check-in.
///
/// Same-day stays (day use) are allowed.
pub fn validate_stay_dates(check_in: NaiveDate, check_out: NaiveDate) -> ValidationResult<()> {
    if check_out < check_in {
        return Err(ValidationError::InvalidDateRange {
            field: "check_out".to_string(),
            reason: format!("{} is before check-in {}", check_out, check_in),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "Deluxe").is_ok());
        assert!(validate_required("name", "   ").is_err());
        assert!(validate_required("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_mobile_no() {
        assert!(validate_mobile_no("9876543210").is_ok());
        assert!(validate_mobile_no("+91 98765 43210").is_ok());
        assert!(validate_mobile_no("12345").is_err());
        assert!(validate_mobile_no("98765abcde").is_err());
        assert!(validate_mobile_no("").is_err());
    }

    #[test]
    fn test_validate_gstin() {
        assert!(validate_gstin("27AAPFU0939F1ZV").is_ok());
        assert!(validate_gstin("27AAPFU0939F1Z").is_err());
        assert!(validate_gstin("27AAPFU0939F1Z-").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_price_paise(0).is_ok());
        assert!(validate_price_paise(MAX_PRICE_PAISE).is_ok());
        assert!(validate_price_paise(MAX_PRICE_PAISE + 1).is_err());
        assert!(validate_price_paise(-1).is_err());
        assert!(validate_positive_amount("amount", i64::MAX).is_err());
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY).is_ok());
        assert!(validate_stock_quantity(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_stay_dates() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(validate_stay_dates(d(10), d(12)).is_ok());
        assert!(validate_stay_dates(d(10), d(10)).is_ok());
        assert!(validate_stay_dates(d(12), d(10)).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps("sgst", 0).is_ok());
        assert!(validate_tax_rate_bps("sgst", 10000).is_ok());
        assert!(validate_tax_rate_bps("sgst", 10001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
