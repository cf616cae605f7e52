//! # Inventory Module
//!
//! Inventory categories, items and the purchase/sell stock ledger.
//!
//! ## Derived Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_movements (append-only)           inventory_items.stock          │
//! │  ┌──────────┬───────────┬─────┐                                        │
//! │  │ Rice     │ purchase  │ 50  │                                        │
//! │  │ Rice     │ sell      │ 12  │  ──►  Σ purchase − Σ sell = 38         │
//! │  │ Rice     │ purchase  │ 10  │          (rewritten in the same        │
//! │  │ Rice     │ sell      │ 10  │           transaction as the movement) │
//! │  └──────────┴───────────┴─────┘                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stored `stock` is a materialised view of the movements; a sell larger
//! than the current stock is refused here, not only in the browser.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::tax::{GstRate, TaxRate};
use crate::validation::{
    validate_price_paise, validate_required, validate_stock_quantity, validate_tax_rate_bps,
};

// =============================================================================
// Category & Item
// =============================================================================

/// Grouping for inventory items (Kitchen, Housekeeping, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCategory {
    pub id: String,
    pub tenant: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A stocked item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub tenant: String,
    pub category_id: String,
    pub name: String,

    /// kg, litre, piece...
    pub quantity_unit: String,

    /// Combined GST rate, split evenly into SGST and CGST.
    pub tax_rate: TaxRate,

    /// Σ purchases − Σ sells, maintained by the repository.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    #[inline]
    pub fn gst(&self) -> GstRate {
        GstRate::from_combined(self.tax_rate)
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    Purchase,
    Sell,
}

/// One purchase or sell event on the stock report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub tenant: String,
    pub item_id: String,
    pub direction: StockDirection,
    pub quantity: i64,
    pub unit_price: Money,
    pub invoice_no: Option<String>,

    /// Supplier for purchases, buyer or department for sells.
    pub party: Option<String>,
    #[ts(as = "String")]
    pub occurred_on: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Stock report entry as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewStockMovement {
    pub item_id: String,
    pub direction: StockDirection,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub invoice_no: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[ts(as = "String")]
    pub occurred_on: NaiveDate,
}

impl NewStockMovement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("item", &self.item_id)?;
        validate_stock_quantity(self.quantity)?;
        validate_price_paise(self.unit_price.paise())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCategoryInput {
    pub name: String,
}

impl InventoryCategoryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("category name", &self.name)
    }
}

/// Item fields accepted on create and update. Stock is never set directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInput {
    pub category_id: String,
    pub name: String,
    pub quantity_unit: String,
    #[serde(default)]
    pub tax_rate: TaxRate,
}

impl InventoryItemInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("category", &self.category_id)?;
        validate_item(&self.name, &self.quantity_unit, self.tax_rate)
    }
}

/// Validates an item's editable fields.
pub fn validate_item(name: &str, quantity_unit: &str, tax_rate: TaxRate) -> Result<(), ValidationError> {
    validate_required("item name", name)?;
    validate_required("quantity unit", quantity_unit)?;
    validate_tax_rate_bps("tax", tax_rate.bps())?;
    Ok(())
}

/// Applies one movement to `current` stock.
///
/// ## Example
/// ```rust
/// use innkeep_core::inventory::{apply_stock_movement, StockDirection};
///
/// assert_eq!(apply_stock_movement("Rice", 10, StockDirection::Purchase, 5).unwrap(), 15);
/// assert_eq!(apply_stock_movement("Rice", 10, StockDirection::Sell, 10).unwrap(), 0);
/// assert!(apply_stock_movement("Rice", 10, StockDirection::Sell, 11).is_err());
/// ```
pub fn apply_stock_movement(
    item: &str,
    current: i64,
    direction: StockDirection,
    quantity: i64,
) -> CoreResult<i64> {
    validate_stock_quantity(quantity)?;

    match direction {
        StockDirection::Purchase => current
            .checked_add(quantity)
            .ok_or_else(|| CoreError::Overflow(format!("Stock of {item}"))),
        StockDirection::Sell if quantity > current => Err(CoreError::InsufficientStock {
            item: item.to_string(),
            available: current,
            requested: quantity,
        }),
        StockDirection::Sell => Ok(current - quantity),
    }
}

/// Stock implied by a movement log: Σ purchases − Σ sells, saturating at
/// the `i64` bounds.
pub fn derive_stock<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (StockDirection, i64)>,
{
    movements.into_iter().fold(0i64, |stock, (direction, qty)| match direction {
        StockDirection::Purchase => stock.saturating_add(qty),
        StockDirection::Sell => stock.saturating_sub(qty),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_beyond_stock_rejected() {
        let err = apply_stock_movement("Rice", 3, StockDirection::Sell, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_stock_cannot_overflow() {
        assert!(apply_stock_movement("Rice", 0, StockDirection::Purchase, i64::MAX).is_err());
        assert!(matches!(
            apply_stock_movement("Rice", i64::MAX - 1, StockDirection::Purchase, 5),
            Err(CoreError::Overflow(_))
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(apply_stock_movement("Rice", 3, StockDirection::Purchase, 0).is_err());
    }

    #[test]
    fn test_derive_stock_matches_applied_movements() {
        let log = [
            (StockDirection::Purchase, 50),
            (StockDirection::Sell, 12),
            (StockDirection::Purchase, 10),
            (StockDirection::Sell, 10),
        ];

        let mut running = 0;
        for (direction, qty) in log {
            running = apply_stock_movement("Rice", running, direction, qty).unwrap();
        }

        assert_eq!(derive_stock(log), 38);
        assert_eq!(derive_stock(log), running);
        assert_eq!(derive_stock(std::iter::empty()), 0);
    }

    #[test]
    fn test_validate_item() {
        assert!(validate_item("Rice", "kg", TaxRate::from_bps(500)).is_ok());
        assert!(validate_item("", "kg", TaxRate::zero()).is_err());
        assert!(validate_item("Rice", "kg", TaxRate::from_bps(20_000)).is_err());
    }
}
