//! # Restaurant Module
//!
//! Menu items, dining tables and order pricing.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewRestaurantOrder { order_number, lines: [menu item × qty] }          │
//! │        │                                                                │
//! │        ▼  menu prices and GST looked up by the repository               │
//! │  OrderLine { name, unit_price, quantity, gst_rate }                     │
//! │        │                                                                │
//! │        ▼  price_order(lines, regime)                                    │
//! │  subtotal / tax / total                                                 │
//! │        │                                                                │
//! │        └── room_bill_id set? → each line becomes a Food line item       │
//! │                                 on that ledger (same transaction)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::ledger::{ChargeKind, NewLineItem};
use crate::money::Money;
use crate::tax::{GstRate, TaxBreakdown, TaxRate, TaxRegime};
use crate::validation::{
    validate_price_paise, validate_quantity, validate_required, validate_tax_rate_bps,
    validate_text,
};

// =============================================================================
// Menu & Tables
// =============================================================================

/// A dish or drink on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub tenant: String,
    pub name: String,
    pub category: Option<String>,
    pub price: Money,

    /// Combined GST rate, split evenly into SGST and CGST.
    pub gst_rate: TaxRate,

    /// Inactive items stay on old orders but can't be ordered.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Whether a table has an open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Free,
    Occupied,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiningTable {
    pub id: String,
    pub tenant: String,
    pub number: String,
    pub capacity: u32,
    pub status: TableStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub gst_rate: TaxRate,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl MenuItemInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("menu item name", &self.name)?;
        validate_price_paise(self.price.paise())?;
        validate_tax_rate_bps("gst", self.gst_rate.bps())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiningTableInput {
    pub number: String,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub status: Option<TableStatus>,
}

fn default_capacity() -> u32 {
    4
}

impl DiningTableInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("table number", &self.number, 20)?;
        if self.capacity == 0 {
            return Err(ValidationError::MustBePositive {
                field: "capacity".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A priced order line, copied from the menu at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub gst_rate: TaxRate,
}

impl OrderLine {
    /// Prices `quantity` of `item` at its current menu price.
    pub fn from_menu(item: &MenuItem, quantity: i64) -> Self {
        OrderLine {
            menu_item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            gst_rate: item.gst_rate,
        }
    }

    #[inline]
    pub fn gst(&self) -> GstRate {
        GstRate::from_combined(self.gst_rate)
    }

    /// The line as a food charge on a room ledger.
    pub fn to_line_item(&self, room_index: usize) -> NewLineItem {
        let gst = self.gst();
        NewLineItem {
            room_index,
            kind: ChargeKind::Food,
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            sgst_rate: gst.sgst,
            cgst_rate: gst.cgst,
        }
    }
}

/// Requested line: which menu item and how many.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub menu_item_id: String,
    pub quantity: i64,
}

/// Order as submitted from the restaurant page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurantOrder {
    /// Unique per tenant.
    pub order_number: String,
    #[serde(default)]
    pub table_id: Option<String>,

    /// Ledger to charge the order to, for in-house guests.
    #[serde(default)]
    pub room_bill_id: Option<String>,
    #[serde(default)]
    pub room_index: Option<usize>,
    pub lines: Vec<NewOrderLine>,
}

impl NewRestaurantOrder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("order number", &self.order_number)?;

        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "order lines".to_string(),
            });
        }

        for line in &self.lines {
            validate_required("menu item", &line.menu_item_id)?;
            validate_quantity(line.quantity)?;
        }

        if self.room_bill_id.is_some() && self.room_index.is_none() {
            return Err(ValidationError::Required {
                field: "room index".to_string(),
            });
        }

        Ok(())
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantOrder {
    pub id: String,
    pub tenant: String,
    pub order_number: String,
    pub table_id: Option<String>,
    pub room_bill_id: Option<String>,
    pub room_index: Option<usize>,
    pub lines: Vec<OrderLine>,
    pub regime: TaxRegime,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Prices an order: each line taxed at its menu GST, then summed.
///
/// ## Example
/// ```rust
/// use innkeep_core::restaurant::{price_order, OrderLine};
/// use innkeep_core::{Money, TaxRate, TaxRegime};
///
/// let lines = vec![OrderLine {
///     menu_item_id: "m1".into(),
///     name: "Masala Dosa".into(),
///     unit_price: Money::from_rupees(100),
///     quantity: 2,
///     gst_rate: TaxRate::from_bps(500),
/// }];
///
/// let priced = price_order(&lines, TaxRegime::IntraState);
/// assert_eq!(priced.total, Money::from_rupees(210));
/// ```
pub fn price_order(lines: &[OrderLine], regime: TaxRegime) -> TaxBreakdown {
    let mut total = TaxBreakdown::default();
    for line in lines {
        let base = line.unit_price.multiply_quantity(line.quantity);
        total.accumulate(&line.gst().apply(base, regime));
    }
    total
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(name: &str, rupees: i64, gst_bps: u32) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id: format!("menu-{name}"),
            tenant: "hotel".into(),
            name: name.into(),
            category: None,
            price: Money::from_rupees(rupees),
            gst_rate: TaxRate::from_bps(gst_bps),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_order_sums_lines() {
        let lines = vec![
            OrderLine::from_menu(&menu("Dosa", 100, 500), 2),
            OrderLine::from_menu(&menu("Coffee", 40, 1200), 1),
        ];

        let priced = price_order(&lines, TaxRegime::IntraState);

        assert_eq!(priced.base, Money::from_rupees(240));
        assert_eq!(priced.tax(), Money::from_paise(1_000 + 480));
        assert_eq!(priced.total, priced.base + priced.tax());
    }

    #[test]
    fn test_inter_state_order_uses_igst() {
        let lines = vec![OrderLine::from_menu(&menu("Dosa", 100, 500), 2)];
        let priced = price_order(&lines, TaxRegime::InterState);
        assert_eq!(priced.igst, Money::from_rupees(10));
        assert!(priced.sgst.is_zero());
    }

    #[test]
    fn test_line_becomes_food_charge() {
        let line = OrderLine::from_menu(&menu("Dosa", 100, 500), 2);
        let item = line.to_line_item(1);

        assert_eq!(item.kind, ChargeKind::Food);
        assert_eq!(item.room_index, 1);
        assert_eq!(item.sgst_rate.bps() + item.cgst_rate.bps(), 500);
    }

    #[test]
    fn test_order_validation() {
        let order = NewRestaurantOrder {
            order_number: "R-1".into(),
            table_id: None,
            room_bill_id: Some("bill".into()),
            room_index: None,
            lines: vec![NewOrderLine {
                menu_item_id: "m".into(),
                quantity: 1,
            }],
        };
        assert!(order.validate().is_err());

        let order = NewRestaurantOrder {
            room_index: Some(0),
            ..order
        };
        assert!(order.validate().is_ok());

        let empty = NewRestaurantOrder {
            lines: vec![],
            ..order
        };
        assert!(empty.validate().is_err());
    }
}
