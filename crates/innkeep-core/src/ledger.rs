//! # Billing Ledger
//!
//! One ledger per booking: line items for every booked room, payment
//! history, and the `total / advanced / due` aggregates.
//!
//! ## Ledger Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐ add_line_item / record_payment    ┌──────────┐            │
//! │   │  OPEN  │ ─────────────────────────────────►│   OPEN   │            │
//! │   └────┬───┘   (due = total − advanced,        └──────────┘            │
//! │        │        recomputed on every change)                             │
//! │        │                                                                │
//! │        ├──── due == 0 && check_in ≤ today ──► mark_paid ──► PAID        │
//! │        │                                                                │
//! │        └──── cancel ─────────────────────────────────────► CANCELLED    │
//! │                                                                         │
//! │   PAID and CANCELLED are terminal: no items, payments or reversal.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Item Arena
//! Items are one flat list, each tagged with the position of its room in
//! `room_numbers`. Older clients read the ledger as co-indexed arrays
//! (`itemList[room][item]`, `taxList[room][item] = [sgst, cgst]`, ...);
//! [`Ledger::legacy_arrays`] renders that shape and
//! [`LegacyLedgerArrays::into_line_items`] reads it back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::tax::{GstRate, TaxBreakdown, TaxRate, TaxRegime};
use crate::validation::{
    validate_price_paise, validate_quantity, validate_required, validate_tax_rate_bps,
};

// =============================================================================
// Charge Kind
// =============================================================================

/// What a line item charges for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    /// Room tariff.
    Room,
    /// Restaurant order charged to the room.
    Food,
    /// Laundry, transport and other services.
    #[default]
    Service,
}

// =============================================================================
// Line Item
// =============================================================================

/// A single charge on a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,

    /// Position of the room in the ledger's `room_numbers`.
    pub room_index: usize,
    pub kind: ChargeKind,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub sgst_rate: TaxRate,
    pub cgst_rate: TaxRate,
}

impl LineItem {
    /// Pre-tax amount.
    #[inline]
    pub fn base(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// The item's SGST/CGST pair.
    #[inline]
    pub fn gst(&self) -> GstRate {
        GstRate::new(self.sgst_rate, self.cgst_rate)
    }

    /// Tax breakdown under `regime`.
    pub fn breakdown(&self, regime: TaxRegime) -> TaxBreakdown {
        self.gst().apply(self.base(), regime)
    }

    /// Tax-inclusive total under `regime`.
    #[inline]
    pub fn total(&self, regime: TaxRegime) -> Money {
        self.breakdown(regime).total
    }
}

/// Input for [`Ledger::add_line_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub room_index: usize,
    #[serde(default)]
    pub kind: ChargeKind,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub sgst_rate: TaxRate,
    pub cgst_rate: TaxRate,
}

impl NewLineItem {
    /// Checks the fields that don't depend on the ledger.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("item name", &self.name)?;
        validate_price_paise(self.unit_price.paise())?;
        validate_quantity(self.quantity)?;
        validate_tax_rate_bps("sgst", self.sgst_rate.bps())?;
        validate_tax_rate_bps("cgst", self.cgst_rate.bps())?;
        Ok(())
    }
}

// =============================================================================
// Payment Entry
// =============================================================================

/// A recorded payment. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub id: String,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,

    /// Cash, UPI, card...; free text chosen at the desk.
    pub mode: String,
    pub amount: Money,
    pub remark: Option<String>,
}

// =============================================================================
// Ledger
// =============================================================================

/// Stored totals that disagree with the items and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsDrift {
    pub stored_total: Money,
    pub computed_total: Money,
    pub stored_advanced: Money,
    pub computed_advanced: Money,
    pub stored_due: Money,
    pub computed_due: Money,
}

/// A booking's billing ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub id: String,
    pub tenant: String,
    pub booking_id: String,

    /// Rooms covered; line items index into this list.
    pub room_numbers: Vec<String>,
    pub regime: TaxRegime,
    #[ts(as = "String")]
    pub check_in: NaiveDate,

    pub items: Vec<LineItem>,
    pub payments: Vec<PaymentEntry>,

    pub total_amount: Money,
    pub amount_advanced: Money,
    pub due_amount: Money,

    pub bill_paid: bool,
    pub cancelled: bool,

    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ledger {
    /// Creates an empty, open ledger.
    pub fn new(
        tenant: impl Into<String>,
        booking_id: impl Into<String>,
        room_numbers: Vec<String>,
        regime: TaxRegime,
        check_in: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Ledger {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.into(),
            booking_id: booking_id.into(),
            room_numbers,
            regime,
            check_in,
            items: Vec::new(),
            payments: Vec::new(),
            total_amount: Money::zero(),
            amount_advanced: Money::zero(),
            due_amount: Money::zero(),
            bill_paid: false,
            cancelled: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fails unless the ledger can still take items and payments.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.bill_paid {
            return Err(CoreError::BillAlreadyPaid(self.id.clone()));
        }
        if self.cancelled {
            return Err(CoreError::BillCancelled(self.id.clone()));
        }
        Ok(())
    }

    /// Appends a line item and adds its total to `total` and `due`.
    ///
    /// ## Example
    /// ```rust
    /// use innkeep_core::ledger::{ChargeKind, Ledger, NewLineItem};
    /// use innkeep_core::{Money, TaxRate, TaxRegime};
    /// use chrono::NaiveDate;
    ///
    /// let check_in = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// let mut ledger = Ledger::new("hotel", "bk", vec!["101".into()], TaxRegime::IntraState, check_in);
    ///
    /// ledger.add_line_item(NewLineItem {
    ///     room_index: 0,
    ///     kind: ChargeKind::Service,
    ///     name: "Laundry".into(),
    ///     unit_price: Money::from_rupees(100),
    ///     quantity: 2,
    ///     sgst_rate: TaxRate::from_bps(600),
    ///     cgst_rate: TaxRate::from_bps(600),
    /// }).unwrap();
    ///
    /// assert_eq!(ledger.total_amount, Money::from_rupees(224));
    /// assert_eq!(ledger.due_amount, Money::from_rupees(224));
    /// ```
    pub fn add_line_item(&mut self, item: NewLineItem) -> CoreResult<&LineItem> {
        self.ensure_open()?;
        item.validate()?;

        if item.room_index >= self.room_numbers.len() {
            return Err(CoreError::RoomIndexOutOfRange {
                index: item.room_index,
                rooms: self.room_numbers.len(),
            });
        }

        let line = LineItem {
            id: Uuid::new_v4().to_string(),
            room_index: item.room_index,
            kind: item.kind,
            name: item.name.trim().to_string(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            sgst_rate: item.sgst_rate,
            cgst_rate: item.cgst_rate,
        };

        self.total_amount = self
            .total_amount
            .checked_add(line.total(self.regime))
            .ok_or_else(|| CoreError::Overflow(format!("Bill {} total", self.id)))?;
        self.recompute_due();
        self.items.push(line);
        self.updated_at = Utc::now();

        Ok(&self.items[self.items.len() - 1])
    }

    /// Records a payment and recomputes `due` in the same step.
    ///
    /// ## Rules
    /// - `amount` must be positive and at most the current due amount
    /// - `mode` must not be blank
    /// - The ledger must be open
    pub fn record_payment(
        &mut self,
        amount: Money,
        mode: &str,
        remark: Option<String>,
        at: DateTime<Utc>,
    ) -> CoreResult<&PaymentEntry> {
        self.ensure_open()?;

        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "amount must be positive".to_string(),
            });
        }

        if amount > self.due_amount {
            return Err(CoreError::PaymentExceedsDue {
                amount,
                due: self.due_amount,
            });
        }

        validate_required("payment mode", mode)?;

        self.payments.push(PaymentEntry {
            id: Uuid::new_v4().to_string(),
            paid_at: at,
            mode: mode.trim().to_string(),
            amount,
            remark: remark.filter(|r| !r.trim().is_empty()),
        });
        self.amount_advanced += amount;
        self.recompute_due();
        self.updated_at = Utc::now();

        Ok(&self.payments[self.payments.len() - 1])
    }

    /// Checks that the bill can be completed on `today`.
    pub fn ensure_completable(&self, today: NaiveDate) -> CoreResult<()> {
        self.ensure_open()?;

        if !self.due_amount.is_zero() {
            return Err(CoreError::BillNotSettled {
                bill_id: self.id.clone(),
                due: self.due_amount,
            });
        }

        if self.check_in > today {
            return Err(CoreError::StayNotStarted {
                check_in: self.check_in,
            });
        }

        Ok(())
    }

    /// Marks the bill paid. Call [`Ledger::ensure_completable`] first.
    pub fn mark_paid(&mut self) {
        self.bill_paid = true;
        self.due_amount = Money::zero();
        self.updated_at = Utc::now();
    }

    /// Cancels the ledger. Paid bills cannot be cancelled.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        self.cancelled = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Aggregated tax breakdown of all items.
    pub fn breakdown(&self) -> TaxBreakdown {
        let mut total = TaxBreakdown::default();
        for item in &self.items {
            total.accumulate(&item.breakdown(self.regime));
        }
        total
    }

    /// Items charged to the room at `room_index`.
    pub fn items_for_room(&self, room_index: usize) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(move |i| i.room_index == room_index)
    }

    /// Recomputes the aggregates from items and payments and reports any
    /// difference from the stored values.
    pub fn verify_totals(&self) -> Option<TotalsDrift> {
        let computed_total: Money = self.items.iter().map(|i| i.total(self.regime)).sum();
        let computed_advanced: Money = self.payments.iter().map(|p| p.amount).sum();
        let computed_due = if self.bill_paid {
            Money::zero()
        } else {
            computed_total - computed_advanced
        };

        if computed_total == self.total_amount
            && computed_advanced == self.amount_advanced
            && computed_due == self.due_amount
        {
            return None;
        }

        Some(TotalsDrift {
            stored_total: self.total_amount,
            computed_total,
            stored_advanced: self.amount_advanced,
            computed_advanced,
            stored_due: self.due_amount,
            computed_due,
        })
    }

    fn recompute_due(&mut self) {
        self.due_amount = self.total_amount - self.amount_advanced;
    }

    /// Renders the ledger in the co-indexed array shape older clients read.
    pub fn legacy_arrays(&self) -> LegacyLedgerArrays {
        let rooms = self.room_numbers.len();
        let mut arrays = LegacyLedgerArrays {
            room_no: self.room_numbers.clone(),
            item_list: vec![Vec::new(); rooms],
            price_list: vec![Vec::new(); rooms],
            quantity_list: vec![Vec::new(); rooms],
            tax_list: vec![Vec::new(); rooms],
            sgst_array: vec![Vec::new(); rooms],
            cgst_array: vec![Vec::new(); rooms],
            kind_list: vec![Vec::new(); rooms],
            total_amount: self.total_amount.as_rupees_f64(),
            amount_advanced: self.amount_advanced.as_rupees_f64(),
            due_amount: self.due_amount.as_rupees_f64(),
            date_of_payment: Vec::with_capacity(self.payments.len()),
            mode_of_payment: Vec::with_capacity(self.payments.len()),
            amount_of_payment: Vec::with_capacity(self.payments.len()),
            bill_paid: yes_no(self.bill_paid),
            cancelled: yes_no(self.cancelled),
        };

        for item in &self.items {
            let r = item.room_index;
            let (sgst, cgst) = (item.sgst_rate.percentage(), item.cgst_rate.percentage());
            arrays.item_list[r].push(item.name.clone());
            arrays.price_list[r].push(item.unit_price.as_rupees_f64());
            arrays.quantity_list[r].push(item.quantity);
            arrays.tax_list[r].push([sgst, cgst]);
            arrays.sgst_array[r].push(sgst);
            arrays.cgst_array[r].push(cgst);
            arrays.kind_list[r].push(item.kind);
        }

        for payment in &self.payments {
            arrays.date_of_payment.push(payment.paid_at.date_naive().to_string());
            arrays.mode_of_payment.push(payment.mode.clone());
            arrays.amount_of_payment.push(payment.amount.as_rupees_f64());
        }

        arrays
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

// =============================================================================
// Legacy Array View
// =============================================================================

/// Co-indexed array rendering of a ledger, `[room][item]`.
///
/// Amounts are rupees and rates are percentages, as older clients expect.
/// `sgstArray`/`cgstArray` repeat the `taxList` columns for clients that
/// predate the pair format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLedgerArrays {
    pub room_no: Vec<String>,
    pub item_list: Vec<Vec<String>>,
    pub price_list: Vec<Vec<f64>>,
    pub quantity_list: Vec<Vec<i64>>,
    pub tax_list: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub sgst_array: Vec<Vec<f64>>,
    #[serde(default)]
    pub cgst_array: Vec<Vec<f64>>,
    #[serde(default)]
    pub kind_list: Vec<Vec<ChargeKind>>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub amount_advanced: f64,
    #[serde(default)]
    pub due_amount: f64,
    #[serde(rename = "DateOfPayment", default)]
    pub date_of_payment: Vec<String>,
    #[serde(rename = "ModeOfPayment", default)]
    pub mode_of_payment: Vec<String>,
    #[serde(rename = "AmountOfPayment", default)]
    pub amount_of_payment: Vec<f64>,
    #[serde(rename = "Bill_Paid", default)]
    pub bill_paid: String,
    #[serde(rename = "Cancelled", default)]
    pub cancelled: String,
}

impl LegacyLedgerArrays {
    /// Reads the item arrays back into line item inputs.
    ///
    /// Each item takes its rates from `taxList`, falling back to the
    /// `sgstArray`/`cgstArray` columns. Items without a kind are services.
    pub fn into_line_items(&self) -> CoreResult<Vec<NewLineItem>> {
        if self.item_list.len() > self.room_no.len() {
            return Err(CoreError::RoomIndexOutOfRange {
                index: self.item_list.len() - 1,
                rooms: self.room_no.len(),
            });
        }

        let mut items = Vec::new();

        for (room_index, names) in self.item_list.iter().enumerate() {
            for (i, name) in names.iter().enumerate() {
                let price = cell(&self.price_list, room_index, i, "priceList")?;
                let quantity = cell(&self.quantity_list, room_index, i, "quantityList")?;

                let (sgst, cgst) = match self.tax_list.get(room_index).and_then(|r| r.get(i)) {
                    Some([sgst, cgst]) => (*sgst, *cgst),
                    None => (
                        cell(&self.sgst_array, room_index, i, "sgstArray")?,
                        cell(&self.cgst_array, room_index, i, "cgstArray")?,
                    ),
                };

                let kind = self
                    .kind_list
                    .get(room_index)
                    .and_then(|r| r.get(i))
                    .copied()
                    .unwrap_or_default();

                items.push(NewLineItem {
                    room_index,
                    kind,
                    name: name.clone(),
                    unit_price: Money::from_rupees_f64(price),
                    quantity,
                    sgst_rate: TaxRate::from_percentage(sgst),
                    cgst_rate: TaxRate::from_percentage(cgst),
                });
            }
        }

        Ok(items)
    }
}

fn cell<T: Copy>(rows: &[Vec<T>], room: usize, item: usize, field: &str) -> CoreResult<T> {
    rows.get(room)
        .and_then(|r| r.get(item))
        .copied()
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("missing entry [{}][{}]", room, item),
            }
            .into()
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
