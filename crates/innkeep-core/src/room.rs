//! # Room Module
//!
//! Room occupancy and the per-room waitlist of queued stays.
//!
//! ## Waitlist Promotion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Room 101                                                               │
//! │                                                                         │
//! │  waitlist: [ stay(bill A) | stay(bill B) | stay(bill C) ]               │
//! │               ▲ current                                                 │
//! │                                                                         │
//! │  complete_checkout(A)                                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  waitlist: [ stay(bill B) | stay(bill C) ]                              │
//! │               ▲ promoted: current = B, occupied stays Confirmed        │
//! │                                                                         │
//! │  complete_checkout(B), complete_checkout(C)                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  waitlist: [ ]   current = None, occupied = Vacant                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A queued stay is one record, so the guest, bill and date sequences that
//! clients still read (see [`WaitlistArrays`]) are always the same length.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::tax::{GstRate, TaxRate};
use crate::validation::{
    validate_price_paise, validate_required, validate_room_number, validate_stay_dates,
    validate_tax_rate_bps,
};

// =============================================================================
// Occupancy
// =============================================================================

/// Whether a room currently has a confirmed stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum Occupancy {
    #[default]
    Vacant,
    Confirmed,
}

// =============================================================================
// Room Category
// =============================================================================

/// A room category sets the nightly tariff and GST rate of its rooms.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomCategory {
    pub id: String,
    pub tenant: String,
    pub name: String,

    /// Nightly tariff.
    pub tariff: Money,

    /// Combined GST rate, split evenly into SGST and CGST.
    pub gst_rate: TaxRate,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RoomCategory {
    /// SGST/CGST pair for this category.
    #[inline]
    pub fn gst(&self) -> GstRate {
        GstRate::from_combined(self.gst_rate)
    }
}

/// Category fields accepted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomCategoryInput {
    pub name: String,
    pub tariff: Money,
    pub gst_rate: TaxRate,
}

impl RoomCategoryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("category name", &self.name)?;
        validate_price_paise(self.tariff.paise())?;
        validate_tax_rate_bps("gst", self.gst_rate.bps())?;
        Ok(())
    }
}

// =============================================================================
// Queued Stay
// =============================================================================

/// One entry of a room's waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QueuedStay {
    pub guest_id: String,
    pub bill_id: String,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
}

/// The legacy four-sequence rendering of a waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistArrays {
    pub guest_waitlist: Vec<String>,
    pub bill_waitlist: Vec<String>,
    #[ts(as = "Vec<String>")]
    pub check_in_date_list: Vec<NaiveDate>,
    #[ts(as = "Vec<String>")]
    pub check_out_date_list: Vec<NaiveDate>,
}

/// What happened to a room when a stay left its waitlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The front stay left and the next one became current.
    Promoted(QueuedStay),
    /// The last stay left; the room is vacant.
    Vacated,
    /// A stay further back in the queue was removed; the current stay is unchanged.
    Dequeued,
}

// =============================================================================
// Room
// =============================================================================

/// Room fields set by admin room setup.
///
/// Occupancy and the waitlist are never written through this; they only
/// move with bookings and checkouts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    pub number: String,
    #[serde(default)]
    pub floor: Option<String>,
    pub category_id: String,

    /// Housekeeping toggle; ignored on create.
    #[serde(default)]
    pub clean: Option<bool>,

    /// Expected version for updates; a mismatch is a conflict.
    #[serde(default)]
    pub version: Option<i64>,
}

impl RoomInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_room_number(&self.number)?;
        validate_required("category", &self.category_id)?;
        Ok(())
    }
}

/// A physical room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub tenant: String,

    /// Room number, unique per tenant.
    pub number: String,
    pub floor: Option<String>,
    pub category_id: String,

    pub occupied: Occupancy,
    pub clean: bool,
    pub billing_started: bool,
    pub current_guest_id: Option<String>,
    pub current_billing_id: Option<String>,

    /// FIFO queue of stays; the front entry is the current stay.
    pub waitlist: Vec<QueuedStay>,

    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Creates a clean, vacant room with an empty waitlist.
    pub fn new(
        tenant: impl Into<String>,
        number: impl Into<String>,
        floor: Option<String>,
        category_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.into(),
            number: number.into(),
            floor,
            category_id: category_id.into(),
            occupied: Occupancy::Vacant,
            clean: true,
            billing_started: false,
            current_guest_id: None,
            current_billing_id: None,
            waitlist: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the bill is queued on this room.
    pub fn holds_bill(&self, bill_id: &str) -> bool {
        self.waitlist.iter().any(|s| s.bill_id == bill_id)
    }

    /// Appends a stay to the waitlist.
    ///
    /// The first stay on an empty waitlist becomes current and confirms the
    /// room. Nothing changes if the dates are inverted or the bill is
    /// already queued here.
    pub fn enqueue_stay(&mut self, stay: QueuedStay) -> CoreResult<()> {
        validate_stay_dates(stay.check_in, stay.check_out)?;

        if self.holds_bill(&stay.bill_id) {
            return Err(CoreError::DuplicateStay {
                room: self.number.clone(),
                bill_id: stay.bill_id,
            });
        }

        if self.waitlist.is_empty() {
            self.occupied = Occupancy::Confirmed;
            self.current_guest_id = Some(stay.guest_id.clone());
            self.current_billing_id = Some(stay.bill_id.clone());
        }

        self.waitlist.push(stay);
        Ok(())
    }

    /// Removes the stay for `bill_id` after its bill was completed.
    ///
    /// The room is marked clean. See [`CheckoutOutcome`] for how the
    /// current stay moves.
    pub fn complete_checkout(&mut self, bill_id: &str) -> CoreResult<CheckoutOutcome> {
        let outcome = self.remove_stay(bill_id)?;
        self.clean = true;
        Ok(outcome)
    }

    /// Removes the stay for a cancelled booking.
    ///
    /// Same promotion rules as [`Room::complete_checkout`]; nobody slept
    /// here, so `clean` is left alone.
    pub fn release_stay(&mut self, bill_id: &str) -> CoreResult<CheckoutOutcome> {
        self.remove_stay(bill_id)
    }

    fn remove_stay(&mut self, bill_id: &str) -> CoreResult<CheckoutOutcome> {
        let position = self
            .waitlist
            .iter()
            .position(|s| s.bill_id == bill_id)
            .ok_or_else(|| CoreError::NoMatchingBill {
                room: self.number.clone(),
                bill_id: bill_id.to_string(),
            })?;

        self.waitlist.remove(position);

        if position != 0 {
            return Ok(CheckoutOutcome::Dequeued);
        }

        self.billing_started = false;

        match self.waitlist.first() {
            Some(next) => {
                self.occupied = Occupancy::Confirmed;
                self.current_guest_id = Some(next.guest_id.clone());
                self.current_billing_id = Some(next.bill_id.clone());
                Ok(CheckoutOutcome::Promoted(next.clone()))
            }
            None => {
                self.occupied = Occupancy::Vacant;
                self.current_guest_id = None;
                self.current_billing_id = None;
                Ok(CheckoutOutcome::Vacated)
            }
        }
    }

    /// Starts billing when the guest of `bill_id` checks in.
    ///
    /// Returns `Ok(false)` when the stay is queued behind another guest.
    /// Billing for an early arrival starts when their stay is promoted.
    pub fn start_billing(&mut self, bill_id: &str) -> CoreResult<bool> {
        if !self.holds_bill(bill_id) {
            return Err(CoreError::NoMatchingBill {
                room: self.number.clone(),
                bill_id: bill_id.to_string(),
            });
        }

        if self.current_billing_id.as_deref() == Some(bill_id) {
            self.billing_started = true;
            return Ok(true);
        }

        Ok(false)
    }

    /// Renders the waitlist as four parallel sequences.
    pub fn waitlist_arrays(&self) -> WaitlistArrays {
        let mut arrays = WaitlistArrays::default();
        for stay in &self.waitlist {
            arrays.guest_waitlist.push(stay.guest_id.clone());
            arrays.bill_waitlist.push(stay.bill_id.clone());
            arrays.check_in_date_list.push(stay.check_in);
            arrays.check_out_date_list.push(stay.check_out);
        }
        arrays
    }

    /// Changes the room number. Bookings and ledgers refer to rooms by
    /// number, so a room with queued stays keeps the one it has.
    pub fn renumber(&mut self, number: &str) -> CoreResult<()> {
        let number = number.trim();
        if number == self.number {
            return Ok(());
        }
        self.ensure_deletable()?;
        self.number = number.to_string();
        Ok(())
    }

    /// Rejects deletion while stays are queued.
    pub fn ensure_deletable(&self) -> CoreResult<()> {
        if !self.waitlist.is_empty() {
            return Err(CoreError::RoomInUse {
                room: self.number.clone(),
                queued: self.waitlist.len(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn stay(bill: &str, from: u32, to: u32) -> QueuedStay {
        QueuedStay {
            guest_id: format!("guest-{bill}"),
            bill_id: bill.to_string(),
            check_in: date(from),
            check_out: date(to),
        }
    }

    fn assert_arrays_aligned(room: &Room) {
        let a = room.waitlist_arrays();
        assert_eq!(a.guest_waitlist.len(), a.bill_waitlist.len());
        assert_eq!(a.bill_waitlist.len(), a.check_in_date_list.len());
        assert_eq!(a.check_in_date_list.len(), a.check_out_date_list.len());
    }

    #[test]
    fn test_first_enqueue_confirms_room() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();

        assert_eq!(room.occupied, Occupancy::Confirmed);
        assert_eq!(room.current_billing_id.as_deref(), Some("A"));
        assert_eq!(room.current_guest_id.as_deref(), Some("guest-A"));
        assert_arrays_aligned(&room);
    }

    #[test]
    fn test_second_enqueue_keeps_current() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();
        room.enqueue_stay(stay("B", 3, 5)).unwrap();

        assert_eq!(room.current_billing_id.as_deref(), Some("A"));
        assert_eq!(room.waitlist.len(), 2);
        assert_arrays_aligned(&room);
    }

    #[test]
    fn test_enqueue_rejects_duplicate_and_inverted_dates() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();

        assert!(matches!(
            room.enqueue_stay(stay("A", 4, 5)),
            Err(CoreError::DuplicateStay { .. })
        ));
        assert!(room.enqueue_stay(stay("B", 5, 4)).is_err());
        assert_eq!(room.waitlist.len(), 1);
    }

    #[test]
    fn test_checkout_first_shifts_waitlist_left() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();
        room.enqueue_stay(stay("B", 3, 5)).unwrap();
        room.clean = false;
        room.billing_started = true;

        let outcome = room.complete_checkout("A").unwrap();

        assert_eq!(outcome, CheckoutOutcome::Promoted(stay("B", 3, 5)));
        assert_eq!(room.waitlist_arrays().bill_waitlist, vec!["B".to_string()]);
        assert_eq!(room.waitlist_arrays().guest_waitlist, vec!["guest-B".to_string()]);
        assert_eq!(room.occupied, Occupancy::Confirmed);
        assert_eq!(room.current_billing_id.as_deref(), Some("B"));
        assert!(room.clean);
        assert!(!room.billing_started);
        assert_arrays_aligned(&room);
    }

    #[test]
    fn test_last_checkout_vacates_room() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();

        assert_eq!(room.complete_checkout("A").unwrap(), CheckoutOutcome::Vacated);
        assert_eq!(room.occupied, Occupancy::Vacant);
        assert!(room.current_billing_id.is_none());
        assert!(room.current_guest_id.is_none());
        assert!(room.ensure_deletable().is_ok());
    }

    #[test]
    fn test_checkout_unknown_bill_leaves_room_untouched() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();
        room.clean = false;

        let err = room.complete_checkout("Z").unwrap_err();

        assert!(matches!(err, CoreError::NoMatchingBill { .. }));
        assert_eq!(room.waitlist.len(), 1);
        assert!(!room.clean);
        assert_eq!(room.current_billing_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_release_queued_stay_keeps_current() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();
        room.enqueue_stay(stay("B", 3, 5)).unwrap();
        room.billing_started = true;
        room.clean = false;

        assert_eq!(room.release_stay("B").unwrap(), CheckoutOutcome::Dequeued);
        assert_eq!(room.current_billing_id.as_deref(), Some("A"));
        assert!(room.billing_started);
        assert!(!room.clean);
    }

    #[test]
    fn test_start_billing_only_for_current_stay() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();
        room.enqueue_stay(stay("B", 3, 5)).unwrap();

        assert!(!room.start_billing("B").unwrap());
        assert!(!room.billing_started);
        assert!(room.start_billing("A").unwrap());
        assert!(room.billing_started);
        assert!(room.start_billing("Z").is_err());
    }

    #[test]
    fn test_room_in_use_cannot_be_deleted() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();

        assert!(matches!(
            room.ensure_deletable(),
            Err(CoreError::RoomInUse { queued: 1, .. })
        ));
    }

    #[test]
    fn test_renumber_only_when_waitlist_empty() {
        let mut room = Room::new("hotel", "101", None, "cat");
        room.enqueue_stay(stay("A", 1, 3)).unwrap();

        assert!(room.renumber(" 101 ").is_ok());
        assert!(matches!(
            room.renumber("201"),
            Err(CoreError::RoomInUse { queued: 1, .. })
        ));
        assert_eq!(room.number, "101");

        room.complete_checkout("A").unwrap();
        room.renumber("201").unwrap();
        assert_eq!(room.number, "201");
    }

    #[test]
    fn test_room_input_validation() {
        let input = RoomInput {
            number: "A-12".into(),
            floor: Some("1".into()),
            category_id: "cat".into(),
            clean: None,
            version: None,
        };
        assert!(input.validate().is_ok());

        let input = RoomInput {
            number: "A 12".into(),
            ..input
        };
        assert!(input.validate().is_err());

        let category = RoomCategoryInput {
            name: "Suite".into(),
            tariff: Money::from_rupees(-1),
            gst_rate: TaxRate::from_bps(1800),
        };
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_category_gst_split() {
        let now = Utc::now();
        let category = RoomCategory {
            id: "c".into(),
            tenant: "hotel".into(),
            name: "Deluxe".into(),
            tariff: Money::from_rupees(2500),
            gst_rate: TaxRate::from_bps(1200),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(category.gst().sgst, TaxRate::from_bps(600));
        assert_eq!(category.gst().cgst, TaxRate::from_bps(600));
    }
}
