//! # Booking Module
//!
//! Guest stays: who is staying, in which rooms, for which dates.
//!
//! ## Stay Flags
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  created ──► checked_in = true ──► checked_out = true                   │
//! │                                                                         │
//! │  Both flags only ever go false → true. Cancellation lives on the        │
//! │  booking's ledger, not here.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check-out Amendments
//! A stay can be shortened but never extended past the check-out date it
//! was booked with (`original_check_out`), and never before check-in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_gstin, validate_mobile_no, validate_required, validate_stay_dates};
use crate::MAX_ROOMS_PER_BOOKING;

// =============================================================================
// Booking Status
// =============================================================================

/// Whether the rooms are confirmed for the guest or only held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum BookingStatus {
    #[default]
    Confirm,
    Block,
}

// =============================================================================
// New Booking
// =============================================================================

/// Reservation request from the front desk.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub guest_name: String,
    pub mobile_no: String,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
    pub room_numbers: Vec<String>,
    #[serde(default)]
    pub status: BookingStatus,

    /// Guest's state, compared with the hotel's to pick the tax regime.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

fn default_adults() -> u32 {
    1
}

impl NewBooking {
    /// Validates the request before any room or ledger is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("guest name", &self.guest_name)?;
        validate_mobile_no(&self.mobile_no)?;

        if let Some(gstin) = self.gstin.as_deref().filter(|g| !g.trim().is_empty()) {
            validate_gstin(gstin)?;
        }

        validate_stay_dates(self.check_in, self.check_out)?;

        if self.room_numbers.is_empty() {
            return Err(ValidationError::Required {
                field: "room numbers".to_string(),
            });
        }

        if self.room_numbers.len() > MAX_ROOMS_PER_BOOKING {
            return Err(ValidationError::OutOfRange {
                field: "room numbers".to_string(),
                min: 1,
                max: MAX_ROOMS_PER_BOOKING as i64,
            });
        }

        let numbers = self.trimmed_room_numbers();
        for (i, number) in numbers.iter().enumerate() {
            validate_required("room number", number)?;
            if numbers[..i].contains(number) {
                return Err(ValidationError::Duplicate {
                    field: "room number".to_string(),
                    value: number.clone(),
                });
            }
        }

        if self.adults < 1 {
            return Err(ValidationError::OutOfRange {
                field: "adults".to_string(),
                min: 1,
                max: i64::from(u32::MAX),
            });
        }

        Ok(())
    }

    /// Room numbers as rooms store them.
    pub fn trimmed_room_numbers(&self) -> Vec<String> {
        self.room_numbers.iter().map(|n| n.trim().to_string()).collect()
    }
}

/// Front-desk edits to an existing booking. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
}

// =============================================================================
// Booking
// =============================================================================

/// A guest stay across one or more rooms.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Also used as the guest id on room waitlists.
    pub id: String,
    pub tenant: String,

    /// Display id, `BK-YYYYMMDD-NNNN`.
    pub booking_id: String,
    pub guest_name: String,
    pub mobile_no: String,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
    #[ts(as = "String")]
    pub original_check_out: NaiveDate,
    pub room_numbers: Vec<String>,
    pub checked_in: bool,
    pub checked_out: bool,
    pub status: BookingStatus,
    pub state: Option<String>,
    pub gstin: Option<String>,
    pub adults: u32,
    pub children: u32,

    /// The booking's ledger.
    pub bill_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a booking from a validated request.
    pub fn from_new(
        tenant: impl Into<String>,
        booking_id: impl Into<String>,
        bill_id: impl Into<String>,
        new: NewBooking,
    ) -> Self {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.into(),
            booking_id: booking_id.into(),
            guest_name: new.guest_name.trim().to_string(),
            mobile_no: new.mobile_no.trim().to_string(),
            check_in: new.check_in,
            check_out: new.check_out,
            original_check_out: new.check_out,
            room_numbers: new.trimmed_room_numbers(),
            checked_in: false,
            checked_out: false,
            status: new.status,
            state: new.state.filter(|s| !s.is_empty()),
            gstin: new.gstin.filter(|g| !g.trim().is_empty()),
            adults: new.adults,
            children: new.children,
            bill_id: bill_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Nights billed for the stay; same-day stays count as one.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use innkeep_core::booking::nights_between;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
    /// assert_eq!(nights_between(d(1), d(4)), 3);
    /// assert_eq!(nights_between(d(1), d(1)), 1);
    /// ```
    pub fn nights(&self) -> i64 {
        nights_between(self.check_in, self.check_out)
    }

    /// Flags the guest as arrived.
    pub fn check_in(&mut self) -> CoreResult<()> {
        if self.checked_out {
            return Err(self.invalid_state("already checked out"));
        }
        if self.checked_in {
            return Err(self.invalid_state("already checked in"));
        }
        self.checked_in = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Flags the stay as finished. Called when the bill is completed.
    pub fn mark_checked_out(&mut self) {
        self.checked_out = true;
        self.updated_at = Utc::now();
    }

    /// Moves the check-out date within `[check_in, original_check_out]`.
    pub fn amend_check_out(&mut self, check_out: NaiveDate) -> CoreResult<()> {
        if self.checked_out {
            return Err(self.invalid_state("stay has ended"));
        }

        validate_stay_dates(self.check_in, check_out)?;

        if check_out > self.original_check_out {
            return Err(ValidationError::InvalidDateRange {
                field: "check_out".to_string(),
                reason: format!(
                    "{} is after the booked check-out {}",
                    check_out, self.original_check_out
                ),
            }
            .into());
        }

        self.check_out = check_out;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Applies front-desk edits. Returns true when the check-out date moved.
    pub fn apply_update(&mut self, update: BookingUpdate) -> CoreResult<bool> {
        if let Some(name) = &update.guest_name {
            validate_required("guest name", name)?;
        }
        if let Some(mobile) = &update.mobile_no {
            validate_mobile_no(mobile)?;
        }
        if let Some(gstin) = update.gstin.as_deref().filter(|g| !g.trim().is_empty()) {
            validate_gstin(gstin)?;
        }
        if update.adults == Some(0) {
            return Err(ValidationError::OutOfRange {
                field: "adults".to_string(),
                min: 1,
                max: i64::from(u32::MAX),
            }
            .into());
        }

        let moved = match update.check_out {
            Some(date) if date != self.check_out => {
                self.amend_check_out(date)?;
                true
            }
            _ => false,
        };

        if let Some(name) = update.guest_name {
            self.guest_name = name.trim().to_string();
        }
        if let Some(mobile) = update.mobile_no {
            self.mobile_no = mobile.trim().to_string();
        }
        if let Some(gstin) = update.gstin {
            self.gstin = Some(gstin).filter(|g| !g.trim().is_empty());
        }
        if let Some(adults) = update.adults {
            self.adults = adults;
        }
        if let Some(children) = update.children {
            self.children = children;
        }

        self.updated_at = Utc::now();
        Ok(moved)
    }

    /// Cancellation is only possible before the stay is closed.
    pub fn ensure_cancellable(&self) -> CoreResult<()> {
        if self.checked_out {
            return Err(self.invalid_state("cannot cancel a completed stay"));
        }
        Ok(())
    }

    fn invalid_state(&self, reason: &str) -> CoreError {
        CoreError::InvalidBookingState {
            booking_id: self.booking_id.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Nights between two dates, at least one.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

/// Formats a display booking id such as `BK-20260301-0007`.
pub fn display_booking_id(date: NaiveDate, sequence: u32) -> String {
    format!("BK-{}-{:04}", date.format("%Y%m%d"), sequence)
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

    fn request() -> NewBooking {
        NewBooking {
            guest_name: "Asha Rao".to_string(),
            mobile_no: "9876543210".to_string(),
            check_in: date(10),
            check_out: date(12),
            room_numbers: vec!["101".to_string(), "102".to_string()],
            status: BookingStatus::Confirm,
            state: Some("Karnataka".to_string()),
            gstin: None,
            adults: 2,
            children: 0,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_request_validation_failures() {
        let mut r = request();
        r.check_out = date(9);
        assert!(matches!(r.validate(), Err(ValidationError::InvalidDateRange { .. })));

        let mut r = request();
        r.room_numbers = vec!["101".to_string(), "101".to_string()];
        assert!(matches!(r.validate(), Err(ValidationError::Duplicate { .. })));

        let mut r = request();
        r.room_numbers.clear();
        assert!(r.validate().is_err());

        let mut r = request();
        r.adults = 0;
        assert!(r.validate().is_err());

        let mut r = request();
        r.gstin = Some("BAD".to_string());
        assert!(r.validate().is_err());

        let mut r = request();
        r.mobile_no = "123".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_room_numbers_are_trimmed() {
        let mut r = request();
        r.room_numbers = vec!["101".to_string(), " 101 ".to_string()];
        assert!(matches!(
            r.validate(),
            Err(ValidationError::Duplicate { ref value, .. }) if value == "101"
        ));

        r.room_numbers = vec![" 101".to_string(), "102 ".to_string()];
        assert!(r.validate().is_ok());
        let b = Booking::from_new("hotel", "BK-1", "bill", r);
        assert_eq!(b.room_numbers, vec!["101", "102"]);
    }

    #[test]
    fn test_request_json_defaults() {
        let json = r#"{
            "guestName": "Asha",
            "mobileNo": "9876543210",
            "checkIn": "2026-03-10",
            "checkOut": "2026-03-12",
            "roomNumbers": ["101"]
        }"#;
        let r: NewBooking = serde_json::from_str(json).unwrap();
        assert_eq!(r.adults, 1);
        assert_eq!(r.status, BookingStatus::Confirm);
        assert!(r.state.is_none());
    }

    #[test]
    fn test_check_in_is_monotonic() {
        let mut b = Booking::from_new("hotel", "BK-1", "bill", request());
        b.check_in().unwrap();
        assert!(b.checked_in);
        assert!(b.check_in().is_err());

        b.mark_checked_out();
        assert!(matches!(b.check_in(), Err(CoreError::InvalidBookingState { .. })));
        assert!(b.ensure_cancellable().is_err());
    }

    #[test]
    fn test_amend_check_out_bounds() {
        let mut b = Booking::from_new("hotel", "BK-1", "bill", request());

        assert!(b.amend_check_out(date(13)).is_err());
        assert!(b.amend_check_out(date(9)).is_err());
        b.amend_check_out(date(11)).unwrap();
        assert_eq!(b.check_out, date(11));
        assert_eq!(b.original_check_out, date(12));

        // back up to the original date is still allowed
        b.amend_check_out(date(12)).unwrap();
    }

    #[test]
    fn test_apply_update() {
        let mut b = Booking::from_new("hotel", "BK-1", "bill", request());

        let moved = b
            .apply_update(BookingUpdate {
                guest_name: Some("  Asha R. ".into()),
                children: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert!(!moved);
        assert_eq!(b.guest_name, "Asha R.");
        assert_eq!(b.children, 1);

        let moved = b
            .apply_update(BookingUpdate {
                check_out: Some(date(11)),
                ..Default::default()
            })
            .unwrap();
        assert!(moved);
        assert_eq!(b.check_out, date(11));

        let err = b.apply_update(BookingUpdate {
            adults: Some(0),
            guest_name: Some("Changed".into()),
            ..Default::default()
        });
        assert!(err.is_err());
        assert_eq!(b.guest_name, "Asha R.");
    }

    #[test]
    fn test_nights_and_display_id() {
        let b = Booking::from_new("hotel", "BK-1", "bill", request());
        assert_eq!(b.nights(), 2);
        assert_eq!(display_booking_id(date(1), 7), "BK-20260301-0007");
    }
}
