//! # Booking Repository
//!
//! Booking lifecycle: create, amend, check in, cancel. Every operation that
//! touches more than the booking row runs in one transaction.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewBooking { rooms: [101, 102], 1 Mar → 3 Mar, state: "Goa" }          │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  profile.state ──► TaxRegime::for_states("Goa", profile.state)          │
//! │  booking row   ──► BK-20260301-0001                                     │
//! │  ledger row    ──► one Room line item per room:                         │
//! │                    category tariff × nights, category GST split         │
//! │  room 101      ──► enqueue_stay(guest = booking.id, bill = ledger.id)   │
//! │  room 102      ──► enqueue_stay(...)                                    │
//! │       │                                                                 │
//! │       ▼  COMMIT                                                         │
//! │  BookingReceipt { booking, ledger }                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use innkeep_core::booking::display_booking_id;
use innkeep_core::{
    Booking, BookingStatus, BookingUpdate, ChargeKind, CheckoutOutcome, Ledger, NewBooking,
    NewLineItem, QueuedStay, Room, TaxRegime,
};

use super::admin::load_tenant_state;
use super::ledger::{insert_ledger, load_ledger, save_ledger};
use super::room::{load_category, load_room_by_number, save_room_state};
use super::{from_json, to_json};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: String,
    tenant: String,
    booking_id: String,
    guest_name: String,
    mobile_no: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    original_check_out: NaiveDate,
    room_numbers: String,
    checked_in: bool,
    checked_out: bool,
    status: BookingStatus,
    state: Option<String>,
    gstin: Option<String>,
    adults: i64,
    children: i64,
    bill_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> DbResult<Self> {
        Ok(Booking {
            room_numbers: from_json("bookings.room_numbers", &row.room_numbers)?,
            id: row.id,
            tenant: row.tenant,
            booking_id: row.booking_id,
            guest_name: row.guest_name,
            mobile_no: row.mobile_no,
            check_in: row.check_in,
            check_out: row.check_out,
            original_check_out: row.original_check_out,
            checked_in: row.checked_in,
            checked_out: row.checked_out,
            status: row.status,
            state: row.state,
            gstin: row.gstin,
            adults: u32::try_from(row.adults).unwrap_or(1),
            children: u32::try_from(row.children).unwrap_or(0),
            bill_id: row.bill_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, tenant, booking_id, guest_name, mobile_no, check_in, \
    check_out, original_check_out, room_numbers, checked_in, checked_out, status, state, \
    gstin, adults, children, bill_id, created_at, updated_at";

/// A new booking together with its opening ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking: Booking,
    pub ledger: Ledger,
}

// =============================================================================
// Shared Helpers
// =============================================================================

pub(crate) async fn load_booking(
    conn: &mut SqliteConnection,
    tenant: &str,
    id: &str,
) -> DbResult<Booking> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE tenant = ?1 AND id = ?2");
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(tenant)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Booking", id))?
        .try_into()
}

/// Starts billing for a promoted stay whose guest checked in while the
/// room was still occupied. Guest ids are booking ids.
pub(crate) async fn start_promoted_billing(
    conn: &mut SqliteConnection,
    tenant: &str,
    room: &mut Room,
    outcome: &CheckoutOutcome,
) -> DbResult<()> {
    let CheckoutOutcome::Promoted(stay) = outcome else {
        return Ok(());
    };

    let guest = load_booking(conn, tenant, &stay.guest_id).await?;
    if guest.checked_in && room.start_billing(&stay.bill_id)? {
        info!(room = %room.number, booking = %guest.booking_id, "Billing started for promoted stay");
    }
    Ok(())
}

async fn insert_booking(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO bookings (id, tenant, booking_id, guest_name, mobile_no, check_in,
            check_out, original_check_out, room_numbers, checked_in, checked_out, status,
            state, gstin, adults, children, bill_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
    )
    .bind(&booking.id)
    .bind(&booking.tenant)
    .bind(&booking.booking_id)
    .bind(&booking.guest_name)
    .bind(&booking.mobile_no)
    .bind(booking.check_in)
    .bind(booking.check_out)
    .bind(booking.original_check_out)
    .bind(to_json("bookings.room_numbers", &booking.room_numbers)?)
    .bind(booking.checked_in)
    .bind(booking.checked_out)
    .bind(booking.status)
    .bind(&booking.state)
    .bind(&booking.gstin)
    .bind(i64::from(booking.adults))
    .bind(i64::from(booking.children))
    .bind(&booking.bill_id)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes back the mutable fields of a booking.
pub(crate) async fn save_booking(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE bookings SET
            guest_name = ?1, mobile_no = ?2, check_out = ?3, checked_in = ?4,
            checked_out = ?5, gstin = ?6, adults = ?7, children = ?8, updated_at = ?9
         WHERE id = ?10 AND tenant = ?11",
    )
    .bind(&booking.guest_name)
    .bind(&booking.mobile_no)
    .bind(booking.check_out)
    .bind(booking.checked_in)
    .bind(booking.checked_out)
    .bind(&booking.gstin)
    .bind(i64::from(booking.adults))
    .bind(i64::from(booking.children))
    .bind(booking.updated_at)
    .bind(&booking.id)
    .bind(&booking.tenant)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Booking", &booking.id));
    }
    Ok(())
}

async fn next_booking_id(conn: &mut SqliteConnection, tenant: &str, today: NaiveDate) -> DbResult<String> {
    let prefix = format!("BK-{}-%", today.format("%Y%m%d"));
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE tenant = ?1 AND booking_id LIKE ?2",
    )
    .bind(tenant)
    .bind(prefix)
    .fetch_one(&mut *conn)
    .await?;

    let sequence = u32::try_from(count + 1).unwrap_or(u32::MAX);
    Ok(display_booking_id(today, sequence))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bookings.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Lists the tenant's bookings by check-in date, latest first.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE tenant = ?1
             ORDER BY check_in DESC, created_at DESC"
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Booking> {
        let mut conn = self.pool.acquire().await?;
        load_booking(&mut conn, tenant, id).await
    }

    /// Creates a booking, its ledger with the room tariff posted, and a
    /// queued stay on every booked room.
    ///
    /// ## Errors
    /// - `Validation` for a malformed request
    /// - `NotFound` if any room number doesn't exist for the tenant
    /// - `CoreError::DuplicateStay` should the ids ever collide
    pub async fn create(
        &self,
        tenant: &str,
        request: NewBooking,
        today: NaiveDate,
    ) -> DbResult<BookingReceipt> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let regime = match load_tenant_state(&mut tx, tenant).await? {
            Some(home) => TaxRegime::for_states(request.state.as_deref(), &home),
            None => TaxRegime::IntraState,
        };

        let mut rooms = Vec::with_capacity(request.room_numbers.len());
        for number in &request.room_numbers {
            let room = load_room_by_number(&mut tx, tenant, number.trim()).await?;
            let category = load_category(&mut tx, tenant, &room.category_id).await?;
            rooms.push((room, category));
        }

        let display_id = next_booking_id(&mut tx, tenant, today).await?;
        let mut booking = Booking::from_new(tenant, display_id, "", request);
        let mut ledger = Ledger::new(
            tenant,
            booking.id.clone(),
            booking.room_numbers.clone(),
            regime,
            booking.check_in,
        );
        booking.bill_id = ledger.id.clone();

        let nights = booking.nights();
        for (room_index, (room, category)) in rooms.iter().enumerate() {
            let gst = category.gst();
            ledger.add_line_item(NewLineItem {
                room_index,
                kind: ChargeKind::Room,
                name: format!("Room {} ({})", room.number, category.name),
                unit_price: category.tariff,
                quantity: nights,
                sgst_rate: gst.sgst,
                cgst_rate: gst.cgst,
            })?;
        }

        insert_booking(&mut tx, &booking).await?;
        insert_ledger(&mut tx, &ledger).await?;

        for (room, _) in rooms.iter_mut() {
            room.enqueue_stay(QueuedStay {
                guest_id: booking.id.clone(),
                bill_id: ledger.id.clone(),
                check_in: booking.check_in,
                check_out: booking.check_out,
            })?;
            save_room_state(&mut tx, room).await?;
        }

        tx.commit().await?;

        info!(
            tenant = %tenant,
            booking = %booking.booking_id,
            ledger = %ledger.id,
            rooms = booking.room_numbers.len(),
            total = %ledger.total_amount,
            "Booking created"
        );
        Ok(BookingReceipt { booking, ledger })
    }

    /// Applies front-desk edits. A moved check-out date is copied onto the
    /// booking's queued stays; the posted tariff is left as billed.
    pub async fn update(&self, tenant: &str, id: &str, update: BookingUpdate) -> DbResult<Booking> {
        let mut tx = self.pool.begin().await?;
        let mut booking = load_booking(&mut tx, tenant, id).await?;

        let moved = booking.apply_update(update)?;

        if moved {
            for number in &booking.room_numbers {
                let mut room = load_room_by_number(&mut tx, tenant, number).await?;
                let mut touched = false;
                for stay in room.waitlist.iter_mut().filter(|s| s.bill_id == booking.bill_id) {
                    stay.check_out = booking.check_out;
                    touched = true;
                }
                if touched {
                    save_room_state(&mut tx, &mut room).await?;
                }
            }
        }

        save_booking(&mut tx, &booking).await?;
        tx.commit().await?;

        debug!(booking = %booking.booking_id, check_out_moved = moved, "Booking updated");
        Ok(booking)
    }

    /// Checks the guest in and starts billing on every room where this
    /// stay is current. Rooms still occupied by an earlier guest keep the
    /// stay queued.
    pub async fn check_in(&self, tenant: &str, id: &str) -> DbResult<Booking> {
        let mut tx = self.pool.begin().await?;
        let mut booking = load_booking(&mut tx, tenant, id).await?;
        booking.check_in()?;

        for number in &booking.room_numbers {
            let mut room = load_room_by_number(&mut tx, tenant, number).await?;
            if room.start_billing(&booking.bill_id)? {
                save_room_state(&mut tx, &mut room).await?;
            } else {
                info!(
                    room = %room.number,
                    booking = %booking.booking_id,
                    "Room still occupied, stay remains queued"
                );
            }
        }

        save_booking(&mut tx, &booking).await?;
        tx.commit().await?;

        info!(booking = %booking.booking_id, "Guest checked in");
        Ok(booking)
    }

    /// Cancels the booking: the ledger is marked cancelled and the stay
    /// leaves every room's waitlist.
    pub async fn cancel(&self, tenant: &str, id: &str) -> DbResult<Ledger> {
        let mut tx = self.pool.begin().await?;
        let booking = load_booking(&mut tx, tenant, id).await?;
        booking.ensure_cancellable()?;

        let mut ledger = load_ledger(&mut tx, tenant, &booking.bill_id).await?;
        ledger.cancel()?;

        for number in &booking.room_numbers {
            let mut room = load_room_by_number(&mut tx, tenant, number).await?;
            let outcome = room.release_stay(&ledger.id)?;
            start_promoted_billing(&mut tx, tenant, &mut room, &outcome).await?;
            save_room_state(&mut tx, &mut room).await?;
        }

        save_ledger(&mut tx, &mut ledger).await?;
        tx.commit().await?;

        info!(booking = %booking.booking_id, ledger = %ledger.id, "Booking cancelled");
        Ok(ledger)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
