//! # Ledger Repository
//!
//! Billing ledgers, their line items and payment history.
//!
//! ## Complete Bill
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_bill(tenant, bill_id, today)        ONE transaction           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── load ledger          ensure_completable(today): due == 0, open,   │
//! │   │                        stay started                                 │
//! │   ├── load booking         mark_checked_out                             │
//! │   ├── for room in ledger.room_numbers:                                  │
//! │   │     load room          complete_checkout(bill_id) → promote next    │
//! │   │     save room          UPDATE ... WHERE version = ?                 │
//! │   ├── ledger.mark_paid     UPDATE ... WHERE version = ?                 │
//! │   └── save booking                                                      │
//! │  COMMIT                    any error above rolls every record back      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items and payments are append-only, so a ledger write inserts the rows
//! it doesn't have yet and never rewrites old ones.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use innkeep_core::{
    ChargeKind, CheckoutOutcome, Ledger, LineItem, Money, NewLineItem, PaymentEntry, TaxRegime,
};

use super::booking::{load_booking, save_booking, start_promoted_billing};
use super::room::{load_room_by_number, save_room_state};
use super::{expect_version, expect_written, from_json, tax_rate, to_json};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: String,
    tenant: String,
    booking_id: String,
    room_numbers: String,
    regime: TaxRegime,
    check_in: NaiveDate,
    total_paise: i64,
    advanced_paise: i64,
    due_paise: i64,
    bill_paid: bool,
    cancelled: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LedgerRow {
    fn into_ledger(self, items: Vec<LineItem>, payments: Vec<PaymentEntry>) -> DbResult<Ledger> {
        Ok(Ledger {
            room_numbers: from_json("ledgers.room_numbers", &self.room_numbers)?,
            id: self.id,
            tenant: self.tenant,
            booking_id: self.booking_id,
            regime: self.regime,
            check_in: self.check_in,
            items,
            payments,
            total_amount: Money::from_paise(self.total_paise),
            amount_advanced: Money::from_paise(self.advanced_paise),
            due_amount: Money::from_paise(self.due_paise),
            bill_paid: self.bill_paid,
            cancelled: self.cancelled,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    ledger_id: String,
    room_index: i64,
    kind: ChargeKind,
    name: String,
    unit_price_paise: i64,
    quantity: i64,
    sgst_bps: i64,
    cgst_bps: i64,
}

impl TryFrom<ItemRow> for LineItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        let room_index = usize::try_from(row.room_index).map_err(|_| DbError::Serialization {
            column: "ledger_items.room_index".to_string(),
            message: format!("negative room index {} on item {}", row.room_index, row.id),
        })?;

        Ok(LineItem {
            id: row.id,
            room_index,
            kind: row.kind,
            name: row.name,
            unit_price: Money::from_paise(row.unit_price_paise),
            quantity: row.quantity,
            sgst_rate: tax_rate(row.sgst_bps),
            cgst_rate: tax_rate(row.cgst_bps),
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    ledger_id: String,
    paid_at: DateTime<Utc>,
    mode: String,
    amount_paise: i64,
    remark: Option<String>,
}

impl From<PaymentRow> for PaymentEntry {
    fn from(row: PaymentRow) -> Self {
        PaymentEntry {
            id: row.id,
            paid_at: row.paid_at,
            mode: row.mode,
            amount: Money::from_paise(row.amount_paise),
            remark: row.remark,
        }
    }
}

const LEDGER_COLUMNS: &str = "id, tenant, booking_id, room_numbers, regime, check_in, \
    total_paise, advanced_paise, due_paise, bill_paid, cancelled, version, created_at, updated_at";

const ITEM_COLUMNS: &str = "i.id, i.ledger_id, i.room_index, i.kind, i.name, \
    i.unit_price_paise, i.quantity, i.sgst_bps, i.cgst_bps";

const PAYMENT_COLUMNS: &str = "p.id, p.ledger_id, p.paid_at, p.mode, p.amount_paise, p.remark";

// =============================================================================
// Shared Helpers
// =============================================================================

/// Loads a ledger with its items and payments.
///
/// Stored totals that disagree with the rows are logged, not corrected.
pub(crate) async fn load_ledger(
    conn: &mut SqliteConnection,
    tenant: &str,
    id: &str,
) -> DbResult<Ledger> {
    let sql = format!("SELECT {LEDGER_COLUMNS} FROM ledgers WHERE tenant = ?1 AND id = ?2");
    let row = sqlx::query_as::<_, LedgerRow>(&sql)
        .bind(tenant)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Ledger", id))?;

    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM ledger_items i WHERE i.ledger_id = ?1 ORDER BY i.position"
    );
    let items = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM ledger_payments p WHERE p.ledger_id = ?1 ORDER BY p.position"
    );
    let payments = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    let items = items
        .into_iter()
        .map(LineItem::try_from)
        .collect::<DbResult<Vec<_>>>()?;
    let ledger = row.into_ledger(
        items,
        payments.into_iter().map(PaymentEntry::from).collect(),
    )?;

    if let Some(drift) = ledger.verify_totals() {
        warn!(
            ledger = %ledger.id,
            stored_due = %drift.stored_due,
            computed_due = %drift.computed_due,
            "Ledger totals disagree with items and payments"
        );
    }

    Ok(ledger)
}

/// Inserts a new ledger with whatever items and payments it already has.
pub(crate) async fn insert_ledger(conn: &mut SqliteConnection, ledger: &Ledger) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO ledgers (id, tenant, booking_id, room_numbers, regime, check_in,
            total_paise, advanced_paise, due_paise, bill_paid, cancelled, version,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(&ledger.id)
    .bind(&ledger.tenant)
    .bind(&ledger.booking_id)
    .bind(to_json("ledgers.room_numbers", &ledger.room_numbers)?)
    .bind(ledger.regime)
    .bind(ledger.check_in)
    .bind(ledger.total_amount.paise())
    .bind(ledger.amount_advanced.paise())
    .bind(ledger.due_amount.paise())
    .bind(ledger.bill_paid)
    .bind(ledger.cancelled)
    .bind(ledger.version)
    .bind(ledger.created_at)
    .bind(ledger.updated_at)
    .execute(&mut *conn)
    .await?;

    append_rows(conn, ledger).await
}

/// Writes the ledger's aggregates and flags, and appends new items and
/// payments, if nobody else wrote it since it was loaded.
///
/// ## Errors
/// `DbError::Conflict` when the stored version moved on.
pub(crate) async fn save_ledger(conn: &mut SqliteConnection, ledger: &mut Ledger) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE ledgers SET
            total_paise = ?1, advanced_paise = ?2, due_paise = ?3, bill_paid = ?4,
            cancelled = ?5, version = version + 1, updated_at = ?6
         WHERE id = ?7 AND tenant = ?8 AND version = ?9",
    )
    .bind(ledger.total_amount.paise())
    .bind(ledger.amount_advanced.paise())
    .bind(ledger.due_amount.paise())
    .bind(ledger.bill_paid)
    .bind(ledger.cancelled)
    .bind(ledger.updated_at)
    .bind(&ledger.id)
    .bind(&ledger.tenant)
    .bind(ledger.version)
    .execute(&mut *conn)
    .await?;

    expect_written(result, "Ledger", &ledger.id)?;
    append_rows(conn, ledger).await?;

    ledger.version += 1;
    debug!(ledger = %ledger.id, version = ledger.version, "Ledger saved");
    Ok(())
}

async fn append_rows(conn: &mut SqliteConnection, ledger: &Ledger) -> DbResult<()> {
    for (position, item) in ledger.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO ledger_items (id, ledger_id, position, room_index, kind, name,
                unit_price_paise, quantity, sgst_bps, cgst_bps)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&item.id)
        .bind(&ledger.id)
        .bind(position as i64)
        .bind(item.room_index as i64)
        .bind(item.kind)
        .bind(&item.name)
        .bind(item.unit_price.paise())
        .bind(item.quantity)
        .bind(i64::from(item.sgst_rate.bps()))
        .bind(i64::from(item.cgst_rate.bps()))
        .execute(&mut *conn)
        .await?;
    }

    for (position, payment) in ledger.payments.iter().enumerate() {
        sqlx::query(
            "INSERT INTO ledger_payments (id, ledger_id, position, paid_at, mode, amount_paise, remark)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&payment.id)
        .bind(&ledger.id)
        .bind(position as i64)
        .bind(payment.paid_at)
        .bind(&payment.mode)
        .bind(payment.amount.paise())
        .bind(&payment.remark)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for billing ledgers.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.ledgers();
///
/// repo.add_line_item(tenant, &bill_id, item, Some(version)).await?;
/// repo.record_payment(tenant, &bill_id, Money::from_rupees(500), "UPI", None, None).await?;
/// repo.complete_bill(tenant, &bill_id, today).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Lists the tenant's ledgers, newest first.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<Ledger>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledgers WHERE tenant = ?1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM ledger_items i
             INNER JOIN ledgers l ON l.id = i.ledger_id
             WHERE l.tenant = ?1 ORDER BY i.ledger_id, i.position"
        );
        let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
        for row in sqlx::query_as::<_, ItemRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?
        {
            items
                .entry(row.ledger_id.clone())
                .or_default()
                .push(LineItem::try_from(row)?);
        }

        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM ledger_payments p
             INNER JOIN ledgers l ON l.id = p.ledger_id
             WHERE l.tenant = ?1 ORDER BY p.ledger_id, p.position"
        );
        let mut payments: HashMap<String, Vec<PaymentEntry>> = HashMap::new();
        for row in sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?
        {
            payments.entry(row.ledger_id.clone()).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let i = items.remove(&row.id).unwrap_or_default();
                let p = payments.remove(&row.id).unwrap_or_default();
                row.into_ledger(i, p)
            })
            .collect()
    }

    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Ledger> {
        let mut conn = self.pool.acquire().await?;
        load_ledger(&mut conn, tenant, id).await
    }

    /// Appends a line item.
    ///
    /// `expected_version`, when given, must match the stored ledger.
    pub async fn add_line_item(
        &self,
        tenant: &str,
        id: &str,
        item: NewLineItem,
        expected_version: Option<i64>,
    ) -> DbResult<Ledger> {
        let mut tx = self.pool.begin().await?;
        let mut ledger = load_ledger(&mut tx, tenant, id).await?;
        expect_version("Ledger", id, expected_version, ledger.version)?;

        let regime = ledger.regime;
        let total = ledger.add_line_item(item)?.total(regime);
        save_ledger(&mut tx, &mut ledger).await?;
        tx.commit().await?;

        debug!(ledger = %id, item_total = %total, due = %ledger.due_amount, "Line item added");
        Ok(ledger)
    }

    /// Records a payment; `due` is recomputed in the same write.
    pub async fn record_payment(
        &self,
        tenant: &str,
        id: &str,
        amount: Money,
        mode: &str,
        remark: Option<String>,
        expected_version: Option<i64>,
    ) -> DbResult<Ledger> {
        let mut tx = self.pool.begin().await?;
        let mut ledger = load_ledger(&mut tx, tenant, id).await?;
        expect_version("Ledger", id, expected_version, ledger.version)?;

        if let Err(e) = ledger.record_payment(amount, mode, remark, Utc::now()) {
            warn!(ledger = %id, amount = %amount, error = %e, "Payment rejected");
            return Err(e.into());
        }
        save_ledger(&mut tx, &mut ledger).await?;
        tx.commit().await?;

        info!(ledger = %id, amount = %amount, due = %ledger.due_amount, "Payment recorded");
        Ok(ledger)
    }

    /// Completes a settled bill: ledger paid, booking checked out, every
    /// room checked out with the next queued stay promoted.
    ///
    /// ## Errors
    /// - `CoreError::BillNotSettled` while money is owed
    /// - `CoreError::StayNotStarted` before the check-in date
    /// - `CoreError::NoMatchingBill` if a room no longer queues this bill
    /// - `DbError::Conflict` if any record changed concurrently
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn complete_bill(&self, tenant: &str, id: &str, today: NaiveDate) -> DbResult<Ledger> {
        let mut tx = self.pool.begin().await?;

        let mut ledger = load_ledger(&mut tx, tenant, id).await?;
        if let Err(e) = ledger.ensure_completable(today) {
            warn!(ledger = %id, error = %e, "Bill completion rejected");
            return Err(e.into());
        }

        let mut booking = load_booking(&mut tx, tenant, &ledger.booking_id).await?;
        booking.mark_checked_out();

        for number in &ledger.room_numbers {
            let mut room = load_room_by_number(&mut tx, tenant, number).await?;
            let outcome = room.complete_checkout(&ledger.id)?;
            match &outcome {
                CheckoutOutcome::Promoted(next) => info!(
                    room = %room.number,
                    bill = %next.bill_id,
                    "Next queued stay promoted"
                ),
                CheckoutOutcome::Vacated => info!(room = %room.number, "Room vacated"),
                CheckoutOutcome::Dequeued => debug!(room = %room.number, "Queued stay removed"),
            }
            start_promoted_billing(&mut tx, tenant, &mut room, &outcome).await?;
            save_room_state(&mut tx, &mut room).await?;
        }

        ledger.mark_paid();
        save_ledger(&mut tx, &mut ledger).await?;
        save_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        info!(
            ledger = %ledger.id,
            booking = %booking.booking_id,
            total = %ledger.total_amount,
            "Bill completed"
        );
        Ok(ledger)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, date, TENANT};
    use innkeep_core::{CoreError, Occupancy, TaxRate};

    fn laundry(room_index: usize) -> NewLineItem {
        NewLineItem {
            room_index,
            kind: ChargeKind::Service,
            name: "Laundry".into(),
            unit_price: Money::from_rupees(100),
            quantity: 2,
            sgst_rate: TaxRate::from_bps(600),
            cgst_rate: TaxRate::from_bps(600),
        }
    }

    #[tokio::test]
    async fn test_add_line_item_persists_totals() {
        let db = fixtures::hotel().await;
        let receipt = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap();
        let bill = receipt.ledger;

        let ledger = db
            .ledgers()
            .add_line_item(TENANT, &bill.id, laundry(0), Some(bill.version))
            .await
            .unwrap();

        // 2 nights × ₹1000 at 12% = ₹2240, plus ₹224 laundry
        assert_eq!(ledger.total_amount, Money::from_rupees(2464));
        assert_eq!(ledger.due_amount, Money::from_rupees(2464));

        let stored = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[1].name, "Laundry");
        assert_eq!(stored.version, bill.version + 1);
        assert!(stored.verify_totals().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let db = fixtures::hotel().await;
        let bill = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap()
            .ledger;

        db.ledgers()
            .add_line_item(TENANT, &bill.id, laundry(0), Some(bill.version))
            .await
            .unwrap();

        let err = db
            .ledgers()
            .add_line_item(TENANT, &bill.id, laundry(0), Some(bill.version))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let stored = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
    }

    #[tokio::test]
    async fn test_payment_capped_at_due() {
        let db = fixtures::hotel().await;
        let bill = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap()
            .ledger;

        let err = db
            .ledgers()
            .record_payment(TENANT, &bill.id, Money::from_rupees(5000), "Cash", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::PaymentExceedsDue { .. })));

        let ledger = db
            .ledgers()
            .record_payment(TENANT, &bill.id, Money::from_rupees(240), "UPI", None, None)
            .await
            .unwrap();
        assert_eq!(ledger.amount_advanced, Money::from_rupees(240));
        assert_eq!(ledger.due_amount, Money::from_rupees(2000));

        let stored = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        assert_eq!(stored.payments.len(), 1);
        assert_eq!(stored.payments[0].mode, "UPI");
    }

    #[tokio::test]
    async fn test_complete_bill_rejected_while_due() {
        let db = fixtures::hotel().await;
        let bill = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap()
            .ledger;

        let err = db
            .ledgers()
            .complete_bill(TENANT, &bill.id, date(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BillNotSettled { .. })));

        let room = fixtures::room(&db, "101").await;
        assert_eq!(room.current_billing_id.as_deref(), Some(bill.id.as_str()));
    }

    #[tokio::test]
    async fn test_complete_bill_promotes_next_stay() {
        let db = fixtures::hotel().await;
        let first = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101", "102"], 1, 3), date(1))
            .await
            .unwrap();
        let second = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 3, 5), date(1))
            .await
            .unwrap();

        db.bookings().check_in(TENANT, &first.booking.id).await.unwrap();

        let bill = first.ledger;
        db.ledgers()
            .record_payment(TENANT, &bill.id, bill.due_amount, "Card", None, None)
            .await
            .unwrap();

        let paid = db.ledgers().complete_bill(TENANT, &bill.id, date(3)).await.unwrap();
        assert!(paid.bill_paid);
        assert!(paid.due_amount.is_zero());

        let booking = db.bookings().get(TENANT, &first.booking.id).await.unwrap();
        assert!(booking.checked_out);

        let r101 = fixtures::room(&db, "101").await;
        assert_eq!(r101.waitlist.len(), 1);
        assert_eq!(r101.occupied, Occupancy::Confirmed);
        assert_eq!(r101.current_billing_id.as_deref(), Some(second.ledger.id.as_str()));
        assert!(!r101.billing_started);
        assert!(r101.clean);

        let r102 = fixtures::room(&db, "102").await;
        assert_eq!(r102.occupied, Occupancy::Vacant);
        assert!(r102.current_billing_id.is_none());

        let err = db
            .ledgers()
            .complete_bill(TENANT, &bill.id, date(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BillAlreadyPaid(_))));
    }

    #[test]
    fn test_negative_room_index_is_corrupt() {
        let row = ItemRow {
            id: "item-1".into(),
            ledger_id: "ledger-1".into(),
            room_index: -1,
            kind: ChargeKind::Food,
            name: "Dinner".into(),
            unit_price_paise: 10_000,
            quantity: 1,
            sgst_bps: 250,
            cgst_bps: 250,
        };

        let err = LineItem::try_from(row).unwrap_err();
        assert!(matches!(err, DbError::Serialization { ref column, .. } if column == "ledger_items.room_index"));
    }

    #[tokio::test]
    async fn test_oversized_price_rejected() {
        let db = fixtures::hotel().await;
        let bill = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 2), date(1))
            .await
            .unwrap()
            .ledger;

        let mut hall = laundry(0);
        hall.unit_price = Money::from_paise(i64::MAX / 2);
        hall.quantity = 3;

        let err = db
            .ledgers()
            .add_line_item(TENANT, &bill.id, hall, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let stored = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.total_amount, bill.total_amount);
    }

    #[tokio::test]
    async fn test_early_arrival_billed_once_promoted() {
        let db = fixtures::hotel().await;
        let first = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap();
        let second = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 3, 5), date(1))
            .await
            .unwrap();

        db.bookings().check_in(TENANT, &first.booking.id).await.unwrap();
        db.bookings().check_in(TENANT, &second.booking.id).await.unwrap();
        assert_eq!(
            fixtures::room(&db, "101").await.current_billing_id.as_deref(),
            Some(first.ledger.id.as_str())
        );

        let bill = first.ledger;
        db.ledgers()
            .record_payment(TENANT, &bill.id, bill.due_amount, "Cash", None, None)
            .await
            .unwrap();
        db.ledgers().complete_bill(TENANT, &bill.id, date(3)).await.unwrap();

        let room = fixtures::room(&db, "101").await;
        assert_eq!(room.current_billing_id.as_deref(), Some(second.ledger.id.as_str()));
        assert!(room.billing_started);
    }

    #[tokio::test]
    async fn test_complete_bill_rolls_back_on_missing_stay() {
        let db = fixtures::hotel().await;
        let receipt = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101", "102"], 1, 3), date(1))
            .await
            .unwrap();
        let bill = receipt.ledger;

        db.ledgers()
            .record_payment(TENANT, &bill.id, bill.due_amount, "Cash", None, None)
            .await
            .unwrap();

        // Knock the stay off room 102 behind the ledger's back.
        sqlx::query("DELETE FROM room_stays WHERE bill_id = ?1 AND room_id = (SELECT id FROM rooms WHERE number = '102')")
            .bind(&bill.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .ledgers()
            .complete_bill(TENANT, &bill.id, date(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NoMatchingBill { .. })));

        let ledger = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        assert!(!ledger.bill_paid);
        let booking = db.bookings().get(TENANT, &receipt.booking.id).await.unwrap();
        assert!(!booking.checked_out);
        let r101 = fixtures::room(&db, "101").await;
        assert_eq!(r101.waitlist.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let db = fixtures::hotel().await;
        db.bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 3), date(1))
            .await
            .unwrap();

        let ledgers = db.ledgers().list(TENANT).await.unwrap();
        assert_eq!(ledgers.len(), 1);
        assert_eq!(ledgers[0].items.len(), 1);
        assert!(db.ledgers().list("someone-else").await.unwrap().is_empty());
    }
}
