//! # Room Repository
//!
//! Room categories, rooms and their waitlists.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rooms                           room_stays                             │
//! │  ┌──────────────────────────┐    ┌─────────────────────────────────┐    │
//! │  │ id | number | occupied   │    │ room_id | position | bill_id    │    │
//! │  │ current_* | version      │◄───│ guest_id | check_in | check_out │    │
//! │  └──────────────────────────┘    └─────────────────────────────────┘    │
//! │                                                                         │
//! │  position 0 is the current stay. A room write replaces all of its       │
//! │  room_stays rows in the same statement batch as the version bump.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use innkeep_core::{Money, Occupancy, QueuedStay, Room, RoomCategory, RoomCategoryInput, RoomInput};

use super::{expect_version, expect_written, tax_rate};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    tenant: String,
    name: String,
    tariff_paise: i64,
    gst_bps: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for RoomCategory {
    fn from(row: CategoryRow) -> Self {
        RoomCategory {
            id: row.id,
            tenant: row.tenant,
            name: row.name,
            tariff: Money::from_paise(row.tariff_paise),
            gst_rate: tax_rate(row.gst_bps),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: String,
    tenant: String,
    number: String,
    floor: Option<String>,
    category_id: String,
    occupied: Occupancy,
    clean: bool,
    billing_started: bool,
    current_guest_id: Option<String>,
    current_billing_id: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self, waitlist: Vec<QueuedStay>) -> Room {
        Room {
            id: self.id,
            tenant: self.tenant,
            number: self.number,
            floor: self.floor,
            category_id: self.category_id,
            occupied: self.occupied,
            clean: self.clean,
            billing_started: self.billing_started,
            current_guest_id: self.current_guest_id,
            current_billing_id: self.current_billing_id,
            waitlist,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StayRow {
    room_id: String,
    guest_id: String,
    bill_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl From<StayRow> for QueuedStay {
    fn from(row: StayRow) -> Self {
        QueuedStay {
            guest_id: row.guest_id,
            bill_id: row.bill_id,
            check_in: row.check_in,
            check_out: row.check_out,
        }
    }
}

const ROOM_COLUMNS: &str = "id, tenant, number, floor, category_id, occupied, clean, \
    billing_started, current_guest_id, current_billing_id, version, created_at, updated_at";

// =============================================================================
// Shared Helpers
// =============================================================================

/// Loads a category, scoped to the tenant.
pub(crate) async fn load_category(
    conn: &mut SqliteConnection,
    tenant: &str,
    id: &str,
) -> DbResult<RoomCategory> {
    sqlx::query_as::<_, CategoryRow>(
        "SELECT id, tenant, name, tariff_paise, gst_bps, created_at, updated_at
         FROM room_categories WHERE tenant = ?1 AND id = ?2",
    )
    .bind(tenant)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .map(RoomCategory::from)
    .ok_or_else(|| DbError::not_found("Room category", id))
}

async fn load_waitlist(conn: &mut SqliteConnection, room_id: &str) -> DbResult<Vec<QueuedStay>> {
    let rows = sqlx::query_as::<_, StayRow>(
        "SELECT room_id, guest_id, bill_id, check_in, check_out
         FROM room_stays WHERE room_id = ?1 ORDER BY position",
    )
    .bind(room_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(QueuedStay::from).collect())
}

/// Loads a room with its waitlist by id.
pub(crate) async fn load_room(
    conn: &mut SqliteConnection,
    tenant: &str,
    id: &str,
) -> DbResult<Room> {
    let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE tenant = ?1 AND id = ?2");
    let row = sqlx::query_as::<_, RoomRow>(&sql)
        .bind(tenant)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Room", id))?;

    let waitlist = load_waitlist(conn, &row.id).await?;
    Ok(row.into_room(waitlist))
}

/// Loads a room with its waitlist by room number.
pub(crate) async fn load_room_by_number(
    conn: &mut SqliteConnection,
    tenant: &str,
    number: &str,
) -> DbResult<Room> {
    let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE tenant = ?1 AND number = ?2");
    let row = sqlx::query_as::<_, RoomRow>(&sql)
        .bind(tenant)
        .bind(number)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Room", number))?;

    let waitlist = load_waitlist(conn, &row.id).await?;
    Ok(row.into_room(waitlist))
}

/// Writes a room and its full waitlist if nobody else wrote it since it was
/// loaded. Bumps `room.version` on success.
///
/// ## Errors
/// `DbError::Conflict` when the stored version moved on.
pub(crate) async fn save_room_state(conn: &mut SqliteConnection, room: &mut Room) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE rooms SET
            number = ?1, floor = ?2, category_id = ?3, occupied = ?4, clean = ?5,
            billing_started = ?6, current_guest_id = ?7, current_billing_id = ?8,
            version = version + 1, updated_at = ?9
         WHERE id = ?10 AND tenant = ?11 AND version = ?12",
    )
    .bind(&room.number)
    .bind(&room.floor)
    .bind(&room.category_id)
    .bind(room.occupied)
    .bind(room.clean)
    .bind(room.billing_started)
    .bind(&room.current_guest_id)
    .bind(&room.current_billing_id)
    .bind(now)
    .bind(&room.id)
    .bind(&room.tenant)
    .bind(room.version)
    .execute(&mut *conn)
    .await?;

    expect_written(result, "Room", &room.number)?;

    sqlx::query("DELETE FROM room_stays WHERE room_id = ?1")
        .bind(&room.id)
        .execute(&mut *conn)
        .await?;

    for (position, stay) in room.waitlist.iter().enumerate() {
        sqlx::query(
            "INSERT INTO room_stays (room_id, position, guest_id, bill_id, check_in, check_out)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&room.id)
        .bind(position as i64)
        .bind(&stay.guest_id)
        .bind(&stay.bill_id)
        .bind(stay.check_in)
        .bind(stay.check_out)
        .execute(&mut *conn)
        .await?;
    }

    room.version += 1;
    room.updated_at = now;

    debug!(
        room = %room.number,
        version = room.version,
        queued = room.waitlist.len(),
        "Room state saved"
    );
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for room categories and rooms.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.rooms();
///
/// let category = repo.create_category(tenant, input).await?;
/// let rooms = repo.list(tenant).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self, tenant: &str) -> DbResult<Vec<RoomCategory>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, tenant, name, tariff_paise, gst_bps, created_at, updated_at
             FROM room_categories WHERE tenant = ?1 ORDER BY name",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RoomCategory::from).collect())
    }

    pub async fn get_category(&self, tenant: &str, id: &str) -> DbResult<RoomCategory> {
        let mut conn = self.pool.acquire().await?;
        load_category(&mut conn, tenant, id).await
    }

    pub async fn create_category(
        &self,
        tenant: &str,
        input: RoomCategoryInput,
    ) -> DbResult<RoomCategory> {
        input.validate()?;

        let now = Utc::now();
        let category = RoomCategory {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            name: input.name.trim().to_string(),
            tariff: input.tariff,
            gst_rate: input.gst_rate,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO room_categories (id, tenant, name, tariff_paise, gst_bps, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&category.id)
        .bind(&category.tenant)
        .bind(&category.name)
        .bind(category.tariff.paise())
        .bind(i64::from(category.gst_rate.bps()))
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("room category", &category.name),
            other => other,
        })?;

        debug!(id = %category.id, name = %category.name, "Room category created");
        Ok(category)
    }

    /// Updates a category. Rooms pick up the new tariff on their next booking;
    /// ledgers already posted keep the old price.
    pub async fn update_category(
        &self,
        tenant: &str,
        id: &str,
        input: RoomCategoryInput,
    ) -> DbResult<RoomCategory> {
        input.validate()?;

        let result = sqlx::query(
            "UPDATE room_categories SET name = ?1, tariff_paise = ?2, gst_bps = ?3, updated_at = ?4
             WHERE tenant = ?5 AND id = ?6",
        )
        .bind(input.name.trim())
        .bind(input.tariff.paise())
        .bind(i64::from(input.gst_rate.bps()))
        .bind(Utc::now())
        .bind(tenant)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("room category", input.name.trim()),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room category", id));
        }

        self.get_category(tenant, id).await
    }

    // -------------------------------------------------------------------------
    // Rooms
    // -------------------------------------------------------------------------

    /// Lists the tenant's rooms with their waitlists, ordered by room number.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE tenant = ?1 ORDER BY number");
        let rows = sqlx::query_as::<_, RoomRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        let stays = sqlx::query_as::<_, StayRow>(
            "SELECT s.room_id, s.guest_id, s.bill_id, s.check_in, s.check_out
             FROM room_stays s
             INNER JOIN rooms r ON r.id = s.room_id
             WHERE r.tenant = ?1
             ORDER BY s.room_id, s.position",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        let mut waitlists: HashMap<String, Vec<QueuedStay>> = HashMap::new();
        for stay in stays {
            waitlists
                .entry(stay.room_id.clone())
                .or_default()
                .push(stay.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let waitlist = waitlists.remove(&row.id).unwrap_or_default();
                row.into_room(waitlist)
            })
            .collect())
    }

    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Room> {
        let mut conn = self.pool.acquire().await?;
        load_room(&mut conn, tenant, id).await
    }

    /// Creates a clean, vacant room.
    ///
    /// ## Errors
    /// - `NotFound` if the category doesn't belong to the tenant
    /// - `UniqueViolation` if the room number is taken
    pub async fn create(&self, tenant: &str, input: RoomInput) -> DbResult<Room> {
        input.validate()?;

        let mut conn = self.pool.acquire().await?;
        load_category(&mut conn, tenant, &input.category_id).await?;

        let room = Room::new(tenant, input.number.trim(), input.floor, input.category_id);

        sqlx::query(
            "INSERT INTO rooms (id, tenant, number, floor, category_id, occupied, clean,
                billing_started, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&room.id)
        .bind(&room.tenant)
        .bind(&room.number)
        .bind(&room.floor)
        .bind(&room.category_id)
        .bind(room.occupied)
        .bind(room.clean)
        .bind(room.billing_started)
        .bind(room.version)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("room number", &room.number),
            other => other,
        })?;

        info!(id = %room.id, number = %room.number, "Room created");
        Ok(room)
    }

    /// Updates the admin fields of a room (number, floor, category, clean).
    ///
    /// Occupancy and the waitlist are carried over untouched.
    ///
    /// ## Errors
    /// `CoreError::RoomInUse` when renumbering a room with queued stays.
    pub async fn update(&self, tenant: &str, id: &str, input: RoomInput) -> DbResult<Room> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let mut room = load_room(&mut tx, tenant, id).await?;
        expect_version("Room", &room.number, input.version, room.version)?;

        if room.category_id != input.category_id {
            load_category(&mut tx, tenant, &input.category_id).await?;
        }

        room.renumber(&input.number)?;
        room.floor = input.floor;
        room.category_id = input.category_id;
        if let Some(clean) = input.clean {
            room.clean = clean;
        }

        let number = room.number.clone();
        save_room_state(&mut tx, &mut room)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => DbError::duplicate("room number", &number),
                other => other,
            })?;
        tx.commit().await?;

        debug!(id = %room.id, version = room.version, "Room updated");
        Ok(room)
    }

    /// Deletes a room with an empty waitlist.
    ///
    /// ## Errors
    /// `CoreError::RoomInUse` while any stay is queued.
    pub async fn delete(&self, tenant: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let room = load_room(&mut tx, tenant, id).await?;
        room.ensure_deletable()?;

        let result = sqlx::query("DELETE FROM rooms WHERE id = ?1 AND tenant = ?2 AND version = ?3")
            .bind(&room.id)
            .bind(tenant)
            .bind(room.version)
            .execute(&mut *tx)
            .await?;
        expect_written(result, "Room", &room.number)?;

        tx.commit().await?;

        info!(id = %room.id, number = %room.number, "Room deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
