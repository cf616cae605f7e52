//! # Restaurant Repository
//!
//! Menu items, dining tables and orders.
//!
//! An order charged to a room posts its lines onto that room's ledger in
//! the same transaction that stores the order, so the restaurant total and
//! the ledger's food charges can't drift apart.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use innkeep_core::restaurant::price_order;
use innkeep_core::{
    CoreError, DiningTable, DiningTableInput, MenuItem, MenuItemInput, Money, NewRestaurantOrder,
    OrderLine, RestaurantOrder, TableStatus, TaxRegime,
};

use super::ledger::{load_ledger, save_ledger};
use super::{from_json, tax_rate, to_json};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: String,
    tenant: String,
    name: String,
    category: Option<String>,
    price_paise: i64,
    gst_bps: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuRow> for MenuItem {
    fn from(row: MenuRow) -> Self {
        MenuItem {
            id: row.id,
            tenant: row.tenant,
            name: row.name,
            category: row.category,
            price: Money::from_paise(row.price_paise),
            gst_rate: tax_rate(row.gst_bps),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TableRow {
    id: String,
    tenant: String,
    number: String,
    capacity: i64,
    status: TableStatus,
    created_at: DateTime<Utc>,
}

impl From<TableRow> for DiningTable {
    fn from(row: TableRow) -> Self {
        DiningTable {
            id: row.id,
            tenant: row.tenant,
            number: row.number,
            capacity: u32::try_from(row.capacity).unwrap_or_default(),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    tenant: String,
    order_number: String,
    table_id: Option<String>,
    room_bill_id: Option<String>,
    room_index: Option<i64>,
    lines: String,
    regime: TaxRegime,
    subtotal_paise: i64,
    tax_paise: i64,
    total_paise: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for RestaurantOrder {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(RestaurantOrder {
            lines: from_json("restaurant_orders.lines", &row.lines)?,
            id: row.id,
            tenant: row.tenant,
            order_number: row.order_number,
            table_id: row.table_id,
            room_bill_id: row.room_bill_id,
            room_index: row.room_index.and_then(|i| usize::try_from(i).ok()),
            regime: row.regime,
            subtotal: Money::from_paise(row.subtotal_paise),
            tax: Money::from_paise(row.tax_paise),
            total: Money::from_paise(row.total_paise),
            created_at: row.created_at,
        })
    }
}

const MENU_COLUMNS: &str =
    "id, tenant, name, category, price_paise, gst_bps, is_active, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, tenant, order_number, table_id, room_bill_id, room_index, \
    lines, regime, subtotal_paise, tax_paise, total_paise, created_at";

async fn load_menu_item(conn: &mut SqliteConnection, tenant: &str, id: &str) -> DbResult<MenuItem> {
    let sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE tenant = ?1 AND id = ?2");
    sqlx::query_as::<_, MenuRow>(&sql)
        .bind(tenant)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(MenuItem::from)
        .ok_or_else(|| DbError::not_found("Menu item", id))
}

async fn load_table(conn: &mut SqliteConnection, tenant: &str, id: &str) -> DbResult<DiningTable> {
    sqlx::query_as::<_, TableRow>(
        "SELECT id, tenant, number, capacity, status, created_at
         FROM dining_tables WHERE tenant = ?1 AND id = ?2",
    )
    .bind(tenant)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .map(DiningTable::from)
    .ok_or_else(|| DbError::not_found("Table", id))
}

async fn set_table_status(
    conn: &mut SqliteConnection,
    table_id: &str,
    status: TableStatus,
) -> DbResult<()> {
    sqlx::query("UPDATE dining_tables SET status = ?1 WHERE id = ?2")
        .bind(status)
        .bind(table_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the restaurant.
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Menu
    // -------------------------------------------------------------------------

    pub async fn list_menu(&self, tenant: &str) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menu_items WHERE tenant = ?1 ORDER BY category, name"
        );
        let rows = sqlx::query_as::<_, MenuRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    pub async fn create_menu_item(&self, tenant: &str, input: MenuItemInput) -> DbResult<MenuItem> {
        input.validate()?;

        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            name: input.name.trim().to_string(),
            category: input.category.filter(|c| !c.trim().is_empty()),
            price: input.price,
            gst_rate: input.gst_rate,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO menu_items (id, tenant, name, category, price_paise, gst_bps, is_active,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.tenant)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price.paise())
        .bind(i64::from(item.gst_rate.bps()))
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %item.id, name = %item.name, "Menu item created");
        Ok(item)
    }

    /// Updates a menu item. Orders already placed keep the price they were
    /// placed at.
    pub async fn update_menu_item(
        &self,
        tenant: &str,
        id: &str,
        input: MenuItemInput,
    ) -> DbResult<MenuItem> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = load_menu_item(&mut tx, tenant, id).await?;

        sqlx::query(
            "UPDATE menu_items SET name = ?1, category = ?2, price_paise = ?3, gst_bps = ?4,
                is_active = ?5, updated_at = ?6
             WHERE tenant = ?7 AND id = ?8",
        )
        .bind(input.name.trim())
        .bind(input.category.filter(|c| !c.trim().is_empty()))
        .bind(input.price.paise())
        .bind(i64::from(input.gst_rate.bps()))
        .bind(input.is_active.unwrap_or(current.is_active))
        .bind(Utc::now())
        .bind(tenant)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let item = load_menu_item(&mut tx, tenant, id).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn delete_menu_item(&self, tenant: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM menu_items WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tables
    // -------------------------------------------------------------------------

    pub async fn list_tables(&self, tenant: &str) -> DbResult<Vec<DiningTable>> {
        let rows = sqlx::query_as::<_, TableRow>(
            "SELECT id, tenant, number, capacity, status, created_at
             FROM dining_tables WHERE tenant = ?1 ORDER BY number",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DiningTable::from).collect())
    }

    pub async fn create_table(&self, tenant: &str, input: DiningTableInput) -> DbResult<DiningTable> {
        input.validate()?;

        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            number: input.number.trim().to_string(),
            capacity: input.capacity,
            status: input.status.unwrap_or_default(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO dining_tables (id, tenant, number, capacity, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&table.id)
        .bind(&table.tenant)
        .bind(&table.number)
        .bind(i64::from(table.capacity))
        .bind(table.status)
        .bind(table.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("table number", &table.number),
            other => other,
        })?;

        debug!(id = %table.id, number = %table.number, "Table created");
        Ok(table)
    }

    pub async fn update_table(
        &self,
        tenant: &str,
        id: &str,
        input: DiningTableInput,
    ) -> DbResult<DiningTable> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = load_table(&mut tx, tenant, id).await?;
        let number = input.number.trim();

        sqlx::query(
            "UPDATE dining_tables SET number = ?1, capacity = ?2, status = ?3
             WHERE tenant = ?4 AND id = ?5",
        )
        .bind(number)
        .bind(i64::from(input.capacity))
        .bind(input.status.unwrap_or(current.status))
        .bind(tenant)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("table number", number),
            other => other,
        })?;

        let table = load_table(&mut tx, tenant, id).await?;
        tx.commit().await?;
        Ok(table)
    }

    pub async fn delete_table(&self, tenant: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM dining_tables WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn list_orders(&self, tenant: &str) -> DbResult<Vec<RestaurantOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM restaurant_orders WHERE tenant = ?1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(RestaurantOrder::try_from)
            .collect()
    }

    pub async fn get_order(&self, tenant: &str, id: &str) -> DbResult<RestaurantOrder> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM restaurant_orders WHERE tenant = ?1 AND id = ?2");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(tenant)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?
            .try_into()
    }

    /// Places an order at current menu prices.
    ///
    /// With `room_bill_id` set, every line is posted to that ledger as a
    /// food charge and the order is taxed under the ledger's regime.
    ///
    /// ## Errors
    /// - `CoreError::MenuItemUnavailable` for inactive menu items
    /// - `UniqueViolation` for a reused order number
    /// - any ledger rule (closed bill, room index out of range)
    pub async fn create_order(&self, tenant: &str, new: NewRestaurantOrder) -> DbResult<RestaurantOrder> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        if let Some(table_id) = &new.table_id {
            load_table(&mut tx, tenant, table_id).await?;
        }

        let mut lines = Vec::with_capacity(new.lines.len());
        for requested in &new.lines {
            let item = load_menu_item(&mut tx, tenant, &requested.menu_item_id).await?;
            if !item.is_active {
                return Err(CoreError::MenuItemUnavailable(item.name).into());
            }
            lines.push(OrderLine::from_menu(&item, requested.quantity));
        }

        let regime = match (&new.room_bill_id, new.room_index) {
            (Some(bill_id), Some(room_index)) => {
                let mut ledger = load_ledger(&mut tx, tenant, bill_id).await?;
                for line in &lines {
                    ledger.add_line_item(line.to_line_item(room_index))?;
                }
                save_ledger(&mut tx, &mut ledger).await?;
                ledger.regime
            }
            _ => TaxRegime::IntraState,
        };

        let priced = price_order(&lines, regime);
        let order = RestaurantOrder {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            order_number: new.order_number.trim().to_string(),
            table_id: new.table_id,
            room_bill_id: new.room_bill_id,
            room_index: new.room_index,
            lines,
            regime,
            subtotal: priced.base,
            tax: priced.tax(),
            total: priced.total,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO restaurant_orders (id, tenant, order_number, table_id, room_bill_id,
                room_index, lines, regime, subtotal_paise, tax_paise, total_paise, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&order.id)
        .bind(&order.tenant)
        .bind(&order.order_number)
        .bind(&order.table_id)
        .bind(&order.room_bill_id)
        .bind(order.room_index.map(|i| i as i64))
        .bind(to_json("restaurant_orders.lines", &order.lines)?)
        .bind(order.regime)
        .bind(order.subtotal.paise())
        .bind(order.tax.paise())
        .bind(order.total.paise())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("order number", &order.order_number),
            other => other,
        })?;

        if let Some(table_id) = &order.table_id {
            set_table_status(&mut tx, table_id, TableStatus::Occupied).await?;
        }

        tx.commit().await?;

        info!(
            order = %order.order_number,
            total = %order.total,
            room_bill = order.room_bill_id.as_deref().unwrap_or("-"),
            "Restaurant order placed"
        );
        Ok(order)
    }

    /// Deletes a walk-in order and frees its table.
    ///
    /// ## Errors
    /// `CoreError::OrderChargedToRoom` for orders posted to a ledger.
    pub async fn delete_order(&self, tenant: &str, id: &str) -> DbResult<()> {
        let order = self.get_order(tenant, id).await?;
        if order.room_bill_id.is_some() {
            return Err(CoreError::OrderChargedToRoom(order.order_number).into());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM restaurant_orders WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(table_id) = &order.table_id {
            set_table_status(&mut tx, table_id, TableStatus::Free).await?;
        }

        tx.commit().await?;
        debug!(order = %order.order_number, "Restaurant order deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, date, TENANT};
    use innkeep_core::{ChargeKind, NewOrderLine, TaxRate};

    async fn dosa(db: &crate::Database) -> MenuItem {
        db.restaurant()
            .create_menu_item(
                TENANT,
                MenuItemInput {
                    name: "Masala Dosa".into(),
                    category: Some("South Indian".into()),
                    price: Money::from_rupees(100),
                    gst_rate: TaxRate::from_bps(500),
                    is_active: None,
                },
            )
            .await
            .unwrap()
    }

    fn order(number: &str, item: &MenuItem, quantity: i64) -> NewRestaurantOrder {
        NewRestaurantOrder {
            order_number: number.into(),
            table_id: None,
            room_bill_id: None,
            room_index: None,
            lines: vec![NewOrderLine {
                menu_item_id: item.id.clone(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_walk_in_order_occupies_table() {
        let db = fixtures::db().await;
        let item = dosa(&db).await;
        let table = db
            .restaurant()
            .create_table(
                TENANT,
                DiningTableInput {
                    number: "T1".into(),
                    capacity: 4,
                    status: None,
                },
            )
            .await
            .unwrap();

        let mut new = order("R-1", &item, 2);
        new.table_id = Some(table.id.clone());
        let placed = db.restaurant().create_order(TENANT, new).await.unwrap();

        assert_eq!(placed.subtotal, Money::from_rupees(200));
        assert_eq!(placed.total, Money::from_rupees(210));

        let tables = db.restaurant().list_tables(TENANT).await.unwrap();
        assert_eq!(tables[0].status, TableStatus::Occupied);

        db.restaurant().delete_order(TENANT, &placed.id).await.unwrap();
        let tables = db.restaurant().list_tables(TENANT).await.unwrap();
        assert_eq!(tables[0].status, TableStatus::Free);
    }

    #[tokio::test]
    async fn test_order_number_unique_per_tenant() {
        let db = fixtures::db().await;
        let item = dosa(&db).await;

        db.restaurant()
            .create_order(TENANT, order("R-1", &item, 1))
            .await
            .unwrap();
        let err = db
            .restaurant()
            .create_order(TENANT, order("R-1", &item, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_inactive_item_cannot_be_ordered() {
        let db = fixtures::db().await;
        let item = dosa(&db).await;

        db.restaurant()
            .update_menu_item(
                TENANT,
                &item.id,
                MenuItemInput {
                    name: item.name.clone(),
                    category: item.category.clone(),
                    price: item.price,
                    gst_rate: item.gst_rate,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();

        let err = db
            .restaurant()
            .create_order(TENANT, order("R-2", &item, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MenuItemUnavailable(_))));
    }

    #[tokio::test]
    async fn test_room_order_posts_food_to_ledger() {
        let db = fixtures::hotel().await;
        let item = dosa(&db).await;
        let bill = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101", "102"], 1, 2), date(1))
            .await
            .unwrap()
            .ledger;

        let mut new = order("R-9", &item, 2);
        new.room_bill_id = Some(bill.id.clone());
        new.room_index = Some(1);
        let placed = db.restaurant().create_order(TENANT, new).await.unwrap();

        let ledger = db.ledgers().get(TENANT, &bill.id).await.unwrap();
        let food: Vec<_> = ledger.items_for_room(1).filter(|i| i.kind == ChargeKind::Food).collect();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].quantity, 2);
        assert_eq!(ledger.total_amount, bill.total_amount + placed.total);

        let err = db.restaurant().delete_order(TENANT, &placed.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderChargedToRoom(_))));
    }

    #[tokio::test]
    async fn test_room_order_on_closed_bill_rolls_back() {
        let db = fixtures::hotel().await;
        let item = dosa(&db).await;
        let receipt = db
            .bookings()
            .create(TENANT, fixtures::booking(&["101"], 1, 2), date(1))
            .await
            .unwrap();
        db.bookings().cancel(TENANT, &receipt.booking.id).await.unwrap();

        let mut new = order("R-10", &item, 1);
        new.room_bill_id = Some(receipt.ledger.id.clone());
        new.room_index = Some(0);

        let err = db.restaurant().create_order(TENANT, new).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BillCancelled(_))));
        assert!(db.restaurant().list_orders(TENANT).await.unwrap().is_empty());
    }
}
