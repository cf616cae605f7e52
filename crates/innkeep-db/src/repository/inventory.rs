//! # Inventory Repository
//!
//! Inventory categories, items and the stock movement log.
//!
//! ## Stock Is Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_movement(Sell 5 × Rice)               ONE transaction           │
//! │                                                                         │
//! │  item.stock = 3 ──► apply_stock_movement ──► InsufficientStock          │
//! │                                                                         │
//! │  item.stock = 8 ──► apply_stock_movement ok                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  INSERT stock_movements                                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  stock = derive_stock(all movements of the item)  = Σ buy − Σ sell      │
//! │  UPDATE inventory_items SET stock = 3                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use innkeep_core::inventory::{apply_stock_movement, derive_stock};
use innkeep_core::{
    InventoryCategory, InventoryCategoryInput, InventoryItem, InventoryItemInput, Money,
    NewStockMovement, StockDirection, StockMovement,
};

use super::tax_rate;
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    tenant: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for InventoryCategory {
    fn from(row: CategoryRow) -> Self {
        InventoryCategory {
            id: row.id,
            tenant: row.tenant,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    tenant: String,
    category_id: String,
    name: String,
    quantity_unit: String,
    tax_bps: i64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            tenant: row.tenant,
            category_id: row.category_id,
            name: row.name,
            quantity_unit: row.quantity_unit,
            tax_rate: tax_rate(row.tax_bps),
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: String,
    tenant: String,
    item_id: String,
    direction: StockDirection,
    quantity: i64,
    unit_price_paise: i64,
    invoice_no: Option<String>,
    party: Option<String>,
    occurred_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for StockMovement {
    fn from(row: MovementRow) -> Self {
        StockMovement {
            id: row.id,
            tenant: row.tenant,
            item_id: row.item_id,
            direction: row.direction,
            quantity: row.quantity,
            unit_price: Money::from_paise(row.unit_price_paise),
            invoice_no: row.invoice_no,
            party: row.party,
            occurred_on: row.occurred_on,
            created_at: row.created_at,
        }
    }
}

const ITEM_COLUMNS: &str =
    "id, tenant, category_id, name, quantity_unit, tax_bps, stock, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, tenant, item_id, direction, quantity, unit_price_paise, \
    invoice_no, party, occurred_on, created_at";

/// A recorded movement and the item's stock after it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    pub movement: StockMovement,
    pub item: InventoryItem,
}

async fn load_item(conn: &mut SqliteConnection, tenant: &str, id: &str) -> DbResult<InventoryItem> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE tenant = ?1 AND id = ?2");
    sqlx::query_as::<_, ItemRow>(&sql)
        .bind(tenant)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(InventoryItem::from)
        .ok_or_else(|| DbError::not_found("Inventory item", id))
}

async fn ensure_category(conn: &mut SqliteConnection, tenant: &str, id: &str) -> DbResult<()> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT id FROM inventory_categories WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Inventory category", id))
}

fn named_duplicate<'a>(field: &'static str, value: &'a str) -> impl FnOnce(sqlx::Error) -> DbError + 'a {
    move |e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
        other => other,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self, tenant: &str) -> DbResult<Vec<InventoryCategory>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, tenant, name, created_at FROM inventory_categories
             WHERE tenant = ?1 ORDER BY name",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryCategory::from).collect())
    }

    pub async fn create_category(
        &self,
        tenant: &str,
        input: InventoryCategoryInput,
    ) -> DbResult<InventoryCategory> {
        input.validate()?;

        let category = InventoryCategory {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            name: input.name.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO inventory_categories (id, tenant, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.tenant)
        .bind(&category.name)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(named_duplicate("inventory category", &category.name))?;

        debug!(id = %category.id, name = %category.name, "Inventory category created");
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        tenant: &str,
        id: &str,
        input: InventoryCategoryInput,
    ) -> DbResult<InventoryCategory> {
        input.validate()?;
        let name = input.name.trim();

        let result = sqlx::query("UPDATE inventory_categories SET name = ?1 WHERE tenant = ?2 AND id = ?3")
            .bind(name)
            .bind(tenant)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(named_duplicate("inventory category", name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory category", id));
        }

        self.list_categories(tenant)
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Inventory category", id))
    }

    /// Deletes an empty category.
    ///
    /// ## Errors
    /// `ForeignKeyViolation` while items still belong to it.
    pub async fn delete_category(&self, tenant: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_categories WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory category", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    pub async fn list_items(&self, tenant: &str) -> DbResult<Vec<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE tenant = ?1 ORDER BY name");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    pub async fn get_item(&self, tenant: &str, id: &str) -> DbResult<InventoryItem> {
        let mut conn = self.pool.acquire().await?;
        load_item(&mut conn, tenant, id).await
    }

    /// Creates an item with zero stock; stock only moves through
    /// [`InventoryRepository::record_movement`].
    pub async fn create_item(&self, tenant: &str, input: InventoryItemInput) -> DbResult<InventoryItem> {
        input.validate()?;

        let mut conn = self.pool.acquire().await?;
        ensure_category(&mut conn, tenant, &input.category_id).await?;

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            category_id: input.category_id,
            name: input.name.trim().to_string(),
            quantity_unit: input.quantity_unit.trim().to_string(),
            tax_rate: input.tax_rate,
            stock: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO inventory_items (id, tenant, category_id, name, quantity_unit, tax_bps,
                stock, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.tenant)
        .bind(&item.category_id)
        .bind(&item.name)
        .bind(&item.quantity_unit)
        .bind(i64::from(item.tax_rate.bps()))
        .bind(item.stock)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(named_duplicate("inventory item", &item.name))?;

        info!(id = %item.id, name = %item.name, "Inventory item created");
        Ok(item)
    }

    /// Updates the descriptive fields of an item. Stock is untouched.
    pub async fn update_item(
        &self,
        tenant: &str,
        id: &str,
        input: InventoryItemInput,
    ) -> DbResult<InventoryItem> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        ensure_category(&mut tx, tenant, &input.category_id).await?;
        let name = input.name.trim();

        let result = sqlx::query(
            "UPDATE inventory_items SET category_id = ?1, name = ?2, quantity_unit = ?3,
                tax_bps = ?4, updated_at = ?5
             WHERE tenant = ?6 AND id = ?7",
        )
        .bind(&input.category_id)
        .bind(name)
        .bind(input.quantity_unit.trim())
        .bind(i64::from(input.tax_rate.bps()))
        .bind(Utc::now())
        .bind(tenant)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(named_duplicate("inventory item", name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        let item = load_item(&mut tx, tenant, id).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Deletes an item together with its movement log.
    pub async fn delete_item(&self, tenant: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        load_item(&mut tx, tenant, id).await?;

        sqlx::query("DELETE FROM stock_movements WHERE tenant = ?1 AND item_id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM inventory_items WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(id = %id, "Inventory item deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    /// Lists movements, newest first; optionally for one item only.
    pub async fn list_movements(
        &self,
        tenant: &str,
        item_id: Option<&str>,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements
             WHERE tenant = ?1 AND (?2 IS NULL OR item_id = ?2)
             ORDER BY occurred_on DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(tenant)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(StockMovement::from).collect())
    }

    /// Records a purchase or sale and rewrites the item's stock from the
    /// full movement log.
    ///
    /// ## Errors
    /// `CoreError::InsufficientStock` when selling more than is held.
    pub async fn record_movement(&self, tenant: &str, new: NewStockMovement) -> DbResult<StockReceipt> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;
        let mut item = load_item(&mut tx, tenant, &new.item_id).await?;

        if let Err(e) = apply_stock_movement(&item.name, item.stock, new.direction, new.quantity) {
            warn!(item = %item.name, stock = item.stock, error = %e, "Stock movement rejected");
            return Err(e.into());
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            item_id: item.id.clone(),
            direction: new.direction,
            quantity: new.quantity,
            unit_price: new.unit_price,
            invoice_no: new.invoice_no.filter(|s| !s.trim().is_empty()),
            party: new.party.filter(|s| !s.trim().is_empty()),
            occurred_on: new.occurred_on,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO stock_movements (id, tenant, item_id, direction, quantity,
                unit_price_paise, invoice_no, party, occurred_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&movement.id)
        .bind(&movement.tenant)
        .bind(&movement.item_id)
        .bind(movement.direction)
        .bind(movement.quantity)
        .bind(movement.unit_price.paise())
        .bind(&movement.invoice_no)
        .bind(&movement.party)
        .bind(movement.occurred_on)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        let log: Vec<(StockDirection, i64)> =
            sqlx::query_as("SELECT direction, quantity FROM stock_movements WHERE item_id = ?1")
                .bind(&item.id)
                .fetch_all(&mut *tx)
                .await?;
        item.stock = derive_stock(log);
        item.updated_at = Utc::now();

        sqlx::query("UPDATE inventory_items SET stock = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(item.stock)
            .bind(item.updated_at)
            .bind(&item.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            item = %item.name,
            direction = ?movement.direction,
            quantity = movement.quantity,
            stock = item.stock,
            "Stock movement recorded"
        );
        Ok(StockReceipt { movement, item })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, date, TENANT};
    use innkeep_core::{CoreError, TaxRate};

    async fn rice(db: &crate::Database) -> InventoryItem {
        let category = db
            .inventory()
            .create_category(TENANT, InventoryCategoryInput { name: "Grocery".into() })
            .await
            .unwrap();

        db.inventory()
            .create_item(
                TENANT,
                InventoryItemInput {
                    category_id: category.id,
                    name: "Rice".into(),
                    quantity_unit: "kg".into(),
                    tax_rate: TaxRate::from_bps(500),
                },
            )
            .await
            .unwrap()
    }

    fn movement(item: &InventoryItem, direction: StockDirection, quantity: i64) -> NewStockMovement {
        NewStockMovement {
            item_id: item.id.clone(),
            direction,
            quantity,
            unit_price: Money::from_rupees(60),
            invoice_no: None,
            party: Some("Mandi Traders".into()),
            occurred_on: date(2),
        }
    }

    #[tokio::test]
    async fn test_stock_follows_movement_log() {
        let db = fixtures::db().await;
        let item = rice(&db).await;
        let repo = db.inventory();

        repo.record_movement(TENANT, movement(&item, StockDirection::Purchase, 10))
            .await
            .unwrap();
        let receipt = repo
            .record_movement(TENANT, movement(&item, StockDirection::Sell, 4))
            .await
            .unwrap();

        assert_eq!(receipt.item.stock, 6);
        assert_eq!(repo.get_item(TENANT, &item.id).await.unwrap().stock, 6);

        let log = repo.list_movements(TENANT, Some(&item.id)).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(derive_stock(log.iter().map(|m| (m.direction, m.quantity))), 6);
    }

    #[tokio::test]
    async fn test_oversell_rejected_and_nothing_written() {
        let db = fixtures::db().await;
        let item = rice(&db).await;
        let repo = db.inventory();

        repo.record_movement(TENANT, movement(&item, StockDirection::Purchase, 3))
            .await
            .unwrap();

        let err = repo
            .record_movement(TENANT, movement(&item, StockDirection::Sell, 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 3, requested: 5, .. })
        ));

        assert_eq!(repo.list_movements(TENANT, None).await.unwrap().len(), 1);
        assert_eq!(repo.get_item(TENANT, &item.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_category_with_items_cannot_be_deleted() {
        let db = fixtures::db().await;
        let item = rice(&db).await;

        let err = db
            .inventory()
            .delete_category(TENANT, &item.category_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        db.inventory().delete_item(TENANT, &item.id).await.unwrap();
        db.inventory()
            .delete_category(TENANT, &item.category_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_names_are_reported_by_field() {
        let db = fixtures::db().await;
        let item = rice(&db).await;

        let err = db
            .inventory()
            .create_category(TENANT, InventoryCategoryInput { name: "Grocery".into() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value }
                if field == "inventory category" && value == "Grocery"
        ));

        let err = db
            .inventory()
            .create_item(
                TENANT,
                InventoryItemInput {
                    category_id: item.category_id.clone(),
                    name: "Rice".into(),
                    quantity_unit: "kg".into(),
                    tax_rate: TaxRate::from_bps(500),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, .. } if field == "inventory item"
        ));
    }

    #[tokio::test]
    async fn test_update_item_keeps_stock() {
        let db = fixtures::db().await;
        let item = rice(&db).await;
        db.inventory()
            .record_movement(TENANT, movement(&item, StockDirection::Purchase, 7))
            .await
            .unwrap();

        let updated = db
            .inventory()
            .update_item(
                TENANT,
                &item.id,
                InventoryItemInput {
                    category_id: item.category_id.clone(),
                    name: "Basmati Rice".into(),
                    quantity_unit: "kg".into(),
                    tax_rate: TaxRate::from_bps(500),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Basmati Rice");
        assert_eq!(updated.stock, 7);
    }
}
