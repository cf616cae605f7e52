//! # Admin Repositories
//!
//! Expenses and tenant profiles.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use innkeep_core::admin::summarize_expenses;
use innkeep_core::{Expense, ExpenseSummary, Money, NewExpense, Profile, ProfileUpdate};

use crate::error::{DbError, DbResult};

// =============================================================================
// Expenses
// =============================================================================

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    tenant: String,
    category: String,
    description: Option<String>,
    amount_paise: i64,
    mode: String,
    paid_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            tenant: row.tenant,
            category: row.category,
            description: row.description,
            amount: Money::from_paise(row.amount_paise),
            mode: row.mode,
            paid_on: row.paid_on,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Lists expenses, most recent first.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<Expense>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            "SELECT id, tenant, category, description, amount_paise, mode, paid_on, created_at
             FROM expenses WHERE tenant = ?1
             ORDER BY paid_on DESC, created_at DESC",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    pub async fn create(&self, tenant: &str, new: NewExpense) -> DbResult<Expense> {
        new.validate()?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            tenant: tenant.to_string(),
            category: new.category.trim().to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
            amount: new.amount,
            mode: new.mode.trim().to_string(),
            paid_on: new.paid_on,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO expenses (id, tenant, category, description, amount_paise, mode, paid_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&expense.id)
        .bind(&expense.tenant)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount.paise())
        .bind(&expense.mode)
        .bind(expense.paid_on)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %expense.id, category = %expense.category, amount = %expense.amount, "Expense recorded");
        Ok(expense)
    }

    pub async fn delete(&self, tenant: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE tenant = ?1 AND id = ?2")
            .bind(tenant)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }
        Ok(())
    }

    /// Per-category totals over all of the tenant's expenses.
    pub async fn summary(&self, tenant: &str) -> DbResult<Vec<ExpenseSummary>> {
        let expenses = self.list(tenant).await?;
        Ok(summarize_expenses(&expenses))
    }
}

// =============================================================================
// Profiles
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    username: String,
    hotel_name: String,
    state: String,
    gstin: Option<String>,
    address: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            username: row.username,
            hotel_name: row.hotel_name,
            state: row.state,
            gstin: row.gstin,
            address: row.address,
            updated_at: row.updated_at,
        }
    }
}

/// The tenant's home state, if a profile exists.
pub(crate) async fn load_tenant_state(
    conn: &mut SqliteConnection,
    tenant: &str,
) -> DbResult<Option<String>> {
    let state = sqlx::query_scalar::<_, String>("SELECT state FROM profiles WHERE username = ?1")
        .bind(tenant)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(state)
}

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    pub async fn get(&self, user_id: &str) -> DbResult<Profile> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, username, hotel_name, state, gstin, address, updated_at
             FROM profiles WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::from)
        .ok_or_else(|| DbError::not_found("Profile", user_id))
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Profile> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, username, hotel_name, state, gstin, address, updated_at
             FROM profiles WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::from)
        .ok_or_else(|| DbError::not_found("Profile", username))
    }

    /// Creates or replaces the profile of `user_id`.
    ///
    /// Changing `state` affects bookings created afterwards; existing
    /// ledgers keep the regime they were opened with.
    pub async fn upsert(&self, user_id: &str, username: &str, update: ProfileUpdate) -> DbResult<Profile> {
        update.validate()?;

        sqlx::query(
            "INSERT INTO profiles (user_id, username, hotel_name, state, gstin, address, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (user_id) DO UPDATE SET
                hotel_name = excluded.hotel_name,
                state = excluded.state,
                gstin = excluded.gstin,
                address = excluded.address,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(username)
        .bind(update.hotel_name.trim())
        .bind(update.state.trim())
        .bind(update.gstin.filter(|g| !g.trim().is_empty()))
        .bind(update.address.filter(|a| !a.trim().is_empty()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(user_id = %user_id, "Profile saved");
        self.get(user_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, date, TENANT};

    fn expense(category: &str, rupees: i64) -> NewExpense {
        NewExpense {
            category: category.into(),
            description: None,
            amount: Money::from_rupees(rupees),
            mode: "Cash".into(),
            paid_on: date(2),
        }
    }

    #[tokio::test]
    async fn test_expense_summary() {
        let db = fixtures::db().await;
        let repo = db.expenses();

        repo.create(TENANT, expense("Electricity", 4000)).await.unwrap();
        repo.create(TENANT, expense("Laundry", 300)).await.unwrap();
        let last = repo.create(TENANT, expense("Laundry", 200)).await.unwrap();

        let summary = repo.summary(TENANT).await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].category, "Laundry");
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[1].total, Money::from_rupees(500));

        repo.delete(TENANT, &last.id).await.unwrap();
        assert_eq!(repo.list(TENANT).await.unwrap().len(), 2);
        assert!(matches!(
            repo.delete(TENANT, &last.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_positive_expense_rejected() {
        let db = fixtures::db().await;
        assert!(db.expenses().create(TENANT, expense("Misc", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_upsert() {
        let db = fixtures::hotel().await;

        let profile = db
            .profiles()
            .upsert(
                "user-1",
                TENANT,
                ProfileUpdate {
                    hotel_name: "Grand Hotel & Spa".into(),
                    state: "Goa".into(),
                    gstin: Some("29ABCDE1234F1Z5".into()),
                    address: Some("".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.state, "Goa");
        assert!(profile.address.is_none());
        assert_eq!(db.profiles().get_by_username(TENANT).await.unwrap().user_id, "user-1");
        assert!(db.profiles().get("nobody").await.is_err());
    }
}
