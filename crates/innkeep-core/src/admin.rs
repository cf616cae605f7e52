//! # Admin Module
//!
//! Expenses and the tenant profile.
//!
//! The profile's `state` is what every booking's state is compared against
//! when choosing between SGST+CGST and IGST.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_gstin, validate_positive_amount, validate_required};

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub tenant: String,
    pub category: String,
    pub description: Option<String>,
    pub amount: Money,
    pub mode: String,
    #[ts(as = "String")]
    pub paid_on: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Money,
    pub mode: String,
    #[ts(as = "String")]
    pub paid_on: NaiveDate,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("category", &self.category)?;
        validate_required("payment mode", &self.mode)?;
        validate_positive_amount("amount", self.amount.paise())?;
        Ok(())
    }
}

/// Spend in one expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub category: String,
    pub count: usize,
    pub total: Money,
}

/// Totals expenses per category, ordered by category name.
pub fn summarize_expenses(expenses: &[Expense]) -> Vec<ExpenseSummary> {
    let mut by_category: BTreeMap<&str, (usize, Money)> = BTreeMap::new();

    for expense in expenses {
        let entry = by_category
            .entry(expense.category.as_str())
            .or_insert((0, Money::zero()));
        entry.0 += 1;
        entry.1 += expense.amount;
    }

    by_category
        .into_iter()
        .map(|(category, (count, total))| ExpenseSummary {
            category: category.to_string(),
            count,
            total,
        })
        .collect()
}

// =============================================================================
// Profile
// =============================================================================

/// The tenant's hotel profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,

    /// Tenant key; scopes every list query.
    pub username: String,
    pub hotel_name: String,

    /// Home state for the tax regime, compared exactly.
    pub state: String,
    pub gstin: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub hotel_name: String,
    pub state: String,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("hotel name", &self.hotel_name)?;
        validate_required("state", &self.state)?;
        if let Some(gstin) = self.gstin.as_deref().filter(|g| !g.trim().is_empty()) {
            validate_gstin(gstin)?;
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

    fn expense(category: &str, rupees: i64) -> Expense {
        Expense {
            id: format!("{category}-{rupees}"),
            tenant: "hotel".into(),
            category: category.into(),
            description: None,
            amount: Money::from_rupees(rupees),
            mode: "cash".into(),
            paid_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_expenses() {
        let summary = summarize_expenses(&[
            expense("Utilities", 1200),
            expense("Salaries", 30000),
            expense("Utilities", 800),
        ]);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category, "Salaries");
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[1].total, Money::from_rupees(2000));
    }

    #[test]
    fn test_new_expense_validation() {
        let mut e = NewExpense {
            category: "Utilities".into(),
            description: None,
            amount: Money::from_rupees(10),
            mode: "cash".into(),
            paid_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(e.validate().is_ok());

        e.amount = Money::zero();
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_profile_update_validation() {
        let update = ProfileUpdate {
            hotel_name: "Sea View".into(),
            state: "Goa".into(),
            gstin: Some("30AAAAA0000A1Z5".into()),
            address: None,
        };
        assert!(update.validate().is_ok());

        let update = ProfileUpdate {
            state: " ".into(),
            ..update
        };
        assert!(update.validate().is_err());
    }
}
