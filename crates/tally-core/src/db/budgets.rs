//! Budget operations and the persisted alert log

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info};

use super::{format_datetime, map_unique_violation, parse_datetime, Database, DbPool};
use crate::budget::{AlertSink, BudgetStatus, TracingAlertSink};
use crate::error::{Error, Result};
use crate::models::{AlertState, Budget, BudgetAlertEvent, NewBudget};
use crate::money::Money;
use crate::period::YearMonth;

const BUDGET_COLUMNS: &str = r#"id, owner_id, category_id, budget_cents, spent_cents,
       alert_threshold, alert_state, month, created_at, updated_at"#;

/// A fired budget alert as recorded by [`StoreAlertSink`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertRecord {
    pub id: i64,
    pub event: BudgetAlertEvent,
    pub created_at: DateTime<Utc>,
}

impl Database {
    /// Create a budget for `owner_id` and compute its spent amount right away.
    ///
    /// One budget per (owner, category, month); a whole-month budget
    /// (no category) counts as its own scope.
    pub fn create_budget(&self, owner_id: i64, new: &NewBudget) -> Result<BudgetStatus> {
        if !new.budget_amount.is_positive() {
            return Err(Error::InvalidData(format!(
                "budget amount must be positive, got {}",
                new.budget_amount
            )));
        }
        let threshold = new
            .alert_threshold
            .unwrap_or_else(|| self.config().budgets.default_threshold());
        if threshold < Decimal::ONE || threshold > Decimal::ONE_HUNDRED {
            return Err(Error::InvalidData(format!(
                "alert threshold must be between 1 and 100, got {}",
                threshold
            )));
        }
        if let Some(category_id) = new.category_id {
            if self.get_category(owner_id, category_id)?.is_none() {
                return Err(Error::NotFound(format!("category {}", category_id)));
            }
        }
        if !self
            .find_budgets_for_scope(owner_id, new.month, new.category_id)?
            .is_empty()
        {
            return Err(Error::Duplicate(scope_label(new)));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (owner_id, category_id, budget_cents, alert_threshold, month)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                owner_id,
                new.category_id,
                new.budget_amount.cents()?,
                threshold.to_string(),
                new.month.to_string(),
            ],
        )
        .map_err(|e| map_unique_violation(e, || scope_label(new)))?;
        let id = conn.last_insert_rowid();
        drop(conn);
        info!(owner_id, budget_id = id, month = %new.month, amount = %new.budget_amount, "Budget created");

        self.tracker().refresh(self, owner_id, id)
    }

    /// Get a budget by id, whoever owns it.
    ///
    /// Owner checks belong to the caller; see [`Database::find_budget`].
    pub fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS);
        let budget = conn
            .query_row(&sql, params![id], Self::row_to_budget)
            .optional()?;
        Ok(budget)
    }

    /// Get a budget of `owner_id`
    pub fn find_budget(&self, owner_id: i64, id: i64) -> Result<Option<Budget>> {
        Ok(self.get_budget(id)?.filter(|b| b.owner_id == owner_id))
    }

    /// Budgets of `owner_id`, newest month first
    pub fn list_budgets(&self, owner_id: i64, month: Option<YearMonth>) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let budgets = match month {
            Some(month) => {
                let sql = format!(
                    "SELECT {} FROM budgets WHERE owner_id = ? AND month = ? ORDER BY category_id IS NOT NULL, category_id",
                    BUDGET_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![owner_id, month.to_string()], Self::row_to_budget)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM budgets WHERE owner_id = ? ORDER BY month DESC, category_id IS NOT NULL, category_id",
                    BUDGET_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![owner_id], Self::row_to_budget)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(budgets)
    }

    /// The budget (if any) covering exactly this (owner, month, category) scope
    pub fn find_budgets_for_scope(
        &self,
        owner_id: i64,
        month: YearMonth,
        category_id: Option<i64>,
    ) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM budgets WHERE owner_id = ? AND month = ? AND category_id IS ?",
            BUDGET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let budgets = stmt
            .query_map(
                params![owner_id, month.to_string(), category_id],
                Self::row_to_budget,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Delete a budget of `owner_id`; its alert log stays
    pub fn delete_budget(&self, owner_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND owner_id = ?",
            params![id, owner_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        self.tracker().forget(id);
        info!(owner_id, budget_id = id, "Budget deleted");
        Ok(())
    }

    /// Write back the spent amount of a budget.
    ///
    /// The alert state is never written here; it only moves forward through
    /// [`Database::claim_budget_alert`].
    pub fn save_budget_state(&self, budget: &Budget) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE budgets SET spent_cents = ?, updated_at = ? WHERE id = ?",
            params![
                budget.spent_amount.cents()?,
                format_datetime(budget.updated_at),
                budget.id,
            ],
        )?;
        Ok(())
    }

    /// Move a budget's alert to `threshold_reached` if nobody has yet.
    ///
    /// Returns `true` for exactly one caller per budget, whichever handle or
    /// process it runs in.
    pub fn claim_budget_alert(&self, budget_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE budgets SET alert_state = ?, updated_at = ?
            WHERE id = ? AND alert_state = ?
            "#,
            params![
                AlertState::ThresholdReached.as_str(),
                format_datetime(Utc::now()),
                budget_id,
                AlertState::BelowThreshold.as_str(),
            ],
        )?;
        if changed == 0 {
            debug!(budget_id, "Budget alert already claimed");
        }
        Ok(changed == 1)
    }

    /// Recorded alerts of `owner_id`, newest first
    pub fn list_budget_alerts(&self, owner_id: i64) -> Result<Vec<BudgetAlertRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, payload, created_at FROM budget_alerts
            WHERE owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, payload, created_at)| {
                Ok(BudgetAlertRecord {
                    id,
                    event: serde_json::from_str(&payload)?,
                    created_at: parse_datetime(&created_at),
                })
            })
            .collect()
    }

    fn row_to_budget(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
        let budget_cents: i64 = row.get(3)?;
        let spent_cents: i64 = row.get(4)?;
        let threshold_str: String = row.get(5)?;
        let state_str: String = row.get(6)?;
        let month_str: String = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let alert_threshold = threshold_str
            .parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        let alert_state = state_str
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?;
        let month = month_str
            .parse::<YearMonth>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(Budget {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            category_id: row.get(2)?,
            budget_amount: Money::from_cents(budget_cents),
            spent_amount: Money::from_cents(spent_cents),
            alert_threshold,
            alert_state,
            month,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}

fn scope_label(new: &NewBudget) -> String {
    format!(
        "budget for {} ({})",
        new.month,
        new.category_id
            .map_or_else(|| "all categories".to_string(), |id| format!("category {}", id))
    )
}

/// Alert sink that records every fired alert in the `budget_alerts` table,
/// then logs it like [`TracingAlertSink`]
pub struct StoreAlertSink {
    pool: DbPool,
}

impl StoreAlertSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn record(&self, event: &BudgetAlertEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let conn = self.pool.get()?;
        conn.execute(
            r#"
            INSERT INTO budget_alerts (budget_id, owner_id, category_id, month, usage_percentage, payload)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                event.budget_id,
                event.owner_id,
                event.category_id,
                event.month.to_string(),
                event.usage_percentage.to_string(),
                payload,
            ],
        )?;
        Ok(())
    }
}

impl AlertSink for StoreAlertSink {
    fn notify(&self, event: &BudgetAlertEvent) {
        match self.record(event) {
            Ok(()) => TracingAlertSink.notify(event),
            Err(e) => error!(
                budget_id = event.budget_id,
                owner_id = event.owner_id,
                error = %e,
                "Failed to record budget alert"
            ),
        }
    }
}
