//! Transaction operations
//!
//! Every write is followed by a budget refresh for the scopes the
//! transaction left and entered.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{info, warn};

use super::transaction_filter::TransactionFilter;
use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategorySnapshot, NewTransaction, Transaction, TransactionKind, TransactionUpdate,
};
use crate::money::Money;
use crate::period::DateRange;

const TRANSACTION_COLUMNS: &str = r#"t.id, t.owner_id, t.title, t.description, t.amount_cents, t.kind, t.date,
       t.category_id, t.category_name, t.category_color, t.category_icon,
       t.notes, t.recurring, t.frequency, t.created_at, t.updated_at"#;

impl Database {
    /// Snapshot of the category a transaction is being filed under
    fn category_snapshot(
        &self,
        owner_id: i64,
        category_id: Option<i64>,
    ) -> Result<Option<CategorySnapshot>> {
        match category_id {
            None => Ok(None),
            Some(id) => {
                let category = self
                    .get_category(owner_id, id)?
                    .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
                Ok(Some(category.snapshot()))
            }
        }
    }

    /// Create a transaction and refresh the budgets it falls into
    pub fn create_transaction(&self, owner_id: i64, new: &NewTransaction) -> Result<Transaction> {
        if !new.amount.is_positive() {
            return Err(Error::InvalidData(format!(
                "amount must be positive, got {}",
                new.amount
            )));
        }
        let snapshot = self.category_snapshot(owner_id, new.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (owner_id, title, description, amount_cents, kind, date,
                                      category_id, category_name, category_color, category_icon,
                                      notes, recurring, frequency)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                owner_id,
                new.title,
                new.description,
                new.amount.cents()?,
                new.kind.as_str(),
                new.date.to_string(),
                new.category_id,
                snapshot.as_ref().map(|s| s.name.clone()),
                snapshot.as_ref().and_then(|s| s.color.clone()),
                snapshot.as_ref().and_then(|s| s.icon.clone()),
                new.notes,
                new.recurring,
                new.frequency.map(|f| f.as_str()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        let tx = self
            .get_transaction(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
        info!(owner_id, transaction_id = id, amount = %tx.amount, kind = %tx.kind, "Transaction created");

        self.tracker()
            .on_transaction_changed(self, owner_id, None, Some(&tx))?;
        Ok(tx)
    }

    /// Partially update a transaction.
    ///
    /// Category and date edits can move it between budget scopes; both the
    /// old and the new scope are refreshed.
    pub fn update_transaction(
        &self,
        owner_id: i64,
        id: i64,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        let before = self
            .get_transaction(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        let mut after = before.clone();
        if let Some(title) = &update.title {
            after.title = title.clone();
        }
        if let Some(description) = &update.description {
            after.description = description.clone();
        }
        if let Some(amount) = update.amount {
            if !amount.is_positive() {
                return Err(Error::InvalidData(format!(
                    "amount must be positive, got {}",
                    amount
                )));
            }
            after.amount = amount;
        }
        if let Some(kind) = update.kind {
            after.kind = kind;
        }
        if let Some(date) = update.date {
            after.date = date;
        }
        if let Some(category_id) = update.category_id {
            after.category_id = category_id;
            after.category = self.category_snapshot(owner_id, category_id)?;
        }
        if let Some(notes) = &update.notes {
            after.notes = notes.clone();
        }
        if let Some(recurring) = update.recurring {
            after.recurring = recurring;
        }
        if let Some(frequency) = update.frequency {
            after.frequency = frequency;
        }
        after.updated_at = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE transactions
            SET title = ?, description = ?, amount_cents = ?, kind = ?, date = ?,
                category_id = ?, category_name = ?, category_color = ?, category_icon = ?,
                notes = ?, recurring = ?, frequency = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
            params![
                after.title,
                after.description,
                after.amount.cents()?,
                after.kind.as_str(),
                after.date.to_string(),
                after.category_id,
                after.category.as_ref().map(|s| s.name.clone()),
                after.category.as_ref().and_then(|s| s.color.clone()),
                after.category.as_ref().and_then(|s| s.icon.clone()),
                after.notes,
                after.recurring,
                after.frequency.map(|f| f.as_str()),
                format_datetime(after.updated_at),
                id,
                owner_id,
            ],
        )?;
        drop(conn);
        info!(owner_id, transaction_id = id, "Transaction updated");

        self.tracker()
            .on_transaction_changed(self, owner_id, Some(&before), Some(&after))?;
        Ok(after)
    }

    /// Delete a transaction and refresh the budgets it counted toward
    pub fn delete_transaction(&self, owner_id: i64, id: i64) -> Result<()> {
        let before = self
            .get_transaction(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM transactions WHERE id = ? AND owner_id = ?",
            params![id, owner_id],
        )?;
        drop(conn);
        info!(owner_id, transaction_id = id, "Transaction deleted");

        self.tracker()
            .on_transaction_changed(self, owner_id, Some(&before), None)?;
        Ok(())
    }

    /// Get a single transaction of `owner_id`
    pub fn get_transaction(&self, owner_id: i64, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.id = ? AND t.owner_id = ?",
            TRANSACTION_COLUMNS
        );
        let tx = conn
            .query_row(&sql, params![id, owner_id], Self::row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    /// All transactions of `owner_id`, oldest first, optionally within a range
    pub fn list_transactions(
        &self,
        owner_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>> {
        if range.is_some_and(|r| r.is_empty()) {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let (sql, params): (String, Vec<Box<dyn rusqlite::ToSql>>) = match range {
            Some(r) => (
                format!(
                    "SELECT {} FROM transactions t WHERE t.owner_id = ? AND t.date >= ? AND t.date <= ? ORDER BY t.date, t.id",
                    TRANSACTION_COLUMNS
                ),
                vec![
                    Box::new(owner_id),
                    Box::new(r.start.to_string()),
                    Box::new(r.end.to_string()),
                ],
            ),
            None => (
                format!(
                    "SELECT {} FROM transactions t WHERE t.owner_id = ? ORDER BY t.date, t.id",
                    TRANSACTION_COLUMNS
                ),
                vec![Box::new(owner_id)],
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let transactions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Search an owner's transactions with the full filter set
    pub fn search_transactions(
        &self,
        owner_id: i64,
        filter: &TransactionFilter<'_>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let built = filter.build(owner_id);

        let sql = format!(
            "SELECT {} FROM transactions t {} {} {}",
            TRANSACTION_COLUMNS, built.where_clause, built.order_clause, built.limit_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(built.params_refs().as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Count an owner's transactions matching a filter (ignores its limit)
    pub fn count_transactions(&self, owner_id: i64, filter: &TransactionFilter<'_>) -> Result<i64> {
        let conn = self.conn()?;
        let built = filter.clone().limit(None).build(owner_id);
        let count: i64 = conn.query_row(
            &built.build_count_query(),
            built.params_refs().as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of transactions per category id for an owner
    pub fn category_usage(&self, owner_id: i64) -> Result<Vec<(i64, usize)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT category_id, COUNT(*) FROM transactions
            WHERE owner_id = ? AND category_id IS NOT NULL
            GROUP BY category_id
            "#,
        )?;
        let usage = stmt
            .query_map(params![owner_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(usage)
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let id: i64 = row.get(0)?;
        let cents: i64 = row.get(4)?;
        let kind_str: String = row.get(5)?;
        let date_str: String = row.get(6)?;
        let category_name: Option<String> = row.get(8)?;
        let frequency_str: Option<String> = row.get(13)?;
        let created_at_str: String = row.get(14)?;
        let updated_at_str: String = row.get(15)?;

        let kind = kind_str.parse().unwrap_or_else(|_| {
            warn!(transaction_id = id, kind = %kind_str, "Unknown transaction kind, reading as expense");
            TransactionKind::Expense
        });

        let category = match category_name {
            Some(name) => Some(CategorySnapshot {
                name,
                color: row.get(9)?,
                icon: row.get(10)?,
            }),
            None => None,
        };

        Ok(Transaction {
            id,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            amount: Money::from_cents(cents),
            kind,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            category_id: row.get(7)?,
            category,
            notes: row.get(11)?,
            recurring: row.get(12)?,
            frequency: frequency_str.and_then(|s| s.parse().ok()),
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
