//! Transaction filter builder for constructing dynamic SQL queries
//!
//! This module provides a builder pattern for constructing WHERE clauses
//! and related SQL components for transaction searches.

use chrono::NaiveDate;

use crate::models::TransactionKind;
use crate::money::Money;

/// Builder for constructing transaction query filters
///
/// The owner is not part of the filter: the search methods always scope by
/// owner themselves. The lifetime `'query` covers the borrowed search term.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter<'query> {
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub search: Option<&'query str>,
    pub recurring: Option<bool>,
    pub sort_field: Option<&'query str>,
    pub sort_order: Option<&'query str>,
    pub limit: Option<i64>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword
    pub where_clause: String,
    /// ORDER BY clause including "ORDER BY" keyword
    pub order_clause: String,
    /// LIMIT clause (empty string if unlimited)
    pub limit_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl<'query> TransactionFilter<'query> {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set category filter
    pub fn category_id(mut self, id: Option<i64>) -> Self {
        self.category_id = id;
        self
    }

    /// Set kind filter (expense or income)
    pub fn kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Set inclusive date range filter
    pub fn date_range(mut self, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        self.date_range = range;
        self
    }

    /// Set minimum amount (inclusive)
    pub fn min_amount(mut self, amount: Option<Money>) -> Self {
        self.min_amount = amount;
        self
    }

    /// Set maximum amount (inclusive)
    pub fn max_amount(mut self, amount: Option<Money>) -> Self {
        self.max_amount = amount;
        self
    }

    /// Set search query (searches title and description)
    pub fn search(mut self, query: Option<&'query str>) -> Self {
        self.search = query;
        self
    }

    /// Set recurring flag filter
    pub fn recurring(mut self, value: Option<bool>) -> Self {
        self.recurring = value;
        self
    }

    /// Set sort field (date or amount)
    pub fn sort_field(mut self, field: Option<&'query str>) -> Self {
        self.sort_field = field;
        self
    }

    /// Set sort order (asc or desc)
    pub fn sort_order(mut self, order: Option<&'query str>) -> Self {
        self.sort_order = order;
        self
    }

    /// Cap the number of rows returned
    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Build the filter components for `owner_id`
    pub fn build(&self, owner_id: i64) -> FilterResult {
        let mut conditions = vec!["t.owner_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id)];

        if let Some(cid) = self.category_id {
            conditions.push("t.category_id = ?".to_string());
            params.push(Box::new(cid));
        }

        if let Some(kind) = self.kind {
            conditions.push("t.kind = ?".to_string());
            params.push(Box::new(kind.as_str()));
        }

        if let Some((from_date, to_date)) = self.date_range {
            conditions.push("t.date >= ? AND t.date <= ?".to_string());
            params.push(Box::new(from_date.to_string()));
            params.push(Box::new(to_date.to_string()));
        }

        // Amounts are stored as cents; out-of-range bounds are skipped
        if let Some(cents) = self.min_amount.and_then(|m| m.cents().ok()) {
            conditions.push("t.amount_cents >= ?".to_string());
            params.push(Box::new(cents));
        }
        if let Some(cents) = self.max_amount.and_then(|m| m.cents().ok()) {
            conditions.push("t.amount_cents <= ?".to_string());
            params.push(Box::new(cents));
        }

        // Search filter (title and description)
        if let Some(q) = self.search {
            if !q.trim().is_empty() {
                conditions.push(
                    "(t.title LIKE ? COLLATE NOCASE OR t.description LIKE ? COLLATE NOCASE)"
                        .to_string(),
                );
                let pattern = format!("%{}%", q.trim());
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
        }

        if let Some(recurring) = self.recurring {
            conditions.push("t.recurring = ?".to_string());
            params.push(Box::new(recurring));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let order_column = match self.sort_field {
            Some("amount") => "t.amount_cents",
            _ => "t.date",
        };
        let order_dir = match self.sort_order {
            Some("asc") => "ASC",
            _ => "DESC",
        };
        let order_clause = format!("ORDER BY {} {}, t.id DESC", order_column, order_dir);

        let limit_clause = match self.limit {
            Some(limit) => {
                params.push(Box::new(limit));
                "LIMIT ?".to_string()
            }
            None => String::new(),
        };

        FilterResult {
            where_clause,
            order_clause,
            limit_clause,
            params,
        }
    }
}

impl FilterResult {
    /// Build a COUNT query
    pub fn build_count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM transactions t {}", self.where_clause)
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
