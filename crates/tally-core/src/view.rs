//! Read-only, single-owner slice of transactions handed to the analytics engine

use tracing::debug;

use crate::category::CategoryDirectory;
use crate::config::CategoryLabels;
use crate::error::Result;
use crate::models::{Category, Transaction};
use crate::period::DateRange;
use crate::repository::Repository;

/// A coherent snapshot of one owner's transactions and categories.
///
/// Construction drops anything that does not belong to the owner (or lies
/// outside the range), so every aggregate computed from a view is scoped by
/// construction.
#[derive(Debug, Clone)]
pub struct TransactionView {
    owner_id: i64,
    range: Option<DateRange>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
}

impl TransactionView {
    pub fn new(
        owner_id: i64,
        range: Option<DateRange>,
        transactions: Vec<Transaction>,
        categories: Vec<Category>,
    ) -> Self {
        let supplied = transactions.len();
        let mut transactions: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| tx.owner_id == owner_id)
            .filter(|tx| range.map_or(true, |r| r.contains(tx.date)))
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        if transactions.len() != supplied {
            debug!(
                owner_id,
                dropped = supplied - transactions.len(),
                "Dropped out-of-scope transactions from view"
            );
        }

        let categories = categories
            .into_iter()
            .filter(|c| c.visible_to(owner_id))
            .collect();

        Self {
            owner_id,
            range,
            transactions,
            categories,
        }
    }

    /// Load a view from a repository
    pub fn load(repo: &dyn Repository, owner_id: i64, range: Option<DateRange>) -> Result<Self> {
        if range.is_some_and(|r| r.is_empty()) {
            return Ok(Self::new(owner_id, range, Vec::new(), repo.list_categories(owner_id)?));
        }
        let transactions = repo.list_transactions(owner_id, range)?;
        let categories = repo.list_categories(owner_id)?;
        Ok(Self::new(owner_id, range, transactions, categories))
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    /// Transactions ordered by date, then id
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions dated inside `range`
    pub fn within(&self, range: DateRange) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions
            .iter()
            .filter(move |tx| range.contains(tx.date))
    }

    pub fn directory<'a>(&'a self, labels: &'a CategoryLabels) -> CategoryDirectory<'a> {
        CategoryDirectory::new(&self.categories, labels)
    }
}
