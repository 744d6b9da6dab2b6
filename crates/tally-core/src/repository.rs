//! Storage collaborator interface
//!
//! The engine never touches storage directly. A repository hands it owner-scoped
//! snapshots of transactions, categories and budgets, and accepts the budget
//! state the tracker derives. [`crate::db::Database`] is the SQLite
//! implementation; tests use an in-memory one.

use crate::error::Result;
use crate::models::{Budget, Category, Transaction};
use crate::period::{DateRange, YearMonth};

pub trait Repository: Send + Sync {
    /// Transactions of `owner_id`, optionally limited to an inclusive date range
    fn list_transactions(&self, owner_id: i64, range: Option<DateRange>)
        -> Result<Vec<Transaction>>;

    /// Categories visible to `owner_id` (their own plus shared defaults)
    fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>>;

    /// Budgets of `owner_id`, optionally for a single month
    fn list_budgets(&self, owner_id: i64, month: Option<YearMonth>) -> Result<Vec<Budget>>;

    fn get_budget(&self, budget_id: i64) -> Result<Option<Budget>>;

    /// Persist the tracker-derived spent amount
    fn save_budget_state(&self, budget: &Budget) -> Result<()>;

    /// Atomically move a budget from below threshold to threshold reached.
    ///
    /// Returns `false` when the alert was already claimed, possibly by another
    /// writer sharing the same storage.
    fn claim_alert(&self, budget_id: i64) -> Result<bool>;
}
