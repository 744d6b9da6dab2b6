//! Test utilities for tally-core
//!
//! Builders for domain records, an in-memory [`Repository`] and an alert sink
//! that records every event it receives. Available to unit tests and, via the
//! `test-utils` feature, to integration tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::budget::AlertSink;
use crate::error::Result;
use crate::models::{
    AlertState, Budget, BudgetAlertEvent, Category, Transaction, TransactionKind,
};
use crate::money::Money;
use crate::period::{DateRange, YearMonth};
use crate::repository::Repository;

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Parse a `YYYY-MM` literal
pub fn month(s: &str) -> YearMonth {
    s.parse().unwrap()
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// A category owned by `owner_id`
pub fn category(id: i64, owner_id: i64, name: &str) -> Category {
    let now = Utc::now();
    Category {
        id,
        owner_id: Some(owner_id),
        name: name.to_string(),
        description: None,
        color: "#6366F1".to_string(),
        icon: None,
        is_default: false,
        created_at: now,
        updated_at: now,
    }
}

fn transaction(
    owner_id: i64,
    kind: TransactionKind,
    day: &str,
    amount: &str,
    category: Option<&Category>,
) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: next_id(),
        owner_id,
        title: format!("{} on {}", kind, day),
        description: None,
        amount: money(amount),
        kind,
        date: date(day),
        category_id: category.map(|c| c.id),
        category: category.map(Category::snapshot),
        notes: None,
        recurring: false,
        frequency: None,
        created_at: now,
        updated_at: now,
    }
}

/// An expense with a fresh id and a snapshot of `category`
pub fn expense(owner_id: i64, day: &str, amount: &str, category: Option<&Category>) -> Transaction {
    transaction(owner_id, TransactionKind::Expense, day, amount, category)
}

pub fn income(owner_id: i64, day: &str, amount: &str) -> Transaction {
    transaction(owner_id, TransactionKind::Income, day, amount, None)
}

/// A budget below its threshold with nothing spent, alerting at 80%
pub fn budget(id: i64, owner_id: i64, category_id: Option<i64>, month_str: &str, amount: &str) -> Budget {
    let now = Utc::now();
    Budget {
        id,
        owner_id,
        category_id,
        budget_amount: money(amount),
        spent_amount: Money::ZERO,
        alert_threshold: Decimal::from(80),
        alert_state: AlertState::BelowThreshold,
        month: month(month_str),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct Store {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    budgets: Vec<Budget>,
}

/// Thread-safe in-memory storage collaborator
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    pub fn insert_transaction(&self, tx: Transaction) -> Transaction {
        self.store().transactions.push(tx.clone());
        tx
    }

    /// Replace the stored transaction with the same id, returning the old version
    pub fn replace_transaction(&self, tx: Transaction) -> Option<Transaction> {
        let mut store = self.store();
        let slot = store.transactions.iter_mut().find(|t| t.id == tx.id)?;
        Some(std::mem::replace(slot, tx))
    }

    pub fn remove_transaction(&self, id: i64) -> Option<Transaction> {
        let mut store = self.store();
        let index = store.transactions.iter().position(|t| t.id == id)?;
        Some(store.transactions.remove(index))
    }

    pub fn insert_category(&self, category: Category) {
        self.store().categories.push(category);
    }

    pub fn insert_budget(&self, budget: Budget) {
        self.store().budgets.push(budget);
    }

    /// Current stored copy of a budget
    pub fn budget(&self, id: i64) -> Budget {
        self.store()
            .budgets
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .unwrap()
    }
}

impl Repository for MemoryRepository {
    fn list_transactions(
        &self,
        owner_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .store()
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| range.map_or(true, |r| r.contains(t.date)))
            .cloned()
            .collect())
    }

    fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>> {
        Ok(self
            .store()
            .categories
            .iter()
            .filter(|c| c.visible_to(owner_id))
            .cloned()
            .collect())
    }

    fn list_budgets(&self, owner_id: i64, month: Option<YearMonth>) -> Result<Vec<Budget>> {
        Ok(self
            .store()
            .budgets
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .filter(|b| month.map_or(true, |m| b.month == m))
            .cloned()
            .collect())
    }

    fn get_budget(&self, budget_id: i64) -> Result<Option<Budget>> {
        Ok(self.store().budgets.iter().find(|b| b.id == budget_id).cloned())
    }

    fn save_budget_state(&self, budget: &Budget) -> Result<()> {
        let mut store = self.store();
        if let Some(slot) = store.budgets.iter_mut().find(|b| b.id == budget.id) {
            slot.spent_amount = budget.spent_amount;
            slot.updated_at = budget.updated_at;
        }
        Ok(())
    }

    fn claim_alert(&self, budget_id: i64) -> Result<bool> {
        let mut store = self.store();
        match store.budgets.iter_mut().find(|b| b.id == budget_id) {
            Some(slot) if slot.alert_state == AlertState::BelowThreshold => {
                slot.alert_state = AlertState::ThresholdReached;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Alert sink that keeps every event
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BudgetAlertEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BudgetAlertEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl AlertSink for RecordingSink {
    fn notify(&self, event: &BudgetAlertEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
