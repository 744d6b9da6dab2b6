//! Budget tracker: keeps spent amounts and alert states in step with transactions

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info};

use super::notify::AlertSink;
use super::state;
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetAlertEvent, Transaction};
use crate::money::Money;
use crate::period::YearMonth;
use crate::repository::Repository;

/// A budget with its derived figures
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub remaining: Money,
    pub usage_percentage: Decimal,
    pub over_budget: bool,
    /// The alert emitted by the refresh that produced this status, if any
    pub fired: Option<BudgetAlertEvent>,
}

/// Serialises recompute-and-evaluate per budget.
///
/// Each budget has its own lock. A refresh takes the lock, then reads the
/// budget and its transactions from the repository, so the last refresh to
/// run always sees every committed write. However concurrent inserts
/// interleave, the final spent amount is the true total.
///
/// The lock only covers this tracker. Trackers in other processes can share
/// the storage, so the alert transition itself goes through
/// [`Repository::claim_alert`] and the alert fires at most once per budget.
pub struct BudgetTracker {
    sink: Arc<dyn AlertSink>,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl BudgetTracker {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, budget_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(budget_id).or_default().clone()
    }

    /// Drop the lock of a deleted budget
    pub fn forget(&self, budget_id: i64) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&budget_id);
    }

    /// Recompute a budget's spent amount and evaluate its alert.
    ///
    /// Fails with [`Error::ScopeViolation`] when the budget does not belong
    /// to `owner_id`.
    pub fn refresh(
        &self,
        repo: &dyn Repository,
        owner_id: i64,
        budget_id: i64,
    ) -> Result<BudgetStatus> {
        let lock = self.lock_for(budget_id);
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut budget = repo
            .get_budget(budget_id)?
            .ok_or_else(|| Error::NotFound(format!("budget {}", budget_id)))?;

        if budget.owner_id != owner_id {
            error!(
                budget_id,
                owner_id,
                budget_owner = budget.owner_id,
                "Refresh requested for another owner's budget"
            );
            return Err(Error::ScopeViolation(format!(
                "budget {} does not belong to owner {}",
                budget_id, owner_id
            )));
        }

        let transactions = repo.list_transactions(owner_id, Some(budget.month.range()))?;
        let previous = budget.spent_amount;
        let spent = state::recompute_spent(&mut budget, &transactions)?;
        if spent != previous {
            budget.updated_at = Utc::now();
        }
        let evaluated = state::evaluate_alert(&mut budget);

        repo.save_budget_state(&budget)?;
        // Another handle on the same storage may have crossed first.
        let fired = match evaluated {
            Some(event) if repo.claim_alert(budget_id)? => Some(event),
            Some(_) => {
                debug!(budget_id, owner_id, "Alert already claimed by another writer");
                None
            }
            None => None,
        };
        debug!(
            budget_id,
            owner_id,
            %previous,
            %spent,
            usage = %state::usage_percentage(&budget),
            "Budget recomputed"
        );

        if let Some(event) = &fired {
            info!(
                budget_id,
                owner_id,
                usage = %event.usage_percentage,
                threshold = %budget.alert_threshold,
                "Budget crossed its alert threshold"
            );
            self.sink.notify(event);
        }

        let mut status = Self::status(&budget);
        status.fired = fired;
        Ok(status)
    }

    /// Refresh every budget whose scope holds either version of a transaction.
    ///
    /// `before` is the stored version prior to the write (`None` on create)
    /// and `after` the version written (`None` on delete). An edit that moves
    /// a transaction between months or categories refreshes both scopes.
    pub fn on_transaction_changed(
        &self,
        repo: &dyn Repository,
        owner_id: i64,
        before: Option<&Transaction>,
        after: Option<&Transaction>,
    ) -> Result<Vec<BudgetStatus>> {
        let versions: Vec<&Transaction> = before.into_iter().chain(after).collect();
        if let Some(foreign) = versions.iter().find(|tx| tx.owner_id != owner_id) {
            return Err(Error::ScopeViolation(format!(
                "transaction {} does not belong to owner {}",
                foreign.id, owner_id
            )));
        }

        let months: BTreeSet<YearMonth> = versions.iter().map(|tx| YearMonth::of(tx.date)).collect();
        let mut affected = BTreeSet::new();
        for month in months {
            for budget in repo.list_budgets(owner_id, Some(month))? {
                let scope = budget.scope();
                if versions.iter().any(|tx| scope.contains(tx)) {
                    affected.insert(budget.id);
                }
            }
        }

        affected
            .into_iter()
            .map(|budget_id| self.refresh(repo, owner_id, budget_id))
            .collect()
    }

    /// Refresh every budget of an owner, optionally for one month
    pub fn refresh_all(
        &self,
        repo: &dyn Repository,
        owner_id: i64,
        month: Option<YearMonth>,
    ) -> Result<Vec<BudgetStatus>> {
        repo.list_budgets(owner_id, month)?
            .iter()
            .map(|budget| self.refresh(repo, owner_id, budget.id))
            .collect()
    }

    /// Derived figures of a budget as stored, without recomputing
    pub fn status(budget: &Budget) -> BudgetStatus {
        BudgetStatus {
            remaining: state::remaining(budget),
            usage_percentage: state::usage_percentage(budget),
            over_budget: state::is_over_budget(budget),
            budget: budget.clone(),
            fired: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertState;
    use crate::test_utils::{budget, category, expense, money, MemoryRepository, RecordingSink};

    fn setup(amount: &str) -> (MemoryRepository, Arc<RecordingSink>, BudgetTracker) {
        let repo = MemoryRepository::new();
        repo.insert_budget(budget(1, 1, None, "2024-03", amount));
        let sink = Arc::new(RecordingSink::new());
        let tracker = BudgetTracker::new(sink.clone());
        (repo, sink, tracker)
    }

    #[test]
    fn alert_fires_once_as_expenses_arrive() {
        let (repo, sink, tracker) = setup("100.00");

        for amount in ["50.00", "35.00", "10.00"] {
            let tx = repo.insert_transaction(expense(1, "2024-03-10", amount, None));
            tracker.on_transaction_changed(&repo, 1, None, Some(&tx)).unwrap();
        }

        let stored = repo.budget(1);
        assert_eq!(stored.spent_amount, money("95.00"));
        assert_eq!(stored.alert_state, AlertState::ThresholdReached);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].usage_percentage, rust_decimal_macros::dec!(85));
    }

    #[test]
    fn refresh_twice_is_idempotent() {
        let (repo, sink, tracker) = setup("100.00");
        repo.insert_transaction(expense(1, "2024-03-10", "90.00", None));

        let first = tracker.refresh(&repo, 1, 1).unwrap();
        let second = tracker.refresh(&repo, 1, 1).unwrap();
        assert_eq!(first.budget.spent_amount, second.budget.spent_amount);
        assert!(first.fired.is_some());
        assert!(second.fired.is_none());
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn refresh_rejects_other_owner() {
        let (repo, sink, tracker) = setup("100.00");
        let err = tracker.refresh(&repo, 2, 1).unwrap_err();
        assert!(matches!(err, Error::ScopeViolation(_)));
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn refresh_missing_budget_is_not_found() {
        let (repo, _, tracker) = setup("100.00");
        assert!(matches!(tracker.refresh(&repo, 1, 42), Err(Error::NotFound(_))));
    }

    #[test]
    fn moving_a_transaction_refreshes_both_scopes() {
        let repo = MemoryRepository::new();
        let food = category(5, 1, "Food");
        let rent = category(6, 1, "Rent");
        repo.insert_budget(budget(1, 1, Some(5), "2024-03", "100.00"));
        repo.insert_budget(budget(2, 1, Some(6), "2024-03", "100.00"));
        let tracker = BudgetTracker::new(Arc::new(RecordingSink::new()));

        let before = repo.insert_transaction(expense(1, "2024-03-10", "40.00", Some(&food)));
        tracker.on_transaction_changed(&repo, 1, None, Some(&before)).unwrap();
        assert_eq!(repo.budget(1).spent_amount, money("40.00"));

        let mut after = before.clone();
        after.category_id = Some(rent.id);
        after.category = Some(rent.snapshot());
        repo.replace_transaction(after.clone());
        let refreshed = tracker
            .on_transaction_changed(&repo, 1, Some(&before), Some(&after))
            .unwrap();

        assert_eq!(refreshed.len(), 2);
        assert_eq!(repo.budget(1).spent_amount, Money::ZERO);
        assert_eq!(repo.budget(2).spent_amount, money("40.00"));
    }

    #[test]
    fn deleting_a_transaction_lowers_spent_but_keeps_alert() {
        let (repo, sink, tracker) = setup("100.00");
        let tx = repo.insert_transaction(expense(1, "2024-03-10", "90.00", None));
        tracker.on_transaction_changed(&repo, 1, None, Some(&tx)).unwrap();

        let removed = repo.remove_transaction(tx.id).unwrap();
        tracker.on_transaction_changed(&repo, 1, Some(&removed), None).unwrap();

        let stored = repo.budget(1);
        assert_eq!(stored.spent_amount, Money::ZERO);
        assert_eq!(stored.alert_state, AlertState::ThresholdReached);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn next_month_budget_starts_below_threshold() {
        let (repo, sink, tracker) = setup("100.00");
        repo.insert_budget(budget(2, 1, None, "2024-04", "100.00"));

        let march = repo.insert_transaction(expense(1, "2024-03-10", "90.00", None));
        tracker.on_transaction_changed(&repo, 1, None, Some(&march)).unwrap();
        let april = repo.insert_transaction(expense(1, "2024-04-10", "85.00", None));
        tracker.on_transaction_changed(&repo, 1, None, Some(&april)).unwrap();

        let ids: Vec<i64> = sink.events().iter().map(|e| e.budget_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn concurrent_inserts_fire_exactly_once() {
        let (repo, sink, tracker) = setup("100.00");

        std::thread::scope(|s| {
            for _ in 0..10 {
                s.spawn(|| {
                    let tx = repo.insert_transaction(expense(1, "2024-03-15", "10.00", None));
                    tracker.on_transaction_changed(&repo, 1, None, Some(&tx)).unwrap();
                });
            }
        });

        let stored = repo.budget(1);
        assert_eq!(stored.spent_amount, money("100.00"));
        assert_eq!(stored.alert_state, AlertState::ThresholdReached);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn concurrent_inserts_below_threshold_never_fire() {
        let (repo, sink, tracker) = setup("100.00");

        std::thread::scope(|s| {
            for _ in 0..7 {
                s.spawn(|| {
                    let tx = repo.insert_transaction(expense(1, "2024-03-15", "10.00", None));
                    tracker.on_transaction_changed(&repo, 1, None, Some(&tx)).unwrap();
                });
            }
        });

        assert_eq!(repo.budget(1).spent_amount, money("70.00"));
        assert_eq!(sink.count(), 0);
    }

    /// Storage shared with a writer whose alert claim landed after our read
    struct LaggingReads<'a>(&'a MemoryRepository);

    impl Repository for LaggingReads<'_> {
        fn list_transactions(
            &self,
            owner_id: i64,
            range: Option<crate::period::DateRange>,
        ) -> Result<Vec<Transaction>> {
            self.0.list_transactions(owner_id, range)
        }

        fn list_categories(&self, owner_id: i64) -> Result<Vec<crate::models::Category>> {
            self.0.list_categories(owner_id)
        }

        fn list_budgets(&self, owner_id: i64, month: Option<YearMonth>) -> Result<Vec<Budget>> {
            self.0.list_budgets(owner_id, month)
        }

        fn get_budget(&self, budget_id: i64) -> Result<Option<Budget>> {
            Ok(self.0.get_budget(budget_id)?.map(|mut b| {
                b.alert_state = AlertState::BelowThreshold;
                b
            }))
        }

        fn save_budget_state(&self, budget: &Budget) -> Result<()> {
            self.0.save_budget_state(budget)
        }

        fn claim_alert(&self, budget_id: i64) -> Result<bool> {
            self.0.claim_alert(budget_id)
        }
    }

    #[test]
    fn separate_trackers_on_shared_storage_fire_once() {
        let (repo, first_sink, first) = setup("100.00");
        let second_sink = Arc::new(RecordingSink::new());
        let second = BudgetTracker::new(second_sink.clone());
        repo.insert_transaction(expense(1, "2024-03-10", "90.00", None));

        assert!(first.refresh(&repo, 1, 1).unwrap().fired.is_some());
        // The second tracker read the budget before the first one claimed it
        let status = second.refresh(&LaggingReads(&repo), 1, 1).unwrap();

        assert!(status.fired.is_none());
        assert_eq!(first_sink.count(), 1);
        assert_eq!(second_sink.count(), 0);
        assert_eq!(repo.budget(1).alert_state, AlertState::ThresholdReached);
    }

    #[test]
    fn saving_spent_never_rewinds_the_alert() {
        let (repo, _, _) = setup("100.00");
        assert!(repo.claim_alert(1).unwrap());

        let mut stale = budget(1, 1, None, "2024-03", "100.00");
        stale.spent_amount = money("10.00");
        repo.save_budget_state(&stale).unwrap();

        assert_eq!(repo.budget(1).alert_state, AlertState::ThresholdReached);
        assert_eq!(repo.budget(1).spent_amount, money("10.00"));
        assert!(!repo.claim_alert(1).unwrap());
    }

    #[test]
    fn status_projects_stored_figures() {
        let mut b = budget(1, 1, None, "2024-03", "50.00");
        b.spent_amount = money("60.00");
        let status = BudgetTracker::status(&b);
        assert!(status.over_budget);
        assert_eq!(status.remaining, money("-10.00"));
        assert_eq!(status.usage_percentage, rust_decimal_macros::dec!(120));
        assert!(status.fired.is_none());
    }
}
