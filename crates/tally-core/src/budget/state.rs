//! Budget arithmetic and the alert state machine
//!
//! These functions only look at the budget and the transactions they are
//! handed. Serialising concurrent updates is the tracker's job.

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::error;

use crate::error::{Error, Result};
use crate::models::{AlertState, Budget, BudgetAlertEvent, Transaction};
use crate::money::Money;

/// Decimal places kept on the spent/budget ratio before it becomes a percentage
const USAGE_RATIO_SCALE: u32 = 4;

/// Recompute `spent_amount` from the transactions in the budget's scope.
///
/// `transactions` may be broader than the scope; anything outside it is
/// skipped. A transaction belonging to another owner means the caller built
/// the input for the wrong budget, which is reported as a scope violation
/// instead of producing a wrong total.
pub fn recompute_spent(budget: &mut Budget, transactions: &[Transaction]) -> Result<Money> {
    if let Some(foreign) = transactions.iter().find(|tx| tx.owner_id != budget.owner_id) {
        error!(
            budget_id = budget.id,
            budget_owner = budget.owner_id,
            transaction_id = foreign.id,
            transaction_owner = foreign.owner_id,
            "Budget recompute handed another owner's transaction"
        );
        return Err(Error::ScopeViolation(format!(
            "budget {} belongs to owner {}, transaction {} to owner {}",
            budget.id, budget.owner_id, foreign.id, foreign.owner_id
        )));
    }

    let scope = budget.scope();
    let spent: Money = transactions
        .iter()
        .filter(|tx| tx.is_expense() && scope.contains(tx))
        .map(|tx| tx.amount)
        .sum();

    budget.spent_amount = spent;
    Ok(spent)
}

/// Spent as a percentage of the budget; 0 when the budget amount is 0.
///
/// The ratio is rounded half-up to four places before scaling, so
/// 85/100 is exactly 85 and 2/3 is 66.67.
pub fn usage_percentage(budget: &Budget) -> Decimal {
    if budget.budget_amount.is_zero() {
        return Decimal::ZERO;
    }
    let ratio = (budget.spent_amount.amount() / budget.budget_amount.amount())
        .round_dp_with_strategy(USAGE_RATIO_SCALE, RoundingStrategy::MidpointAwayFromZero);
    ratio * Decimal::ONE_HUNDRED
}

/// Strictly more spent than budgeted
pub fn is_over_budget(budget: &Budget) -> bool {
    budget.spent_amount > budget.budget_amount
}

/// Budget left to spend; negative once over budget
pub fn remaining(budget: &Budget) -> Money {
    budget.budget_amount - budget.spent_amount
}

/// Whether the alert should fire now, without changing anything
pub fn should_alert(budget: &Budget) -> bool {
    budget.alert_state == AlertState::BelowThreshold
        && usage_percentage(budget) >= budget.alert_threshold
}

/// Fire the alert at most once per budget.
///
/// On the first evaluation where usage reaches the threshold the budget moves
/// to [`AlertState::ThresholdReached`] and the event to emit is returned.
/// Every later evaluation returns `None`, whatever the spending.
pub fn evaluate_alert(budget: &mut Budget) -> Option<BudgetAlertEvent> {
    if !should_alert(budget) {
        return None;
    }
    budget.alert_state = AlertState::ThresholdReached;
    budget.updated_at = Utc::now();
    Some(BudgetAlertEvent {
        budget_id: budget.id,
        owner_id: budget.owner_id,
        usage_percentage: usage_percentage(budget),
        month: budget.month,
        category_id: budget.category_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{budget, category, expense, income, money};
    use rust_decimal_macros::dec;

    #[test]
    fn recompute_sums_expenses_in_scope_only() {
        let food = category(3, 1, "Food");
        let mut b = budget(1, 1, Some(3), "2024-03", "100.00");
        let txs = vec![
            expense(1, "2024-03-01", "10.00", Some(&food)),
            expense(1, "2024-03-31", "15.50", Some(&food)),
            expense(1, "2024-03-15", "99.00", None),
            expense(1, "2024-04-01", "99.00", Some(&food)),
            income(1, "2024-03-10", "500.00"),
        ];

        assert_eq!(recompute_spent(&mut b, &txs).unwrap(), money("25.50"));
        assert_eq!(b.spent_amount, money("25.50"));
    }

    #[test]
    fn whole_month_budget_counts_every_category() {
        let food = category(3, 1, "Food");
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        let txs = vec![
            expense(1, "2024-03-01", "10.00", Some(&food)),
            expense(1, "2024-03-02", "5.00", None),
        ];
        assert_eq!(recompute_spent(&mut b, &txs).unwrap(), money("15.00"));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        let txs = vec![expense(1, "2024-03-01", "33.33", None)];
        let first = recompute_spent(&mut b, &txs).unwrap();
        let second = recompute_spent(&mut b, &txs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn recompute_rejects_foreign_owner() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        let txs = vec![expense(2, "2024-03-01", "10.00", None)];
        let err = recompute_spent(&mut b, &txs).unwrap_err();
        assert!(matches!(err, Error::ScopeViolation(_)));
        assert_eq!(b.spent_amount, Money::ZERO);
    }

    #[test]
    fn usage_rounds_ratio_to_four_places() {
        let mut b = budget(1, 1, None, "2024-03", "3.00");
        b.spent_amount = money("2.00");
        assert_eq!(usage_percentage(&b), dec!(66.67));
    }

    #[test]
    fn zero_budget_guard() {
        let mut b = budget(1, 1, None, "2024-03", "0");
        assert_eq!(usage_percentage(&b), Decimal::ZERO);
        assert!(!is_over_budget(&b));

        b.spent_amount = money("0.01");
        assert_eq!(usage_percentage(&b), Decimal::ZERO);
        assert!(is_over_budget(&b));
    }

    #[test]
    fn over_budget_is_strict() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        b.spent_amount = money("100.00");
        assert!(!is_over_budget(&b));
        assert_eq!(remaining(&b), Money::ZERO);

        b.spent_amount = money("120.00");
        assert!(is_over_budget(&b));
        assert_eq!(remaining(&b), money("-20.00"));
    }

    #[test]
    fn alert_fires_once_across_spending_steps() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        let mut fired = Vec::new();

        for spent in ["0", "50.00", "85.00", "95.00"] {
            b.spent_amount = money(spent);
            if let Some(event) = evaluate_alert(&mut b) {
                fired.push((spent, event));
            }
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "85.00");
        assert_eq!(fired[0].1.usage_percentage, dec!(85));
        assert_eq!(fired[0].1.budget_id, 1);
        assert!(b.alert_sent());
    }

    #[test]
    fn alert_fires_at_exact_threshold() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        b.spent_amount = money("80.00");
        assert!(evaluate_alert(&mut b).is_some());
    }

    #[test]
    fn alert_stays_reached_after_spending_drops() {
        let mut b = budget(1, 1, None, "2024-03", "100.00");
        b.spent_amount = money("90.00");
        assert!(evaluate_alert(&mut b).is_some());

        b.spent_amount = money("10.00");
        assert!(evaluate_alert(&mut b).is_none());
        b.spent_amount = money("99.00");
        assert!(evaluate_alert(&mut b).is_none());
        assert_eq!(b.alert_state, AlertState::ThresholdReached);
    }
}
