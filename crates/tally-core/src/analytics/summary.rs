//! Overall and monthly summaries

use std::collections::BTreeMap;

use tracing::warn;

use super::{group_expenses, totals, AggregationEngine, BudgetUsage, MonthlySummary, Summary};
use crate::budget;
use crate::models::Budget;
use crate::money::Money;
use crate::period::YearMonth;
use crate::view::TransactionView;

impl AggregationEngine {
    /// Totals over every transaction in the view.
    ///
    /// `expense_count` counts every transaction, income included, and
    /// `category_count` is the number of the owner's own categories; shared
    /// defaults are not counted.
    pub fn summarize(&self, view: &TransactionView) -> Summary {
        let directory = view.directory(&self.labels);
        let (total_expenses, total_income, count) = totals(view.transactions().iter());

        let mut expenses_by_category: BTreeMap<String, Money> = BTreeMap::new();
        for tx in view.transactions().iter().filter(|tx| tx.is_expense()) {
            *expenses_by_category
                .entry(directory.resolve(tx).name)
                .or_insert(Money::ZERO) += tx.amount;
        }

        Summary {
            total_expenses,
            total_income,
            balance: total_income - total_expenses,
            expense_count: count,
            category_count: view.categories().iter().filter(|c| !c.is_default).count(),
            expenses_by_category,
        }
    }

    /// Totals and category breakdown for one month.
    ///
    /// `budget` is the month's budget, if any. A budget for another owner or
    /// month is ignored rather than reported against the wrong figures.
    pub fn monthly_summary(
        &self,
        view: &TransactionView,
        month: YearMonth,
        budget: Option<&Budget>,
    ) -> MonthlySummary {
        let directory = view.directory(&self.labels);
        let range = month.range();
        let (total_expenses, total_income, transaction_count) = totals(view.within(range));

        let category_breakdown = group_expenses(&directory, view.within(range))
            .iter()
            .map(|group| group.share(total_expenses))
            .collect();

        let budget = budget.and_then(|b| {
            if b.owner_id != view.owner_id() || b.month != month {
                warn!(
                    budget_id = b.id,
                    owner_id = view.owner_id(),
                    month = %month,
                    "Ignoring budget outside the summarized month"
                );
                return None;
            }
            Some(BudgetUsage {
                budget_id: b.id,
                budget: b.budget_amount,
                remaining: budget::remaining(b),
                usage_percentage: budget::usage_percentage(b),
            })
        });

        MonthlySummary {
            month,
            total_expenses,
            total_income,
            net_amount: total_income - total_expenses,
            budget,
            transaction_count,
            category_breakdown,
        }
    }
}
