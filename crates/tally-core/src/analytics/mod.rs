//! Aggregation engine
//!
//! Turns a [`crate::view::TransactionView`] into summaries, monthly and yearly reports,
//! per-category statistics and daily trends. Every operation is a pure
//! function of the view (plus an optional budget for monthly summaries), so
//! reports can run in parallel across owners without coordination.
//!
//! Malformed inputs never produce errors here: empty views give zero-valued
//! aggregates, inverted ranges give empty results, and every division by
//! zero yields zero.
//!
//! - `summary` - overall totals and the monthly summary
//! - `spending` - per-category statistics over a range
//! - `yearly` - twelve-month report with top categories
//! - `trend` - daily buckets and trend classification

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::category::{CategoryDirectory, CategoryLabel};
use crate::config::{CategoryLabels, TrackerConfig};
use crate::models::{Transaction, TransactionKind};
use crate::money::{percentage_of, Money};

mod spending;
mod summary;
mod trend;
mod types;
mod yearly;

pub use types::{
    BudgetUsage, CategoryShare, CategorySpending, CategoryStats, DailyExpense, ExpenseTrend,
    MonthlyData, MonthlySummary, Summary, Trend, TrendAnalysis, YearlyReport,
};

/// Stateless report calculator configured with display labels and thresholds
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    labels: CategoryLabels,
    /// Percent change beyond which a trend is increasing or decreasing
    trend_band: Decimal,
    top_categories_limit: Option<usize>,
}

impl AggregationEngine {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            labels: config.categories.clone(),
            trend_band: config.trends.band(),
            top_categories_limit: config.reports.top_categories_limit,
        }
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

/// Running expense totals for one resolved category
struct CategoryGroup {
    label: CategoryLabel,
    total: Money,
    count: usize,
    largest: Money,
    smallest: Money,
}

impl CategoryGroup {
    fn new(label: CategoryLabel) -> Self {
        Self {
            label,
            total: Money::ZERO,
            count: 0,
            largest: Money::ZERO,
            smallest: Money::ZERO,
        }
    }

    fn add(&mut self, amount: Money) {
        if self.count == 0 {
            self.largest = amount;
            self.smallest = amount;
        } else {
            self.largest = self.largest.max(amount);
            self.smallest = self.smallest.min(amount);
        }
        self.total += amount;
        self.count += 1;
    }

    fn share(&self, whole: Money) -> CategoryShare {
        CategoryShare {
            category_id: self.label.id,
            name: self.label.name.clone(),
            color: self.label.color.clone(),
            icon: self.label.icon.clone(),
            amount: self.total,
            percentage: percentage_of(self.total, whole),
            transaction_count: self.count,
        }
    }
}

/// Group the expenses among `transactions` by resolved category.
///
/// Groups come back largest total first; equal totals are ordered by name.
fn group_expenses<'t>(
    directory: &CategoryDirectory<'_>,
    transactions: impl Iterator<Item = &'t Transaction>,
) -> Vec<CategoryGroup> {
    let mut groups: HashMap<Option<i64>, CategoryGroup> = HashMap::new();
    for tx in transactions.filter(|tx| tx.is_expense()) {
        groups
            .entry(tx.category_id)
            .or_insert_with(|| CategoryGroup::new(directory.resolve(tx)))
            .add(tx.amount);
    }

    let mut groups: Vec<CategoryGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.label.name.cmp(&b.label.name))
    });
    groups
}

/// Expense and income totals over `transactions`
fn totals<'t>(transactions: impl Iterator<Item = &'t Transaction>) -> (Money, Money, usize) {
    let mut expenses = Money::ZERO;
    let mut income = Money::ZERO;
    let mut count = 0;
    for tx in transactions {
        match tx.kind {
            TransactionKind::Expense => expenses += tx.amount,
            TransactionKind::Income => income += tx.amount,
        }
        count += 1;
    }
    (expenses, income, count)
}
