//! Aggregation results
//!
//! These are the engine's own outputs. Amounts are [`Money`], percentages are
//! `Decimal`; the response shapes in [`crate::report`] are built from them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::Money;
use crate::period::{DateRange, YearMonth};

/// Totals over every transaction in a view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_expenses: Money,
    pub total_income: Money,
    pub balance: Money,
    /// Every transaction in the view, income included
    pub expense_count: usize,
    pub category_count: usize,
    /// Expense totals keyed by resolved category name
    pub expenses_by_category: BTreeMap<String, Money>,
}

/// One category's share of the expenses in a period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category_id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub amount: Money,
    pub percentage: Decimal,
    pub transaction_count: usize,
}

/// A month's budget position, present only when the month has a budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub budget_id: i64,
    pub budget: Money,
    pub remaining: Money,
    pub usage_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_expenses: Money,
    pub total_income: Money,
    pub net_amount: Money,
    pub budget: Option<BudgetUsage>,
    pub transaction_count: usize,
    /// Sorted by amount, largest first
    pub category_breakdown: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category_id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub total_amount: Money,
    pub percentage: Decimal,
    pub transaction_count: usize,
    pub average_transaction: Money,
    pub largest_transaction: Money,
    pub smallest_transaction: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub range: DateRange,
    pub total_spent: Money,
    /// Sorted by total, largest first
    pub categories: Vec<CategoryStats>,
}

/// One calendar month of a yearly report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyData {
    /// 1-12
    pub month: u32,
    pub expenses: Money,
    pub income: Money,
    pub net_amount: Money,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub total_expenses: Money,
    pub total_income: Money,
    pub net_amount: Money,
    pub average_monthly_expense: Money,
    pub average_monthly_income: Money,
    pub total_transactions: usize,
    /// Always twelve entries, January first
    pub monthly_data: Vec<MonthlyData>,
    pub top_categories: Vec<CategoryShare>,
}

/// Expenses of a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyExpense {
    pub date: NaiveDate,
    pub amount: Money,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "INCREASING",
            Self::Decreasing => "DECREASING",
            Self::Stable => "STABLE",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub change_percentage: Decimal,
    /// `None` only for an empty range
    pub highest_spending_day: Option<DailyExpense>,
    pub lowest_spending_day: Option<DailyExpense>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseTrend {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: Money,
    pub average_daily_spending: Money,
    /// One bucket per day of the range, in order
    pub daily_expenses: Vec<DailyExpense>,
    pub analysis: TrendAnalysis,
}
