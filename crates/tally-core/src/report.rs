//! Response shapes for presentation layers
//!
//! The assembler only renames and reshapes: every figure comes from the
//! aggregation engine or the budget tracker unchanged. Amounts serialize as
//! decimal strings ("12.30") and percentages as JSON numbers.

use chrono::{DateTime, Month, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics::{
    CategoryShare, CategorySpending, CategoryStats, DailyExpense, ExpenseTrend, MonthlyData,
    MonthlySummary, Summary, YearlyReport,
};
use crate::budget::BudgetStatus;
use crate::category::{CategoryDirectory, CategoryLabel};
use crate::models::{Category, Transaction};
use crate::money::Money;
use crate::period::YearMonth;

fn percent(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummaryResponse {
    pub total_expenses: Money,
    pub total_income: Money,
    pub balance: Money,
    pub expense_count: usize,
    pub category_count: usize,
    pub expenses_by_category: std::collections::BTreeMap<String, Money>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExpense {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub amount: Money,
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummaryResponse {
    pub month: YearMonth,
    pub total_expenses: Money,
    pub total_income: Money,
    pub net_amount: Money,
    pub budget: Option<Money>,
    pub remaining_budget: Option<Money>,
    pub budget_usage_percentage: f64,
    pub transaction_count: usize,
    pub category_breakdown: Vec<CategoryExpense>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDataResponse {
    pub month: u32,
    pub month_name: &'static str,
    pub expenses: Money,
    pub income: Money,
    pub net_amount: Money,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub total_amount: Money,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReportResponse {
    pub year: i32,
    pub total_expenses: Money,
    pub total_income: Money,
    pub net_amount: Money,
    pub average_monthly_expense: Money,
    pub average_monthly_income: Money,
    pub total_transactions: usize,
    pub monthly_data: Vec<MonthlyDataResponse>,
    pub top_categories: Vec<TopCategory>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpendingRow {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub category_icon: Option<String>,
    pub total_amount: Money,
    pub percentage: f64,
    pub transaction_count: usize,
    pub average_transaction: Money,
    pub largest_transaction: Money,
    pub smallest_transaction: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWiseSpendingResponse {
    pub total_spent: Money,
    pub categories: Vec<CategorySpendingRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyExpenseResponse {
    pub date: NaiveDate,
    pub amount: Money,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysisResponse {
    pub trend: &'static str,
    pub change_percentage: f64,
    pub highest_spending_day: Option<Money>,
    pub highest_spending_date: Option<NaiveDate>,
    pub lowest_spending_day: Option<Money>,
    pub lowest_spending_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTrendResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: Money,
    pub average_daily_spending: Money,
    pub daily_expenses: Vec<DailyExpenseResponse>,
    pub trend_analysis: TrendAnalysisResponse,
}

/// Category as embedded in budget and transaction responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl From<CategoryLabel> for CategoryRef {
    fn from(label: CategoryLabel) -> Self {
        Self {
            id: label.id,
            name: label.name,
            color: label.color,
            icon: label.icon,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
    pub expense_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    pub id: i64,
    pub budget_amount: Money,
    pub spent_amount: Money,
    pub remaining_budget: Money,
    pub usage_percentage: f64,
    pub budget_month: YearMonth,
    pub alert_threshold: f64,
    pub alert_sent: bool,
    pub over_budget: bool,
    pub category: Option<CategoryRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub expense_type: &'static str,
    pub expense_date: NaiveDate,
    pub category: CategoryRef,
    pub notes: Option<String>,
    pub recurring: bool,
    pub recurring_frequency: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Converts engine and tracker outputs into response shapes
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn summary(&self, summary: &Summary) -> AnalyticsSummaryResponse {
        AnalyticsSummaryResponse {
            total_expenses: summary.total_expenses,
            total_income: summary.total_income,
            balance: summary.balance,
            expense_count: summary.expense_count,
            category_count: summary.category_count,
            expenses_by_category: summary.expenses_by_category.clone(),
        }
    }

    pub fn monthly(&self, summary: &MonthlySummary) -> MonthlySummaryResponse {
        MonthlySummaryResponse {
            month: summary.month,
            total_expenses: summary.total_expenses,
            total_income: summary.total_income,
            net_amount: summary.net_amount,
            budget: summary.budget.as_ref().map(|b| b.budget),
            remaining_budget: summary.budget.as_ref().map(|b| b.remaining),
            budget_usage_percentage: summary
                .budget
                .as_ref()
                .map_or(0.0, |b| percent(b.usage_percentage)),
            transaction_count: summary.transaction_count,
            category_breakdown: summary.category_breakdown.iter().map(category_expense).collect(),
        }
    }

    pub fn yearly(&self, report: &YearlyReport) -> YearlyReportResponse {
        YearlyReportResponse {
            year: report.year,
            total_expenses: report.total_expenses,
            total_income: report.total_income,
            net_amount: report.net_amount,
            average_monthly_expense: report.average_monthly_expense,
            average_monthly_income: report.average_monthly_income,
            total_transactions: report.total_transactions,
            monthly_data: report.monthly_data.iter().map(monthly_data).collect(),
            top_categories: report.top_categories.iter().map(top_category).collect(),
        }
    }

    pub fn category_spending(&self, spending: &CategorySpending) -> CategoryWiseSpendingResponse {
        CategoryWiseSpendingResponse {
            total_spent: spending.total_spent,
            categories: spending.categories.iter().map(spending_row).collect(),
        }
    }

    pub fn trend(&self, trend: &ExpenseTrend) -> ExpenseTrendResponse {
        let analysis = &trend.analysis;
        ExpenseTrendResponse {
            start_date: trend.start_date,
            end_date: trend.end_date,
            total_amount: trend.total_amount,
            average_daily_spending: trend.average_daily_spending,
            daily_expenses: trend.daily_expenses.iter().map(daily_expense).collect(),
            trend_analysis: TrendAnalysisResponse {
                trend: analysis.trend.as_str(),
                change_percentage: percent(analysis.change_percentage),
                highest_spending_day: analysis.highest_spending_day.as_ref().map(|d| d.amount),
                highest_spending_date: analysis.highest_spending_day.as_ref().map(|d| d.date),
                lowest_spending_day: analysis.lowest_spending_day.as_ref().map(|d| d.amount),
                lowest_spending_date: analysis.lowest_spending_day.as_ref().map(|d| d.date),
            },
        }
    }

    pub fn budget(&self, status: &BudgetStatus, directory: &CategoryDirectory<'_>) -> BudgetResponse {
        let budget = &status.budget;
        BudgetResponse {
            id: budget.id,
            budget_amount: budget.budget_amount,
            spent_amount: budget.spent_amount,
            remaining_budget: status.remaining,
            usage_percentage: percent(status.usage_percentage),
            budget_month: budget.month,
            alert_threshold: percent(budget.alert_threshold),
            alert_sent: budget.alert_sent(),
            over_budget: status.over_budget,
            category: budget
                .category_id
                .map(|id| directory.resolve_parts(Some(id), None).into()),
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }

    pub fn transaction(&self, tx: &Transaction, directory: &CategoryDirectory<'_>) -> TransactionResponse {
        TransactionResponse {
            id: tx.id,
            title: tx.title.clone(),
            description: tx.description.clone(),
            amount: tx.amount,
            expense_type: tx.kind.as_str(),
            expense_date: tx.date,
            category: directory.resolve(tx).into(),
            notes: tx.notes.clone(),
            recurring: tx.recurring,
            recurring_frequency: tx.frequency.map(|f| f.as_str()),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }

    pub fn category(&self, category: &Category, expense_count: usize) -> CategoryResponse {
        CategoryResponse {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            color: category.color.clone(),
            icon: category.icon.clone(),
            is_default: category.is_default,
            expense_count,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

fn category_expense(share: &CategoryShare) -> CategoryExpense {
    CategoryExpense {
        category_id: share.category_id,
        category_name: share.name.clone(),
        category_color: share.color.clone(),
        amount: share.amount,
        percentage: percent(share.percentage),
        transaction_count: share.transaction_count,
    }
}

fn top_category(share: &CategoryShare) -> TopCategory {
    TopCategory {
        category_id: share.category_id,
        category_name: share.name.clone(),
        category_color: share.color.clone(),
        total_amount: share.amount,
        percentage: percent(share.percentage),
    }
}

fn monthly_data(data: &MonthlyData) -> MonthlyDataResponse {
    let month_name = u8::try_from(data.month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("", |m| m.name());
    MonthlyDataResponse {
        month: data.month,
        month_name,
        expenses: data.expenses,
        income: data.income,
        net_amount: data.net_amount,
        transaction_count: data.transaction_count,
    }
}

fn spending_row(stats: &CategoryStats) -> CategorySpendingRow {
    CategorySpendingRow {
        category_id: stats.category_id,
        category_name: stats.name.clone(),
        category_color: stats.color.clone(),
        category_icon: stats.icon.clone(),
        total_amount: stats.total_amount,
        percentage: percent(stats.percentage),
        transaction_count: stats.transaction_count,
        average_transaction: stats.average_transaction,
        largest_transaction: stats.largest_transaction,
        smallest_transaction: stats.smallest_transaction,
    }
}

fn daily_expense(day: &DailyExpense) -> DailyExpenseResponse {
    DailyExpenseResponse {
        date: day.date,
        amount: day.amount,
        transaction_count: day.transaction_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AggregationEngine;
    use crate::budget::BudgetTracker;
    use crate::config::CategoryLabels;
    use crate::test_utils::{budget, category, date, expense, income, money};
    use crate::view::TransactionView;
    use crate::period::DateRange;

    fn view() -> TransactionView {
        let food = category(1, 1, "Food");
        TransactionView::new(
            1,
            None,
            vec![
                expense(1, "2024-03-02", "30.00", Some(&food)),
                expense(1, "2024-03-10", "40.00", Some(&food)),
                expense(1, "2024-03-21", "20.00", Some(&food)),
                income(1, "2024-03-01", "500.00"),
            ],
            vec![food],
        )
    }

    #[test]
    fn summary_json_uses_camel_case_and_string_amounts() {
        let summary = AggregationEngine::default().summarize(&view());
        let json = serde_json::to_value(ReportAssembler.summary(&summary)).unwrap();

        assert_eq!(json["totalExpenses"], "90.00");
        assert_eq!(json["balance"], "410.00");
        assert_eq!(json["expenseCount"], 4);
        assert_eq!(json["expensesByCategory"]["Food"], "90.00");
    }

    #[test]
    fn yearly_rows_carry_month_names() {
        let report = AggregationEngine::default().yearly_report(&view(), 2024);
        let response = ReportAssembler.yearly(&report);
        assert_eq!(response.monthly_data.len(), 12);
        assert_eq!(response.monthly_data[0].month_name, "January");
        assert_eq!(response.monthly_data[2].month_name, "March");
        assert_eq!(response.monthly_data[2].expenses, money("90.00"));
    }

    #[test]
    fn monthly_without_budget_reports_zero_usage() {
        let month = "2024-03".parse().unwrap();
        let summary = AggregationEngine::default().monthly_summary(&view(), month, None);
        let response = ReportAssembler.monthly(&summary);
        assert!(response.budget.is_none());
        assert_eq!(response.budget_usage_percentage, 0.0);
        assert_eq!(response.category_breakdown[0].percentage, 100.0);
    }

    #[test]
    fn trend_flattens_extreme_days() {
        let range = DateRange::new(date("2024-03-01"), date("2024-03-31"));
        let trend = AggregationEngine::default().trend_analysis(&view(), range);
        let json = serde_json::to_value(ReportAssembler.trend(&trend)).unwrap();

        assert_eq!(json["trendAnalysis"]["highestSpendingDay"], "40.00");
        assert_eq!(json["trendAnalysis"]["highestSpendingDate"], "2024-03-10");
        assert_eq!(json["dailyExpenses"].as_array().unwrap().len(), 31);
    }

    #[test]
    fn budget_response_resolves_category() {
        let cats = vec![category(1, 1, "Food")];
        let labels = CategoryLabels::default();
        let directory = CategoryDirectory::new(&cats, &labels);

        let mut b = budget(7, 1, Some(1), "2024-03", "100.00");
        b.spent_amount = money("120.00");
        let response = ReportAssembler.budget(&BudgetTracker::status(&b), &directory);

        assert!(response.over_budget);
        assert_eq!(response.usage_percentage, 120.0);
        assert_eq!(response.category.unwrap().name, "Food");

        let json = serde_json::to_value(ReportAssembler.budget(&BudgetTracker::status(&b), &directory)).unwrap();
        assert_eq!(json["budgetMonth"], "2024-03");
        assert_eq!(json["remainingBudget"], "-20.00");
    }
}
