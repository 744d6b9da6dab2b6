//! Report command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Duration};
use serde::Serialize;
use tally_core::{AggregationEngine, Database, DateRange, ReportAssembler, TransactionView, YearMonth};

use super::core::{parse_date, parse_month, today};
use super::truncate;

/// Resolve a period string to an inclusive range; `all` is unbounded
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<Option<DateRange>> {
    // If custom dates provided, use those
    if let (Some(from), Some(to)) = (custom_from, custom_to) {
        return Ok(Some(DateRange::new(parse_date(from)?, parse_date(to)?)));
    }

    let today = today();
    let this_month = YearMonth::of(today);

    let range = match period.to_lowercase().as_str() {
        "this-month" => DateRange::new(this_month.first_day(), today),
        "last-month" => {
            let last_day = this_month
                .first_day()
                .pred_opt()
                .context("No month before this one")?;
            YearMonth::of(last_day).range()
        }
        "this-year" => DateRange::new(DateRange::year(today.year())?.start, today),
        "last-30-days" => DateRange::new(today - Duration::days(30), today),
        "last-90-days" => DateRange::new(today - Duration::days(90), today),
        "all" => return Ok(None),
        _ => anyhow::bail!(
            "Unknown period: {}. Available: this-month, last-month, this-year, last-30-days, last-90-days, all",
            period
        ),
    };
    Ok(Some(range))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn period_label(range: Option<DateRange>) -> String {
    match range {
        Some(r) => format!("{} to {}", r.start, r.end),
        None => "all time".to_string(),
    }
}

pub fn cmd_report_summary(
    db: &Database,
    owner: i64,
    range: Option<DateRange>,
    json: bool,
) -> Result<()> {
    let view = TransactionView::load(db, owner, range)?;
    let summary = AggregationEngine::new(db.config()).summarize(&view);
    let response = ReportAssembler.summary(&summary);

    if json {
        return print_json(&response);
    }

    println!();
    println!("📊 Summary");
    println!("   Period: {}", period_label(view.range()));
    println!("   ─────────────────────────────────────────");
    println!("   Expenses:      {:>12}", response.total_expenses.to_string());
    println!("   Income:        {:>12}", response.total_income.to_string());
    println!("   Balance:       {:>12}", response.balance.to_string());
    println!("   Transactions:  {:>12}", response.expense_count);
    println!("   Categories:    {:>12}", response.category_count);

    if !response.expenses_by_category.is_empty() {
        println!();
        for (name, amount) in &response.expenses_by_category {
            println!("   {:25} {:>12}", truncate(name, 25), amount.to_string());
        }
    }

    Ok(())
}

pub fn cmd_report_monthly(db: &Database, owner: i64, month: Option<&str>, json: bool) -> Result<()> {
    let month = parse_month(month)?;
    let view = TransactionView::load(db, owner, Some(month.range()))?;
    let budget = db.find_budgets_for_scope(owner, month, None)?.into_iter().next();
    let summary = AggregationEngine::new(db.config()).monthly_summary(&view, month, budget.as_ref());
    let response = ReportAssembler.monthly(&summary);

    if json {
        return print_json(&response);
    }

    println!();
    println!("📅 {}", month);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Expenses: {}   Income: {}   Net: {}",
        response.total_expenses,
        response.total_income,
        response.net_amount
    );
    if let (Some(budget), Some(remaining)) = (response.budget, response.remaining_budget) {
        println!(
            "   Budget:   {}   Remaining: {}   Used: {:.1}%",
            budget, remaining, response.budget_usage_percentage
        );
    }

    if response.category_breakdown.is_empty() {
        println!("   No spending this month.");
        return Ok(());
    }

    println!();
    println!("   {:25} │ {:>10} │ {:>6} │ {:>5}", "Category", "Amount", "%", "Count");
    println!("   ──────────────────────────┼────────────┼────────┼───────");
    for row in &response.category_breakdown {
        println!(
            "   {:25} │ {:>10} │ {:>5.1}% │ {:>5}",
            truncate(&row.category_name, 25),
            row.amount.to_string(),
            row.percentage,
            row.transaction_count
        );
    }

    Ok(())
}

pub fn cmd_report_yearly(db: &Database, owner: i64, year: Option<i32>, json: bool) -> Result<()> {
    let year = year.unwrap_or_else(|| today().year());
    let view = TransactionView::load(db, owner, Some(DateRange::year(year)?))?;
    let report = AggregationEngine::new(db.config()).yearly_report(&view, year);
    let response = ReportAssembler.yearly(&report);

    if json {
        return print_json(&response);
    }

    println!();
    println!("📆 {} at a glance", year);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:10} │ {:>10} │ {:>10} │ {:>10} │ {:>5}", "Month", "Expenses", "Income", "Net", "Count");
    println!("   ───────────┼────────────┼────────────┼────────────┼───────");
    for month in &response.monthly_data {
        println!(
            "   {:10} │ {:>10} │ {:>10} │ {:>10} │ {:>5}",
            month.month_name,
            month.expenses.to_string(),
            month.income.to_string(),
            month.net_amount.to_string(),
            month.transaction_count
        );
    }
    println!();
    println!(
        "   Total expenses: {}   Total income: {}   Net: {}",
        response.total_expenses, response.total_income, response.net_amount
    );
    println!(
        "   Monthly average: {} spent, {} earned",
        response.average_monthly_expense, response.average_monthly_income
    );

    if !response.top_categories.is_empty() {
        println!();
        println!("   Top categories:");
        for category in &response.top_categories {
            println!(
                "   {:25} {:>10} {:>6.1}%",
                truncate(&category.category_name, 25),
                category.total_amount.to_string(),
                category.percentage
            );
        }
    }

    Ok(())
}

pub fn cmd_report_categories(
    db: &Database,
    owner: i64,
    range: Option<DateRange>,
    json: bool,
) -> Result<()> {
    let range = range.context("Category report needs a bounded period (not 'all')")?;
    let view = TransactionView::load(db, owner, Some(range))?;
    let spending = AggregationEngine::new(db.config()).category_spending(&view, range);
    let response = ReportAssembler.category_spending(&spending);

    if json {
        return print_json(&response);
    }

    println!();
    println!("📊 Spending by category");
    println!("   Period: {}", period_label(Some(range)));
    println!("   Total: {}", response.total_spent);
    println!("   ─────────────────────────────────────────────────────────────────────");

    if response.categories.is_empty() {
        println!("   No spending found in this period.");
        return Ok(());
    }

    println!(
        "   {:20} │ {:>10} │ {:>6} │ {:>5} │ {:>9} │ {:>9}",
        "Category", "Amount", "%", "Count", "Average", "Largest"
    );
    println!("   ─────────────────────┼────────────┼────────┼───────┼───────────┼──────────");
    for row in &response.categories {
        println!(
            "   {:20} │ {:>10} │ {:>5.1}% │ {:>5} │ {:>9} │ {:>9}",
            truncate(&row.category_name, 20),
            row.total_amount.to_string(),
            row.percentage,
            row.transaction_count,
            row.average_transaction.to_string(),
            row.largest_transaction.to_string()
        );
    }

    Ok(())
}

pub fn cmd_report_trend(
    db: &Database,
    owner: i64,
    range: Option<DateRange>,
    json: bool,
) -> Result<()> {
    let range = range.context("Trend report needs a bounded period (not 'all')")?;
    let view = TransactionView::load(db, owner, Some(range))?;
    let trend = AggregationEngine::new(db.config()).trend_analysis(&view, range);
    let response = ReportAssembler.trend(&trend);

    if json {
        return print_json(&response);
    }

    let analysis = &response.trend_analysis;
    let arrow = match analysis.trend {
        "INCREASING" => "📈",
        "DECREASING" => "📉",
        _ => "➡️ ",
    };

    println!();
    println!("{} Spending trend: {}", arrow, analysis.trend);
    println!("   Period: {} to {}", response.start_date, response.end_date);
    println!("   ─────────────────────────────────────────");
    println!("   Total:          {:>12}", response.total_amount.to_string());
    println!("   Daily average:  {:>12}", response.average_daily_spending.to_string());
    println!("   Change:         {:>11.1}%", analysis.change_percentage);
    if let (Some(amount), Some(date)) = (analysis.highest_spending_day, analysis.highest_spending_date) {
        println!("   Highest day:    {} ({})", amount, date);
    }
    if let (Some(amount), Some(date)) = (analysis.lowest_spending_day, analysis.lowest_spending_date) {
        println!("   Lowest day:     {} ({})", amount, date);
    }

    Ok(())
}
