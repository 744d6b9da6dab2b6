//! Budget command implementations

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tally_core::models::NewBudget;
use tally_core::{BudgetStatus, BudgetTracker, CategoryDirectory, Database};

use super::core::{parse_money, parse_month};
use super::truncate;

pub fn cmd_budgets_list(db: &Database, owner: i64, month: Option<&str>) -> Result<()> {
    let month = month.map(|m| parse_month(Some(m))).transpose()?;
    let budgets = db.list_budgets(owner, month)?;

    if budgets.is_empty() {
        println!("No budgets. Create one with: tally budgets set <amount>");
        return Ok(());
    }

    let categories = db.list_categories(owner)?;
    let labels = &db.config().categories;
    let directory = CategoryDirectory::new(&categories, labels);

    println!(
        "{:>5}  {:7}  {:18} {:>10} {:>10} {:>10} {:>8}  {}",
        "ID", "Month", "Category", "Budget", "Spent", "Left", "Used", ""
    );
    println!("{}", "─".repeat(88));

    for budget in &budgets {
        let status = BudgetTracker::status(budget);
        let category = match budget.category_id {
            Some(id) => directory.resolve_parts(Some(id), None).name,
            None => "(all)".to_string(),
        };
        println!(
            "{:>5}  {:7}  {:18} {:>10} {:>10} {:>10} {:>7}%  {}",
            budget.id,
            budget.month.to_string(),
            truncate(&category, 18),
            budget.budget_amount.to_string(),
            budget.spent_amount.to_string(),
            status.remaining.to_string(),
            status.usage_percentage.normalize().to_string(),
            status_flag(&status)
        );
    }

    Ok(())
}

pub fn cmd_budgets_set(
    db: &Database,
    owner: i64,
    amount: &str,
    month: Option<&str>,
    category: Option<i64>,
    threshold: Option<u32>,
) -> Result<()> {
    let new = NewBudget {
        category_id: category,
        budget_amount: parse_money(amount)?,
        month: parse_month(month)?,
        alert_threshold: threshold.map(Decimal::from),
    };

    let status = db
        .create_budget(owner, &new)
        .with_context(|| format!("Failed to create budget for {}", new.month))?;

    println!(
        "✓ Created budget {} for {} (alert at {}%)",
        status.budget.id,
        status.budget.month,
        status.budget.alert_threshold
    );
    print_status_line(&status);
    Ok(())
}

pub fn cmd_budgets_delete(db: &Database, owner: i64, id: i64) -> Result<()> {
    db.delete_budget(owner, id)
        .with_context(|| format!("Failed to delete budget {}", id))?;
    println!("✓ Deleted budget {}", id);
    Ok(())
}

pub fn cmd_budgets_alerts(db: &Database, owner: i64) -> Result<()> {
    let alerts = db.list_budget_alerts(owner)?;

    if alerts.is_empty() {
        println!("✅ No budget alerts.");
        return Ok(());
    }

    println!("⚠️  Budget alerts:");
    println!();
    for alert in &alerts {
        let event = &alert.event;
        println!(
            "   {}  budget {} ({}): {}% used",
            alert.created_at.format("%Y-%m-%d %H:%M"),
            event.budget_id,
            event.month,
            event.usage_percentage.normalize()
        );
    }

    Ok(())
}

/// Recompute every budget from the stored transactions
pub fn cmd_budgets_check(db: &Database, owner: i64, month: Option<&str>) -> Result<()> {
    let month = month.map(|m| parse_month(Some(m))).transpose()?;
    let statuses = db
        .tracker()
        .refresh_all(db, owner, month)
        .context("Failed to recompute budgets")?;

    println!("🔍 Checked {} budgets", statuses.len());
    let fired: Vec<&BudgetStatus> = statuses.iter().filter(|s| s.fired.is_some()).collect();
    for status in &statuses {
        print_status_line(status);
    }
    if fired.is_empty() {
        println!("   No new alerts.");
    } else {
        println!("   ⚠️  {} budget(s) newly reached their alert threshold", fired.len());
    }

    Ok(())
}

fn status_flag(status: &BudgetStatus) -> &'static str {
    if status.over_budget {
        "🔴 over"
    } else if status.budget.alert_sent() {
        "⚠️  alert"
    } else {
        ""
    }
}

/// One-line budget status used after writes
pub fn print_status_line(status: &BudgetStatus) {
    let budget = &status.budget;
    println!(
        "   Budget {} ({}): {} of {} ({}%) {}",
        budget.id,
        budget.month,
        budget.spent_amount,
        budget.budget_amount,
        status.usage_percentage.normalize(),
        status_flag(status)
    );
}
