//! Transaction command implementations

use anyhow::{Context, Result};
use tally_core::models::{NewTransaction, TransactionUpdate};
use tally_core::{BudgetTracker, CategoryDirectory, Database, TransactionFilter, YearMonth};

use super::budgets::print_status_line;
use super::core::{parse_date, parse_frequency, parse_kind, parse_money, today};
use super::truncate;
use crate::cli::TxFilterArgs;

// Open ends of a one-sided --from/--to range
const EARLIEST: &str = "0001-01-01";
const LATEST: &str = "9999-12-31";

/// Arguments of `tx add`
pub struct TxInput {
    pub title: String,
    pub amount: String,
    pub kind: String,
    pub date: Option<String>,
    pub category: Option<i64>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub every: Option<String>,
}

/// Arguments of `tx edit`; `None` leaves a field as it is
#[derive(Default)]
pub struct TxChanges {
    pub title: Option<String>,
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub date: Option<String>,
    /// `Some(None)` removes the category
    pub category: Option<Option<i64>>,
    pub notes: Option<String>,
}

pub fn cmd_tx_list(db: &Database, owner: i64, args: &TxFilterArgs) -> Result<()> {
    let kind = args.kind.as_deref().map(parse_kind).transpose()?;
    let min = args.min.as_deref().map(parse_money).transpose()?;
    let max = args.max.as_deref().map(parse_money).transpose()?;
    let date_range = match (args.from.as_deref(), args.to.as_deref()) {
        (None, None) => None,
        (from, to) => Some((
            parse_date(from.unwrap_or(EARLIEST))?,
            parse_date(to.unwrap_or(LATEST))?,
        )),
    };

    let filter = TransactionFilter::new()
        .category_id(args.category)
        .kind(kind)
        .date_range(date_range)
        .min_amount(min)
        .max_amount(max)
        .search(args.search.as_deref())
        .recurring(args.recurring.then_some(true))
        .sort_field(Some(args.sort.as_str()))
        .sort_order(Some(if args.asc { "asc" } else { "desc" }))
        .limit(Some(args.limit));

    let transactions = db.search_transactions(owner, &filter)?;
    let total = db.count_transactions(owner, &filter)?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let categories = db.list_categories(owner)?;
    let directory = CategoryDirectory::new(&categories, &db.config().categories);

    println!(
        "{:>6}  {:10}  {:30} {:18} {:>12}",
        "ID", "Date", "Title", "Category", "Amount"
    );
    println!("{}", "─".repeat(82));

    for tx in &transactions {
        let sign = if tx.is_income() { "+" } else { "-" };
        println!(
            "{:>6}  {:10}  {:30} {:18} {:>12}{}",
            tx.id,
            tx.date,
            truncate(&tx.title, 30),
            truncate(&directory.resolve(tx).name, 18),
            format!("{}{}", sign, tx.amount),
            if tx.recurring { " ↻" } else { "" }
        );
    }

    println!();
    println!("Showing {} of {} transactions", transactions.len(), total);
    Ok(())
}

pub fn cmd_tx_add(db: &Database, owner: i64, input: TxInput) -> Result<()> {
    let frequency = input.every.as_deref().map(parse_frequency).transpose()?;
    let new = NewTransaction {
        amount: parse_money(&input.amount)?,
        kind: parse_kind(&input.kind)?,
        date: input.date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today),
        category_id: input.category,
        title: input.title,
        description: input.description,
        notes: input.notes,
        recurring: frequency.is_some(),
        frequency,
    };

    let tx = db
        .create_transaction(owner, &new)
        .context("Failed to record transaction")?;

    println!(
        "✓ Recorded {} {} on {} (id: {})",
        tx.kind.as_str().to_lowercase(),
        tx.amount,
        tx.date,
        tx.id
    );
    print_budget_impact(db, owner, tx.date)?;
    Ok(())
}

pub fn cmd_tx_edit(db: &Database, owner: i64, id: i64, changes: TxChanges) -> Result<()> {
    let update = TransactionUpdate {
        title: changes.title,
        amount: changes.amount.as_deref().map(parse_money).transpose()?,
        kind: changes.kind.as_deref().map(parse_kind).transpose()?,
        date: changes.date.as_deref().map(parse_date).transpose()?,
        category_id: changes.category,
        notes: changes.notes.map(Some),
        ..Default::default()
    };

    let tx = db
        .update_transaction(owner, id, &update)
        .with_context(|| format!("Failed to update transaction {}", id))?;

    println!("✓ Updated transaction {}: {} {}", tx.id, tx.title, tx.amount);
    print_budget_impact(db, owner, tx.date)?;
    Ok(())
}

pub fn cmd_tx_delete(db: &Database, owner: i64, id: i64) -> Result<()> {
    db.delete_transaction(owner, id)
        .with_context(|| format!("Failed to delete transaction {}", id))?;
    println!("✓ Deleted transaction {}", id);
    Ok(())
}

/// Show where the month's budgets stand after a write
fn print_budget_impact(db: &Database, owner: i64, date: chrono::NaiveDate) -> Result<()> {
    let month = YearMonth::of(date);
    for budget in db.list_budgets(owner, Some(month))? {
        let status = BudgetTracker::status(&budget);
        print_status_line(&status);
    }
    Ok(())
}
