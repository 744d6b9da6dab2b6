//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database with the resolved config
//! - `cmd_init` - Initialize the database
//! - Argument parsers shared by the other commands

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tally_core::models::{Frequency, TransactionKind};
use tally_core::{Database, Money, TrackerConfig, YearMonth};
use tracing::debug;

/// Open the database with the config override (or the defaults)
pub fn open_db(db_path: &Path, config_path: Option<&Path>) -> Result<Database> {
    let config = TrackerConfig::load(config_path).context("Failed to load config")?;
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    debug!(path = path_str, config = ?config_path, "Opening database");
    Database::open(path_str, config).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path, config_path: Option<&Path>) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, config_path)?;

    let seeded = db
        .seed_default_categories()
        .context("Failed to seed default categories")?;
    println!("   Seeded {} default categories", seeded);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record spending: tally tx add \"Groceries\" 54.20 --category 2");
    println!("  2. Set a budget:    tally budgets set 400");
    println!("  3. See the month:   tally report monthly");

    Ok(())
}

pub fn parse_money(value: &str) -> Result<Money> {
    value
        .parse::<Money>()
        .with_context(|| format!("Invalid amount: {}", value))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (use YYYY-MM-DD): {}", value))
}

/// Parse a month, defaulting to the current one
pub fn parse_month(value: Option<&str>) -> Result<YearMonth> {
    match value {
        Some(m) => m.parse::<YearMonth>().context("Invalid --month"),
        None => Ok(YearMonth::of(today())),
    }
}

pub fn parse_kind(value: &str) -> Result<TransactionKind> {
    value.parse::<TransactionKind>().map_err(anyhow::Error::msg)
}

pub fn parse_frequency(value: &str) -> Result<Frequency> {
    value.parse::<Frequency>().map_err(anyhow::Error::msg)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
