//! Tally CLI - Personal expense tracker
//!
//! Usage:
//!   tally init                          Initialize database
//!   tally tx add "Lunch" 12.50          Record an expense
//!   tally budgets set 400 --month 2024-03
//!   tally report monthly --json         Monthly summary as JSON

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let owner = cli.user;
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, config),
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, config)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db, owner),
                Some(CategoriesAction::Add {
                    name,
                    color,
                    icon,
                    description,
                }) => commands::cmd_categories_add(
                    &db,
                    owner,
                    &name,
                    color.as_deref(),
                    icon.as_deref(),
                    description.as_deref(),
                ),
                Some(CategoriesAction::Edit {
                    id,
                    name,
                    color,
                    icon,
                }) => commands::cmd_categories_edit(
                    &db,
                    owner,
                    id,
                    name.as_deref(),
                    color.as_deref(),
                    icon.as_deref(),
                ),
                Some(CategoriesAction::Delete { id }) => {
                    commands::cmd_categories_delete(&db, owner, id)
                }
            }
        }
        Commands::Tx { action } => {
            let db = commands::open_db(&cli.db, config)?;
            match action {
                None => commands::cmd_tx_list(&db, owner, &TxFilterArgs::default_listing()),
                Some(TxAction::List { filter }) => commands::cmd_tx_list(&db, owner, &filter),
                Some(TxAction::Add {
                    title,
                    amount,
                    kind,
                    date,
                    category,
                    description,
                    notes,
                    every,
                }) => commands::cmd_tx_add(
                    &db,
                    owner,
                    commands::TxInput {
                        title,
                        amount,
                        kind,
                        date,
                        category,
                        description,
                        notes,
                        every,
                    },
                ),
                Some(TxAction::Edit {
                    id,
                    title,
                    amount,
                    kind,
                    date,
                    category,
                    uncategorize,
                    notes,
                }) => {
                    let category = if uncategorize {
                        Some(None)
                    } else {
                        category.map(Some)
                    };
                    commands::cmd_tx_edit(
                        &db,
                        owner,
                        id,
                        commands::TxChanges {
                            title,
                            amount,
                            kind,
                            date,
                            category,
                            notes,
                        },
                    )
                }
                Some(TxAction::Delete { id }) => commands::cmd_tx_delete(&db, owner, id),
            }
        }
        Commands::Budgets { action } => {
            let db = commands::open_db(&cli.db, config)?;
            match action {
                None => commands::cmd_budgets_list(&db, owner, None),
                Some(BudgetsAction::List { month }) => {
                    commands::cmd_budgets_list(&db, owner, month.as_deref())
                }
                Some(BudgetsAction::Set {
                    amount,
                    month,
                    category,
                    threshold,
                }) => commands::cmd_budgets_set(
                    &db,
                    owner,
                    &amount,
                    month.as_deref(),
                    category,
                    threshold,
                ),
                Some(BudgetsAction::Delete { id }) => commands::cmd_budgets_delete(&db, owner, id),
                Some(BudgetsAction::Alerts) => commands::cmd_budgets_alerts(&db, owner),
                Some(BudgetsAction::Check { month }) => {
                    commands::cmd_budgets_check(&db, owner, month.as_deref())
                }
            }
        }
        Commands::Report { json, report } => {
            let db = commands::open_db(&cli.db, config)?;
            match report {
                ReportType::Summary { period, from, to } => {
                    let range = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
                    commands::cmd_report_summary(&db, owner, range, json)
                }
                ReportType::Monthly { month } => {
                    commands::cmd_report_monthly(&db, owner, month.as_deref(), json)
                }
                ReportType::Yearly { year } => commands::cmd_report_yearly(&db, owner, year, json),
                ReportType::Categories { period, from, to } => {
                    let range = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
                    commands::cmd_report_categories(&db, owner, range, json)
                }
                ReportType::Trend { period, from, to } => {
                    let range = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
                    commands::cmd_report_trend(&db, owner, range, json)
                }
            }
        }
    }
}
