//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tally - Track spending against monthly budgets
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal expense tracker with budgets and spending reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Owner id every command runs as
    #[arg(long, default_value_t = 1, global = true)]
    pub user: i64,

    /// Config override (defaults to ~/.local/share/tally/config/tally.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Manage categories (list, add, edit, delete)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage transactions (list, add, edit, delete)
    Tx {
        #[command(subcommand)]
        action: Option<TxAction>,
    },

    /// Manage monthly budgets (list, set, delete, alerts, check)
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Generate reports
    Report {
        /// Print the report as JSON
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        report: ReportType,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List your categories and the shared defaults
    List,

    /// Add a category
    Add {
        /// Category name (unique per user, case-insensitive)
        name: String,

        /// Hex color, e.g. #ff0000
        #[arg(long)]
        color: Option<String>,

        /// Icon name
        #[arg(long)]
        icon: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Change a category; transactions follow the new name and color
    Edit {
        /// Category ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New color
        #[arg(long)]
        color: Option<String>,

        /// New icon
        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a category (transactions keep their last known name)
    Delete {
        /// Category ID
        id: i64,
    },
}

/// Filters for `tx list`
#[derive(Args, Debug, Default)]
pub struct TxFilterArgs {
    /// Maximum number of transactions to show
    #[arg(short, long, default_value = "20")]
    pub limit: i64,

    /// Only this category
    #[arg(long)]
    pub category: Option<i64>,

    /// Only this kind: expense or income
    #[arg(long)]
    pub kind: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Minimum amount
    #[arg(long)]
    pub min: Option<String>,

    /// Maximum amount
    #[arg(long)]
    pub max: Option<String>,

    /// Search title and description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only recurring transactions
    #[arg(long)]
    pub recurring: bool,

    /// Sort by date or amount
    #[arg(long, default_value = "date")]
    pub sort: String,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

impl TxFilterArgs {
    /// What a bare `tally tx` lists
    pub fn default_listing() -> Self {
        Self {
            limit: 20,
            sort: "date".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum TxAction {
    /// List transactions
    List {
        #[command(flatten)]
        filter: TxFilterArgs,
    },

    /// Record a transaction
    Add {
        /// Title
        title: String,

        /// Amount (positive, e.g. 12.50)
        amount: String,

        /// expense or income
        #[arg(long, default_value = "expense")]
        kind: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Category ID
        #[arg(long)]
        category: Option<i64>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,

        /// Mark as recurring with a frequency: daily, weekly, monthly, yearly
        #[arg(long)]
        every: Option<String>,
    },

    /// Change a transaction
    Edit {
        /// Transaction ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New amount
        #[arg(long)]
        amount: Option<String>,

        /// New kind
        #[arg(long)]
        kind: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New category ID
        #[arg(long, conflicts_with = "uncategorize")]
        category: Option<i64>,

        /// Remove the category
        #[arg(long)]
        uncategorize: bool,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// List budgets with spent amounts
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Create a budget for a month
    Set {
        /// Budget amount
        amount: String,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Category ID (omit for a whole-month budget)
        #[arg(long)]
        category: Option<i64>,

        /// Alert threshold percent, 1-100 (defaults to config)
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Delete a budget
    Delete {
        /// Budget ID
        id: i64,
    },

    /// Show recorded budget alerts
    Alerts,

    /// Recompute every budget and report newly crossed thresholds
    Check {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Overall totals
    Summary {
        /// Time period: this-month, last-month, this-year, last-30-days, last-90-days, all
        #[arg(long, default_value = "all")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,
    },

    /// One month with its category breakdown and budget
    Monthly {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Twelve months of a year
    Yearly {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Spending statistics per category
    Categories {
        /// Time period
        #[arg(long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,
    },

    /// Daily spending and trend direction
    Trend {
        /// Time period
        #[arg(long, default_value = "last-30-days")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,
    },
}
