//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Category CRUD, default seeding and snapshot refresh
//! - `transactions` - Transaction CRUD and filtered search
//! - `budgets` - Budgets, tracker write-back and the alert log
//!
//! Every transaction write runs the budget tracker afterwards, so the
//! spent amounts and alert states stored here never lag the transactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::budget::{AlertSink, BudgetTracker};
use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::models::{Budget, Category, Transaction};
use crate::period::{DateRange, YearMonth};
use crate::repository::Repository;

mod budgets;
mod categories;
mod transaction_filter;
mod transactions;

pub use budgets::{BudgetAlertRecord, StoreAlertSink};
pub use transaction_filter::{FilterResult, TransactionFilter};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a timestamp the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Turn a unique-index failure into [`Error::Duplicate`]
pub(crate) fn map_unique_violation(err: rusqlite::Error, what: impl FnOnce() -> String) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::Duplicate(what())
        }
        other => Error::Database(other),
    }
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    config: Arc<TrackerConfig>,
    tracker: Arc<BudgetTracker>,
}

impl Database {
    /// Open (or create) a database with the default configuration
    pub fn new(path: &str) -> Result<Self> {
        Self::open(path, TrackerConfig::default())
    }

    /// Open (or create) a database.
    ///
    /// Budget alerts are recorded in the `budget_alerts` table; use
    /// [`Database::with_alert_sink`] to deliver them elsewhere.
    pub fn open(path: &str, config: TrackerConfig) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let sink = Arc::new(StoreAlertSink::new(pool.clone()));
        let db = Self {
            pool,
            db_path: path.to_string(),
            config: Arc::new(config),
            tracker: Arc::new(BudgetTracker::new(sink)),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Replace where budget alerts are delivered
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.tracker = Arc::new(BudgetTracker::new(sink));
        self
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracker(&self) -> &BudgetTracker {
        &self.tracker
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;

            -- Ids are never reused: transactions keep dangling category ids and
            -- the alert log keeps ids of deleted budgets.

            -- Categories (owner_id NULL = shared default)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER,
                name TEXT NOT NULL,
                description TEXT,
                color TEXT NOT NULL,
                icon TEXT,
                is_default BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_categories_owner ON categories(owner_id);

            -- Transactions
            -- category_* columns are a snapshot of the category at write time.
            -- category_id is deliberately not a foreign key: it may outlive the category.
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
                kind TEXT NOT NULL,                        -- EXPENSE, INCOME
                date DATE NOT NULL,
                category_id INTEGER,
                category_name TEXT,
                category_color TEXT,
                category_icon TEXT,
                notes TEXT,
                recurring BOOLEAN NOT NULL DEFAULT 0,
                frequency TEXT,                            -- DAILY, WEEKLY, MONTHLY, YEARLY
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_owner_date ON transactions(owner_id, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

            -- Budgets (one per owner, category-or-none and month)
            CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                category_id INTEGER,
                budget_cents INTEGER NOT NULL,
                spent_cents INTEGER NOT NULL DEFAULT 0,
                alert_threshold TEXT NOT NULL,             -- decimal percent, 1-100
                alert_state TEXT NOT NULL DEFAULT 'below_threshold',
                month TEXT NOT NULL,                       -- YYYY-MM
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_budgets_scope
                ON budgets(owner_id, IFNULL(category_id, 0), month);

            -- Budget alerts (one row per threshold crossing)
            CREATE TABLE IF NOT EXISTS budget_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                budget_id INTEGER NOT NULL,
                owner_id INTEGER NOT NULL,
                category_id INTEGER,
                month TEXT NOT NULL,
                usage_percentage TEXT NOT NULL,
                payload TEXT NOT NULL,                     -- BudgetAlertEvent as JSON
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_budget_alerts_owner ON budget_alerts(owner_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

impl Repository for Database {
    fn list_transactions(
        &self,
        owner_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>> {
        Database::list_transactions(self, owner_id, range)
    }

    fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>> {
        Database::list_categories(self, owner_id)
    }

    fn list_budgets(&self, owner_id: i64, month: Option<YearMonth>) -> Result<Vec<Budget>> {
        Database::list_budgets(self, owner_id, month)
    }

    fn get_budget(&self, budget_id: i64) -> Result<Option<Budget>> {
        Database::get_budget(self, budget_id)
    }

    fn save_budget_state(&self, budget: &Budget) -> Result<()> {
        Database::save_budget_state(self, budget)
    }

    fn claim_alert(&self, budget_id: i64) -> Result<bool> {
        Database::claim_budget_alert(self, budget_id)
    }
}
