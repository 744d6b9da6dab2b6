//! Tally Core Library
//!
//! Analytics and budget tracking for the Tally expense tracker:
//! - Fixed-point money and budget months
//! - Transaction views and category resolution with snapshot fallback
//! - Aggregation engine (summaries, monthly/yearly reports, trends)
//! - Budget tracker with a once-per-month threshold alert
//! - Report assembly into the external response shapes
//! - SQLite storage collaborator with connection pooling and migrations

pub mod analytics;
pub mod budget;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod period;
pub mod report;
pub mod repository;
pub mod view;

/// Test utilities including an in-memory repository
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::{AggregationEngine, Trend};
pub use budget::{AlertSink, BudgetStatus, BudgetTracker, TracingAlertSink};
pub use category::{CategoryDirectory, CategoryLabel};
pub use config::TrackerConfig;
pub use db::{BudgetAlertRecord, Database, StoreAlertSink, TransactionFilter};
pub use error::{Error, Result};
pub use money::Money;
pub use period::{DateRange, YearMonth};
pub use report::ReportAssembler;
pub use repository::Repository;
pub use view::TransactionView;
