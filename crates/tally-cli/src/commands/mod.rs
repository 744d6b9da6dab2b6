//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budgets` - Budget commands (list, set, delete, alerts, check)
//! - `categories` - Category commands (list, add, edit, delete)
//! - `core` - Init and shared utilities (open_db, argument parsers)
//! - `reports` - Report commands (summary, monthly, yearly, categories, trend)
//! - `transactions` - Transaction commands (list, add, edit, delete)

pub mod budgets;
pub mod categories;
pub mod core;
pub mod reports;
pub mod transactions;

// Re-export command functions for main.rs
pub use budgets::*;
pub use categories::*;
pub use self::core::*;
pub use reports::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
