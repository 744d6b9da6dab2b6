//! Budget tracking
//!
//! A budget's spent amount is derived: it is always the sum of the expense
//! transactions in its scope (owner, month and optionally category), and only
//! the tracker writes it. The alert is a two-state machine per budget month:
//!
//! ```text
//! BelowThreshold --(usage >= threshold)--> ThresholdReached
//! ```
//!
//! There is no way back within a month. A new budget record for the next
//! month starts over at `BelowThreshold`. Being over budget is a separate
//! flag and does not gate the alert.

mod notify;
mod state;
mod tracker;

pub use notify::{AlertSink, TracingAlertSink};
pub use state::{
    evaluate_alert, is_over_budget, recompute_spent, remaining, should_alert, usage_percentage,
};
pub use tracker::{BudgetStatus, BudgetTracker};
