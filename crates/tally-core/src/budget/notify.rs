//! Budget alert delivery

use tracing::warn;

use crate::models::BudgetAlertEvent;

/// Receives budget alerts from the tracker.
///
/// Delivery is fire-and-forget: a sink handles (and logs) its own failures
/// and never fails the write that triggered the alert.
pub trait AlertSink: Send + Sync {
    fn notify(&self, event: &BudgetAlertEvent);
}

/// Sink that only logs the alert
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn notify(&self, event: &BudgetAlertEvent) {
        warn!(
            budget_id = event.budget_id,
            owner_id = event.owner_id,
            month = %event.month,
            category_id = ?event.category_id,
            usage = %event.usage_percentage,
            "Budget alert threshold reached"
        );
    }
}
