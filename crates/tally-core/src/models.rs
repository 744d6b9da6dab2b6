//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::period::YearMonth;

// ========== Transactions ==========

/// Whether a transaction spends or earns money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "EXPENSE",
            Self::Income => "INCOME",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EXPENSE" => Ok(Self::Expense),
            "INCOME" => Ok(Self::Income),
            _ => Err(format!("Unknown transaction kind: {} (valid: expense, income)", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence frequency; stored and shown, never interpreted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(format!(
                "Unknown frequency: {} (valid: daily, weekly, monthly, yearly)",
                s
            )),
        }
    }
}

/// Copy of a category's display attributes taken when a transaction was written.
///
/// This is a read cache. The live [`Category`] wins whenever it still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A recorded expense or income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Always positive; the direction comes from `kind`
    pub amount: Money,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub category: Option<CategorySnapshot>,
    pub notes: Option<String>,
    pub recurring: bool,
    pub frequency: Option<Frequency>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

/// A transaction to create
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub notes: Option<String>,
    pub recurring: bool,
    pub frequency: Option<Frequency>,
}

/// Partial update of a transaction; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<Money>,
    pub kind: Option<TransactionKind>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` removes the category
    pub category_id: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
    pub recurring: Option<bool>,
    pub frequency: Option<Option<Frequency>>,
}

// ========== Categories ==========

/// A user-defined (or shared default) spending category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// `None` for shared defaults
    pub owner_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn snapshot(&self) -> CategorySnapshot {
        CategorySnapshot {
            name: self.name.clone(),
            color: Some(self.color.clone()),
            icon: self.icon.clone(),
        }
    }

    /// Whether `owner_id` may use this category
    pub fn visible_to(&self, owner_id: i64) -> bool {
        self.is_default || self.owner_id == Some(owner_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub icon: Option<Option<String>>,
}

// ========== Budgets ==========

/// Alert state of a budget month
///
/// The only transition is `BelowThreshold -> ThresholdReached`. A new
/// budget record for the next month starts over at `BelowThreshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    #[default]
    BelowThreshold,
    ThresholdReached,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelowThreshold => "below_threshold",
            Self::ThresholdReached => "threshold_reached",
        }
    }
}

impl std::str::FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "below_threshold" => Ok(Self::BelowThreshold),
            "threshold_reached" => Ok(Self::ThresholdReached),
            _ => Err(format!("Unknown alert state: {}", s)),
        }
    }
}

/// The transactions a budget counts: one owner, one month, optionally one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetScope {
    pub owner_id: i64,
    pub month: YearMonth,
    /// `None` covers every category (whole-month budget)
    pub category_id: Option<i64>,
}

impl BudgetScope {
    /// Whether `tx` falls inside this scope (any kind; only expenses are summed)
    pub fn contains(&self, tx: &Transaction) -> bool {
        tx.owner_id == self.owner_id
            && self.month.contains(tx.date)
            && match self.category_id {
                Some(category_id) => tx.category_id == Some(category_id),
                None => true,
            }
    }
}

/// A monthly spending limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub owner_id: i64,
    pub category_id: Option<i64>,
    pub budget_amount: Money,
    /// Derived from transactions by the tracker; never written from outside it
    pub spent_amount: Money,
    /// Percent of `budget_amount` at which the alert fires (1-100)
    pub alert_threshold: Decimal,
    pub alert_state: AlertState,
    pub month: YearMonth,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn scope(&self) -> BudgetScope {
        BudgetScope {
            owner_id: self.owner_id,
            month: self.month,
            category_id: self.category_id,
        }
    }

    pub fn alert_sent(&self) -> bool {
        self.alert_state == AlertState::ThresholdReached
    }
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: Option<i64>,
    pub budget_amount: Money,
    pub month: YearMonth,
    /// Falls back to the configured default when absent
    pub alert_threshold: Option<Decimal>,
}

/// Emitted once per budget month when spending first reaches the alert threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertEvent {
    pub budget_id: i64,
    pub owner_id: i64,
    pub usage_percentage: Decimal,
    pub month: YearMonth,
    pub category_id: Option<i64>,
}
