//! Daily expense trend

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{AggregationEngine, DailyExpense, ExpenseTrend, Trend, TrendAnalysis};
use crate::money::{round_percent, Money};
use crate::period::DateRange;
use crate::view::TransactionView;

impl AggregationEngine {
    /// One zero-filled bucket per day of `range` plus trend classification.
    ///
    /// The buckets are split into a first and a second half; with an odd
    /// number of days the middle day belongs to neither. The change between
    /// the halves' averages is compared against the configured band.
    pub fn trend_analysis(&self, view: &TransactionView, range: DateRange) -> ExpenseTrend {
        let mut by_day: HashMap<NaiveDate, (Money, usize)> = HashMap::new();
        for tx in view.within(range).filter(|tx| tx.is_expense()) {
            let entry = by_day.entry(tx.date).or_insert((Money::ZERO, 0));
            entry.0 += tx.amount;
            entry.1 += 1;
        }

        let daily_expenses: Vec<DailyExpense> = range
            .days()
            .map(|date| {
                let (amount, transaction_count) =
                    by_day.get(&date).copied().unwrap_or((Money::ZERO, 0));
                DailyExpense {
                    date,
                    amount,
                    transaction_count,
                }
            })
            .collect();

        let total_amount: Money = daily_expenses.iter().map(|d| d.amount).sum();

        ExpenseTrend {
            start_date: range.start,
            end_date: range.end,
            total_amount,
            average_daily_spending: total_amount.average_over(daily_expenses.len()),
            analysis: self.classify(&daily_expenses),
            daily_expenses,
        }
    }

    fn classify(&self, days: &[DailyExpense]) -> TrendAnalysis {
        let half = days.len() / 2;
        let first = half_average(&days[..half]);
        let second = half_average(&days[days.len() - half..]);

        let (trend, change_percentage) = if first.is_zero() {
            if second > Decimal::ZERO {
                (Trend::Increasing, Decimal::ZERO)
            } else {
                (Trend::Stable, Decimal::ZERO)
            }
        } else {
            let change = round_percent((second - first) / first * Decimal::ONE_HUNDRED);
            let trend = if change > self.trend_band {
                Trend::Increasing
            } else if change < -self.trend_band {
                Trend::Decreasing
            } else {
                Trend::Stable
            };
            (trend, change)
        };

        TrendAnalysis {
            trend,
            change_percentage,
            highest_spending_day: extreme_day(days, |candidate, best| candidate > best),
            lowest_spending_day: extreme_day(days, |candidate, best| candidate < best),
        }
    }
}

fn half_average(days: &[DailyExpense]) -> Decimal {
    if days.is_empty() {
        return Decimal::ZERO;
    }
    let total: Money = days.iter().map(|d| d.amount).sum();
    total.amount() / Decimal::from(days.len() as u64)
}

/// First day whose amount beats every earlier one, so ties go to the earliest date
fn extreme_day(days: &[DailyExpense], beats: impl Fn(Money, Money) -> bool) -> Option<DailyExpense> {
    let mut best: Option<&DailyExpense> = None;
    for day in days {
        match best {
            Some(current) if !beats(day.amount, current.amount) => {}
            _ => best = Some(day),
        }
    }
    best.cloned()
}
