//! Yearly report

use chrono::Datelike;

use super::{group_expenses, totals, AggregationEngine, MonthlyData, YearlyReport};
use crate::models::Transaction;
use crate::money::Money;
use crate::view::TransactionView;

const MONTHS_PER_YEAR: usize = 12;

impl AggregationEngine {
    /// Twelve zero-filled months plus yearly totals and top categories.
    ///
    /// Monthly averages divide by twelve, not by the number of months with data.
    pub fn yearly_report(&self, view: &TransactionView, year: i32) -> YearlyReport {
        let in_year = |tx: &&Transaction| tx.date.year() == year;
        let directory = view.directory(&self.labels);

        let monthly_data: Vec<MonthlyData> = (1..=MONTHS_PER_YEAR as u32)
            .map(|month| {
                let (expenses, income, transaction_count) = totals(
                    view.transactions()
                        .iter()
                        .filter(in_year)
                        .filter(|tx| tx.date.month() == month),
                );
                MonthlyData {
                    month,
                    expenses,
                    income,
                    net_amount: income - expenses,
                    transaction_count,
                }
            })
            .collect();

        let total_expenses: Money = monthly_data.iter().map(|m| m.expenses).sum();
        let total_income: Money = monthly_data.iter().map(|m| m.income).sum();
        let total_transactions: usize = monthly_data.iter().map(|m| m.transaction_count).sum();

        let groups = group_expenses(&directory, view.transactions().iter().filter(in_year));
        let limit = self.top_categories_limit.unwrap_or(groups.len());
        let top_categories = groups
            .iter()
            .take(limit)
            .map(|group| group.share(total_expenses))
            .collect();

        YearlyReport {
            year,
            total_expenses,
            total_income,
            net_amount: total_income - total_expenses,
            average_monthly_expense: total_expenses.average_over(MONTHS_PER_YEAR),
            average_monthly_income: total_income.average_over(MONTHS_PER_YEAR),
            total_transactions,
            monthly_data,
            top_categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::test_utils::{category, expense, income, money};
    use rust_decimal_macros::dec;

    #[test]
    fn empty_year_has_twelve_zero_months() {
        let view = TransactionView::new(1, None, vec![], vec![]);
        let report = AggregationEngine::default().yearly_report(&view, 2024);

        assert_eq!(report.monthly_data.len(), 12);
        assert!(report
            .monthly_data
            .iter()
            .enumerate()
            .all(|(i, m)| m.month == i as u32 + 1 && m.expenses == Money::ZERO));
        assert_eq!(report.average_monthly_expense, Money::ZERO);
        assert!(report.top_categories.is_empty());
    }

    #[test]
    fn averages_use_fixed_denominator() {
        let food = category(1, 1, "Food");
        let view = TransactionView::new(
            1,
            None,
            vec![
                expense(1, "2024-01-15", "100.00", Some(&food)),
                expense(1, "2024-06-15", "20.00", None),
                income(1, "2024-06-01", "1200.00"),
                expense(1, "2023-12-31", "500.00", Some(&food)),
            ],
            vec![food],
        );

        let report = AggregationEngine::default().yearly_report(&view, 2024);
        assert_eq!(report.total_expenses, money("120.00"));
        assert_eq!(report.average_monthly_expense, money("10.00"));
        assert_eq!(report.average_monthly_income, money("100.00"));
        assert_eq!(report.total_transactions, 3);

        let june = &report.monthly_data[5];
        assert_eq!(june.transaction_count, 2);
        assert_eq!(june.net_amount, money("1180.00"));

        assert_eq!(report.top_categories[0].name, "Food");
        assert_eq!(report.top_categories[0].percentage, dec!(83.3333));
    }

    #[test]
    fn top_categories_honour_configured_limit() {
        let cats: Vec<_> = (1..=4).map(|i| category(i, 1, &format!("C{}", i))).collect();
        let txs = cats
            .iter()
            .enumerate()
            .map(|(i, c)| expense(1, "2024-05-01", &format!("{}.00", i + 1), Some(c)))
            .collect();
        let view = TransactionView::new(1, None, txs, cats.clone());

        let mut config = TrackerConfig::default();
        config.reports.top_categories_limit = Some(2);
        let report = AggregationEngine::new(&config).yearly_report(&view, 2024);

        let names: Vec<&str> = report.top_categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C4", "C3"]);
    }
}
