//! Per-category spending statistics

use super::{group_expenses, AggregationEngine, CategorySpending, CategoryStats};
use crate::money::{percentage_of, Money};
use crate::period::DateRange;
use crate::view::TransactionView;

impl AggregationEngine {
    /// Expense statistics per category over an inclusive range
    pub fn category_spending(&self, view: &TransactionView, range: DateRange) -> CategorySpending {
        let directory = view.directory(&self.labels);
        let groups = group_expenses(&directory, view.within(range));
        let total_spent: Money = groups.iter().map(|g| g.total).sum();

        let categories = groups
            .into_iter()
            .map(|group| CategoryStats {
                category_id: group.label.id,
                percentage: percentage_of(group.total, total_spent),
                transaction_count: group.count,
                average_transaction: group.total.average_over(group.count),
                largest_transaction: group.largest,
                smallest_transaction: group.smallest,
                total_amount: group.total,
                name: group.label.name,
                color: group.label.color,
                icon: group.label.icon,
            })
            .collect();

        CategorySpending {
            range,
            total_spent,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{category, date, expense, income, money};
    use rust_decimal_macros::dec;

    #[test]
    fn stats_per_category() {
        let food = category(1, 1, "Food");
        let rent = category(2, 1, "Rent");
        let view = TransactionView::new(
            1,
            None,
            vec![
                expense(1, "2024-03-01", "10.00", Some(&food)),
                expense(1, "2024-03-05", "25.00", Some(&food)),
                expense(1, "2024-03-09", "5.00", Some(&food)),
                expense(1, "2024-03-01", "60.00", Some(&rent)),
                income(1, "2024-03-01", "1000.00"),
            ],
            vec![food, rent],
        );
        let range = DateRange::new(date("2024-03-01"), date("2024-03-31"));

        let spending = AggregationEngine::default().category_spending(&view, range);
        assert_eq!(spending.total_spent, money("100.00"));
        assert_eq!(spending.categories.len(), 2);

        let rent = &spending.categories[0];
        assert_eq!(rent.name, "Rent");
        assert_eq!(rent.percentage, dec!(60));

        let food = &spending.categories[1];
        assert_eq!(food.total_amount, money("40.00"));
        assert_eq!(food.transaction_count, 3);
        assert_eq!(food.average_transaction, money("13.33"));
        assert_eq!(food.largest_transaction, money("25.00"));
        assert_eq!(food.smallest_transaction, money("5.00"));
    }

    #[test]
    fn respects_range_bounds() {
        let view = TransactionView::new(
            1,
            None,
            vec![
                expense(1, "2024-02-29", "1.00", None),
                expense(1, "2024-03-01", "2.00", None),
                expense(1, "2024-03-31", "3.00", None),
                expense(1, "2024-04-01", "4.00", None),
            ],
            vec![],
        );
        let range = DateRange::new(date("2024-03-01"), date("2024-03-31"));
        let spending = AggregationEngine::default().category_spending(&view, range);
        assert_eq!(spending.total_spent, money("5.00"));
        assert_eq!(spending.categories[0].name, "Uncategorized");
    }

    #[test]
    fn inverted_range_is_empty() {
        let view = TransactionView::new(1, None, vec![expense(1, "2024-03-05", "9.00", None)], vec![]);
        let range = DateRange::new(date("2024-03-31"), date("2024-03-01"));
        let spending = AggregationEngine::default().category_spending(&view, range);
        assert_eq!(spending.total_spent, Money::ZERO);
        assert!(spending.categories.is_empty());
    }
}
