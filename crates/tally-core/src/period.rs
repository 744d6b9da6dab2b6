//! Calendar periods used to scope reports and budgets

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A calendar month without a day component (a budget month).
///
/// Stored as the first day of the month so every derived date is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| Error::InvalidData(format!("invalid month: {}-{:02}", year, month)))
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// The following month, if representable.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.first_day(), self.last_day())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| Error::InvalidData(format!("invalid month (use YYYY-MM): {}", s)))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// An inclusive date range.
///
/// A range whose start is after its end is empty rather than invalid:
/// reports over it come back zero-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// January 1st through December 31st of `year`.
    pub fn year(year: i32) -> Result<Self> {
        let start = YearMonth::new(year, 1)?.first_day();
        let end = YearMonth::new(year, 12)?.last_day();
        Ok(Self::new(start, end))
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, 0 for an empty range.
    pub fn num_days(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_month_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert!(feb.contains(date(2024, 2, 15)));
        assert!(!feb.contains(date(2023, 2, 15)));
        assert_eq!(YearMonth::new(2023, 12).unwrap().next(), Some(YearMonth::new(2024, 1).unwrap()));
    }

    #[test]
    fn year_month_parse_and_display() {
        let ym: YearMonth = "2024-03".parse().unwrap();
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2024-03");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!(YearMonth::new(2024, 0).is_err());
    }

    #[test]
    fn year_month_serializes_as_string() {
        let ym = YearMonth::new(2024, 3).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-03\"");
        let back: YearMonth = serde_json::from_str("\"2024-03\"").unwrap();
        assert_eq!(back, ym);
    }

    #[test]
    fn date_range_counts_inclusive_days() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 7));
        assert_eq!(range.num_days(), 7);
        assert_eq!(range.days().count(), 7);
        assert_eq!(range.days().last(), Some(date(2024, 3, 7)));
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = DateRange::new(date(2024, 3, 7), date(2024, 3, 1));
        assert!(range.is_empty());
        assert_eq!(range.num_days(), 0);
        assert_eq!(range.days().count(), 0);
        assert!(!range.contains(date(2024, 3, 3)));
    }

    #[test]
    fn year_range_covers_leap_year() {
        let range = DateRange::year(2024).unwrap();
        assert_eq!(range.num_days(), 366);
    }
}
