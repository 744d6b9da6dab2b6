//! Fixed-point money and percentage arithmetic
//!
//! Every amount in Tally is a [`Money`]: a `Decimal` normalised to two
//! fractional digits with half-up rounding. Percentages stay as `Decimal`
//! and are rounded half-up as well, so the numbers a report shows do not
//! depend on float formatting.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of fractional digits carried by every amount.
pub const MONEY_SCALE: u32 = 2;

/// Number of fractional digits kept on report percentages.
pub const PERCENT_SCALE: u32 = 4;

/// A signed monetary amount with exactly two fractional digits.
///
/// ```rust
/// use tally_core::Money;
///
/// let amount: Money = "12.3".parse().unwrap();
/// assert_eq!(amount.to_string(), "12.30");
/// assert_eq!(amount.cents().unwrap(), 1230);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Creates an amount, rounding half-up to two places.
    pub fn new(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(MONEY_SCALE);
        Self(rounded)
    }

    /// Creates an amount from integer cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// Returns the amount as integer cents (storage representation).
    pub fn cents(self) -> Result<i64> {
        i64::try_from(self.0.mantissa())
            .map_err(|_| Error::InvalidData(format!("amount {} out of range", self.0)))
    }

    /// The underlying decimal value.
    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Mean of `count` equal shares of this amount; zero when `count` is 0.
    pub fn average_over(self, count: usize) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        Money::new(self.0 / Decimal::from(count as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parses a decimal string. Accepts `.` or `,` as separator and rejects
    /// more than two fractional digits.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidData("empty amount".to_string()));
        }
        let normalized = trimmed.replace(',', ".");
        if let Some((_, frac)) = normalized.split_once('.') {
            if frac.len() > MONEY_SCALE as usize {
                return Err(Error::InvalidData(format!(
                    "amount {} has more than {} decimals",
                    trimmed, MONEY_SCALE
                )));
            }
        }
        let value = Decimal::from_str(&normalized)
            .map_err(|e| Error::InvalidData(format!("invalid amount {}: {}", trimmed, e)))?;
        Ok(Money::new(value))
    }
}

/// Rounds a percentage half-up to report precision.
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, rounded half-up; zero when `whole` is zero.
pub fn percentage_of(part: Money, whole: Money) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_percent(part.amount() / whole.amount() * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display_always_has_two_decimals() {
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::new(dec!(90)).to_string(), "90.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
    }

    #[test]
    fn new_rounds_half_up() {
        assert_eq!(Money::new(dec!(1.005)), Money::from_cents(101));
        assert_eq!(Money::new(dec!(1.004)), Money::from_cents(100));
        assert_eq!(Money::new(dec!(-1.005)), Money::from_cents(-101));
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().cents().unwrap(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents().unwrap(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().cents().unwrap(), 1050);
        assert_eq!(" 2.30 ".parse::<Money>().unwrap().cents().unwrap(), 230);
    }

    #[test]
    fn parse_rejects_garbage_and_extra_decimals() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
    }

    #[test]
    fn sum_and_arithmetic() {
        let items = [Money::from_cents(3000), Money::from_cents(4000), Money::from_cents(2000)];
        let total: Money = items.iter().sum();
        assert_eq!(total, Money::new(dec!(90.00)));
        assert_eq!(Money::new(dec!(500)) - total, Money::new(dec!(410)));
    }

    #[test]
    fn average_over_zero_count_is_zero() {
        assert_eq!(Money::new(dec!(10)).average_over(0), Money::ZERO);
        assert_eq!(Money::new(dec!(10)).average_over(3), Money::new(dec!(3.33)));
    }

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(percentage_of(Money::new(dec!(5)), Money::ZERO), Decimal::ZERO);
        assert_eq!(percentage_of(Money::new(dec!(1)), Money::new(dec!(3))), dec!(33.3333));
    }
}
