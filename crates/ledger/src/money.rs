use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

use crate::Currency;

/// Signed money amount represented as **integer minor units** (centavos).
///
/// Use this type for **all** monetary values in the ledger (balances, movement
/// amounts, installment splits) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = income / increase
/// - negative = expense / decrease
///
/// # Examples
///
/// ```rust
/// use ledger::{Currency, Money};
///
/// let amount = Money::new(150_050);
/// assert_eq!(amount.minor(), 150050);
/// assert_eq!(amount.format(Currency::Ars), "$1,500.50 ARS");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates a new amount from whole major units (`500` pesos → `50000`).
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns the absolute value.
    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Divides by `parts`, rounding half away from zero to the nearest minor unit.
    ///
    /// Returns `None` when `parts` is zero.
    #[must_use]
    pub fn div_round(self, parts: u32) -> Option<Money> {
        if parts == 0 {
            return None;
        }
        let parts = i64::from(parts);
        let half = parts / 2;
        let value = if self.0 >= 0 {
            (self.0 + half) / parts
        } else {
            (self.0 - half) / parts
        };
        Some(Money(value))
    }

    /// Share of `self` over `total` as a percentage, `0.0` when `total` is zero.
    #[must_use]
    pub fn percent_of(self, total: Money) -> f64 {
        if total.0 == 0 {
            return 0.0;
        }
        (self.0 as f64) * 100.0 / (total.0 as f64)
    }

    /// Formats the amount with thousands grouping, symbol and currency code.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let minor = abs % 100;
        format!(
            "{sign}{symbol}{major}.{minor:02} {code}",
            symbol = currency.symbol(),
            major = group_thousands(major),
            code = currency.code()
        )
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_groups_thousands() {
        assert_eq!(Money::new(0).format(Currency::Ars), "$0.00 ARS");
        assert_eq!(Money::new(50_000).format(Currency::Ars), "$500.00 ARS");
        assert_eq!(Money::new(150_050).format(Currency::Ars), "$1,500.50 ARS");
        assert_eq!(
            Money::new(200_000_000).format(Currency::Ars),
            "$2,000,000.00 ARS"
        );
        assert_eq!(Money::new(-1_050).format(Currency::Usd), "-US$10.50 USD");
    }

    #[test]
    fn div_round_rounds_half_up() {
        assert_eq!(Money::new(1_000).div_round(3), Some(Money::new(333)));
        assert_eq!(Money::new(1_001).div_round(2), Some(Money::new(501)));
        assert_eq!(Money::new(10).div_round(0), None);
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(Money::new(10).percent_of(Money::ZERO), 0.0);
        assert!((Money::new(25).percent_of(Money::new(100)) - 25.0).abs() < f64::EPSILON);
    }
}
