//! Type-safe money representation using decimal arithmetic.
//!
//! The store trades in a single currency (Indian rupees), so `Money` carries
//! only an amount. Amounts are never negative: prices, line totals and order
//! totals are all sums of non-negative values.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in the store currency.
///
/// Serialized as a decimal string (e.g. `"42.50"`) so that no precision is
/// lost in JSON.
///
/// ## Examples
///
/// ```
/// use grocer_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::from_minor(4_550);
/// assert_eq!(price.amount(), Decimal::new(4_550, 2));
/// assert_eq!(price.times(2).to_string(), "₹91.00");
/// assert!(Money::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Currency symbol used for display.
    pub const SYMBOL: &'static str = "₹";

    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create an amount from minor units (paise).
    #[must_use]
    pub fn from_minor(minor: u32) -> Self {
        Self(Decimal::new(i64::from(minor), 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a quantity (line total).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", Self::SYMBOL, self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rejected() {
        let result = Money::new(Decimal::new(-1, 2));
        assert!(matches!(result, Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_zero_and_negative_zero_accepted() {
        assert!(Money::new(Decimal::ZERO).unwrap().is_zero());
        assert!(Money::new(-Decimal::ZERO).unwrap().is_zero());
    }

    #[test]
    fn test_sum_and_times() {
        let total: Money = [Money::from_minor(1_000), Money::from_minor(250).times(3)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_minor(1_750));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(4_000).to_string(), "₹40.00");
        assert_eq!(Money::ZERO.to_string(), "₹0.00");
    }

    #[test]
    fn test_serde_as_string_and_rejects_negative() {
        let json = serde_json::to_string(&Money::from_minor(1_999)).unwrap();
        assert_eq!(json, "\"19.99\"");

        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_minor(1_999));

        assert!(serde_json::from_str::<Money>("\"-5\"").is_err());
    }
}
