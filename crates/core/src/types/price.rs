//! Product prices.
//!
//! The backend sends prices as bare JSON numbers without a currency, so a
//! [`Price`] is just a non-negative decimal amount.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative product price.
///
/// Displays with two decimals and a dollar sign, e.g. `$19.90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Price of `quantity` units, or `None` if the amount does not fit.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Sum of two prices, or `None` if the amount does not fit.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sum of `prices`, or `None` if any partial sum does not fit.
    pub fn checked_sum(prices: impl IntoIterator<Item = Self>) -> Option<Self> {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |acc, price| acc.checked_add(price))
    }

    /// Format for display (e.g. "$19.90").
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${rounded:.2}")
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        let result = Price::new(Decimal::new(-1, 0));
        assert!(matches!(result, Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::new(Decimal::new(1999, 2)).unwrap().display(), "$19.99");
        assert_eq!(Price::new(Decimal::new(12990, 0)).unwrap().display(), "$12990.00");
        assert_eq!(Price::new(Decimal::new(1005, 3)).unwrap().display(), "$1.01");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::new(Decimal::new(250, 2)).unwrap();
        let total = Price::checked_sum([unit.checked_times(2).unwrap(), unit]).unwrap();
        assert_eq!(total.display(), "$7.50");
        assert_eq!(Price::checked_sum([]), Some(Price::ZERO));
    }

    #[test]
    fn test_overflow_is_none() {
        let huge = Price::new(Decimal::from_scientific("5e27").unwrap()).unwrap();
        assert!(huge.checked_times(20).is_none());
        assert!(huge.checked_times(10).is_some());
        assert!(Price::checked_sum([huge; 20]).is_none());
        assert!(Price::new(Decimal::MAX).unwrap().checked_add(huge).is_none());
    }

    #[test]
    fn test_deserialize_from_json_number() {
        let price: Price = serde_json::from_str("19.9").unwrap();
        assert_eq!(price.display(), "$19.90");

        let price: Price = serde_json::from_str("1500").unwrap();
        assert_eq!(price.display(), "$1500.00");

        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
