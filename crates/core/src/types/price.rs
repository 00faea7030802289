//! Type-safe price representation using decimal arithmetic.
//!
//! The API transmits prices as JSON numbers (`19.99`). Floats are fine on
//! the wire but not for cart arithmetic, so prices are decoded into a
//! [`Decimal`] and all totals are computed in decimal.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in the store currency (USD).
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use the_shop_core::Price;
///
/// let price = Price::new(Decimal::new(550, 2)).unwrap();
/// assert_eq!(price.display(), "$5.50");
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display with two decimal places (e.g. `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        self * quantity
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at [`Decimal::MAX`].
    fn add(self, rhs: Self) -> Self {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    /// Saturates at [`Decimal::MAX`].
    fn mul(self, rhs: u32) -> Self {
        Self(self.0.checked_mul(Decimal::from(rhs)).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("price is not representable as f64"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Decimal accepts JSON numbers as well as numeric strings.
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price::new(Decimal::MAX).unwrap();
        assert_eq!((huge * 3).amount(), Decimal::MAX);
        assert_eq!((huge + huge).amount(), Decimal::MAX);
        assert_eq!([huge, Price::from_cents(1)].into_iter().sum::<Price>(), huge);
        assert_eq!(Price::from_cents(250).times(4), Price::from_cents(1000));
    }

    #[test]
    fn test_display_pads_to_cents() {
        assert_eq!(Price::from_cents(1000).display(), "$10.00");
        assert_eq!(Price::new(Decimal::new(55, 1)).unwrap().display(), "$5.50");
    }

    #[test]
    fn test_zero_is_valid() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 0)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Price = [Price::from_cents(1000) * 2, Price::from_cents(550) * 1]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2550));
    }

    #[test]
    fn test_deserialize_json_float_is_exact() {
        let price: Price = serde_json::from_str("109.95").unwrap();
        assert_eq!(price, Price::from_cents(10995));
    }

    #[test]
    fn test_deserialize_negative_fails() {
        assert!(serde_json::from_str::<Price>("-1.5").is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Price::from_cents(2550)).unwrap();
        assert_eq!(json, "25.5");
    }
}
