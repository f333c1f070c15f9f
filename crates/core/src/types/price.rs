//! Monetary amounts using decimal arithmetic.

use std::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// A catalog price above [`Price::MAX_UNIT`].
    #[error("price must be at most 99999999.99")]
    TooLarge,
}

/// A non-negative amount of money in the store currency.
///
/// Amounts are rounded to two decimal places (cents) on construction, and
/// serialize as plain JSON numbers (`12.5`, not `"12.50"`). Deserialization
/// accepts numbers or numeric strings.
///
/// ```
/// use bookstore_core::Price;
/// use rust_decimal::Decimal;
///
/// let unit = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(unit.times(3).amount(), Decimal::new(5997, 2));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest unit price a book can carry (`NUMERIC(10, 2)`).
    pub const MAX_UNIT: Self = Self(Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2));

    /// Create a price, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// A catalog unit price: non-negative and at most [`Self::MAX_UNIT`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` or `PriceError::TooLarge`.
    pub fn unit(amount: Decimal) -> Result<Self, PriceError> {
        let price = Self::new(amount)?;
        if price > Self::MAX_UNIT {
            return Err(PriceError::TooLarge);
        }
        Ok(price)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this price.
    ///
    /// Non-positive quantities contribute nothing.
    #[must_use]
    pub fn times(self, quantity: i32) -> Self {
        if quantity <= 0 {
            return Self::ZERO;
        }
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_rounds_to_cents() {
        let p = Price::new(Decimal::new(12_345, 3)).unwrap();
        assert_eq!(p.amount(), Decimal::new(1234, 2));
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_order_total_sums_line_totals() {
        let lines = [(price(1000), 2), (price(550), 1), (price(1), 3)];
        let total: Price = lines.iter().map(|(p, q)| p.times(*q)).sum();
        assert_eq!(total.amount(), Decimal::new(2553, 2));
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let total: Price = std::iter::empty().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&price(1999)).unwrap(), "19.99");
    }

    #[test]
    fn test_deserializes_number_or_string() {
        let a: Price = serde_json::from_str("19.99").unwrap();
        let b: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_unit_price_bounds() {
        assert_eq!(Price::MAX_UNIT.amount(), Decimal::new(9_999_999_999, 2));
        assert_eq!(Price::unit(Decimal::new(9_999_999_999, 2)), Ok(Price::MAX_UNIT));
        assert_eq!(
            Price::unit(Decimal::new(1_000_000_000, 0)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(Price::unit(Decimal::new(-1, 0)), Err(PriceError::Negative));
        // Totals are not bounded by the unit limit
        assert!(Price::new(Decimal::new(1_000_000_000, 0)).is_ok());
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let p: Price = serde_json::from_str("12.345").unwrap();
        assert_eq!(p.amount(), Decimal::new(1234, 2));
        let err = serde_json::from_str::<Price>("\"-0.01\"").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price(500).to_string(), "5.00");
    }
}
