//! Monetary amounts.
//!
//! The store prices everything in whole units of a single currency (rupees),
//! so an [`Amount`] is a non-fractional `i64`. Percentages such as the tax rate
//! are applied with decimal arithmetic and rounded back to whole units.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole units.
    #[must_use]
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// Get the amount in whole units.
    #[must_use]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiply a unit price by a quantity, or `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    /// Apply a rate (e.g. `0.18`) and round to the nearest whole unit, halves
    /// rounding away from zero.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    ///
    /// ```
    /// use elegance_core::Amount;
    /// use rust_decimal::Decimal;
    ///
    /// let rate = Decimal::new(18, 2);
    /// assert_eq!(Amount::new(800).apply_rate(rate), Some(Amount::new(144)));
    /// assert_eq!(Amount::new(2500).apply_rate(rate), Some(Amount::new(450)));
    /// ```
    #[must_use]
    pub fn apply_rate(self, rate: Decimal) -> Option<Self> {
        Decimal::from(self.0)
            .checked_mul(rate)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

impl From<i64> for Amount {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // 5 * 0.5 = 2.5 -> 3
        assert_eq!(
            Amount::new(5).apply_rate(Decimal::new(5, 1)),
            Some(Amount::new(3))
        );
        // 1499 * 0.18 = 269.82 -> 270
        assert_eq!(
            Amount::new(1499).apply_rate(Decimal::new(18, 2)),
            Some(Amount::new(270))
        );
    }

    #[test]
    fn test_checked_times_overflow() {
        assert_eq!(Amount::new(i64::MAX).checked_times(2), None);
        assert_eq!(Amount::new(250).checked_times(4), Some(Amount::new(1000)));
    }

    #[test]
    fn test_sum_and_display() {
        let total: Amount = [100, 200, 44].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(344));
        assert_eq!(total.to_string(), "₹344");
    }
}
