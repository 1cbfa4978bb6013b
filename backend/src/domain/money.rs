//! Monetary amounts.
//!
//! Amounts are exact decimals with at most two fractional digits and fit a
//! `NUMERIC(12,2)` column. Balances that may legitimately go negative (an
//! overdrawn advance, a surplus settlement) use a bare [`Decimal`].

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest storable magnitude: ten digits before the decimal point.
const MAX_WHOLE: i64 = 10_000_000_000;
/// Fractional digits kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Validation errors for [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The value is below zero.
    #[error("amount must not be negative")]
    Negative,
    /// More than two fractional digits were supplied.
    #[error("amount must have at most two decimal places")]
    TooPrecise,
    /// The value does not fit the storage precision.
    #[error("amount exceeds the supported range")]
    OutOfRange,
}

/// A non-negative monetary amount with cent precision.
///
/// # Examples
/// ```
/// use advance_ledger::domain::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(1050, 2)).expect("valid amount");
/// assert_eq!(amount.to_string(), "10.50");
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and normalise a decimal into an amount.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        let normalised = value.normalize();
        if normalised.scale() > AMOUNT_SCALE {
            return Err(AmountError::TooPrecise);
        }
        if normalised >= Decimal::from(MAX_WHOLE) {
            return Err(AmountError::OutOfRange);
        }
        let mut scaled = normalised;
        scaled.rescale(AMOUNT_SCALE);
        Ok(Self(scaled))
    }

    /// Underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Amount {
    type Output = Decimal;

    fn add(self, rhs: Self) -> Self::Output {
        self.0 + rhs.0
    }
}

impl Sum<Amount> for Decimal {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, amount| acc + amount.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Round a computed balance to cent precision.
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(AMOUNT_SCALE);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}
