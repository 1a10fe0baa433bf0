//! Fixed-point money.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every monetary value is an integer count of 1/10,000 currency units, and
//! exchange rates use the same scale (quote units per base unit).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale factor: one currency unit is `SCALE` scaled units.
pub const SCALE: i64 = 10_000;

/// Number of decimal digits carried by a scaled amount.
const SCALE_DIGITS: u32 = 4;

/// Number of decimal digits shown to users.
const DISPLAY_DIGITS: u32 = 2;

/// Largest supported magnitude, in scaled units (10^15, i.e. 10^11 currency units).
pub const MAX_MAGNITUDE: i64 = 1_000_000_000_000_000;

/// Errors raised while building monetary values from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Malformed or out-of-range monetary value.
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount {
        /// The offending input, as received.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Malformed currency code.
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),
}

impl MoneyError {
    fn invalid_amount(value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidAmount {
            value: value.to_string(),
            reason,
        }
    }
}

/// A monetary quantity multiplied by [`SCALE`].
///
/// Values are immutable; every operation returns a new amount. Arithmetic is
/// exact integer arithmetic within [`MAX_MAGNITUDE`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScaledAmount(i64);

impl ScaledAmount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One currency unit; also the exchange rate 1.0.
    pub const ONE: Self = Self(SCALE);

    /// Wraps a raw scaled value without range checking.
    ///
    /// Use [`ScaledAmount::try_from_scaled`] for values of unknown origin.
    #[must_use]
    pub const fn from_scaled(raw: i64) -> Self {
        Self(raw)
    }

    /// Wraps a raw scaled value, rejecting anything beyond [`MAX_MAGNITUDE`].
    #[must_use]
    pub const fn try_from_scaled(raw: i64) -> Option<Self> {
        if raw.unsigned_abs() <= MAX_MAGNITUDE.unsigned_abs() {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Returns the raw scaled integer.
    #[must_use]
    pub const fn scaled(self) -> i64 {
        self.0
    }

    /// Converts a decimal value to its scaled representation.
    ///
    /// Multiplies by [`SCALE`] and rounds half away from zero.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        let scaled = value
            .checked_mul(Decimal::from(SCALE))
            .ok_or_else(|| MoneyError::invalid_amount(value, "exceeds supported range"))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        scaled
            .to_i64()
            .and_then(Self::try_from_scaled)
            .ok_or_else(|| MoneyError::invalid_amount(value, "exceeds supported range"))
    }

    /// Like [`ScaledAmount::from_decimal`], but rejects negative values.
    pub fn from_non_negative_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::invalid_amount(value, "must not be negative"));
        }
        Self::from_decimal(value)
    }

    /// Parses human-entered text such as `"10.00"` or `" 3.5 "`.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::invalid_amount(input, "empty"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| MoneyError::invalid_amount(input, "not a decimal number"))?;
        Self::from_decimal(value)
    }

    /// Returns the exact decimal value (4 decimal places).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, SCALE_DIGITS)
    }

    /// Formats the amount with two decimals, rounding half away from zero.
    #[must_use]
    pub fn to_display_string(self) -> String {
        let mut rounded = self
            .to_decimal()
            .round_dp_with_strategy(DISPLAY_DIGITS, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded.set_sign_positive(true);
        }
        rounded.to_string()
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` beyond [`MAX_MAGNITUDE`].
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Self::try_from_scaled)
    }

    /// Subtracts two amounts, returning `None` beyond [`MAX_MAGNITUDE`].
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).and_then(Self::try_from_scaled)
    }

    /// Computes `round(self * numerator / denominator)` with a 128-bit
    /// intermediate and a single half-away-from-zero rounding.
    ///
    /// Returns `None` for a zero denominator or a result beyond [`MAX_MAGNITUDE`].
    #[must_use]
    pub fn checked_mul_div(self, numerator: Self, denominator: Self) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        let product = i128::from(self.0) * i128::from(numerator.0);
        let raw = div_round_half_away(product, i128::from(denominator.0));
        i64::try_from(raw).ok().and_then(Self::try_from_scaled)
    }

    /// Multiplies by a scaled rate: `round(self * rate / SCALE)`.
    ///
    /// Returns `None` if the result exceeds [`MAX_MAGNITUDE`].
    #[must_use]
    pub fn checked_scale_by_rate(self, rate: Self) -> Option<Self> {
        self.checked_mul_div(rate, Self::ONE)
    }

    /// Multiplies by a scaled rate: `round(self * rate / SCALE)`.
    ///
    /// # Panics
    ///
    /// Panics if the result exceeds [`MAX_MAGNITUDE`]; amounts and rates are
    /// validated at input time so this is a precondition violation.
    #[must_use]
    pub fn scale_by_rate(self, rate: Self) -> Self {
        match self.checked_scale_by_rate(rate) {
            Some(result) => result,
            None => panic!("scaled amount overflow: {self} * {rate}"),
        }
    }
}

/// Integer division rounding half away from zero.
fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    }
}

impl Add for ScaledAmount {
    type Output = Self;

    /// # Panics
    ///
    /// Panics beyond [`MAX_MAGNITUDE`].
    fn add(self, rhs: Self) -> Self {
        match self.checked_add(rhs) {
            Some(sum) => sum,
            None => panic!("scaled amount overflow: {self} + {rhs}"),
        }
    }
}

impl Sub for ScaledAmount {
    type Output = Self;

    /// # Panics
    ///
    /// Panics beyond [`MAX_MAGNITUDE`].
    fn sub(self, rhs: Self) -> Self {
        match self.checked_sub(rhs) {
            Some(difference) => difference,
            None => panic!("scaled amount overflow: {self} - {rhs}"),
        }
    }
}

impl Neg for ScaledAmount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for ScaledAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a ScaledAmount> for ScaledAmount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for ScaledAmount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
