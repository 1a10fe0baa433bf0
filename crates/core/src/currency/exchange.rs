//! Exchange rate types.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use kitty_shared::types::{CurrencyCode, MoneyError, ScaledAmount};
use serde::{Deserialize, Serialize};

/// An ordered currency pair: amounts in `base` convert into `quote`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: CurrencyCode,
    /// Currency being converted into.
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    /// Creates a pair from already-validated codes.
    #[must_use]
    pub const fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self { base, quote }
    }

    /// Parses both codes, normalizing case.
    pub fn parse(base: &str, quote: &str) -> Result<Self, MoneyError> {
        Ok(Self::new(CurrencyCode::parse(base)?, CurrencyCode::parse(quote)?))
    }

    /// Parses the `BASE:QUOTE` key form.
    pub fn parse_key(key: &str) -> Result<Self, MoneyError> {
        let (base, quote) = key
            .split_once(':')
            .ok_or_else(|| MoneyError::InvalidCurrency(key.to_string()))?;
        Self::parse(base, quote)
    }

    /// Returns true when no conversion is needed.
    #[must_use]
    pub fn is_same_currency(&self) -> bool {
        self.base == self.quote
    }

    /// The `BASE:QUOTE` key form.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.base, self.quote)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.base, self.quote)
    }
}

/// A rate observed at a point in time.
///
/// `rate` is quote units per base unit at the money scale, so `1.0` is
/// [`ScaledAmount::ONE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateQuote {
    /// Currency being converted from.
    pub base: CurrencyCode,
    /// Currency being converted into.
    pub quote: CurrencyCode,
    /// Quote units per base unit, scaled.
    pub rate: ScaledAmount,
    /// When the rate was observed.
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRateQuote {
    /// Creates a quote for `pair`.
    #[must_use]
    pub fn new(pair: &CurrencyPair, rate: ScaledAmount, fetched_at: DateTime<Utc>) -> Self {
        Self {
            base: pair.base.clone(),
            quote: pair.quote.clone(),
            rate,
            fetched_at,
        }
    }

    /// The identity rate for a same-currency pair.
    #[must_use]
    pub fn identity(currency: &CurrencyCode, now: DateTime<Utc>) -> Self {
        Self {
            base: currency.clone(),
            quote: currency.clone(),
            rate: ScaledAmount::ONE,
            fetched_at: now,
        }
    }

    /// The pair this quote prices.
    #[must_use]
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.quote.clone())
    }

    /// Returns true if this quote prices `pair`.
    #[must_use]
    pub fn prices(&self, pair: &CurrencyPair) -> bool {
        self.base == pair.base && self.quote == pair.quote
    }

    /// Age at `now`. A quote stamped in the future has zero age.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.fetched_at).max(TimeDelta::zero())
    }

    /// Fresh means `age <= window`; the boundary itself is still fresh.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.age(now) <= window
    }
}
