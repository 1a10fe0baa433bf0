//! Wire format of the `/latest` endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kitty_core::currency::{CurrencyPair, ExchangeRateQuote};
use kitty_core::rates::SourceError;
use kitty_shared::types::{CurrencyCode, ScaledAmount};
use rust_decimal::Decimal;
use serde::Deserialize;

/// `{ "base": "USD", "timestamp": 1700000000, "rates": { "EUR": 0.92 } }`
#[derive(Debug, Deserialize)]
pub(crate) struct LatestRatesResponse {
    pub base: String,
    /// Unix seconds at which the provider observed the rates.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub rates: HashMap<String, RateValue>,
}

/// Providers disagree on whether rates are JSON strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RateValue {
    Text(String),
    Number(serde_json::Number),
}

impl RateValue {
    /// Parses the textual form into a positive scaled rate.
    pub(crate) fn to_scaled(&self) -> Result<ScaledAmount, SourceError> {
        let text = match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        };

        let decimal = Decimal::from_str_exact(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| invalid(format!("unparseable rate '{text}'")))?;
        if decimal <= Decimal::ZERO {
            return Err(invalid(format!("non-positive rate {decimal}")));
        }

        let rate = ScaledAmount::from_decimal(decimal).map_err(|e| invalid(e.to_string()))?;
        if rate.is_zero() {
            return Err(invalid(format!("rate {decimal} rounds to zero")));
        }
        Ok(rate)
    }
}

impl LatestRatesResponse {
    /// Extracts the quote for `pair`.
    ///
    /// `received_at` stamps the quote when the provider sends no timestamp.
    pub(crate) fn into_quote(
        self,
        pair: &CurrencyPair,
        received_at: DateTime<Utc>,
    ) -> Result<ExchangeRateQuote, SourceError> {
        let base = CurrencyCode::parse(&self.base)
            .map_err(|_| invalid(format!("unknown base currency '{}'", self.base)))?;
        if base != pair.base {
            return Err(invalid(format!("expected base {}, got {base}", pair.base)));
        }

        let value = self
            .rates
            .iter()
            .find(|(code, _)| code.trim().eq_ignore_ascii_case(pair.quote.as_str()))
            .map(|(_, value)| value)
            .ok_or_else(|| SourceError::MissingRate(pair.quote.clone()))?;
        let rate = value.to_scaled()?;

        let fetched_at = match self.timestamp {
            Some(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| invalid(format!("timestamp {secs} out of range")))?,
            None => received_at,
        };

        Ok(ExchangeRateQuote::new(pair, rate, fetched_at))
    }
}

fn invalid(reason: String) -> SourceError {
    SourceError::InvalidResponse(reason)
}
