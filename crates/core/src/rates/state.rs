//! Per-pair lookup decisions.
//!
//! A lookup walks the tiers top-down, carrying the freshest stale quote seen
//! so far. The first fresh quote ends the walk; otherwise the live source is
//! asked and its outcome is settled against the carried stale quote.

use chrono::{DateTime, TimeDelta, Utc};

use super::error::SourceError;
use crate::currency::{CurrencyPair, ExchangeRateQuote};

/// What to do after reading one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// Serve this quote.
    Fresh(ExchangeRateQuote),
    /// Keep going; `stale` is the freshest expired quote seen so far.
    Miss {
        /// Best expired quote, if any tier had one.
        stale: Option<ExchangeRateQuote>,
    },
}

/// Final result of a lookup that reached the live source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The source answered; the quote must be written back to every tier.
    Fetched(ExchangeRateQuote),
    /// The source failed and an expired quote is served instead.
    Stale {
        /// Quote being served.
        quote: ExchangeRateQuote,
        /// Why the source failed.
        cause: SourceError,
    },
    /// The source failed and no tier held a quote.
    Unavailable(SourceError),
}

/// Folds one tier's candidate into the walk.
///
/// Candidates for another pair are ignored.
#[must_use]
pub fn observe(
    pair: &CurrencyPair,
    stale: Option<ExchangeRateQuote>,
    candidate: Option<ExchangeRateQuote>,
    now: DateTime<Utc>,
    window: TimeDelta,
) -> TierOutcome {
    match candidate {
        Some(quote) if quote.prices(pair) && quote.is_fresh(now, window) => {
            TierOutcome::Fresh(quote)
        }
        Some(quote) if quote.prices(pair) => TierOutcome::Miss {
            stale: freshest(stale, Some(quote)),
        },
        _ => TierOutcome::Miss { stale },
    }
}

/// Settles the live source's answer against the best stale quote.
#[must_use]
pub fn settle(
    pair: &CurrencyPair,
    fetched: Result<ExchangeRateQuote, SourceError>,
    stale: Option<ExchangeRateQuote>,
) -> Settlement {
    let cause = match fetched.and_then(|quote| validate(pair, quote)) {
        Ok(quote) => return Settlement::Fetched(quote),
        Err(cause) => cause,
    };
    match stale {
        Some(quote) => Settlement::Stale { quote, cause },
        None => Settlement::Unavailable(cause),
    }
}

/// The quote with the later `fetched_at`.
#[must_use]
pub fn freshest(
    a: Option<ExchangeRateQuote>,
    b: Option<ExchangeRateQuote>,
) -> Option<ExchangeRateQuote> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.fetched_at > a.fetched_at { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn validate(
    pair: &CurrencyPair,
    quote: ExchangeRateQuote,
) -> Result<ExchangeRateQuote, SourceError> {
    if !quote.prices(pair) {
        return Err(SourceError::InvalidResponse(format!(
            "asked for {pair}, got {}",
            quote.pair()
        )));
    }
    if quote.rate.is_zero() || quote.rate.is_negative() {
        return Err(SourceError::InvalidResponse(format!(
            "non-positive rate {} for {pair}",
            quote.rate
        )));
    }
    Ok(quote)
}
