//! Exchange rate error types.

use std::fmt;

use kitty_shared::AppError;
use kitty_shared::types::CurrencyCode;
use thiserror::Error;

use crate::currency::CurrencyPair;

/// Failure to produce any rate for a pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// No fresh or stale quote exists and the live source failed.
    #[error("no exchange rate available for {base}:{quote}")]
    Unavailable {
        /// Currency converted from.
        base: CurrencyCode,
        /// Currency converted into.
        quote: CurrencyCode,
    },
}

impl RateError {
    /// Creates an unavailable error for `pair`.
    #[must_use]
    pub fn unavailable(pair: &CurrencyPair) -> Self {
        Self::Unavailable {
            base: pair.base.clone(),
            quote: pair.quote.clone(),
        }
    }
}

/// Cache tier names, used in logs and [`CacheError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// In-process memo.
    Memo,
    /// Local persistent key-value store.
    Local,
    /// Durable shared store.
    Durable,
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memo => "memo",
            Self::Local => "local",
            Self::Durable => "durable",
        })
    }
}

/// Non-fatal cache tier failure. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A tier could not be read; the read counts as a miss.
    #[error("cache read failed ({tier}) for {pair}: {source}")]
    ReadFailed {
        /// Tier that failed.
        tier: CacheTier,
        /// Pair being read.
        pair: CurrencyPair,
        /// Underlying failure.
        source: StoreError,
    },

    /// A tier could not be written; the fetched quote is still returned.
    #[error("cache write failed ({tier}) for {pair}: {source}")]
    WriteFailed {
        /// Tier that failed.
        tier: CacheTier,
        /// Pair being written.
        pair: CurrencyPair,
        /// Underlying failure.
        source: StoreError,
    },
}

/// Storage adapter failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Live rate source failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Connection, DNS or protocol failure.
    #[error("rate source unreachable: {0}")]
    Transport(String),

    /// The request exceeded its network timeout.
    #[error("rate source timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("rate source returned status {0}")]
    Status(u16),

    /// The response did not contain the requested currency.
    #[error("rate source has no rate for {0}")]
    MissingRate(CurrencyCode),

    /// The response was malformed or the rate unusable.
    #[error("invalid rate source response: {0}")]
    InvalidResponse(String),
}

impl From<RateError> for AppError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Unavailable { base, quote } => {
                Self::RateUnavailable(format!("{base}:{quote}"))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        Self::ExternalService(err.to_string())
    }
}
