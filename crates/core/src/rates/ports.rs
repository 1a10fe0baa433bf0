//! Collaborators consumed by the exchange rate cache.
//!
//! Implemented by adapter crates (`kitty-db`, `kitty-fx`) and by the local
//! storage module; tests provide hand-written fakes.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::{RateError, SourceError, StoreError};
use crate::currency::{CurrencyPair, ExchangeRateQuote};

/// The live rate source.
pub trait LiveRateSource: Send + Sync + 'static {
    /// Fetches the current rate for `pair`.
    ///
    /// Network timeouts, non-success responses and a missing quote currency
    /// are all reported as [`SourceError`].
    fn fetch(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<ExchangeRateQuote, SourceError>> + Send;
}

/// The durable, shared cache tier.
pub trait DurableRateStore: Send + Sync + 'static {
    /// Most recent stored quote for `pair`.
    fn find(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<Option<ExchangeRateQuote>, StoreError>> + Send;

    /// Inserts or updates the quote for its pair.
    ///
    /// Implementations must keep the quote with the later `fetched_at`.
    fn upsert(
        &self,
        quote: &ExchangeRateQuote,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The local persistent key-value tier.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: LiveRateSource> LiveRateSource for Arc<T> {
    fn fetch(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<ExchangeRateQuote, SourceError>> + Send {
        (**self).fetch(pair)
    }
}

impl<T: DurableRateStore> DurableRateStore for Arc<T> {
    fn find(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<Option<ExchangeRateQuote>, StoreError>> + Send {
        (**self).find(pair)
    }

    fn upsert(
        &self,
        quote: &ExchangeRateQuote,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).upsert(quote)
    }
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set(key, value)
    }
}

/// Anything that can answer "what is the rate for this pair".
pub trait RateLookup: Send + Sync {
    /// Resolves a rate, fresh or stale, or fails with [`RateError::Unavailable`].
    fn rate(
        &self,
        pair: &CurrencyPair,
    ) -> impl Future<Output = Result<ExchangeRateQuote, RateError>> + Send;
}
