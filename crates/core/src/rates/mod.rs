//! Exchange rate lookup with bounded staleness.
//!
//! ```text
//! same currency ──► rate 1.0, no I/O
//! memo ──► local store ──► durable store ──► live source
//!   (first quote no older than the freshness window wins)
//! live source fails ──► freshest stale quote, or RateError::Unavailable
//! ```
//!
//! A successful live fetch is written back durable first, then local, then
//! memo. Tier read and write failures are logged and never fail a lookup.

pub mod cache;
pub mod error;
pub mod ports;
pub mod state;


pub use cache::{CacheOptions, ExchangeRateCache, PrefetchHandle, PrefetchSummary, local_key};
pub use error::{CacheError, CacheTier, RateError, SourceError, StoreError};
pub use ports::{Clock, DurableRateStore, KeyValueStore, LiveRateSource, RateLookup, SystemClock};
