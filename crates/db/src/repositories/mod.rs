//! Repository abstractions for data access.

pub mod exchange_rate;

pub use exchange_rate::{ExchangeRateCacheError, ExchangeRateCacheRepository};
