//! `SeaORM` entities.

pub mod exchange_rate_cache;

pub mod prelude {
    //! Entity re-exports.
    pub use super::exchange_rate_cache::Entity as ExchangeRateCache;
}
