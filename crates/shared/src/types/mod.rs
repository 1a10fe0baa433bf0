//! Common types used across the application.

pub mod currency;
pub mod id;
pub mod money;

pub use currency::CurrencyCode;
pub use id::*;
pub use money::{MAX_MAGNITUDE, MoneyError, SCALE, ScaledAmount};
