//! Core money logic for Kitty.
//!
//! This crate contains the monetary computations with ZERO web or database
//! dependencies. Storage and the live rate source are reached through the
//! ports in [`rates::ports`] and [`expense::ports`].
//!
//! # Modules
//!
//! - `split` - Dividing a total into per-member shares
//! - `currency` - Currency pairs, rate quotes and conversion
//! - `rates` - Tiered exchange rate cache with stale fallback
//! - `storage` - OpenDAL-backed local key-value tier
//! - `expense` - Recording and editing expenses and transfers

pub mod currency;
pub mod expense;
pub mod rates;
pub mod split;
pub mod storage;
