//! HTTP live exchange rate source.
//!
//! Implements [`kitty_core::rates::LiveRateSource`] over a JSON
//! `GET {source_url}/latest?base=USD&symbols=EUR` endpoint.

mod client;
mod dto;

pub use client::HttpRateSource;
