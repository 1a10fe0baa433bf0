//! Currency pairs, exchange rate quotes and conversion.

pub mod conversion;
pub mod exchange;

#[cfg(test)]
mod props;

pub use conversion::{Conversion, ConversionEngine, ConvertedShare};
pub use exchange::{CurrencyPair, ExchangeRateQuote};
