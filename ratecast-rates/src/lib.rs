//! Exchange-rate source for Ratecast.
//!
//! Implements [`ratecast_core::RateSource`] on top of CoinGecko.

mod coingecko;

pub use coingecko::{CoinGeckoClient, RatesConfig};
