//! Price provider abstractions and implementations.
//!
//! This module contains:
//! - The `PriceProvider` trait that all providers implement
//! - Provider capabilities (which metrics are reported vs. zero-filled)
//! - Concrete provider implementations (CoinMarketCap, CoinGecko, CoinCap, Binance)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: the resolver only sees normalized `PricePoint`s
//! - **Extensible**: new providers can be added by implementing `PriceProvider`
//! - **Observable**: every response feeds the shared rate-limit tracker

mod capabilities;
pub(crate) mod coerce;
pub(crate) mod http;
mod traits;

pub mod binance;
pub mod coincap;
pub mod coingecko;
pub mod coinmarketcap;

use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::config::{
    AssetSettings, ProviderSettings, BINANCE_ID, COINCAP_ID, COINGECKO_ID, COINMARKETCAP_ID,
};
use crate::registry::RateLimitTracker;

// Re-exports
pub use capabilities::ProviderCapabilities;
pub use traits::PriceProvider;

/// Build the adapter for a configured provider.
///
/// Returns `None` for ids this crate has no adapter for.
pub fn build_provider(
    settings: &ProviderSettings,
    asset: &AssetSettings,
    timeout: Duration,
    tracker: Arc<RateLimitTracker>,
) -> Option<Arc<dyn PriceProvider>> {
    let provider: Arc<dyn PriceProvider> = match settings.id.as_str() {
        COINMARKETCAP_ID => Arc::new(coinmarketcap::CoinMarketCapProvider::new(
            settings, asset, timeout, tracker,
        )),
        COINGECKO_ID => Arc::new(coingecko::CoinGeckoProvider::new(
            settings, asset, timeout, tracker,
        )),
        COINCAP_ID => Arc::new(coincap::CoinCapProvider::new(
            settings, asset, timeout, tracker,
        )),
        BINANCE_ID => Arc::new(binance::BinanceProvider::new(
            settings, asset, timeout, tracker,
        )),
        other => {
            warn!("No adapter for provider '{}', skipping", other);
            return None;
        }
    };
    Some(provider)
}
