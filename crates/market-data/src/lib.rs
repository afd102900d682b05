//! Chainscope Market Data Crate
//!
//! This crate resolves a current asset price from several unreliable,
//! rate-limited crypto market data providers.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple providers: CoinMarketCap, CoinGecko, CoinCap, Binance
//! - Deterministic ordered failover with a full failure trace
//! - Rate-limit tracking from response headers
//! - Concurrent provider health checks
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |      Caller      | --> |  PriceResolver   |  (ordered failover)
//! +------------------+     +------------------+
//!                             |            ^
//!                             v            |
//!                  +------------------+   +-------------------+
//!                  |  PriceProvider   |-->| RateLimitTracker  |
//!                  +------------------+   +-------------------+
//!                             |
//!                             v
//!                  +------------------+
//!                  |    PricePoint    |  (normalized, zero-filled)
//!                  +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`PricePoint`] - Normalized price with 24h metrics
//! - [`PriceResolver`] - Failover chain over [`ProviderDescriptor`]s
//! - [`RateLimitTracker`] - Shared per-provider limit state
//! - [`AggregateError`] - Every provider's failure when nothing resolved

pub mod config;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use config::{AssetSettings, MarketDataConfig, ProviderSettings};
pub use errors::{AggregateError, ErrorKind, MarketDataError, ProviderFailure};
pub use models::{PricePoint, ProviderId, UNAVAILABLE_SOURCE_ID};
pub use provider::{PriceProvider, ProviderCapabilities};
pub use registry::{
    build_resolver, FetchDiagnostics, PriceResolver, ProviderDescriptor, ProviderHealth,
    RateLimitState, RateLimitStatus, RateLimitTracker,
};

// Re-export provider types
pub use provider::binance::BinanceProvider;
pub use provider::coincap::CoinCapProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::coinmarketcap::CoinMarketCapProvider;
