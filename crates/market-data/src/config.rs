//! Injected configuration for the price providers.
//!
//! Adapters never read the environment themselves. The host builds a
//! [`MarketDataConfig`] once, either by hand or with [`MarketDataConfig::from_env`],
//! and hands the relevant pieces to each adapter's constructor.

use std::time::Duration;

use log::warn;

/// Default per-request timeout for provider calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const COINMARKETCAP_ID: &str = "COINMARKETCAP";
pub const COINGECKO_ID: &str = "COINGECKO";
pub const COINCAP_ID: &str = "COINCAP";
pub const BINANCE_ID: &str = "BINANCE";

/// Known providers with their default endpoint, priority, and whether they
/// refuse requests without a key. Order here is the default failover order.
const KNOWN_PROVIDERS: &[(&str, &str, i32, bool)] = &[
    (COINMARKETCAP_ID, "https://pro-api.coinmarketcap.com", 1, true),
    (COINGECKO_ID, "https://api.coingecko.com/api/v3", 2, false),
    (COINCAP_ID, "https://api.coincap.io/v2", 3, false),
    (BINANCE_ID, "https://api.binance.com", 4, false),
];

/// The asset being priced, in each naming scheme the providers use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSettings {
    /// Slug-style id (CoinGecko, CoinCap), e.g. "bitcoin"
    pub coin_id: String,
    /// Ticker symbol (CoinMarketCap, Binance), e.g. "BTC"
    pub symbol: String,
    /// Quote currency, e.g. "USD"
    pub quote_currency: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            coin_id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            quote_currency: "USD".to_string(),
        }
    }
}

/// Endpoint and credentials for one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSettings {
    pub id: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Lower values = tried earlier.
    pub priority: i32,
    pub enabled: bool,
}

impl ProviderSettings {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            api_key: None,
            priority,
            enabled: true,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Configuration for the whole failover chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketDataConfig {
    pub asset: AssetSettings,
    pub providers: Vec<ProviderSettings>,
    pub request_timeout: Duration,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl MarketDataConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Recognized keys:
    /// - `CHAINSCOPE_ASSET_ID`, `CHAINSCOPE_ASSET_SYMBOL`, `CHAINSCOPE_QUOTE_CURRENCY`
    /// - `CHAINSCOPE_REQUEST_TIMEOUT_SECS`
    /// - `CHAINSCOPE_PROVIDER_ORDER`: comma-separated provider ids; listed
    ///   providers are tried in that order, unlisted ones are disabled
    /// - `<PROVIDER_ID>_API_KEY`, `<PROVIDER_ID>_BASE_URL`
    ///
    /// Providers that require a key are disabled when none is configured.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let asset_defaults = AssetSettings::default();
        let asset = AssetSettings {
            coin_id: non_empty("CHAINSCOPE_ASSET_ID").unwrap_or(asset_defaults.coin_id),
            symbol: non_empty("CHAINSCOPE_ASSET_SYMBOL")
                .map(|s| s.to_uppercase())
                .unwrap_or(asset_defaults.symbol),
            quote_currency: non_empty("CHAINSCOPE_QUOTE_CURRENCY")
                .map(|s| s.to_uppercase())
                .unwrap_or(asset_defaults.quote_currency),
        };

        let request_timeout = non_empty("CHAINSCOPE_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let mut providers: Vec<ProviderSettings> = KNOWN_PROVIDERS
            .iter()
            .map(|(id, default_url, priority, requires_key)| {
                let api_key = non_empty(format!("{}_API_KEY", id).as_str());
                let base_url = non_empty(format!("{}_BASE_URL", id).as_str())
                    .unwrap_or_else(|| default_url.to_string());
                ProviderSettings {
                    id: id.to_string(),
                    base_url,
                    enabled: !requires_key || api_key.is_some(),
                    api_key,
                    priority: *priority,
                }
            })
            .collect();

        if let Some(order) = non_empty("CHAINSCOPE_PROVIDER_ORDER") {
            apply_order(&mut providers, &order);
        }

        Self {
            asset,
            providers,
            request_timeout,
        }
    }

    /// Enabled providers, in failover order.
    pub fn enabled_providers(&self) -> Vec<&ProviderSettings> {
        let mut enabled: Vec<_> = self.providers.iter().filter(|p| p.enabled).collect();
        enabled.sort_by_key(|p| p.priority);
        enabled
    }
}

fn apply_order(providers: &mut [ProviderSettings], order: &str) {
    let listed: Vec<String> = order
        .split(',')
        .map(|id| id.trim().to_uppercase())
        .filter(|id| !id.is_empty())
        .collect();

    for id in &listed {
        if !providers.iter().any(|p| &p.id == id) {
            warn!("Ignoring unknown provider '{}' in CHAINSCOPE_PROVIDER_ORDER", id);
        }
    }

    for provider in providers.iter_mut() {
        match listed.iter().position(|id| id == &provider.id) {
            Some(position) => provider.priority = position as i32 + 1,
            None => provider.enabled = false,
        }
    }
}
