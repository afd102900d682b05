//! Block data client configuration.

use std::time::Duration;

pub const DEFAULT_BLOCKS_ENDPOINT: &str = "https://graphql.bitquery.io";
pub const DEFAULT_NETWORK: &str = "bitcoin";
pub const DEFAULT_BLOCKS_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to query block data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDataConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Network argument passed to the indexer, e.g. `bitcoin` or `bitcoin_testnet`.
    pub network: String,
    pub request_timeout: Duration,
}

impl Default for BlockDataConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BLOCKS_ENDPOINT.to_string(),
            api_key: None,
            network: DEFAULT_NETWORK.to_string(),
            request_timeout: DEFAULT_BLOCKS_TIMEOUT,
        }
    }
}

impl BlockDataConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Recognized keys: `CHAINSCOPE_BLOCKS_ENDPOINT`, `CHAINSCOPE_BLOCKS_API_KEY`,
    /// `CHAINSCOPE_BLOCKS_NETWORK`, `CHAINSCOPE_REQUEST_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            endpoint: non_empty("CHAINSCOPE_BLOCKS_ENDPOINT")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.endpoint),
            api_key: non_empty("CHAINSCOPE_BLOCKS_API_KEY"),
            network: non_empty("CHAINSCOPE_BLOCKS_NETWORK")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.network),
            request_timeout: non_empty("CHAINSCOPE_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}
