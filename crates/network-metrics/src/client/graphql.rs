//! GraphQL client for the block indexing service.
//!
//! Queries are POSTed as `{"query": .., "variables": ..}` and answered with
//!
//! ```text
//! {"data": {"bitcoin": {"blocks": [{"height": 820000, "timestamp": {"unixtime": 1700000000},
//!   "difficulty": 6.7e13, "blockHash": "..", "blockSize": 1500000, "blockWeight": 3990000,
//!   "transactionCount": 3000, "miner": {"name": "Foundry USA", "address": "bc1q.."}}]}}}
//! ```
//!
//! GraphQL reports query failures with a 200 status and an `errors` array, so
//! both the HTTP status and the body are checked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::BlockDataSource;
use crate::config::BlockDataConfig;
use crate::errors::{NetworkMetricsError, Result};
use crate::models::{BlockRecord, UNKNOWN_MINER};

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

const RECENT_BLOCKS_QUERY: &str = r#"
query RecentBlocks($network: BitcoinNetwork!, $limit: Int!) {
  bitcoin(network: $network) {
    blocks(options: {desc: "height", limit: $limit}) {
      height
      timestamp { unixtime }
      difficulty
      blockHash
      blockSize
      blockWeight
      transactionCount
      miner { name address }
    }
  }
}"#;

const RANGE_BLOCKS_QUERY: &str = r#"
query BlocksInRange($network: BitcoinNetwork!, $since: ISO8601DateTime, $till: ISO8601DateTime) {
  bitcoin(network: $network) {
    blocks(options: {desc: "height"}, time: {since: $since, till: $till}) {
      height
      timestamp { unixtime }
      difficulty
      blockHash
      blockSize
      blockWeight
      transactionCount
      miner { name address }
    }
  }
}"#;

// ─────────────────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(default)]
    bitcoin: Option<NetworkData>,
}

#[derive(Debug, Deserialize)]
struct NetworkData {
    #[serde(default)]
    blocks: Option<Vec<RawBlock>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    height: u64,
    timestamp: RawTimestamp,
    difficulty: RawNumber,
    #[serde(default)]
    block_hash: Option<String>,
    #[serde(default)]
    block_size: Option<u64>,
    #[serde(default)]
    block_weight: Option<u64>,
    #[serde(default)]
    transaction_count: Option<u64>,
    #[serde(default)]
    miner: Option<RawMiner>,
}

#[derive(Debug, Deserialize)]
struct RawTimestamp {
    unixtime: i64,
}

#[derive(Debug, Deserialize)]
struct RawMiner {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// Difficulty arrives as a JSON number or, from some indexers, a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Float(f64),
    Text(String),
}

impl RawNumber {
    fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl RawMiner {
    fn label(&self) -> Option<&str> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.address.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl RawBlock {
    fn into_record(self) -> Result<BlockRecord> {
        let difficulty = self
            .difficulty
            .to_f64()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                NetworkMetricsError::unavailable(format!(
                    "Block {} has invalid difficulty {:?}",
                    self.height, self.difficulty
                ))
            })?;

        let miner_label = self
            .miner
            .as_ref()
            .and_then(RawMiner::label)
            .unwrap_or(UNKNOWN_MINER)
            .to_string();

        Ok(BlockRecord {
            height: self.height,
            timestamp_epoch_sec: self.timestamp.unixtime,
            difficulty,
            miner_label,
            tx_count: self.transaction_count.unwrap_or(0),
            hash: self.block_hash.unwrap_or_default(),
            size_bytes: self.block_size.unwrap_or(0),
            weight: self.block_weight.unwrap_or(0),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Block Client
// ─────────────────────────────────────────────────────────────────────────────

/// Block data source backed by a GraphQL indexing service.
///
/// # Example
///
/// ```ignore
/// let client = GraphQlBlockClient::new(&BlockDataConfig::from_env());
/// let blocks = client.fetch_recent_blocks(144).await?;
/// ```
#[derive(Debug, Clone)]
pub struct GraphQlBlockClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    network: String,
}

impl GraphQlBlockClient {
    pub fn new(config: &BlockDataConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            network: config.network.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(key).map_err(|e| {
                NetworkMetricsError::unavailable(format!("Invalid API key format: {}", e))
            })?;
            headers.insert("X-API-KEY", value);
        }
        Ok(headers)
    }

    /// POST a query and return the raw body of a 2xx response.
    async fn post(&self, query: &str, variables: serde_json::Value) -> Result<String> {
        debug!("[BlockData] POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkMetricsError::unavailable(format!("Request timed out: {}", e))
                } else {
                    NetworkMetricsError::unavailable(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            NetworkMetricsError::unavailable(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            warn!("[BlockData] HTTP {} from indexer", status);
            return Err(NetworkMetricsError::unavailable(format!(
                "HTTP {} - {}",
                status,
                body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
            )));
        }

        Ok(body)
    }

    /// Parse a GraphQL body into block records sorted descending by height.
    fn parse_blocks(body: &str) -> Result<Vec<BlockRecord>> {
        let response: GraphQlResponse = serde_json::from_str(body).map_err(|e| {
            NetworkMetricsError::unavailable(format!("Failed to parse response: {}", e))
        })?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(NetworkMetricsError::unavailable(format!(
                "Query failed: {}",
                messages.join("; ")
            )));
        }

        let raw_blocks = response
            .data
            .and_then(|d| d.bitcoin)
            .and_then(|n| n.blocks)
            .ok_or_else(|| NetworkMetricsError::unavailable("Response missing `blocks`"))?;

        let mut blocks = raw_blocks
            .into_iter()
            .map(RawBlock::into_record)
            .collect::<Result<Vec<_>>>()?;
        blocks.sort_by(|a, b| b.height.cmp(&a.height));
        Ok(blocks)
    }
}

#[async_trait]
impl BlockDataSource for GraphQlBlockClient {
    async fn fetch_recent_blocks(&self, limit: usize) -> Result<Vec<BlockRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let variables = json!({ "network": self.network, "limit": limit });
        let body = self.post(RECENT_BLOCKS_QUERY, variables).await?;

        let mut blocks = Self::parse_blocks(&body)?;
        blocks.truncate(limit);
        debug!("[BlockData] Fetched {} recent blocks", blocks.len());
        Ok(blocks)
    }

    async fn fetch_blocks_in_range(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<BlockRecord>> {
        if since > until {
            return Ok(Vec::new());
        }

        let variables = json!({
            "network": self.network,
            "since": since.to_rfc3339(),
            "till": until.to_rfc3339(),
        });
        let body = self.post(RANGE_BLOCKS_QUERY, variables).await?;

        let (since_sec, until_sec) = (since.timestamp(), until.timestamp());
        let blocks: Vec<BlockRecord> = Self::parse_blocks(&body)?
            .into_iter()
            .filter(|b| (since_sec..=until_sec).contains(&b.timestamp_epoch_sec))
            .collect();
        debug!(
            "[BlockData] Fetched {} blocks between {} and {}",
            blocks.len(),
            since,
            until
        );
        Ok(blocks)
    }
}
