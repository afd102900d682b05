//! Chainscope Network Metrics Crate
//!
//! Derives network-health metrics from raw per-block difficulty data.
//!
//! # Pipeline
//!
//! ```text
//! BlockDataSource --> compute_series --> HashRateSample[] --> detect --> AnomalyFlag[]
//!        |
//!        +----------> attribute ------> MiningPoolShare[]
//! ```
//!
//! Fetching is async and may fail with
//! [`NetworkMetricsError::Unavailable`]; every calculation is synchronous and
//! returns an empty result when there is too little data.

pub mod anomaly;
pub mod client;
pub mod config;
pub mod errors;
pub mod hashrate;
pub mod models;
pub mod pools;
pub mod service;

pub use anomaly::{detect, DEFAULT_THRESHOLD_PERCENT};
pub use client::{BlockDataSource, GraphQlBlockClient};
pub use config::BlockDataConfig;
pub use errors::{NetworkMetricsError, Result};
pub use hashrate::{compute_series, derive_hash_rate_ths, summarize};
pub use models::{AnomalyFlag, BlockRecord, HashRateSample, HashRateSummary, MiningPoolShare};
pub use pools::{attribute, UNKNOWN_POOL_LABEL};
pub use service::NetworkMetricsService;
