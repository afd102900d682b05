//! Network metrics service.
//!
//! Wires a [`BlockDataSource`] to the calculators so each metric can be
//! requested on its own. Every call performs exactly one block fetch; a fetch
//! failure propagates as `Unavailable` since there is no fallback for raw
//! blocks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::anomaly::detect;
use crate::client::{BlockDataSource, GraphQlBlockClient};
use crate::config::BlockDataConfig;
use crate::errors::Result;
use crate::hashrate::{compute_series, summarize};
use crate::models::{AnomalyFlag, HashRateSample, HashRateSummary, MiningPoolShare};
use crate::pools::attribute;

pub struct NetworkMetricsService {
    source: Arc<dyn BlockDataSource>,
}

impl NetworkMetricsService {
    pub fn new(source: Arc<dyn BlockDataSource>) -> Self {
        Self { source }
    }

    /// Service backed by the GraphQL indexer described by `config`.
    pub fn from_config(config: &BlockDataConfig) -> Self {
        Self::new(Arc::new(GraphQlBlockClient::new(config)))
    }

    /// Hash-rate samples over the `limit` most recent blocks.
    ///
    /// At most `limit - 1` samples, descending by height.
    pub async fn hash_rate_series(&self, limit: usize) -> Result<Vec<HashRateSample>> {
        let blocks = self.source.fetch_recent_blocks(limit).await?;
        let series = compute_series(&blocks);
        debug!(
            "Computed {} hash-rate samples from {} blocks",
            series.len(),
            blocks.len()
        );
        Ok(series)
    }

    pub async fn hash_rate_summary(&self, limit: usize) -> Result<Option<HashRateSummary>> {
        let series = self.hash_rate_series(limit).await?;
        Ok(summarize(&series))
    }

    /// Pool shares over blocks timestamped in `[since, until]`.
    pub async fn pool_shares(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<MiningPoolShare>> {
        let blocks = self.source.fetch_blocks_in_range(since, until).await?;
        let shares = attribute(&blocks);
        info!(
            "Attributed {} blocks to {} pools between {} and {}",
            blocks.len(),
            shares.len(),
            since,
            until
        );
        Ok(shares)
    }

    /// Anomalous samples over the `limit` most recent blocks.
    pub async fn anomalies(
        &self,
        limit: usize,
        threshold_percent: f64,
    ) -> Result<Vec<AnomalyFlag>> {
        let series = self.hash_rate_series(limit).await?;
        Ok(detect(&series, threshold_percent))
    }
}
