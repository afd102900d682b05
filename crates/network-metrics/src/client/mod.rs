//! Block data acquisition.
//!
//! [`BlockDataSource`] is the seam between the metrics pipeline and the
//! indexing service. [`GraphQlBlockClient`] is the production implementation;
//! tests substitute in-memory sources.

mod graphql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::BlockRecord;

pub use graphql::GraphQlBlockClient;

/// Source of raw block records.
///
/// Both operations return blocks sorted descending by height. Any failure is
/// [`NetworkMetricsError::Unavailable`](crate::errors::NetworkMetricsError::Unavailable).
#[async_trait]
pub trait BlockDataSource: Send + Sync {
    /// The `limit` most recent blocks.
    async fn fetch_recent_blocks(&self, limit: usize) -> Result<Vec<BlockRecord>>;

    /// Every block with a timestamp in `[since, until]`.
    async fn fetch_blocks_in_range(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<BlockRecord>>;
}
