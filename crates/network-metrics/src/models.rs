//! Block records and the metrics derived from them.
//!
//! All types are plain values produced per request and serialized camelCase
//! for the calling layer.

use serde::{Deserialize, Serialize};

/// Miner label used when the indexer could not attribute a block.
pub const UNKNOWN_MINER: &str = "unknown";

/// One block as returned by the indexing service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub height: u64,
    pub timestamp_epoch_sec: i64,
    /// Always positive; the client rejects anything else.
    pub difficulty: f64,
    /// Pool name, else payout address, else [`UNKNOWN_MINER`].
    pub miner_label: String,
    pub tx_count: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub weight: u64,
}

impl BlockRecord {
    pub fn new(
        height: u64,
        timestamp_epoch_sec: i64,
        difficulty: f64,
        miner_label: impl Into<String>,
    ) -> Self {
        Self {
            height,
            timestamp_epoch_sec,
            difficulty,
            miner_label: miner_label.into(),
            tx_count: 0,
            hash: String::new(),
            size_bytes: 0,
            weight: 0,
        }
    }
}

/// Instantaneous hash rate derived from one pair of consecutive blocks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashRateSample {
    /// Height of the later block of the pair.
    pub at_height: u64,
    #[serde(rename = "hashRateTHs")]
    pub hash_rate_ths: f64,
    pub difficulty: f64,
    pub block_time_sec: f64,
}

/// Aggregate view over a hash-rate series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashRateSummary {
    pub sample_count: usize,
    #[serde(rename = "meanHashRateTHs")]
    pub mean_hash_rate_ths: f64,
    #[serde(rename = "minHashRateTHs")]
    pub min_hash_rate_ths: f64,
    #[serde(rename = "maxHashRateTHs")]
    pub max_hash_rate_ths: f64,
    /// Sample at the greatest height.
    pub latest: HashRateSample,
    pub mean_block_time_sec: f64,
}

/// Share of blocks mined by one pool over a window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningPoolShare {
    pub pool_label: String,
    /// In `[0, 100]`; shares over one window sum to 100.
    pub percentage: f64,
    pub block_count: u64,
}

/// A sample whose hash rate strays too far from the series mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFlag {
    pub sample: HashRateSample,
    /// Signed: positive above the mean, negative below.
    pub deviation_percent: f64,
    pub threshold_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_with_unit_suffix() {
        let sample = HashRateSample {
            at_height: 820_000,
            hash_rate_ths: 429.5,
            difficulty: 60.0,
            block_time_sec: 600.0,
        };
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["atHeight"], 820_000);
        assert_eq!(json["hashRateTHs"], 429.5);
        assert_eq!(json["blockTimeSec"], 600.0);
    }

    #[test]
    fn test_block_record_camel_case() {
        let block = BlockRecord::new(1, 1_700_000_000, 2.5, "Foundry USA");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["timestampEpochSec"], 1_700_000_000i64);
        assert_eq!(json["minerLabel"], "Foundry USA");
        assert_eq!(json["txCount"], 0);
    }
}
