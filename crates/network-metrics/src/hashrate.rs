//! Hash-rate derivation from block difficulty.

use log::debug;

use crate::models::{BlockRecord, HashRateSample, HashRateSummary};

/// Conversion factor from Bitcoin difficulty units to hashes.
/// A block at difficulty D represents D * 2^32 hashes of expected work.
pub const HASHES_PER_DIFFICULTY: f64 = 4_294_967_296.0;

/// Hashes per second in one TH/s.
pub const HASHES_PER_TERAHASH: f64 = 1e12;

/// Hash rate in TH/s implied by finding a block of `difficulty` in `block_time_sec`.
///
/// # Formula
///
/// hashRateTHs = difficulty * 2^32 / block_time_sec / 10^12
///
/// Returns 0.0 for a non-positive block time; callers that must not emit such
/// samples filter them first.
pub fn derive_hash_rate_ths(difficulty: f64, block_time_sec: f64) -> f64 {
    if block_time_sec <= 0.0 {
        0.0
    } else {
        difficulty * HASHES_PER_DIFFICULTY / block_time_sec / HASHES_PER_TERAHASH
    }
}

/// One sample per adjacent pair of `blocks`, which must be sorted descending
/// by height.
///
/// Pairs whose block time is not positive (clock skew, reorg neighbours) or
/// does not fit in an i64 are skipped, so the result may be shorter than `blocks.len() - 1`. Output keeps
/// the input's descending order.
pub fn compute_series(blocks: &[BlockRecord]) -> Vec<HashRateSample> {
    let mut samples = Vec::with_capacity(blocks.len().saturating_sub(1));

    for pair in blocks.windows(2) {
        let (current, previous) = (&pair[0], &pair[1]);
        let delta = current
            .timestamp_epoch_sec
            .checked_sub(previous.timestamp_epoch_sec)
            .filter(|secs| *secs > 0);

        let Some(delta) = delta else {
            debug!(
                "Skipping block pair {}/{}: timestamps {} and {}",
                current.height,
                previous.height,
                current.timestamp_epoch_sec,
                previous.timestamp_epoch_sec
            );
            continue;
        };
        let block_time_sec = delta as f64;

        samples.push(HashRateSample {
            at_height: current.height,
            hash_rate_ths: derive_hash_rate_ths(current.difficulty, block_time_sec),
            difficulty: current.difficulty,
            block_time_sec,
        });
    }

    samples
}

/// Mean, min, max and latest over a series; `None` when empty.
///
/// "Latest" is the sample at the greatest height, independent of input order.
pub fn summarize(samples: &[HashRateSample]) -> Option<HashRateSummary> {
    let first = samples.first()?;

    let mut latest = *first;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut rate_sum = 0.0;
    let mut time_sum = 0.0;

    for sample in samples {
        min = min.min(sample.hash_rate_ths);
        max = max.max(sample.hash_rate_ths);
        rate_sum += sample.hash_rate_ths;
        time_sum += sample.block_time_sec;
        if sample.at_height > latest.at_height {
            latest = *sample;
        }
    }

    let count = samples.len() as f64;
    Some(HashRateSummary {
        sample_count: samples.len(),
        mean_hash_rate_ths: rate_sum / count,
        min_hash_rate_ths: min,
        max_hash_rate_ths: max,
        latest,
        mean_block_time_sec: time_sum / count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u64, ts: i64, difficulty: f64) -> BlockRecord {
        BlockRecord::new(height, ts, difficulty, "pool")
    }

    #[test]
    fn test_derive_hash_rate_basic() {
        // 100 difficulty over 10 seconds = 42,949,672,960 H/s = 0.0429 TH/s
        let rate = derive_hash_rate_ths(100.0, 10.0);
        assert!((rate - 0.042_949_672_96).abs() < 1e-12);
    }

    #[test]
    fn test_derive_hash_rate_zero_window() {
        assert_eq!(derive_hash_rate_ths(100.0, 0.0), 0.0);
        assert_eq!(derive_hash_rate_ths(100.0, -5.0), 0.0);
    }

    #[test]
    fn test_600s_blocks_match_published_formula() {
        // D = 60T at 600s: 60e12 * 2^32 / 600 / 1e12 TH/s, about 429.5 EH/s
        let d = 60_000_000_000_000.0;
        let blocks = vec![block(101, 1_700_000_600, d), block(100, 1_700_000_000, d)];
        let series = compute_series(&blocks);

        assert_eq!(series.len(), 1);
        let expected = d * 4_294_967_296.0 / 600.0 / 1e12;
        assert!((series[0].hash_rate_ths - expected).abs() / expected < 1e-12);
        assert!((series[0].hash_rate_ths / 1e6 - 429.5).abs() < 0.05);
        assert_eq!(series[0].at_height, 101);
        assert_eq!(series[0].block_time_sec, 600.0);
    }

    #[test]
    fn test_single_block_is_empty() {
        assert!(compute_series(&[block(1, 100, 1.0)]).is_empty());
        assert!(compute_series(&[]).is_empty());
    }

    #[test]
    fn test_non_positive_block_time_skipped() {
        // Equal and inverted timestamps
        let blocks = vec![block(3, 1000, 5.0), block(2, 1000, 5.0), block(1, 1200, 5.0)];
        assert!(compute_series(&blocks).is_empty());

        let blocks = vec![
            block(4, 1600, 5.0),
            block(3, 1000, 5.0),
            block(2, 1000, 5.0),
            block(1, 400, 5.0),
        ];
        let series = compute_series(&blocks);
        let heights: Vec<_> = series.iter().map(|s| s.at_height).collect();
        assert_eq!(heights, vec![4, 2]);
    }

    #[test]
    fn test_extreme_timestamps_skipped() {
        let blocks = vec![
            block(3, i64::MAX, 5.0),
            block(2, -10, 5.0),
            block(1, i64::MIN, 5.0),
        ];
        assert!(compute_series(&blocks).is_empty());

        let blocks = vec![block(2, i64::MAX, 5.0), block(1, 0, 5.0)];
        let series = compute_series(&blocks);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].block_time_sec, i64::MAX as f64);
    }

    #[test]
    fn test_summarize() {
        let blocks = vec![
            block(4, 1800, 3.0),
            block(3, 1200, 2.0),
            block(2, 600, 1.0),
            block(1, 0, 1.0),
        ];
        let series = compute_series(&blocks);
        let summary = summarize(&series).unwrap();

        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.latest.at_height, 4);
        assert_eq!(summary.mean_block_time_sec, 600.0);
        assert_eq!(summary.max_hash_rate_ths, derive_hash_rate_ths(3.0, 600.0));
        assert_eq!(summary.min_hash_rate_ths, derive_hash_rate_ths(1.0, 600.0));
        let mean = derive_hash_rate_ths(6.0, 600.0) / 3.0;
        assert!((summary.mean_hash_rate_ths - mean).abs() < 1e-15);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_none());
    }
}
