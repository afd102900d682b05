//! Property-based tests for the metrics calculators.

use chainscope_network_metrics::{
    attribute, compute_series, detect, BlockRecord, HashRateSample, UNKNOWN_POOL_LABEL,
};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

fn arb_miner_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Foundry USA".to_string()),
        Just("AntPool".to_string()),
        Just("ViaBTC".to_string()),
        Just("unknown".to_string()),
        Just("UNKNOWN".to_string()),
        Just(String::new()),
        "[a-z]{3,8}",
    ]
}

/// Blocks descending by height with arbitrary (possibly skewed) timestamps.
fn arb_blocks(max_len: usize) -> impl Strategy<Value = Vec<BlockRecord>> {
    proptest::collection::vec(
        (
            -900i64..1800,      // timestamp delta to the previous block
            1.0f64..1e14,       // difficulty
            arb_miner_label(),
        ),
        0..=max_len,
    )
    .prop_map(|entries| {
        let mut ts = 1_700_000_000i64;
        let top = 800_000 + entries.len() as u64;
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (delta, difficulty, label))| {
                let block = BlockRecord::new(top - i as u64, ts, difficulty, label);
                ts -= delta;
                block
            })
            .collect()
    })
}

fn arb_samples(max_len: usize) -> impl Strategy<Value = Vec<HashRateSample>> {
    proptest::collection::vec(0.0f64..1e9, 0..=max_len).prop_map(|rates| {
        rates
            .into_iter()
            .enumerate()
            .map(|(i, rate)| HashRateSample {
                at_height: 1_000 - i as u64,
                hash_rate_ths: rate,
                difficulty: 1.0,
                block_time_sec: 600.0,
            })
            .collect()
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Samples never exceed n - 1 and never carry a non-positive block time.
    #[test]
    fn prop_series_length_and_block_time(blocks in arb_blocks(40)) {
        let series = compute_series(&blocks);

        prop_assert!(series.len() <= blocks.len().saturating_sub(1));
        for sample in &series {
            prop_assert!(sample.block_time_sec > 0.0);
            prop_assert!(sample.hash_rate_ths >= 0.0);
        }
    }

    /// Series keeps descending height order.
    #[test]
    fn prop_series_descending(blocks in arb_blocks(40)) {
        let series = compute_series(&blocks);
        for pair in series.windows(2) {
            prop_assert!(pair[0].at_height > pair[1].at_height);
        }
    }

    /// Shares sum to 100 and block counts sum to the window size.
    #[test]
    fn prop_shares_sum_to_hundred(blocks in arb_blocks(60)) {
        let shares = attribute(&blocks);

        if blocks.is_empty() {
            prop_assert!(shares.is_empty());
        } else {
            let total: f64 = shares.iter().map(|s| s.percentage).sum();
            prop_assert!((total - 100.0).abs() < 1e-9);
            let count: u64 = shares.iter().map(|s| s.block_count).sum();
            prop_assert_eq!(count, blocks.len() as u64);
        }

        for share in &shares {
            prop_assert!((0.0..=100.0).contains(&share.percentage));
        }
        for pair in shares.windows(2) {
            prop_assert!(pair[0].block_count >= pair[1].block_count);
        }
        let unknown_buckets = shares
            .iter()
            .filter(|s| s.pool_label.eq_ignore_ascii_case(UNKNOWN_POOL_LABEL))
            .count();
        prop_assert!(unknown_buckets <= 1);
    }

    /// Every flag really exceeds the threshold, and every sample that exceeds
    /// it is flagged.
    #[test]
    fn prop_detect_matches_definition(samples in arb_samples(30), threshold in 0.0f64..100.0) {
        let flags = detect(&samples, threshold);

        if samples.len() < 2 {
            prop_assert!(flags.is_empty());
        } else {
            let mean = samples.iter().map(|s| s.hash_rate_ths).sum::<f64>() / samples.len() as f64;
            let expected = if mean > 0.0 {
                samples
                    .iter()
                    .filter(|s| (s.hash_rate_ths - mean).abs() > mean * threshold / 100.0)
                    .count()
            } else {
                0
            };
            prop_assert_eq!(flags.len(), expected);
            for flag in &flags {
                prop_assert!(flag.deviation_percent.abs() > threshold - 1e-9);
            }
        }
    }
}
