//! Mining-pool attribution over a window of blocks.

use std::collections::HashMap;

use crate::models::{BlockRecord, MiningPoolShare, UNKNOWN_MINER};

/// Bucket that collects every unattributed block.
pub const UNKNOWN_POOL_LABEL: &str = "Unknown";

/// Percentage of blocks per miner label.
///
/// Unattributed blocks (label `"unknown"` in any case, or blank) share one
/// [`UNKNOWN_POOL_LABEL`] bucket. Sorted by block count descending, ties by
/// label ascending. An empty window yields an empty list.
pub fn attribute(blocks: &[BlockRecord]) -> Vec<MiningPoolShare> {
    if blocks.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for block in blocks {
        *counts.entry(pool_label(&block.miner_label)).or_insert(0) += 1;
    }

    let total = blocks.len() as f64;
    let mut shares: Vec<MiningPoolShare> = counts
        .into_iter()
        .map(|(label, count)| MiningPoolShare {
            pool_label: label.to_string(),
            percentage: 100.0 * count as f64 / total,
            block_count: count,
        })
        .collect();

    shares.sort_by(|a, b| {
        b.block_count
            .cmp(&a.block_count)
            .then_with(|| a.pool_label.cmp(&b.pool_label))
    });
    shares
}

fn pool_label(miner_label: &str) -> &str {
    let trimmed = miner_label.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_MINER) {
        UNKNOWN_POOL_LABEL
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(labels: &[(&str, usize)]) -> Vec<BlockRecord> {
        let mut out = Vec::new();
        let mut height = 1000;
        for (label, count) in labels {
            for _ in 0..*count {
                out.push(BlockRecord::new(height, height as i64 * 600, 1.0, *label));
                height -= 1;
            }
        }
        out
    }

    #[test]
    fn test_seventy_thirty() {
        let shares = attribute(&blocks(&[("poolB", 3), ("poolA", 7)]));
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].pool_label, "poolA");
        assert_eq!(shares[0].block_count, 7);
        assert!((shares[0].percentage - 70.0).abs() < 1e-9);
        assert!((shares[1].percentage - 30.0).abs() < 1e-9);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_variants_grouped() {
        let shares = attribute(&blocks(&[
            ("unknown", 1),
            ("Unknown", 1),
            ("  ", 1),
            ("F2Pool", 1),
        ]));
        assert_eq!(shares[0].pool_label, UNKNOWN_POOL_LABEL);
        assert_eq!(shares[0].block_count, 3);
        assert_eq!(shares[1].pool_label, "F2Pool");
    }

    #[test]
    fn test_ties_sorted_by_label() {
        let shares = attribute(&blocks(&[("ViaBTC", 2), ("AntPool", 2), ("Braiins", 2)]));
        let labels: Vec<_> = shares.iter().map(|s| s.pool_label.as_str()).collect();
        assert_eq!(labels, vec!["AntPool", "Braiins", "ViaBTC"]);
    }

    #[test]
    fn test_empty_window() {
        assert!(attribute(&[]).is_empty());
    }
}
