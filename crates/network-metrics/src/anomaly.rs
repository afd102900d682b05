//! Mean-deviation anomaly detection over a hash-rate series.

use log::debug;

use crate::models::{AnomalyFlag, HashRateSample};

/// Deviation from the mean, in percent, above which a sample is flagged.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 15.0;

/// Flag samples with `|rate - mean| > mean * threshold_percent / 100`.
///
/// Single pass over the supplied set; no windowing. Fewer than two samples,
/// or a zero mean, yields no flags. A negative or non-finite threshold is
/// treated as zero. Flags keep input order.
pub fn detect(samples: &[HashRateSample], threshold_percent: f64) -> Vec<AnomalyFlag> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let threshold_percent = if threshold_percent.is_finite() {
        threshold_percent.max(0.0)
    } else {
        0.0
    };

    let mean = samples.iter().map(|s| s.hash_rate_ths).sum::<f64>() / samples.len() as f64;
    if mean <= 0.0 {
        return Vec::new();
    }

    let limit = mean * threshold_percent / 100.0;
    let flags: Vec<AnomalyFlag> = samples
        .iter()
        .filter(|s| (s.hash_rate_ths - mean).abs() > limit)
        .map(|s| AnomalyFlag {
            sample: *s,
            deviation_percent: (s.hash_rate_ths - mean) / mean * 100.0,
            threshold_percent,
        })
        .collect();

    debug!(
        "Anomaly scan: {} of {} samples beyond {}% of mean {:.3} TH/s",
        flags.len(),
        samples.len(),
        threshold_percent,
        mean
    );
    flags
}
