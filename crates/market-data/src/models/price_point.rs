use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source id carried by the placeholder returned when nothing resolved.
pub const UNAVAILABLE_SOURCE_ID: &str = "none";

/// Normalized spot price for one asset, as reported by one provider.
///
/// Metrics a provider does not report are zero, never null, so callers can
/// render the record without null checks. `price` is positive unless
/// `source_id` is [`UNAVAILABLE_SOURCE_ID`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Spot price in the quote currency
    pub price: Decimal,

    /// Price change over the last 24 hours, in percent
    pub change_24h_percent: Decimal,

    /// Traded volume over the last 24 hours, in the quote currency
    pub volume_24h: Decimal,

    /// Market capitalization in the quote currency
    pub market_cap: Decimal,

    /// Units currently in circulation
    pub circulating_supply: Decimal,

    /// Hard cap on supply (zero when the provider does not report one)
    pub max_supply: Decimal,

    /// Local clock at the time the response was received
    pub fetched_at_epoch_ms: i64,

    /// Provider that produced this record (COINGECKO, BINANCE, etc.)
    pub source_id: String,
}

impl PricePoint {
    /// Create a price point with only the spot price; every other metric is zero.
    pub fn new(price: Decimal, source_id: impl Into<String>, fetched_at_epoch_ms: i64) -> Self {
        Self {
            price,
            change_24h_percent: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            market_cap: Decimal::ZERO,
            circulating_supply: Decimal::ZERO,
            max_supply: Decimal::ZERO,
            fetched_at_epoch_ms,
            source_id: source_id.into(),
        }
    }

    /// Placeholder for "data unavailable".
    pub fn unavailable(fetched_at_epoch_ms: i64) -> Self {
        Self::new(Decimal::ZERO, UNAVAILABLE_SOURCE_ID, fetched_at_epoch_ms)
    }

    pub fn is_unavailable(&self) -> bool {
        self.source_id == UNAVAILABLE_SOURCE_ID
    }

    /// Passive freshness check: was this record fetched within `window` of `now_epoch_ms`?
    ///
    /// Records stamped in the future (clock skew between hosts) count as fresh.
    pub fn is_fresh(&self, now_epoch_ms: i64, window: Duration) -> bool {
        let age_ms = now_epoch_ms.saturating_sub(self.fetched_at_epoch_ms);
        age_ms <= i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
    }
}
