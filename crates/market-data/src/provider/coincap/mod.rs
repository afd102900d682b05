//! CoinCap price provider.
//!
//! `/assets/{id}` returns every numeric field as a string:
//!
//! ```text
//! {"data": {"id": "bitcoin", "priceUsd": "43250.1234", "supply": "19600000.0000", "maxSupply": null, ...}, "timestamp": 1700000000000}
//! ```
//!
//! Prices are always quoted in USD. The API key is optional and raises the
//! per-minute budget; CoinCap reports the remaining budget in
//! `X-RateLimit-Remaining`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{AssetSettings, ProviderSettings, COINCAP_ID};
use crate::errors::MarketDataError;
use crate::models::PricePoint;
use crate::provider::coerce::{metric, non_negative_metric, require_price, Numeric};
use crate::provider::http::{decode, now_epoch_ms, parse_json, send, take_key};
use crate::provider::{PriceProvider, ProviderCapabilities};
use crate::registry::RateLimitTracker;

const PROVIDER_ID: &str = COINCAP_ID;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetEntry {
    #[serde(default)]
    price_usd: Option<Numeric>,
    #[serde(default)]
    change_percent24_hr: Option<Numeric>,
    #[serde(default)]
    volume_usd24_hr: Option<Numeric>,
    #[serde(default)]
    market_cap_usd: Option<Numeric>,
    #[serde(default)]
    supply: Option<Numeric>,
    #[serde(default)]
    max_supply: Option<Numeric>,
}

/// CoinCap price provider.
pub struct CoinCapProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    coin_id: String,
    tracker: Arc<RateLimitTracker>,
}

impl CoinCapProvider {
    pub fn new(
        settings: &ProviderSettings,
        asset: &AssetSettings,
        timeout: Duration,
        tracker: Arc<RateLimitTracker>,
    ) -> Self {
        if !asset.quote_currency.eq_ignore_ascii_case("USD") {
            warn!(
                "CoinCap only quotes in USD; ignoring quote currency {}",
                asset.quote_currency
            );
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: settings.endpoint().to_string(),
            api_key: settings.api_key.clone(),
            coin_id: asset.coin_id.to_lowercase(),
            tracker,
        }
    }

    fn parse_payload(body: &str, fetched_at_epoch_ms: i64) -> Result<PricePoint, MarketDataError> {
        let mut root = parse_json(PROVIDER_ID, body)?;
        let entry: AssetEntry = decode(PROVIDER_ID, take_key(PROVIDER_ID, &mut root, "data")?)?;

        let price = require_price(PROVIDER_ID, "priceUsd", entry.price_usd.as_ref())?;

        Ok(PricePoint {
            change_24h_percent: metric(entry.change_percent24_hr.as_ref()),
            volume_24h: non_negative_metric(entry.volume_usd24_hr.as_ref()),
            market_cap: non_negative_metric(entry.market_cap_usd.as_ref()),
            circulating_supply: non_negative_metric(entry.supply.as_ref()),
            max_supply: non_negative_metric(entry.max_supply.as_ref()),
            ..PricePoint::new(price, PROVIDER_ID, fetched_at_epoch_ms)
        })
    }
}

#[async_trait]
impl PriceProvider for CoinCapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> i32 {
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full()
    }

    async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
        let url = format!("{}/assets/{}", self.base_url, self.coin_id);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!("CoinCap request for {}", self.coin_id);
        let body = send(PROVIDER_ID, request, &self.tracker).await?;

        Self::parse_payload(&body, now_epoch_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_string_encoded_payload() {
        let body = r#"{
            "data": {
                "id": "bitcoin",
                "rank": "1",
                "symbol": "BTC",
                "supply": "19600000.0000000000000000",
                "maxSupply": "21000000.0000000000000000",
                "marketCapUsd": "847700000000.1234",
                "volumeUsd24Hr": "9000000000.55",
                "priceUsd": "43250.00",
                "changePercent24Hr": "-0.8123"
            },
            "timestamp": 1700000000000
        }"#;
        let point = CoinCapProvider::parse_payload(body, 99).unwrap();
        assert_eq!(point.price, dec!(43250));
        assert_eq!(point.circulating_supply, dec!(19600000));
        assert_eq!(point.max_supply, dec!(21000000));
        assert_eq!(point.market_cap, dec!(847700000000.1234));
        assert_eq!(point.volume_24h, dec!(9000000000.55));
        assert_eq!(point.change_24h_percent, dec!(-0.8123));
        assert_eq!(point.source_id, "COINCAP");
    }

    #[test]
    fn test_null_max_supply() {
        let body = r#"{"data": {"priceUsd": "2250.5", "maxSupply": null}}"#;
        let point = CoinCapProvider::parse_payload(body, 0).unwrap();
        assert_eq!(point.max_supply, Decimal::ZERO);
    }

    #[test]
    fn test_error_body_is_invalid_response() {
        let body = r#"{"error": "bitcoinz not found", "timestamp": 1700000000000}"#;
        let err = CoinCapProvider::parse_payload(body, 0).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidResponse { .. }));
    }

    #[test]
    fn test_unparsable_price() {
        let body = r#"{"data": {"priceUsd": "not-a-number"}}"#;
        assert!(CoinCapProvider::parse_payload(body, 0).is_err());
    }
}
