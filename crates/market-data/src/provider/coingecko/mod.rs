//! CoinGecko price provider.
//!
//! Uses `/simple/price`, which answers with a nested object keyed by coin id
//! and then by field name derived from the quote currency:
//!
//! ```text
//! {"bitcoin": {"usd": 43250.0, "usd_24h_change": 1.2, "usd_24h_vol": ..., "usd_market_cap": ...}}
//! ```
//!
//! Supply figures are not part of this endpoint and are zero-filled. The
//! demo API key is optional and sent as `x-cg-demo-api-key`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{AssetSettings, ProviderSettings, COINGECKO_ID};
use crate::errors::MarketDataError;
use crate::models::PricePoint;
use crate::provider::coerce::{metric, non_negative_metric, require_price, Numeric};
use crate::provider::http::{decode, now_epoch_ms, parse_json, send, take_key};
use crate::provider::{PriceProvider, ProviderCapabilities};
use crate::registry::RateLimitTracker;

const PROVIDER_ID: &str = COINGECKO_ID;

/// CoinGecko price provider.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    coin_id: String,
    vs_currency: String,
    tracker: Arc<RateLimitTracker>,
}

impl CoinGeckoProvider {
    pub fn new(
        settings: &ProviderSettings,
        asset: &AssetSettings,
        timeout: Duration,
        tracker: Arc<RateLimitTracker>,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: settings.endpoint().to_string(),
            api_key: settings.api_key.clone(),
            coin_id: asset.coin_id.to_lowercase(),
            vs_currency: asset.quote_currency.to_lowercase(),
            tracker,
        }
    }

    fn parse_payload(
        body: &str,
        coin_id: &str,
        vs_currency: &str,
        fetched_at_epoch_ms: i64,
    ) -> Result<PricePoint, MarketDataError> {
        let mut root = parse_json(PROVIDER_ID, body)?;
        let fields: HashMap<String, Option<Numeric>> =
            decode(PROVIDER_ID, take_key(PROVIDER_ID, &mut root, coin_id)?)?;

        let field = |suffix: &str| {
            let key = if suffix.is_empty() {
                vs_currency.to_string()
            } else {
                format!("{}_{}", vs_currency, suffix)
            };
            fields.get(&key).and_then(Option::as_ref)
        };

        let price = require_price(PROVIDER_ID, vs_currency, field(""))?;

        Ok(PricePoint {
            change_24h_percent: metric(field("24h_change")),
            volume_24h: non_negative_metric(field("24h_vol")),
            market_cap: non_negative_metric(field("market_cap")),
            ..PricePoint::new(price, PROVIDER_ID, fetched_at_epoch_ms)
        })
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> i32 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            reports_supply: false,
            ..ProviderCapabilities::full()
        }
    }

    async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
        let url = format!("{}/simple/price", self.base_url);

        let mut request = self.client.get(&url).query(&[
            ("ids", self.coin_id.as_str()),
            ("vs_currencies", self.vs_currency.as_str()),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        debug!("CoinGecko request for {}/{}", self.coin_id, self.vs_currency);
        let body = send(PROVIDER_ID, request, &self.tracker).await?;

        Self::parse_payload(&body, &self.coin_id, &self.vs_currency, now_epoch_ms())
    }
}
