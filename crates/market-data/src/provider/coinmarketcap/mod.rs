//! CoinMarketCap price provider.
//!
//! Uses the `/v1/cryptocurrency/quotes/latest` endpoint, which reports every
//! metric a [`PricePoint`] carries. Requests require an API key, sent in the
//! `X-CMC_PRO_API_KEY` header. The basic plan allows 30 calls per minute and
//! reports nothing about the remaining budget in headers, so the rate-limit
//! tracker only learns about exhaustion from a 429 with `Retry-After`.
//!
//! API documentation: https://coinmarketcap.com/api/documentation/v1/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{AssetSettings, ProviderSettings, COINMARKETCAP_ID};
use crate::errors::MarketDataError;
use crate::models::PricePoint;
use crate::provider::coerce::{metric, non_negative_metric, require_price, Numeric};
use crate::provider::http::{decode, now_epoch_ms, parse_json, send, take_key};
use crate::provider::{PriceProvider, ProviderCapabilities};
use crate::registry::RateLimitTracker;

const PROVIDER_ID: &str = COINMARKETCAP_ID;

/// One entry under `data.<SYMBOL>`.
#[derive(Debug, Deserialize)]
struct CurrencyEntry {
    #[serde(default)]
    circulating_supply: Option<Numeric>,
    #[serde(default)]
    max_supply: Option<Numeric>,
    /// Keyed by quote currency ("USD")
    quote: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    #[serde(default)]
    price: Option<Numeric>,
    #[serde(default)]
    percent_change_24h: Option<Numeric>,
    #[serde(default)]
    volume_24h: Option<Numeric>,
    #[serde(default)]
    market_cap: Option<Numeric>,
}

/// CoinMarketCap price provider.
pub struct CoinMarketCapProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    symbol: String,
    quote_currency: String,
    tracker: Arc<RateLimitTracker>,
}

impl CoinMarketCapProvider {
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
            symbol: asset.symbol.to_uppercase(),
            quote_currency: asset.quote_currency.to_uppercase(),
            tracker,
        }
    }

    /// Normalize a `/quotes/latest` body.
    fn parse_payload(
        body: &str,
        symbol: &str,
        quote_currency: &str,
        fetched_at_epoch_ms: i64,
    ) -> Result<PricePoint, MarketDataError> {
        let mut root = parse_json(PROVIDER_ID, body)?;
        let mut data = take_key(PROVIDER_ID, &mut root, "data")?;
        let entry: CurrencyEntry = decode(PROVIDER_ID, take_key(PROVIDER_ID, &mut data, symbol)?)?;

        let quote = entry.quote.get(quote_currency).ok_or_else(|| {
            MarketDataError::invalid_response(
                PROVIDER_ID,
                format!("missing `quote.{}`", quote_currency),
            )
        })?;

        let price = require_price(PROVIDER_ID, "price", quote.price.as_ref())?;

        Ok(PricePoint {
            change_24h_percent: metric(quote.percent_change_24h.as_ref()),
            volume_24h: non_negative_metric(quote.volume_24h.as_ref()),
            market_cap: non_negative_metric(quote.market_cap.as_ref()),
            circulating_supply: non_negative_metric(entry.circulating_supply.as_ref()),
            max_supply: non_negative_metric(entry.max_supply.as_ref()),
            ..PricePoint::new(price, PROVIDER_ID, fetched_at_epoch_ms)
        })
    }
}

#[async_trait]
impl PriceProvider for CoinMarketCapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> i32 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            requires_api_key: true,
            ..ProviderCapabilities::full()
        }
    }

    async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
        let url = format!("{}/v1/cryptocurrency/quotes/latest", self.base_url);

        let mut request = self.client.get(&url).query(&[
            ("symbol", self.symbol.as_str()),
            ("convert", self.quote_currency.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("X-CMC_PRO_API_KEY", key);
        }

        debug!("CoinMarketCap request for {}/{}", self.symbol, self.quote_currency);
        let body = send(PROVIDER_ID, request, &self.tracker).await?;

        Self::parse_payload(&body, &self.symbol, &self.quote_currency, now_epoch_ms())
    }
}
