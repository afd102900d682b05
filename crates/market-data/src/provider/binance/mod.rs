//! Binance spot ticker provider.
//!
//! `/api/v3/ticker/24hr?symbol=BTCUSDT` returns a flat ticker object with
//! string-encoded numbers. The USD quote is approximated by the USDT pair.
//! Binance reports no market cap or supply; those are zero-filled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{AssetSettings, ProviderSettings, BINANCE_ID};
use crate::errors::MarketDataError;
use crate::models::PricePoint;
use crate::provider::coerce::{metric, non_negative_metric, require_price, Numeric};
use crate::provider::http::{decode, now_epoch_ms, parse_json, send};
use crate::provider::{PriceProvider, ProviderCapabilities};
use crate::registry::RateLimitTracker;

const PROVIDER_ID: &str = BINANCE_ID;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    #[serde(default)]
    last_price: Option<Numeric>,
    #[serde(default)]
    price_change_percent: Option<Numeric>,
    /// Volume in the quote asset (USDT), comparable to other providers' USD volume
    #[serde(default)]
    quote_volume: Option<Numeric>,
}

/// Binance spot ticker provider.
pub struct BinanceProvider {
    client: Client,
    base_url: String,
    pair: String,
    tracker: Arc<RateLimitTracker>,
}

impl BinanceProvider {
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
            pair: trading_pair(&asset.symbol, &asset.quote_currency),
            tracker,
        }
    }

    fn parse_payload(body: &str, fetched_at_epoch_ms: i64) -> Result<PricePoint, MarketDataError> {
        let root = parse_json(PROVIDER_ID, body)?;
        if root.get("lastPrice").map_or(true, serde_json::Value::is_null) {
            return Err(MarketDataError::invalid_response(
                PROVIDER_ID,
                "missing `lastPrice`",
            ));
        }
        let ticker: Ticker24h = decode(PROVIDER_ID, root)?;

        let price = require_price(PROVIDER_ID, "lastPrice", ticker.last_price.as_ref())?;

        Ok(PricePoint {
            change_24h_percent: metric(ticker.price_change_percent.as_ref()),
            volume_24h: non_negative_metric(ticker.quote_volume.as_ref()),
            ..PricePoint::new(price, PROVIDER_ID, fetched_at_epoch_ms)
        })
    }
}

/// Binance lists USD liquidity under USDT pairs.
fn trading_pair(symbol: &str, quote_currency: &str) -> String {
    let quote = if quote_currency.eq_ignore_ascii_case("USD") {
        "USDT".to_string()
    } else {
        quote_currency.to_uppercase()
    };
    format!("{}{}", symbol.to_uppercase(), quote)
}

#[async_trait]
impl PriceProvider for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> i32 {
        4
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            reports_change_24h: true,
            reports_volume: true,
            ..ProviderCapabilities::spot_only()
        }
    }

    async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let request = self.client.get(&url).query(&[("symbol", self.pair.as_str())]);

        debug!("Binance request for {}", self.pair);
        let body = send(PROVIDER_ID, request, &self.tracker).await?;

        Self::parse_payload(&body, now_epoch_ms())
    }
}
