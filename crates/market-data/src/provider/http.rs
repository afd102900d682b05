//! HTTP plumbing shared by the provider adapters.

use chrono::Utc;
use reqwest::RequestBuilder;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::registry::RateLimitTracker;

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Send `request`, feed the response headers to `tracker`, and return the body.
///
/// Transport failures, timeouts, and non-2xx statuses become
/// [`MarketDataError::Network`]. Headers are recorded for every response,
/// including error statuses, since a 429 carries the most useful limit state.
pub(crate) async fn send(
    provider: &'static str,
    request: RequestBuilder,
    tracker: &RateLimitTracker,
) -> Result<String, MarketDataError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::network(provider, format!("Request timed out: {}", e))
        } else {
            MarketDataError::network(provider, format!("Request failed: {}", e))
        }
    })?;

    tracker.record(provider, response.headers());

    let status = response.status();
    debug!("{} responded with HTTP {}", provider, status);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(MarketDataError::network(
            provider,
            format!("HTTP {} - {}", status, snippet),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| MarketDataError::network(provider, format!("Failed to read response: {}", e)))
}

/// Parse a body as JSON, mapping failures to `InvalidResponse`.
pub(crate) fn parse_json(provider: &str, body: &str) -> Result<serde_json::Value, MarketDataError> {
    serde_json::from_str(body).map_err(|e| {
        MarketDataError::invalid_response(provider, format!("Failed to parse response: {}", e))
    })
}

/// Detach a required top-level key from a JSON object.
pub(crate) fn take_key(
    provider: &str,
    value: &mut serde_json::Value,
    key: &str,
) -> Result<serde_json::Value, MarketDataError> {
    value
        .get_mut(key)
        .map(serde_json::Value::take)
        .filter(|v| !v.is_null())
        .ok_or_else(|| MarketDataError::invalid_response(provider, format!("missing `{}`", key)))
}

/// Deserialize a detached JSON value into an adapter's payload struct.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    provider: &str,
    value: serde_json::Value,
) -> Result<T, MarketDataError> {
    serde_json::from_value(value).map_err(|e| {
        MarketDataError::invalid_response(provider, format!("Unexpected payload shape: {}", e))
    })
}

pub(crate) fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
