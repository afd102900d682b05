//! Per-provider health probes.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Serialize;

use super::price_resolver::{call_with_timeout, elapsed_millis, failure_for, ProviderDescriptor};
use crate::errors::ProviderFailure;

/// Outcome of probing one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider_id: String,
    pub success: bool,
    pub price: Option<Decimal>,
    pub response_time_ms: u64,
    pub error: Option<ProviderFailure>,
}

/// Call one provider once under `timeout` and report how it went.
pub(crate) async fn probe(descriptor: &ProviderDescriptor, timeout: Duration) -> ProviderHealth {
    let started = Instant::now();
    let result = call_with_timeout(descriptor, timeout).await;
    let response_time_ms = elapsed_millis(started);

    match result {
        Ok(point) => ProviderHealth {
            provider_id: descriptor.id.to_string(),
            success: true,
            price: Some(point.price),
            response_time_ms,
            error: None,
        },
        Err(e) => ProviderHealth {
            provider_id: descriptor.id.to_string(),
            success: false,
            price: None,
            response_time_ms,
            error: Some(failure_for(&descriptor.id, &e)),
        },
    }
}
