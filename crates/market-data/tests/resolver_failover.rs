//! Integration tests for the failover protocol.
//!
//! Mock providers stand in for the HTTP adapters; the tracker is fed real
//! header maps the way adapters feed it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainscope_market_data::{
    ErrorKind, MarketDataError, PricePoint, PriceProvider, PriceResolver, ProviderCapabilities,
    ProviderDescriptor, RateLimitStatus, RateLimitTracker,
};
use chrono::{Duration as ChronoDuration, Utc};
use proptest::prelude::*;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal_macros::dec;

// =============================================================================
// Mocks
// =============================================================================

const IDS: [&str; 6] = ["P0", "P1", "P2", "P3", "P4", "P5"];

struct ScriptedProvider {
    id: &'static str,
    succeed: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(id: &'static str, succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            succeed,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(id: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            succeed: true,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::spot_only()
    }

    async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.succeed {
            Ok(PricePoint::new(dec!(43250.5), self.id, Utc::now().timestamp_millis()))
        } else {
            Err(MarketDataError::network(self.id, "HTTP 502 - Bad Gateway"))
        }
    }
}

fn chain(providers: &[Arc<ScriptedProvider>]) -> Vec<ProviderDescriptor> {
    providers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let provider: Arc<dyn PriceProvider> = p.clone();
            ProviderDescriptor::new(i as i32 + 1, provider)
        })
        .collect()
}

fn exhausted_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_static("300"));
    headers
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// If providers 0..i fail and provider i succeeds, the result comes from
    /// provider i and providers after it are never called.
    #[test]
    fn prop_first_success_after_failures(n in 1usize..=6, winner_seed in 0usize..6) {
        let winner = winner_seed % n;
        let providers: Vec<_> = (0..n)
            .map(|i| ScriptedProvider::new(IDS[i], i == winner))
            .collect();
        let resolver = PriceResolver::new(chain(&providers), Arc::new(RateLimitTracker::new()));

        let point = runtime().block_on(resolver.resolve()).unwrap();

        prop_assert_eq!(point.source_id.as_str(), IDS[winner]);
        for (i, p) in providers.iter().enumerate() {
            let expected = if i <= winner { 1 } else { 0 };
            prop_assert_eq!(p.calls(), expected);
        }
    }

    /// When every provider fails, the aggregate carries exactly one entry per
    /// provider in chain order.
    #[test]
    fn prop_all_fail_reports_every_attempt(n in 0usize..=6) {
        let providers: Vec<_> = (0..n).map(|i| ScriptedProvider::new(IDS[i], false)).collect();
        let resolver = PriceResolver::new(chain(&providers), Arc::new(RateLimitTracker::new()));

        let err = runtime().block_on(resolver.resolve()).unwrap_err();

        prop_assert_eq!(err.len(), n);
        for (i, failure) in err.failures().iter().enumerate() {
            prop_assert_eq!(failure.provider_id.as_str(), IDS[i]);
            prop_assert_eq!(failure.error_kind, ErrorKind::Network);
        }
    }

    /// Exhausted providers are never called, whatever their position.
    #[test]
    fn prop_exhausted_never_called(mask in proptest::collection::vec(any::<bool>(), 1..=6)) {
        let tracker = Arc::new(RateLimitTracker::new());
        let providers: Vec<_> = (0..mask.len())
            .map(|i| ScriptedProvider::new(IDS[i], false))
            .collect();
        for (i, exhausted) in mask.iter().enumerate() {
            if *exhausted {
                tracker.record(IDS[i], &exhausted_headers());
            }
        }
        let resolver = PriceResolver::new(chain(&providers), tracker);

        let err = runtime().block_on(resolver.resolve()).unwrap_err();

        prop_assert_eq!(err.len(), mask.len());
        for (i, exhausted) in mask.iter().enumerate() {
            if *exhausted {
                prop_assert_eq!(providers[i].calls(), 0);
                prop_assert_eq!(err.failures()[i].error_kind, ErrorKind::RateLimited);
            } else {
                prop_assert_eq!(providers[i].calls(), 1);
            }
        }
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[tokio::test]
async fn test_exhausted_primary_fails_over_to_secondary() {
    let tracker = Arc::new(RateLimitTracker::new());
    tracker.record("P0", &exhausted_headers());
    assert_eq!(tracker.status("P0"), RateLimitStatus::Exhausted);

    let primary = ScriptedProvider::new("P0", true);
    let secondary = ScriptedProvider::new("P1", true);
    let resolver = PriceResolver::new(chain(&[primary.clone(), secondary.clone()]), tracker);

    let (result, diagnostics) = resolver.resolve_with_diagnostics().await;
    assert_eq!(result.unwrap().source_id, "P1");
    assert_eq!(primary.calls(), 0);
    assert_eq!(diagnostics.attempts.len(), 2);
    assert!(diagnostics.attempts[0].skipped.is_some());
    assert!(diagnostics.attempts[1].success);
}

#[tokio::test]
async fn test_reset_in_past_provider_is_used_again() {
    let tracker = Arc::new(RateLimitTracker::new());
    let past = Utc::now() - ChronoDuration::minutes(10);
    tracker.record_at("P0", &exhausted_headers(), past);
    assert_eq!(tracker.status("P0"), RateLimitStatus::Ok);

    let primary = ScriptedProvider::new("P0", true);
    let resolver = PriceResolver::new(chain(&[primary.clone()]), tracker);

    assert_eq!(resolver.resolve().await.unwrap().source_id, "P0");
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn test_check_all_settles_every_branch_with_timeout() {
    let ok = ScriptedProvider::new("P0", true);
    let failing = ScriptedProvider::new("P1", false);
    let hanging = ScriptedProvider::slow("P2", Duration::from_secs(30));
    let resolver = PriceResolver::new(
        chain(&[ok, failing, hanging]),
        Arc::new(RateLimitTracker::new()),
    )
    .with_timeout(Duration::from_millis(100));

    let started = std::time::Instant::now();
    let health = resolver.check_all().await;
    assert!(started.elapsed() < Duration::from_secs(5));

    let ids: Vec<_> = health.iter().map(|h| h.provider_id.as_str()).collect();
    assert_eq!(ids, vec!["P0", "P1", "P2"]);
    assert!(health[0].success);
    assert_eq!(health[0].price, Some(dec!(43250.5)));
    assert!(!health[1].success);
    assert!(!health[2].success);
    let timeout = health[2].error.as_ref().unwrap();
    assert_eq!(timeout.error_kind, ErrorKind::Network);
    assert!(timeout.message.contains("Timed out"));
}

#[tokio::test]
async fn test_health_serializes_camel_case() {
    let resolver = PriceResolver::new(
        chain(&[ScriptedProvider::new("P0", false)]),
        Arc::new(RateLimitTracker::new()),
    );
    let health = resolver.check_all().await;
    let json = serde_json::to_value(&health[0]).unwrap();
    assert_eq!(json["providerId"], "P0");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["errorKind"], "NETWORK");
    assert!(json["responseTimeMs"].is_u64());
}
