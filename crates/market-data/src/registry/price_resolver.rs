//! Price resolver: ordered failover across price providers.
//!
//! The resolver walks a priority-ordered chain of provider descriptors:
//! - Providers the tracker reports exhausted are skipped without network I/O
//! - Every call runs under its own timeout
//! - The first validated price wins
//! - When nothing succeeds, every visited provider's failure is returned
//!
//! `resolve()` is strictly sequential. `check_all()` is the only concurrent
//! fan-out and never short-circuits.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use log::{debug, info, warn};

use super::health::{probe, ProviderHealth};
use super::{
    FetchDiagnostics, PricePointValidator, RateLimitStatus, RateLimitTracker, SkipReason,
};
use crate::config::{MarketDataConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::errors::{AggregateError, MarketDataError, ProviderFailure};
use crate::models::{PricePoint, ProviderId};
use crate::provider::{build_provider, PriceProvider};

/// One entry of the failover chain.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    /// Lower values are tried first.
    pub priority: i32,
    pub provider: Arc<dyn PriceProvider>,
}

impl ProviderDescriptor {
    pub fn new(priority: i32, provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            id: Cow::Borrowed(provider.id()),
            priority,
            provider,
        }
    }

    /// Descriptor using the provider's own default priority.
    pub fn from_provider(provider: Arc<dyn PriceProvider>) -> Self {
        Self::new(provider.priority(), provider)
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Resolver orchestrating the failover chain.
pub struct PriceResolver {
    chain: Vec<ProviderDescriptor>,
    tracker: Arc<RateLimitTracker>,
    validator: PricePointValidator,
    timeout: Duration,
}

impl PriceResolver {
    /// Create a resolver over `descriptors`.
    ///
    /// Descriptors are ordered by ascending priority; equal priorities keep
    /// the order they were supplied in.
    pub fn new(mut descriptors: Vec<ProviderDescriptor>, tracker: Arc<RateLimitTracker>) -> Self {
        descriptors.sort_by_key(|d| d.priority);
        Self {
            chain: descriptors,
            tracker,
            validator: PricePointValidator::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Per-provider call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_validator(mut self, validator: PricePointValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Descriptors in failover order.
    pub fn chain(&self) -> &[ProviderDescriptor] {
        &self.chain
    }

    pub fn tracker(&self) -> &Arc<RateLimitTracker> {
        &self.tracker
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the current price from the first provider that delivers one.
    pub async fn resolve(&self) -> Result<PricePoint, AggregateError> {
        self.resolve_with_diagnostics().await.0
    }

    /// Resolve and also return the full attempt trace.
    pub async fn resolve_with_diagnostics(
        &self,
    ) -> (Result<PricePoint, AggregateError>, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();

        if self.chain.is_empty() {
            warn!("Price resolution requested with an empty provider chain");
            return (Err(AggregateError::default()), diagnostics);
        }

        for descriptor in &self.chain {
            let provider_id = descriptor.id.clone();

            if self.tracker.status(&provider_id) == RateLimitStatus::Exhausted {
                let reset_at = self.tracker.state(&provider_id).and_then(|s| s.reset_at);
                warn!(
                    "Skipping provider '{}': rate limit exhausted until {:?}",
                    provider_id, reset_at
                );
                diagnostics.record_skip(provider_id, SkipReason::RateLimitExhausted { reset_at });
                continue;
            }

            debug!("Fetching price from provider '{}'", provider_id);
            let started = Instant::now();
            let outcome = self.call_with_timeout(descriptor).await.and_then(|point| {
                self.validator
                    .validate(&provider_id, &point, descriptor.provider.capabilities())
                    .map(|()| point)
            });
            let elapsed_ms = elapsed_millis(started);

            match outcome {
                Ok(point) => {
                    diagnostics.record_success(provider_id.clone(), elapsed_ms);
                    info!(
                        "Resolved price {} from '{}' in {}ms. Diagnostics: {}",
                        point.price,
                        provider_id,
                        elapsed_ms,
                        diagnostics.summary()
                    );
                    return (Ok(point), diagnostics);
                }
                Err(e) => {
                    warn!("Provider '{}' failed: {}", provider_id, e);
                    diagnostics.record_error(
                        provider_id.clone(),
                        failure_for(&provider_id, &e),
                        elapsed_ms,
                    );
                }
            }
        }

        warn!("All providers failed. Diagnostics: {}", diagnostics.summary());
        let error = AggregateError::new(diagnostics.failures());
        (Err(error), diagnostics)
    }

    /// Probe every provider concurrently.
    ///
    /// Rate-limit state is not consulted. Results come back in chain order
    /// regardless of completion order.
    pub async fn check_all(&self) -> Vec<ProviderHealth> {
        let probes = self
            .chain
            .iter()
            .map(|descriptor| probe(descriptor, self.timeout));
        let results = join_all(probes).await;

        let healthy = results.iter().filter(|h| h.success).count();
        info!(
            "Health check: {}/{} providers responded",
            healthy,
            results.len()
        );
        results
    }

    async fn call_with_timeout(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<PricePoint, MarketDataError> {
        call_with_timeout(descriptor, self.timeout).await
    }
}

/// Run one provider call under `timeout`; expiry is a `Network` failure.
pub(crate) async fn call_with_timeout(
    descriptor: &ProviderDescriptor,
    timeout: Duration,
) -> Result<PricePoint, MarketDataError> {
    match tokio::time::timeout(timeout, descriptor.provider.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::network(
            descriptor.id.as_ref(),
            format!("Timed out after {}ms", timeout.as_millis()),
        )),
    }
}

/// Failure entry attributed to the descriptor that was called.
pub(crate) fn failure_for(provider_id: &str, error: &MarketDataError) -> ProviderFailure {
    ProviderFailure {
        provider_id: provider_id.to_string(),
        ..ProviderFailure::from(error)
    }
}

pub(crate) fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Build the failover chain described by `config`.
///
/// Disabled providers and ids without an adapter are left out. The
/// configured request timeout also bounds each resolver call.
pub fn build_resolver(config: &MarketDataConfig, tracker: Arc<RateLimitTracker>) -> PriceResolver {
    let descriptors: Vec<ProviderDescriptor> = config
        .enabled_providers()
        .into_iter()
        .filter_map(|settings| {
            build_provider(
                settings,
                &config.asset,
                config.request_timeout,
                tracker.clone(),
            )
            .map(|provider| ProviderDescriptor::new(settings.priority, provider))
        })
        .collect();

    debug!(
        "Built price resolver chain: {}",
        descriptors
            .iter()
            .map(|d| d.id.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    );

    PriceResolver::new(descriptors, tracker).with_timeout(config.request_timeout)
}
