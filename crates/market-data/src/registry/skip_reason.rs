//! Skip reason tracking for failover diagnostics.

use chrono::{DateTime, Utc};

use crate::errors::{ErrorKind, ProviderFailure};
use crate::models::ProviderId;

/// Why a provider was skipped without being called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Tracker reported the provider exhausted until `reset_at`.
    RateLimitExhausted { reset_at: Option<DateTime<Utc>> },
}

/// Record of a single provider attempt during a resolution.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub skipped: Option<SkipReason>,
    pub error: Option<ProviderFailure>,
    pub success: bool,
    /// Wall time spent on the call; zero for skips.
    pub elapsed_ms: u64,
}

/// Ordered trace of one resolution.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        let failure = ProviderFailure {
            provider_id: provider_id.to_string(),
            error_kind: ErrorKind::RateLimited,
            message: match &reason {
                SkipReason::RateLimitExhausted { reset_at: Some(at) } => {
                    format!("Rate limit exhausted until {}", at.to_rfc3339())
                }
                SkipReason::RateLimitExhausted { reset_at: None } => {
                    "Rate limit exhausted".to_string()
                }
            },
        };
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: Some(reason),
            error: Some(failure),
            success: false,
            elapsed_ms: 0,
        });
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: ProviderFailure, elapsed_ms: u64) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: Some(error),
            success: false,
            elapsed_ms,
        });
    }

    pub fn record_success(&mut self, provider_id: ProviderId, elapsed_ms: u64) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: None,
            success: true,
            elapsed_ms,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no providers configured".to_string();
        }
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS ({}ms)", a.provider_id, a.elapsed_ms)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({:?})", a.provider_id, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: {} ({})", a.provider_id, err.error_kind, err.message)
                } else {
                    format!("{}: UNKNOWN", a.provider_id)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    /// Providers skipped and why.
    pub fn skip_reasons(&self) -> Vec<(&ProviderId, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.as_ref().map(|s| (&a.provider_id, s)))
            .collect()
    }

    /// One failure per unsuccessful attempt, skips included, in attempt order.
    pub fn failures(&self) -> Vec<ProviderFailure> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.clone())
            .collect()
    }
}
