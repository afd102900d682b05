//! Provider registry module.
//!
//! This module provides orchestration for price providers, including:
//! - Failover chain ordering and resolution
//! - Rate-limit tracking per provider
//! - Price point validation
//! - Concurrent health probes

mod health;
mod price_resolver;
mod rate_limit_tracker;
mod skip_reason;
mod validator;

pub use health::ProviderHealth;
pub use price_resolver::{build_resolver, PriceResolver, ProviderDescriptor};
pub use rate_limit_tracker::{
    RateLimitState, RateLimitStatus, RateLimitTracker, DEFAULT_LOW_WATER_MARK,
};
pub use skip_reason::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use validator::{PricePointValidator, ValidationSeverity, ValidatorConfig};
