//! Error types for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: the failure of a single provider call
//! - [`ErrorKind`]: the serializable classification of that failure
//! - [`ProviderFailure`] and [`AggregateError`]: the failover trace surfaced
//!   when every provider in the chain failed

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while fetching a price from one provider.
///
/// Each variant maps onto an [`ErrorKind`] via [`kind`](Self::kind). The price
/// resolver recovers from all of them locally by moving on to the next
/// provider in the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// Transport failure, timeout, or a non-2xx response.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that could not be reached
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The provider answered, but the payload had the wrong shape or the
    /// price could not be parsed as a positive number.
    #[error("Invalid response: {provider} - {message}")]
    InvalidResponse {
        /// The provider that returned the payload
        provider: String,
        /// Description of the shape or parse failure
        message: String,
    },

    /// The provider was skipped because its tracked rate limit is exhausted.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that was skipped
        provider: String,
    },
}

impl MarketDataError {
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    /// Returns the classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainscope_market_data::errors::{ErrorKind, MarketDataError};
    ///
    /// let error = MarketDataError::network("COINGECKO", "HTTP 503");
    /// assert_eq!(error.kind(), ErrorKind::Network);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
        }
    }

    /// The provider this error belongs to.
    pub fn provider(&self) -> &str {
        match self {
            Self::Network { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::RateLimited { provider } => provider,
        }
    }
}

/// Serializable error classification presented to callers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Network,
    InvalidResponse,
    RateLimited,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::RateLimited => "RATE_LIMITED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the failover trace: `{providerId, errorKind, message}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFailure {
    pub provider_id: String,
    pub error_kind: ErrorKind,
    pub message: String,
}

impl From<&MarketDataError> for ProviderFailure {
    fn from(error: &MarketDataError) -> Self {
        Self {
            provider_id: error.provider().to_string(),
            error_kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<MarketDataError> for ProviderFailure {
    fn from(error: MarketDataError) -> Self {
        Self::from(&error)
    }
}

/// Returned when no provider in the chain produced a price.
///
/// Carries one [`ProviderFailure`] per visited provider, in attempt order, so
/// callers can present every underlying cause rather than only the last one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AggregateError {
    failures: Vec<ProviderFailure>,
}

impl AggregateError {
    pub fn new(failures: Vec<ProviderFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ProviderFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("All providers failed: no providers configured");
        }

        f.write_str("All providers failed: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{} ({})", failure.provider_id, failure.error_kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
