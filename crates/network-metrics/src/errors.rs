//! Error types for the network metrics crate.

use thiserror::Error;

/// Errors raised while acquiring block data.
///
/// There is a single source of raw blocks, so any failure here is fatal to
/// the metric being computed. Too little data is never an error; the
/// calculators return empty results instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkMetricsError {
    /// The block indexing service was unreachable, answered with an error,
    /// or returned a payload that could not be used.
    #[error("Block data unavailable: {message}")]
    Unavailable { message: String },
}

impl NetworkMetricsError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Result alias for network metrics operations.
pub type Result<T> = std::result::Result<T, NetworkMetricsError>;
