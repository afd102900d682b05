//! Price provider trait definitions.
//!
//! This module defines the core `PriceProvider` trait that every provider
//! adapter implements.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::PricePoint;

use super::capabilities::ProviderCapabilities;

/// Trait for spot price providers.
///
/// Implement this trait to add support for a new price source. The resolver
/// treats every implementation uniformly: it only ever sees the normalized
/// [`PricePoint`], never the provider's own field names.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use chainscope_market_data::provider::{PriceProvider, ProviderCapabilities};
///
/// struct MyProvider {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl PriceProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::spot_only()
///     }
///
///     async fn fetch(&self) -> Result<PricePoint, MarketDataError> {
///         // ... request, parse, normalize
///     }
/// }
/// ```
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "COINGECKO", "BINANCE", etc.
    /// Used for logging, rate-limit tracking, and error traces.
    fn id(&self) -> &'static str;

    /// Default position in the failover chain.
    ///
    /// Lower values = higher priority. Default is 10. Configuration can
    /// override it per descriptor.
    fn priority(&self) -> i32 {
        10
    }

    /// Which metrics beyond the spot price this provider reports.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch the current price.
    ///
    /// Returns `Network` on transport failure or non-2xx status and
    /// `InvalidResponse` when the payload lacks the expected shape or a
    /// positive price. Unsupported metrics are zero-filled, not errors.
    async fn fetch(&self) -> Result<PricePoint, MarketDataError>;
}
