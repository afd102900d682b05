//! Provider capabilities.
//!
//! Describes which [`PricePoint`](crate::models::PricePoint) metrics a provider
//! actually reports. A metric a provider does not report is zero-filled in the
//! price point, so this is the place to tell "zero" from "not reported".

/// Describes what a price provider reports and needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProviderCapabilities {
    /// Whether the 24h price change is reported.
    pub reports_change_24h: bool,

    /// Whether the 24h traded volume is reported.
    pub reports_volume: bool,

    /// Whether market capitalization is reported.
    pub reports_market_cap: bool,

    /// Whether circulating and max supply are reported.
    pub reports_supply: bool,

    /// Whether requests fail without an API key.
    pub requires_api_key: bool,
}

impl ProviderCapabilities {
    /// A provider that reports nothing beyond the spot price.
    pub const fn spot_only() -> Self {
        Self {
            reports_change_24h: false,
            reports_volume: false,
            reports_market_cap: false,
            reports_supply: false,
            requires_api_key: false,
        }
    }

    /// A provider that reports every metric.
    pub const fn full() -> Self {
        Self {
            reports_change_24h: true,
            reports_volume: true,
            reports_market_cap: true,
            reports_supply: true,
            requires_api_key: false,
        }
    }
}
