//! Price point validation.
//!
//! Adapters already reject unparsable prices. This is the resolver's last
//! gate before a point is returned to the caller:
//! - price must be positive
//! - volume and market cap must be non-negative
//! - price must be under a sanity ceiling
//!
//! Soft issues (a provider that claims to report volume but sent zero, a
//! circulating supply above the max supply) are logged and accepted.

use log::warn;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::PricePoint;
use crate::provider::ProviderCapabilities;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the point, try next provider.
    Hard,
    /// Accept the point but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
struct ValidationIssue {
    severity: ValidationSeverity,
    message: String,
}

/// Price validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed price value.
    pub max_price: Option<Decimal>,
    /// Warn when a volume-reporting provider sends zero volume.
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(Decimal::from(1_000_000_000i64)),
            warn_on_zero_volume: true,
        }
    }
}

/// Price point validator.
pub struct PricePointValidator {
    config: ValidatorConfig,
}

impl PricePointValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a point returned by `provider_id`.
    ///
    /// Hard issues become `InvalidResponse` against that provider.
    pub fn validate(
        &self,
        provider_id: &str,
        point: &PricePoint,
        capabilities: ProviderCapabilities,
    ) -> Result<(), MarketDataError> {
        let mut issues = Vec::new();

        if point.price <= Decimal::ZERO {
            issues.push(hard(format!("Non-positive price: {}", point.price)));
        }
        if let Some(max) = self.config.max_price {
            if point.price > max {
                issues.push(hard(format!("Price {} exceeds sanity ceiling {}", point.price, max)));
            }
        }
        if point.volume_24h < Decimal::ZERO {
            issues.push(hard(format!("Negative volume: {}", point.volume_24h)));
        }
        if point.market_cap < Decimal::ZERO {
            issues.push(hard(format!("Negative market cap: {}", point.market_cap)));
        }

        if self.config.warn_on_zero_volume
            && capabilities.reports_volume
            && point.volume_24h.is_zero()
        {
            issues.push(soft("Zero 24h volume from a volume-reporting provider"));
        }
        if !point.max_supply.is_zero() && point.circulating_supply > point.max_supply {
            issues.push(soft(format!(
                "Circulating supply {} above max supply {}",
                point.circulating_supply, point.max_supply
            )));
        }

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(MarketDataError::invalid_response(
                provider_id,
                errors.join("; "),
            ));
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!("Price validation warning for '{}': {}", provider_id, issue.message);
        }

        Ok(())
    }
}

impl Default for PricePointValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn hard(message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Hard,
        message: message.into(),
    }
}

fn soft(message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Soft,
        message: message.into(),
    }
}
