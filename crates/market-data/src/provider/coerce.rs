//! Numeric coercion shared by the provider adapters.
//!
//! Providers encode numbers either as JSON numbers (`43250.0`) or as strings
//! (`"43250.00"`). Both go through the decimal text form, so the two encodings
//! of the same price normalize to the same `Decimal` without a detour through
//! binary floating point.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;

/// A provider field that may hold a JSON number or a numeric string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    pub(crate) fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => parse_decimal(&n.to_string()),
            Self::Text(s) => parse_decimal(s),
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .map(|d| d.normalize())
}

/// The spot price: must be present and strictly positive.
pub(crate) fn require_price(
    provider: &str,
    field: &str,
    value: Option<&Numeric>,
) -> Result<Decimal, MarketDataError> {
    let raw = value.ok_or_else(|| {
        MarketDataError::invalid_response(provider, format!("missing `{}`", field))
    })?;

    match raw.to_decimal() {
        Some(price) if price > Decimal::ZERO => Ok(price),
        Some(price) => Err(MarketDataError::invalid_response(
            provider,
            format!("`{}` is not positive: {}", field, price),
        )),
        None => Err(MarketDataError::invalid_response(
            provider,
            format!("`{}` is not a number: {:?}", field, raw),
        )),
    }
}

/// An optional signed metric; zero when absent or unparsable.
pub(crate) fn metric(value: Option<&Numeric>) -> Decimal {
    value
        .and_then(Numeric::to_decimal)
        .unwrap_or(Decimal::ZERO)
}

/// An optional metric that cannot be negative (volume, market cap); zero when
/// absent, unparsable, or negative.
pub(crate) fn non_negative_metric(value: Option<&Numeric>) -> Decimal {
    let v = metric(value);
    if v.is_sign_negative() {
        Decimal::ZERO
    } else {
        v
    }
}
