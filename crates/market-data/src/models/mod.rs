//! Market data models
//!
//! This module contains the core data types for price resolution:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `price_point` - The normalized price record (PricePoint)

mod price_point;
mod types;

pub use price_point::{PricePoint, UNAVAILABLE_SOURCE_ID};
pub use types::ProviderId;
