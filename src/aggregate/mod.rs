//! Folding raw records into published aggregates
//!
//! Both folds here are pure: the same inputs always give the same output,
//! and malformed entries are skipped one at a time rather than failing the
//! whole pass.

mod images;
mod sellers;

pub use images::{build_item_image_lookup, ItemImageLookup};
pub use sellers::{build_market_sellers, ReviewStats, SellerAggregate};

use serde_json::Value;

/// Coerces an identifier that may be a JSON string or number to a string
pub(crate) fn coerce_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a number that may arrive as a JSON number or a numeric string
pub(crate) fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
