//! Pricing catalog record parsing.
//!
//! Catalog records nest differently per product line, so every level of the
//! deserialization target is optional. Extraction then walks the levels in
//! order and reports the first one that is missing or of the wrong JSON type
//! as a [`ParseErrorKind`], along with any instance type already read.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ParseError, ParseErrorKind};
use crate::models::OnDemandPrice;

// ---------------------------------------------------------------------------
// Deserialization targets
// ---------------------------------------------------------------------------

// Each level holds its subtree as a raw value and is decoded on its own, so a
// subtree of the wrong JSON type fails at its own stage.

#[derive(Debug, Deserialize)]
struct PriceDocument {
    product: Option<Value>,
    terms: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Product {
    attributes: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProductAttributes {
    // Kept as a raw value so a non-string type is a stage failure, not a serde error.
    #[serde(rename = "instanceType")]
    instance_type: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand")]
    on_demand: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OnDemandTerm {
    #[serde(rename = "priceDimensions")]
    price_dimensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PriceDimension {
    #[serde(rename = "pricePerUnit")]
    price_per_unit: Option<Value>,
}

/// Decode one level of a record. Absent and wrongly typed subtrees both read as `None`.
fn level<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

/// A non-empty keyed map at one level, in key order.
fn non_empty_map(value: Option<Value>) -> Option<BTreeMap<String, Value>> {
    level::<BTreeMap<String, Value>>(value).filter(|m| !m.is_empty())
}

// ---------------------------------------------------------------------------
// Public parsing entry points
// ---------------------------------------------------------------------------

/// Extract the instance type and on-demand hourly USD price from one catalog record.
///
/// The record may be the decoded JSON object or a JSON-encoded string, which
/// is how the catalog API returns `PriceList` entries.
pub fn parse_on_demand_price(record: &Value) -> Result<OnDemandPrice, ParseError> {
    if let Value::String(raw) = record {
        let decoded: Value = serde_json::from_str(raw)
            .map_err(|e| ParseError::new("", ParseErrorKind::Malformed(e.to_string())))?;
        return parse_document(&decoded);
    }
    parse_document(record)
}

/// Validate a spot price string as a finite, non-negative USD amount.
pub fn parse_spot_price(instance_type: &str, raw: &str) -> Result<f64, ParseError> {
    parse_usd(raw).ok_or_else(|| {
        ParseError::new(instance_type, ParseErrorKind::InvalidSpotPrice(raw.to_string()))
    })
}

fn parse_document(record: &Value) -> Result<OnDemandPrice, ParseError> {
    let doc = PriceDocument::deserialize(record)
        .map_err(|e| ParseError::new("", ParseErrorKind::Malformed(e.to_string())))?;

    let attributes = level::<Product>(doc.product)
        .and_then(|p| level::<ProductAttributes>(p.attributes))
        .ok_or_else(|| ParseError::new("", ParseErrorKind::MissingAttributes))?;

    let instance_type = match attributes.instance_type {
        Some(Value::String(name)) => name,
        _ => return Err(ParseError::new("", ParseErrorKind::MissingInstanceType)),
    };

    let terms = match level::<Terms>(doc.terms) {
        Some(t) => t,
        None => return Err(ParseError::new(instance_type, ParseErrorKind::MissingTerms)),
    };
    let on_demand = match non_empty_map(terms.on_demand) {
        Some(t) => t,
        None => {
            return Err(ParseError::new(
                instance_type,
                ParseErrorKind::MissingOnDemandTerms,
            ))
        }
    };

    let mut first_failure: Option<ParseErrorKind> = None;

    for term in on_demand.into_values() {
        let dimensions = match level::<OnDemandTerm>(Some(term))
            .and_then(|t| non_empty_map(t.price_dimensions))
        {
            Some(d) => d,
            None => {
                first_failure.get_or_insert(ParseErrorKind::MissingPriceDimensions);
                continue;
            }
        };

        for dimension in dimensions.into_values() {
            match dimension_price(dimension) {
                Ok(price) => {
                    return Ok(OnDemandPrice {
                        instance_type,
                        price,
                    })
                }
                Err(kind) => {
                    first_failure.get_or_insert(kind);
                }
            }
        }
    }

    // on_demand is non-empty, so at least one failure was recorded.
    Err(ParseError::new(
        instance_type,
        first_failure.unwrap_or(ParseErrorKind::MissingPriceDimensions),
    ))
}

fn dimension_price(dimension: Value) -> Result<f64, ParseErrorKind> {
    let per_unit = level::<PriceDimension>(Some(dimension))
        .and_then(|d| level::<BTreeMap<String, Value>>(d.price_per_unit))
        .ok_or(ParseErrorKind::MissingPricePerUnit)?;

    let usd = match per_unit.get("USD") {
        Some(Value::String(s)) => s,
        _ => return Err(ParseErrorKind::MissingUsdPrice),
    };

    parse_usd(usd).ok_or_else(|| ParseErrorKind::InvalidUsdPrice(usd.clone()))
}

fn parse_usd(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_usd_rejects_negative_and_non_finite() {
        assert_eq!(parse_usd("0.0416000000"), Some(0.0416));
        assert_eq!(parse_usd(" 1.5 "), Some(1.5));
        assert_eq!(parse_usd("-1"), None);
        assert_eq!(parse_usd("NaN"), None);
        assert_eq!(parse_usd("inf"), None);
        assert_eq!(parse_usd(""), None);
    }
}
