use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OnDemandPrice — Parsed result of one pricing catalog record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandPrice {
    pub instance_type: String,
    /// Hourly rate in USD.
    pub price: f64,
}

// ---------------------------------------------------------------------------
// SpotPriceObservation — One spot price change for an (instance type, zone)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl SpotPriceObservation {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

// ---------------------------------------------------------------------------
// SpotPriceEvent — Raw spot price history entry as returned upstream
// ---------------------------------------------------------------------------

/// A spot price history entry before its price has been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpotPriceEvent {
    pub instance_type: String,
    pub availability_zone: String,
    pub spot_price: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
}
