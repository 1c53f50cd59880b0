//! Shared test fixtures for the pricing integration tests.
//!
//! Provides synthetic catalog records and spot events, plus in-memory
//! collaborators that page their data and count how often they are called.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use ec2_pricing::client::{
    PricingCatalog, PricingPage, ProductFilters, SpotHistoryQuery, SpotPriceHistory,
    SpotPricePage,
};
use ec2_pricing::models::SpotPriceEvent;
use ec2_pricing::{Ec2Pricing, PricingError, Result, SpotPriceObservation};

pub const NO_ZONES: &[&str] = &[];

/// Fixed reference instant so averages are reproducible.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn minutes_before(minutes: i64) -> DateTime<Utc> {
    t0() - Duration::minutes(minutes)
}

pub fn obs(minutes_ago: i64, price: f64) -> SpotPriceObservation {
    SpotPriceObservation::new(minutes_before(minutes_ago), price)
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// A catalog record shaped like the price list service returns for EC2.
pub fn price_document(instance_type: &str, usd: &str) -> serde_json::Value {
    serde_json::json!({
        "product": {
            "productFamily": "Compute Instance",
            "sku": format!("SKU-{}", instance_type.to_uppercase()),
            "attributes": {
                "instanceType": instance_type,
                "location": "US East (N. Virginia)",
                "operatingSystem": "Linux",
                "tenancy": "Shared",
                "capacitystatus": "Used",
                "preInstalledSw": "NA",
                "vcpu": "2"
            }
        },
        "serviceCode": "AmazonEC2",
        "terms": {
            "OnDemand": {
                "SKU.JRTCKXETXF": {
                    "offerTermCode": "JRTCKXETXF",
                    "priceDimensions": {
                        "SKU.JRTCKXETXF.6YS6EN2CT7": {
                            "unit": "Hrs",
                            "description": format!("${} per On Demand Linux {} Instance Hour", usd, instance_type),
                            "pricePerUnit": { "USD": usd }
                        }
                    }
                }
            }
        },
        "version": "20240601000000",
        "publicationDate": "2024-06-01T00:00:00Z"
    })
}

/// A catalog record for the same instance type in another location.
pub fn price_document_in(instance_type: &str, usd: &str, location: &str) -> serde_json::Value {
    let mut doc = price_document(instance_type, usd);
    doc["product"]["attributes"]["location"] = serde_json::Value::String(location.to_string());
    doc
}

/// A catalog record with no terms subtree.
pub fn broken_document(instance_type: &str) -> serde_json::Value {
    serde_json::json!({
        "product": { "attributes": { "instanceType": instance_type } }
    })
}

// ---------------------------------------------------------------------------
// Spot events
// ---------------------------------------------------------------------------

pub fn spot_event(instance_type: &str, zone: &str, price: &str, minutes_ago: i64) -> SpotPriceEvent {
    SpotPriceEvent {
        instance_type: instance_type.to_string(),
        availability_zone: zone.to_string(),
        spot_price: price.to_string(),
        timestamp: minutes_before(minutes_ago),
        product_description: Some("Linux/UNIX (Amazon VPC)".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Paging helper
// ---------------------------------------------------------------------------

fn page<T: Clone>(items: &[T], token: Option<&str>, size: usize) -> (Vec<T>, Option<String>) {
    let start: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
    let end = (start + size).min(items.len());
    let next = if end < items.len() {
        Some(end.to_string())
    } else {
        None
    };
    (items[start..end].to_vec(), next)
}

fn outage() -> PricingError {
    PricingError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "upstream unavailable"))
}

// ---------------------------------------------------------------------------
// MockCatalog
// ---------------------------------------------------------------------------

pub struct MockCatalog {
    records: Mutex<Vec<serde_json::Value>>,
    page_size: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
    filters_seen: Mutex<Vec<ProductFilters>>,
}

impl MockCatalog {
    pub fn new(records: Vec<serde_json::Value>) -> Arc<Self> {
        Self::paged(records, 2)
    }

    pub fn paged(records: Vec<serde_json::Value>, page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            page_size,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            filters_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn set_records(&self, records: Vec<serde_json::Value>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of page requests served (or failed).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn filters_seen(&self) -> Vec<ProductFilters> {
        self.filters_seen.lock().unwrap().clone()
    }
}

impl PricingCatalog for MockCatalog {
    fn get_products(&self, filters: &ProductFilters, next_token: Option<&str>) -> Result<PricingPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.filters_seen.lock().unwrap().push(filters.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage());
        }

        let matching: Vec<serde_json::Value> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| match &filters.instance_type {
                Some(it) => r
                    .pointer("/product/attributes/instanceType")
                    .and_then(|v| v.as_str())
                    .map(|v| v == it)
                    .unwrap_or(true),
                None => true,
            })
            .cloned()
            .collect();

        let (records, next_token) = page(&matching, next_token, self.page_size);
        Ok(PricingPage { records, next_token })
    }
}

// ---------------------------------------------------------------------------
// MockSpotHistory
// ---------------------------------------------------------------------------

pub struct MockSpotHistory {
    events: Mutex<Vec<SpotPriceEvent>>,
    page_size: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
    queries_seen: Mutex<Vec<SpotHistoryQuery>>,
}

impl MockSpotHistory {
    pub fn new(events: Vec<SpotPriceEvent>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
            page_size: 3,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            queries_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn set_events(&self, events: Vec<SpotPriceEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries_seen(&self) -> Vec<SpotHistoryQuery> {
        self.queries_seen.lock().unwrap().clone()
    }
}

impl SpotPriceHistory for MockSpotHistory {
    fn describe_spot_price_history(
        &self,
        query: &SpotHistoryQuery,
        next_token: Option<&str>,
    ) -> Result<SpotPricePage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries_seen.lock().unwrap().push(query.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage());
        }

        let matching: Vec<SpotPriceEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| match &query.instance_type {
                Some(it) => &e.instance_type == it,
                None => true,
            })
            .cloned()
            .collect();

        let (events, next_token) = page(&matching, next_token, self.page_size);
        Ok(SpotPricePage { events, next_token })
    }
}

// ---------------------------------------------------------------------------
// Facade setup
// ---------------------------------------------------------------------------

/// Build a client for us-east-1 backed by the given mocks.
pub fn pricing_with(catalog: &Arc<MockCatalog>, spot: &Arc<MockSpotHistory>) -> Ec2Pricing {
    Ec2Pricing::builder()
        .region("us-east-1")
        .catalog(catalog.clone())
        .spot_history(spot.clone())
        .build()
        .unwrap()
}

/// Catalog with three instance types across two pages.
pub fn sample_catalog() -> Arc<MockCatalog> {
    MockCatalog::new(vec![
        price_document("t3.micro", "0.0104000000"),
        price_document("m5.large", "0.0960000000"),
        price_document("c5.xlarge", "0.1700000000"),
    ])
}

/// Spot history for two instance types.
///
/// m5.large in us-east-1a averages $6 ($10 now, $6 an hour ago) and in
/// us-east-1b sits at a single $4 observation. c5.xlarge has one zone.
pub fn sample_spot_history() -> Arc<MockSpotHistory> {
    MockSpotHistory::new(vec![
        spot_event("m5.large", "us-east-1a", "10.0", 0),
        spot_event("m5.large", "us-east-1b", "4.0", 30),
        spot_event("m5.large", "us-east-1a", "6.0", 60),
        spot_event("c5.xlarge", "us-east-1c", "0.07", 10),
    ])
}
