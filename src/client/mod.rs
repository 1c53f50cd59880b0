//! Upstream collaborators: the pricing catalog and the spot price history.
//!
//! Both are single-page request/response contracts. The caller drives
//! pagination with [`drain_pages`] until the continuation token runs out.

pub mod http;
pub mod recorded;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::config;
use crate::error::{PricingError, Result};
use crate::models::SpotPriceEvent;

pub use http::{HttpPricingCatalog, HttpSpotPriceHistory};
pub use recorded::{RecordedCatalog, RecordedSpotHistory};

// ---------------------------------------------------------------------------
// ProductFilters
// ---------------------------------------------------------------------------

/// Term-match filters for a pricing catalog request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilters {
    pub service_code: String,
    pub operating_system: String,
    /// Region description, e.g. `"US East (N. Virginia)"`.
    pub location: String,
    pub capacity_status: String,
    pub pre_installed_sw: String,
    pub tenancy: String,
    pub instance_type: Option<String>,
}

impl ProductFilters {
    /// Shared-tenancy Linux on-demand pricing for every instance type in `location`.
    pub fn for_location(location: &str) -> Self {
        Self {
            service_code: config::SERVICE_CODE.to_string(),
            operating_system: "linux".to_string(),
            location: location.to_string(),
            capacity_status: "used".to_string(),
            pre_installed_sw: "NA".to_string(),
            tenancy: "shared".to_string(),
            instance_type: None,
        }
    }

    /// Narrow the filters to a single instance type.
    pub fn with_instance_type(mut self, instance_type: &str) -> Self {
        self.instance_type = Some(instance_type.to_string());
        self
    }

    /// The filters as `(field, value)` term-match pairs, in catalog field names.
    pub fn terms(&self) -> Vec<(&'static str, &str)> {
        let mut terms = vec![
            ("ServiceCode", self.service_code.as_str()),
            ("operatingSystem", self.operating_system.as_str()),
            ("location", self.location.as_str()),
            ("capacitystatus", self.capacity_status.as_str()),
            ("preInstalledSw", self.pre_installed_sw.as_str()),
            ("tenancy", self.tenancy.as_str()),
        ];
        if let Some(it) = &self.instance_type {
            terms.push(("instanceType", it.as_str()));
        }
        terms
    }
}

// ---------------------------------------------------------------------------
// SpotHistoryQuery
// ---------------------------------------------------------------------------

/// Time window and filters for a spot price history request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotHistoryQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub instance_type: Option<String>,
    pub product_description: String,
}

impl SpotHistoryQuery {
    /// The `days` days leading up to now, for every instance type.
    ///
    /// Fails with [`PricingError::InvalidArgument`] if `days` is zero or the
    /// window would start before the earliest representable date.
    pub fn last_days(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(PricingError::InvalidArgument(
                "days must be at least 1".to_string(),
            ));
        }

        let end_time = Utc::now();
        let start_time = Duration::try_days(i64::from(days))
            .and_then(|window| end_time.checked_sub_signed(window))
            .ok_or_else(|| {
                PricingError::InvalidArgument(format!("days out of range: {}", days))
            })?;

        Ok(Self {
            start_time,
            end_time,
            instance_type: None,
            product_description: config::PRODUCT_DESCRIPTION.to_string(),
        })
    }

    pub fn with_instance_type(mut self, instance_type: &str) -> Self {
        self.instance_type = Some(instance_type.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A page of results with an optional continuation token.
pub trait Page {
    fn next_token(&self) -> Option<&str>;
}

/// One page of opaque pricing catalog records.
#[derive(Debug, Clone, Default)]
pub struct PricingPage {
    pub records: Vec<Value>,
    pub next_token: Option<String>,
}

impl Page for PricingPage {
    fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
}

/// One page of spot price history events.
#[derive(Debug, Clone, Default)]
pub struct SpotPricePage {
    pub events: Vec<SpotPriceEvent>,
    pub next_token: Option<String>,
}

impl Page for SpotPricePage {
    fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
}

/// Fetch pages until the continuation token is exhausted, handing each page to `visit`.
///
/// An empty token counts as exhausted. The first fetch error aborts the walk.
/// Returns the number of pages fetched.
pub fn drain_pages<P, F, V>(mut fetch: F, mut visit: V) -> Result<usize>
where
    P: Page,
    F: FnMut(Option<&str>) -> Result<P>,
    V: FnMut(P),
{
    let mut token: Option<String> = None;
    let mut pages = 0;
    loop {
        let page = fetch(token.as_deref())?;
        pages += 1;
        let next = page
            .next_token()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string());
        visit(page);
        match next {
            Some(t) => token = Some(t),
            None => return Ok(pages),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Source of on-demand pricing catalog records.
pub trait PricingCatalog: Send + Sync {
    /// Fetch one page of records matching `filters`, starting at `next_token`.
    fn get_products(
        &self,
        filters: &ProductFilters,
        next_token: Option<&str>,
    ) -> Result<PricingPage>;
}

/// Source of historical spot price change events.
pub trait SpotPriceHistory: Send + Sync {
    /// Fetch one page of events matching `query`, starting at `next_token`.
    fn describe_spot_price_history(
        &self,
        query: &SpotHistoryQuery,
        next_token: Option<&str>,
    ) -> Result<SpotPricePage>;
}

impl<T: PricingCatalog + ?Sized> PricingCatalog for Arc<T> {
    fn get_products(
        &self,
        filters: &ProductFilters,
        next_token: Option<&str>,
    ) -> Result<PricingPage> {
        (**self).get_products(filters, next_token)
    }
}

impl<T: SpotPriceHistory + ?Sized> SpotPriceHistory for Arc<T> {
    fn describe_spot_price_history(
        &self,
        query: &SpotHistoryQuery,
        next_token: Option<&str>,
    ) -> Result<SpotPricePage> {
        (**self).describe_spot_price_history(query, next_token)
    }
}
