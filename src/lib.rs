//! EC2 instance pricing for Rust.
//!
//! Answers two questions about an instance type: what it costs on demand per
//! hour, and what its time-weighted average spot price has been over the last
//! N days, optionally restricted to a set of availability zones.
//!
//! Prices are held in two in-memory caches. Each can be filled in bulk with a
//! hydration call, or filled lazily by individual queries. There is no TTL;
//! the last hydration time is exposed so callers can decide when to refresh.
//!
//! # Quick start
//!
//! ```no_run
//! use ec2_pricing::Ec2Pricing;
//!
//! let pricing = Ec2Pricing::builder().region("us-west-2").build().unwrap();
//!
//! // Single lookups fetch on a cache miss
//! let hourly = pricing.on_demand_price("m5.large").unwrap();
//!
//! // Or load everything up front
//! let report = pricing.hydrate_spot_cache(30).unwrap();
//! let spot = pricing
//!     .spot_average_price("m5.large", &["us-west-2a", "us-west-2b"], 30)
//!     .unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod averager;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod region;

#[cfg(feature = "async")]
pub use async_client::AsyncEc2Pricing;
pub use cache::{CacheState, OnDemandCache, SpotSeriesStore};
pub use client::{PricingCatalog, SpotPriceHistory};
pub use config::DEFAULT_SPOT_DAYS_BACK;
pub use error::{ParseError, ParseErrorKind, ParseErrors, PricingError, Result};
pub use models::{HydrationReport, SpotPriceObservation};
pub use region::RegionResolver;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::CacheCell;
use crate::client::{
    drain_pages, HttpPricingCatalog, HttpSpotPriceHistory, ProductFilters, SpotHistoryQuery,
};

// ---------------------------------------------------------------------------
// Ec2PricingBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`Ec2Pricing`] instance.
///
/// Use [`Ec2Pricing::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](Ec2PricingBuilder::build).
pub struct Ec2PricingBuilder {
    region: Option<String>,
    timeout: Duration,
    pricing_endpoint: Option<String>,
    ec2_endpoint: Option<String>,
    catalog: Option<Box<dyn PricingCatalog>>,
    spot_history: Option<Box<dyn SpotPriceHistory>>,
}

impl Default for Ec2PricingBuilder {
    fn default() -> Self {
        Self {
            region: None,
            timeout: config::DEFAULT_TIMEOUT,
            pricing_endpoint: None,
            ec2_endpoint: None,
            catalog: None,
            spot_history: None,
        }
    }
}

impl Ec2PricingBuilder {
    /// Set the region to price.
    ///
    /// If not set, `AWS_REGION` is used, then `AWS_DEFAULT_REGION`, then
    /// `us-east-1`.
    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set the HTTP request timeout for the default HTTP collaborators.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the pricing catalog endpoint used by the default HTTP catalog.
    pub fn pricing_endpoint(mut self, endpoint: &str) -> Self {
        self.pricing_endpoint = Some(endpoint.to_string());
        self
    }

    /// Override the EC2 endpoint used by the default HTTP spot history client.
    pub fn ec2_endpoint(mut self, endpoint: &str) -> Self {
        self.ec2_endpoint = Some(endpoint.to_string());
        self
    }

    /// Use a custom pricing catalog instead of the HTTP one.
    pub fn catalog<C: PricingCatalog + 'static>(mut self, catalog: C) -> Self {
        self.catalog = Some(Box::new(catalog));
        self
    }

    /// Use a custom spot price history source instead of the HTTP one.
    pub fn spot_history<S: SpotPriceHistory + 'static>(mut self, history: S) -> Self {
        self.spot_history = Some(Box::new(history));
        self
    }

    /// Build the pricing client.
    ///
    /// Resolves the region description once and constructs the HTTP
    /// collaborators that were not overridden. No network calls are made
    /// until the first query or hydration.
    pub fn build(self) -> Result<Ec2Pricing> {
        let region = self.region.unwrap_or_else(config::default_region);
        let region_description = RegionResolver::new().describe(&region).to_string();

        let catalog: Box<dyn PricingCatalog> = match self.catalog {
            Some(catalog) => catalog,
            None => Box::new(HttpPricingCatalog::new(
                self.pricing_endpoint
                    .as_deref()
                    .unwrap_or(config::DEFAULT_PRICING_ENDPOINT),
                self.timeout,
            )?),
        };

        let spot_history: Box<dyn SpotPriceHistory> = match self.spot_history {
            Some(history) => history,
            None => {
                let endpoint = self
                    .ec2_endpoint
                    .unwrap_or_else(|| config::default_ec2_endpoint(&region));
                Box::new(HttpSpotPriceHistory::new(&endpoint, self.timeout)?)
            }
        };

        Ok(Ec2Pricing {
            region,
            region_description,
            catalog,
            spot_history,
            on_demand: CacheCell::default(),
            spot: CacheCell::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ec2Pricing
// ---------------------------------------------------------------------------

/// The main entry point: cached on-demand and spot price lookups.
///
/// Owns both caches and the upstream collaborators. Every method takes
/// `&self` and the type is `Send + Sync`, so one instance can be shared
/// across threads behind an [`Arc`].
pub struct Ec2Pricing {
    region: String,
    region_description: String,
    catalog: Box<dyn PricingCatalog>,
    spot_history: Box<dyn SpotPriceHistory>,
    on_demand: CacheCell<OnDemandCache>,
    spot: CacheCell<SpotSeriesStore>,
}

/// Parsed output of one fully-paged fetch.
struct Collected<T> {
    data: T,
    errors: ParseErrors,
    pages: usize,
}

impl Ec2Pricing {
    /// Create a new builder for configuring the client.
    pub fn builder() -> Ec2PricingBuilder {
        Ec2PricingBuilder::default()
    }

    // -- Queries -----------------------------------------------------------

    /// Hourly on-demand USD price for `instance_type`.
    ///
    /// Served from the cache when present. On a miss, the catalog is queried
    /// for that one instance type and the price is added to the cache
    /// without touching the hydration timestamp.
    ///
    /// Fails with [`PricingError::Parse`] if any returned record could not be
    /// parsed, and [`PricingError::NotFound`] if none carried a price.
    pub fn on_demand_price(&self, instance_type: &str) -> Result<f64> {
        if let Some(price) = self.on_demand.load().get(instance_type) {
            tracing::debug!(instance_type, price, "on-demand cache hit");
            return Ok(price);
        }

        let filters =
            ProductFilters::for_location(&self.region_description).with_instance_type(instance_type);
        let collected = self.collect_on_demand(&filters)?;

        if !collected.errors.is_empty() {
            tracing::warn!(
                instance_type,
                failures = collected.errors.len(),
                "on-demand lookup returned unparsable pricing records"
            );
            return Err(PricingError::Parse(collected.errors));
        }

        let price = collected.data.get(instance_type).copied().ok_or_else(|| {
            PricingError::NotFound(format!(
                "No on-demand price for {} in {}",
                instance_type, self.region_description
            ))
        })?;

        self.on_demand.update(|c| c.with_price(instance_type, price));
        tracing::debug!(instance_type, price, pages = collected.pages, "on-demand price cached");
        Ok(price)
    }

    /// Time-weighted average spot price for `instance_type` over the last `days` days.
    ///
    /// `zones` restricts the average to those availability zones, matched by
    /// exact name; an empty slice uses every zone with data. The result is the
    /// unweighted mean of the per-zone averages.
    ///
    /// Served from the hydrated spot cache when it holds the instance type.
    /// Otherwise the history is fetched for this call only and is not added
    /// to the shared cache; only [`hydrate_spot_cache`](Self::hydrate_spot_cache)
    /// fills it.
    ///
    /// `days` must be at least 1 and small enough that the window start is a
    /// representable date, otherwise [`PricingError::InvalidArgument`].
    pub fn spot_average_price<Z: AsRef<str>>(
        &self,
        instance_type: &str,
        zones: &[Z],
        days: u32,
    ) -> Result<f64> {
        let query = SpotHistoryQuery::last_days(days)?.with_instance_type(instance_type);

        let cached = self.spot.load();
        if let Some(series) = cached.zones(instance_type) {
            tracing::debug!(instance_type, zones = series.len(), "spot cache hit");
            return averager::cross_zone_average(instance_type, series, zones);
        }

        let collected = self.collect_spot(&query)?;

        if !collected.errors.is_empty() {
            tracing::warn!(
                instance_type,
                failures = collected.errors.len(),
                "spot lookup returned unparsable price entries"
            );
            return Err(PricingError::Parse(collected.errors));
        }

        let series = collected.data.zones(instance_type).ok_or_else(|| {
            PricingError::NotFound(format!(
                "No spot price history for {} in the last {} days",
                instance_type, days
            ))
        })?;

        averager::cross_zone_average(instance_type, series, zones)
    }

    // -- Hydration ---------------------------------------------------------

    /// Replace the on-demand cache with the full catalog for the configured region.
    ///
    /// A transport failure aborts without touching the current cache. Records
    /// that fail to parse are left out and listed in the returned report; the
    /// rest are committed with a new freshness timestamp.
    pub fn hydrate_on_demand_cache(&self) -> Result<HydrationReport> {
        let filters = ProductFilters::for_location(&self.region_description);
        let collected = self.collect_on_demand(&filters).inspect_err(|e| {
            tracing::warn!(error = %e, "on-demand hydration aborted; cache unchanged");
        })?;

        let refreshed_at = Utc::now();
        let entries = collected.data.len();
        self.on_demand
            .replace(OnDemandCache::hydrated(collected.data, refreshed_at));

        if !collected.errors.is_empty() {
            tracing::warn!(
                failures = collected.errors.len(),
                "skipped unparsable pricing records during on-demand hydration"
            );
        }
        tracing::info!(
            entries,
            pages = collected.pages,
            location = %self.region_description,
            "on-demand cache hydrated"
        );

        Ok(HydrationReport {
            entries,
            refreshed_at,
            parse_errors: collected.errors,
        })
    }

    /// Replace the spot cache with every instance type's history over the last `days` days.
    ///
    /// Same commit rules as [`hydrate_on_demand_cache`](Self::hydrate_on_demand_cache).
    /// The report counts observations.
    pub fn hydrate_spot_cache(&self, days: u32) -> Result<HydrationReport> {
        let query = SpotHistoryQuery::last_days(days)?;
        let collected = self.collect_spot(&query).inspect_err(|e| {
            tracing::warn!(error = %e, "spot hydration aborted; cache unchanged");
        })?;

        let refreshed_at = Utc::now();
        let entries = collected.data.observation_count();
        self.spot.replace(collected.data.stamp(refreshed_at));

        if !collected.errors.is_empty() {
            tracing::warn!(
                failures = collected.errors.len(),
                "skipped unparsable spot prices during spot hydration"
            );
        }
        tracing::info!(entries, pages = collected.pages, days, "spot cache hydrated");

        Ok(HydrationReport {
            entries,
            refreshed_at,
            parse_errors: collected.errors,
        })
    }

    // -- Freshness and introspection ---------------------------------------

    /// When the on-demand cache was last hydrated, or `None` if never.
    pub fn last_on_demand_refresh(&self) -> Option<DateTime<Utc>> {
        self.on_demand.load().refreshed_at()
    }

    /// When the spot cache was last hydrated, or `None` if never.
    pub fn last_spot_refresh(&self) -> Option<DateTime<Utc>> {
        self.spot.load().refreshed_at()
    }

    pub fn on_demand_cache_state(&self) -> CacheState {
        self.on_demand.load().state()
    }

    pub fn spot_cache_state(&self) -> CacheState {
        self.spot.load().state()
    }

    /// The current on-demand cache. Later writes do not affect the returned snapshot.
    pub fn on_demand_snapshot(&self) -> Arc<OnDemandCache> {
        self.on_demand.load()
    }

    /// The current spot cache. Later writes do not affect the returned snapshot.
    pub fn spot_snapshot(&self) -> Arc<SpotSeriesStore> {
        self.spot.load()
    }

    /// Region code being priced, e.g. `us-west-2`.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Catalog location description for [`region()`](Self::region).
    pub fn region_description(&self) -> &str {
        &self.region_description
    }

    // -- Fetch and parse ---------------------------------------------------

    fn collect_on_demand(&self, filters: &ProductFilters) -> Result<Collected<HashMap<String, f64>>> {
        let mut prices = HashMap::new();
        let mut errors = ParseErrors::new();

        let pages = drain_pages(
            |token| self.catalog.get_products(filters, token),
            |page| {
                for record in &page.records {
                    match parser::parse_on_demand_price(record) {
                        Ok(parsed) => {
                            prices.insert(parsed.instance_type, parsed.price);
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "unparsable pricing record");
                            errors.push(e);
                        }
                    }
                }
            },
        )?;

        Ok(Collected {
            data: prices,
            errors,
            pages,
        })
    }

    fn collect_spot(&self, query: &SpotHistoryQuery) -> Result<Collected<SpotSeriesStore>> {
        let mut store = SpotSeriesStore::new();
        let mut errors = ParseErrors::new();

        let pages = drain_pages(
            |token| self.spot_history.describe_spot_price_history(query, token),
            |page| {
                for event in page.events {
                    match parser::parse_spot_price(&event.instance_type, &event.spot_price) {
                        Ok(price) => store.insert(
                            &event.instance_type,
                            &event.availability_zone,
                            SpotPriceObservation::new(event.timestamp, price),
                        ),
                        Err(e) => {
                            tracing::debug!(error = %e, zone = %event.availability_zone, "unparsable spot price");
                            errors.push(e);
                        }
                    }
                }
            },
        )?;

        Ok(Collected {
            data: store,
            errors,
            pages,
        })
    }
}

// ---------------------------------------------------------------------------
// InstancePricing
// ---------------------------------------------------------------------------

/// The pricing operations as a trait, so consumers can substitute a mock.
pub trait InstancePricing: Send + Sync {
    fn on_demand_price(&self, instance_type: &str) -> Result<f64>;
    fn spot_average_price(&self, instance_type: &str, zones: &[String], days: u32) -> Result<f64>;
    fn hydrate_on_demand_cache(&self) -> Result<HydrationReport>;
    fn hydrate_spot_cache(&self, days: u32) -> Result<HydrationReport>;
    fn last_on_demand_refresh(&self) -> Option<DateTime<Utc>>;
    fn last_spot_refresh(&self) -> Option<DateTime<Utc>>;
}

impl InstancePricing for Ec2Pricing {
    fn on_demand_price(&self, instance_type: &str) -> Result<f64> {
        Ec2Pricing::on_demand_price(self, instance_type)
    }

    fn spot_average_price(&self, instance_type: &str, zones: &[String], days: u32) -> Result<f64> {
        Ec2Pricing::spot_average_price(self, instance_type, zones, days)
    }

    fn hydrate_on_demand_cache(&self) -> Result<HydrationReport> {
        Ec2Pricing::hydrate_on_demand_cache(self)
    }

    fn hydrate_spot_cache(&self, days: u32) -> Result<HydrationReport> {
        Ec2Pricing::hydrate_spot_cache(self, days)
    }

    fn last_on_demand_refresh(&self) -> Option<DateTime<Utc>> {
        Ec2Pricing::last_on_demand_refresh(self)
    }

    fn last_spot_refresh(&self) -> Option<DateTime<Utc>> {
        Ec2Pricing::last_spot_refresh(self)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Ec2Pricing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_demand = self.on_demand.load();
        let spot = self.spot.load();
        write!(
            f,
            "Ec2Pricing(region={}, location={}, on_demand={:?}/{}, spot={:?}/{})",
            self.region,
            self.region_description,
            on_demand.state(),
            on_demand.len(),
            spot.state(),
            spot.instance_types().len()
        )
    }
}
