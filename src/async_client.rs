//! Async wrapper around [`Ec2Pricing`] for use in async runtimes (Tokio, etc.).
//!
//! Queries and hydration block on paged HTTP fetches, so every operation is
//! dispatched to the blocking thread pool via [`tokio::task::spawn_blocking`],
//! keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! # use ec2_pricing::AsyncEc2Pricing;
//! # async fn example() -> ec2_pricing::Result<()> {
//! let pricing = AsyncEc2Pricing::builder().region("eu-west-1").build().await?;
//!
//! pricing.hydrate_on_demand_cache().await?;
//! let hourly = pricing.on_demand_price("c6g.xlarge").await?;
//!
//! // Run any sync method via closure
//! let state = pricing.run(|p| Ok(p.spot_cache_state())).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{PricingError, Result};
use crate::models::HydrationReport;
use crate::Ec2Pricing;

// ---------------------------------------------------------------------------
// AsyncEc2PricingBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncEc2Pricing`] instance.
///
/// Covers the HTTP configuration only. To inject custom collaborators, build
/// an [`Ec2Pricing`] and wrap it with [`AsyncEc2Pricing::from_blocking`].
#[derive(Default)]
pub struct AsyncEc2PricingBuilder {
    region: Option<String>,
    timeout: Option<Duration>,
    pricing_endpoint: Option<String>,
    ec2_endpoint: Option<String>,
}

impl AsyncEc2PricingBuilder {
    /// Set the region to price.
    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the pricing catalog endpoint.
    pub fn pricing_endpoint(mut self, endpoint: &str) -> Self {
        self.pricing_endpoint = Some(endpoint.to_string());
        self
    }

    /// Override the EC2 endpoint used for spot price history.
    pub fn ec2_endpoint(mut self, endpoint: &str) -> Self {
        self.ec2_endpoint = Some(endpoint.to_string());
        self
    }

    /// Build the async client.
    ///
    /// Runs on the blocking thread pool, since the blocking HTTP client must
    /// not be constructed on an async worker.
    pub async fn build(self) -> Result<AsyncEc2Pricing> {
        tokio::task::spawn_blocking(move || {
            let mut builder = Ec2Pricing::builder();
            if let Some(region) = &self.region {
                builder = builder.region(region);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(endpoint) = &self.pricing_endpoint {
                builder = builder.pricing_endpoint(endpoint);
            }
            if let Some(endpoint) = &self.ec2_endpoint {
                builder = builder.ec2_endpoint(endpoint);
            }
            Ok(AsyncEc2Pricing::from_blocking(builder.build()?))
        })
        .await
        .map_err(|e| PricingError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncEc2Pricing
// ---------------------------------------------------------------------------

/// Async wrapper around [`Ec2Pricing`].
///
/// [`Ec2Pricing`] is `Sync` and guards its own caches, so the wrapper shares
/// it through an [`Arc`] without an extra lock. Cloning is cheap and every
/// clone sees the same caches.
#[derive(Clone)]
pub struct AsyncEc2Pricing {
    inner: Arc<Ec2Pricing>,
}

impl AsyncEc2Pricing {
    /// Create a new builder for configuring the async client.
    pub fn builder() -> AsyncEc2PricingBuilder {
        AsyncEc2PricingBuilder::default()
    }

    /// Wrap an already-built blocking client.
    pub fn from_blocking(pricing: Ec2Pricing) -> Self {
        Self {
            inner: Arc::new(pricing),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// The closure receives an `&Ec2Pricing` reference and should return
    /// a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Ec2Pricing) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pricing = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&pricing))
            .await
            .map_err(|e| PricingError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Hourly on-demand price for an instance type.
    pub async fn on_demand_price(&self, instance_type: &str) -> Result<f64> {
        let instance_type = instance_type.to_string();
        self.run(move |p| p.on_demand_price(&instance_type)).await
    }

    /// Time-weighted average spot price over the last `days` days.
    pub async fn spot_average_price(
        &self,
        instance_type: &str,
        zones: &[String],
        days: u32,
    ) -> Result<f64> {
        let instance_type = instance_type.to_string();
        let zones = zones.to_vec();
        self.run(move |p| p.spot_average_price(&instance_type, zones.as_slice(), days))
            .await
    }

    /// Replace the on-demand cache with the full catalog.
    pub async fn hydrate_on_demand_cache(&self) -> Result<HydrationReport> {
        self.run(|p| p.hydrate_on_demand_cache()).await
    }

    /// Replace the spot cache with the full history over `days` days.
    pub async fn hydrate_spot_cache(&self, days: u32) -> Result<HydrationReport> {
        self.run(move |p| p.hydrate_spot_cache(days)).await
    }

    /// When the on-demand cache was last hydrated. Does not block.
    pub fn last_on_demand_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.last_on_demand_refresh()
    }

    /// When the spot cache was last hydrated. Does not block.
    pub fn last_spot_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.last_spot_refresh()
    }

    /// The wrapped blocking client.
    pub fn blocking(&self) -> &Ec2Pricing {
        &self.inner
    }
}
