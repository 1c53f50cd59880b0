//! In-memory price caches.
//!
//! Each cache is an immutable snapshot (entries plus freshness timestamp)
//! held in a [`CacheCell`]. Readers load the current snapshot without
//! locking; writers build a replacement and swap it in under a per-cell
//! mutex, so a reader only ever sees a fully-old or fully-new cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::models::SpotPriceObservation;

/// Zone name to that zone's spot observations, for one instance type.
pub type ZoneSeries = HashMap<String, Vec<SpotPriceObservation>>;

// ---------------------------------------------------------------------------
// CacheState
// ---------------------------------------------------------------------------

/// Observable lifecycle of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Never hydrated and holds no entries.
    Uninitialized,
    /// Never hydrated, but single-key queries have added entries.
    PartiallyPopulated,
    /// Replaced by a successful bulk hydration.
    Hydrated,
}

fn state_of(refreshed_at: Option<DateTime<Utc>>, is_empty: bool) -> CacheState {
    match (refreshed_at, is_empty) {
        (Some(_), _) => CacheState::Hydrated,
        (None, true) => CacheState::Uninitialized,
        (None, false) => CacheState::PartiallyPopulated,
    }
}

// ---------------------------------------------------------------------------
// OnDemandCache
// ---------------------------------------------------------------------------

/// Instance type to hourly on-demand USD price.
#[derive(Debug, Clone, Default)]
pub struct OnDemandCache {
    prices: HashMap<String, f64>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl OnDemandCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot produced by a full hydration at `at`.
    pub fn hydrated(prices: HashMap<String, f64>, at: DateTime<Utc>) -> Self {
        Self {
            prices,
            refreshed_at: Some(at),
        }
    }

    pub fn get(&self, instance_type: &str) -> Option<f64> {
        self.prices.get(instance_type).copied()
    }

    /// Copy of this snapshot with one more entry. The freshness timestamp is kept as is.
    pub fn with_price(&self, instance_type: &str, price: f64) -> Self {
        let mut next = self.clone();
        next.prices.insert(instance_type.to_string(), price);
        next
    }

    pub fn prices(&self) -> &HashMap<String, f64> {
        &self.prices
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn state(&self) -> CacheState {
        state_of(self.refreshed_at, self.is_empty())
    }
}

// ---------------------------------------------------------------------------
// SpotSeriesStore
// ---------------------------------------------------------------------------

/// Instance type to zone to spot price observations, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct SpotSeriesStore {
    series: HashMap<String, ZoneSeries>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl SpotSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this store as the product of a full hydration at `at`.
    pub fn stamp(mut self, at: DateTime<Utc>) -> Self {
        self.refreshed_at = Some(at);
        self
    }

    /// Append one observation to the (instance type, zone) series.
    pub fn insert(&mut self, instance_type: &str, zone: &str, observation: SpotPriceObservation) {
        self.series
            .entry(instance_type.to_string())
            .or_default()
            .entry(zone.to_string())
            .or_default()
            .push(observation);
    }

    pub fn zones(&self, instance_type: &str) -> Option<&ZoneSeries> {
        self.series.get(instance_type)
    }

    pub fn instance_types(&self) -> Vec<&str> {
        self.series.keys().map(|k| k.as_str()).collect()
    }

    /// Total number of observations across every instance type and zone.
    pub fn observation_count(&self) -> usize {
        self.series
            .values()
            .flat_map(|zones| zones.values())
            .map(|obs| obs.len())
            .sum()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn state(&self) -> CacheState {
        state_of(self.refreshed_at, self.is_empty())
    }
}

// ---------------------------------------------------------------------------
// CacheCell
// ---------------------------------------------------------------------------

/// Atomically swapped snapshot with serialized writers.
#[derive(Debug)]
pub struct CacheCell<T> {
    current: ArcSwap<T>,
    writer: Mutex<()>,
}

impl<T: Default> Default for CacheCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> CacheCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot. Never blocks on writers.
    pub fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Swap in a whole new snapshot.
    pub fn replace(&self, next: T) {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.store(Arc::new(next));
    }

    /// Build the next snapshot from the current one and swap it in, with no
    /// other writer able to interleave.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.current.load_full();
        let next = f(&snapshot);
        self.current.store(Arc::new(next));
    }
}
