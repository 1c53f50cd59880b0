//! Time-weighted spot price averaging.
//!
//! Spot history arrives as sparse price-change events. Each zone's series is
//! reduced to one time-weighted average, and the per-zone averages are then
//! combined into a single figure with an unweighted mean.

use std::collections::{HashMap, HashSet};

use crate::error::{PricingError, Result};
use crate::models::SpotPriceObservation;

/// Time-weighted average of one zone's observations.
///
/// Observations are ordered most recent first. Each one is weighted by the
/// minutes between it and the next more recent observation, so the newest
/// point carries no weight. The weighted sum is divided by the span from
/// oldest to newest.
///
/// An empty series averages to `0.0`. A series spanning zero time (a single
/// observation, or several sharing one timestamp) averages to the plain mean
/// of its prices.
pub fn zone_average(observations: &[SpotPriceObservation]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }

    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let newest = sorted[0].timestamp;
    let oldest = sorted[sorted.len() - 1].timestamp;
    let total_minutes = minutes_between(newest, oldest);

    if total_minutes <= 0.0 {
        let sum: f64 = sorted.iter().map(|o| o.price).sum();
        return sum / sorted.len() as f64;
    }

    let weighted_sum: f64 = sorted
        .windows(2)
        .map(|pair| minutes_between(pair[0].timestamp, pair[1].timestamp) * pair[1].price)
        .sum();

    weighted_sum / total_minutes
}

/// Unweighted mean of the per-zone averages for every zone selected by `zone_filter`.
///
/// An empty filter selects every zone in `series`. Otherwise a zone is
/// selected only if its name is exactly one of the filter entries.
///
/// Returns [`PricingError::NoMatchingZones`] if nothing is selected.
pub fn cross_zone_average<Z: AsRef<str>>(
    instance_type: &str,
    series: &HashMap<String, Vec<SpotPriceObservation>>,
    zone_filter: &[Z],
) -> Result<f64> {
    let wanted: HashSet<&str> = zone_filter.iter().map(|z| z.as_ref()).collect();

    let averages: Vec<f64> = series
        .iter()
        .filter(|(zone, _)| wanted.is_empty() || wanted.contains(zone.as_str()))
        .map(|(_, observations)| zone_average(observations))
        .collect();

    if averages.is_empty() {
        return Err(PricingError::NoMatchingZones {
            instance_type: instance_type.to_string(),
            zones: zone_filter.iter().map(|z| z.as_ref().to_string()).collect(),
        });
    }

    Ok(averages.iter().sum::<f64>() / averages.len() as f64)
}

fn minutes_between(later: chrono::DateTime<chrono::Utc>, earlier: chrono::DateTime<chrono::Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 60_000.0
}
