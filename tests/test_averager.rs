//! Time-weighted spot averaging tests.

mod common;

use std::collections::HashMap;

use common::{obs, NO_ZONES};
use ec2_pricing::averager::{cross_zone_average, zone_average};
use ec2_pricing::{PricingError, SpotPriceObservation};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn zones(entries: &[(&str, Vec<SpotPriceObservation>)]) -> HashMap<String, Vec<SpotPriceObservation>> {
    entries
        .iter()
        .map(|(zone, o)| (zone.to_string(), o.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// zone_average
// ---------------------------------------------------------------------------

#[test]
fn empty_zone_is_zero() {
    assert_eq!(zone_average(&[]), 0.0);
}

#[test]
fn single_observation_returns_its_price() {
    assert_eq!(zone_average(&[obs(0, 5.0)]), 5.0);
}

#[test]
fn newest_point_carries_no_weight() {
    // $6 held for the hour before the change to $10.
    let avg = zone_average(&[obs(0, 10.0), obs(60, 6.0)]);
    assert_eq!(avg, 6.0);
}

#[test]
fn input_order_does_not_matter() {
    let forward = zone_average(&[obs(0, 10.0), obs(30, 2.0), obs(90, 4.0)]);
    let shuffled = zone_average(&[obs(90, 4.0), obs(0, 10.0), obs(30, 2.0)]);
    assert_eq!(forward, shuffled);
}

#[test]
fn weights_by_time_in_effect() {
    // $2 for 30 minutes, $4 for 60 minutes, over 90 minutes total.
    let avg = zone_average(&[obs(0, 10.0), obs(30, 2.0), obs(90, 4.0)]);
    assert!(approx(avg, (30.0 * 2.0 + 60.0 * 4.0) / 90.0));
}

#[test]
fn shared_timestamp_averages_prices() {
    let avg = zone_average(&[obs(15, 3.0), obs(15, 5.0)]);
    assert_eq!(avg, 4.0);
    assert!(avg.is_finite());
}

#[test]
fn does_not_mutate_input() {
    let input = vec![obs(60, 6.0), obs(0, 10.0)];
    let _ = zone_average(&input);
    assert_eq!(input[0].price, 6.0);
}

// ---------------------------------------------------------------------------
// cross_zone_average
// ---------------------------------------------------------------------------

#[test]
fn unweighted_mean_across_zones() {
    let series = zones(&[
        ("us-east-1a", vec![obs(0, 4.0)]),
        ("us-east-1b", vec![obs(0, 10.0), obs(60, 8.0)]),
    ]);
    assert_eq!(cross_zone_average("m5.large", &series, NO_ZONES).unwrap(), 6.0);
}

#[test]
fn filter_restricts_zones() {
    let series = zones(&[
        ("us-east-1a", vec![obs(0, 4.0)]),
        ("us-east-1b", vec![obs(0, 8.0)]),
        ("us-east-1c", vec![obs(0, 100.0)]),
    ]);
    let avg = cross_zone_average("m5.large", &series, &["us-east-1a", "us-east-1b"]).unwrap();
    assert_eq!(avg, 6.0);
}

#[test]
fn filter_entries_without_data_are_ignored() {
    let series = zones(&[("us-east-1a", vec![obs(0, 4.0)])]);
    let avg = cross_zone_average("m5.large", &series, &["us-east-1a", "us-east-1f"]).unwrap();
    assert_eq!(avg, 4.0);
}

#[test]
fn zone_matching_is_exact_not_substring() {
    let series = zones(&[("us-east-1ab", vec![obs(0, 4.0)])]);
    let err = cross_zone_average("m5.large", &series, &["us-east-1a"]).unwrap_err();
    assert!(matches!(err, PricingError::NoMatchingZones { .. }));
}

#[test]
fn zone_matching_is_exact_not_prefix() {
    let series = zones(&[("us-east-1a", vec![obs(0, 4.0)])]);
    let err = cross_zone_average("m5.large", &series, &["us-east-1ab"]).unwrap_err();
    assert!(matches!(err, PricingError::NoMatchingZones { .. }));
}

#[test]
fn no_zones_at_all_is_an_error() {
    let series = HashMap::new();
    match cross_zone_average("m5.large", &series, NO_ZONES).unwrap_err() {
        PricingError::NoMatchingZones { instance_type, zones } => {
            assert_eq!(instance_type, "m5.large");
            assert!(zones.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_zone_series_counts_as_zero() {
    let series = zones(&[("us-east-1a", vec![]), ("us-east-1b", vec![obs(0, 8.0)])]);
    assert_eq!(cross_zone_average("m5.large", &series, NO_ZONES).unwrap(), 4.0);
}
