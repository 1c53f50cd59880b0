//! Region code to pricing-catalog location lookup.
//!
//! The pricing catalog filters by the human-readable location ("US West
//! (Oregon)") rather than the region code, so every catalog request goes
//! through this table first.

use crate::config::DEFAULT_REGION_DESCRIPTION;

/// Region codes and their catalog descriptions, grouped by partition.
const PARTITIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "aws",
        &[
            ("af-south-1", "Africa (Cape Town)"),
            ("ap-east-1", "Asia Pacific (Hong Kong)"),
            ("ap-northeast-1", "Asia Pacific (Tokyo)"),
            ("ap-northeast-2", "Asia Pacific (Seoul)"),
            ("ap-northeast-3", "Asia Pacific (Osaka)"),
            ("ap-south-1", "Asia Pacific (Mumbai)"),
            ("ap-south-2", "Asia Pacific (Hyderabad)"),
            ("ap-southeast-1", "Asia Pacific (Singapore)"),
            ("ap-southeast-2", "Asia Pacific (Sydney)"),
            ("ap-southeast-3", "Asia Pacific (Jakarta)"),
            ("ap-southeast-4", "Asia Pacific (Melbourne)"),
            ("ca-central-1", "Canada (Central)"),
            ("ca-west-1", "Canada West (Calgary)"),
            ("eu-central-1", "EU (Frankfurt)"),
            ("eu-central-2", "EU (Zurich)"),
            ("eu-north-1", "EU (Stockholm)"),
            ("eu-south-1", "EU (Milan)"),
            ("eu-south-2", "EU (Spain)"),
            ("eu-west-1", "EU (Ireland)"),
            ("eu-west-2", "EU (London)"),
            ("eu-west-3", "EU (Paris)"),
            ("il-central-1", "Israel (Tel Aviv)"),
            ("me-central-1", "Middle East (UAE)"),
            ("me-south-1", "Middle East (Bahrain)"),
            ("sa-east-1", "South America (Sao Paulo)"),
            ("us-east-1", "US East (N. Virginia)"),
            ("us-east-2", "US East (Ohio)"),
            ("us-west-1", "US West (N. California)"),
            ("us-west-2", "US West (Oregon)"),
        ],
    ),
    (
        "aws-cn",
        &[
            ("cn-north-1", "China (Beijing)"),
            ("cn-northwest-1", "China (Ningxia)"),
        ],
    ),
    (
        "aws-us-gov",
        &[
            ("us-gov-east-1", "AWS GovCloud (US-East)"),
            ("us-gov-west-1", "AWS GovCloud (US-West)"),
        ],
    ),
];

/// Maps region codes to the location descriptions the pricing catalog expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionResolver;

impl RegionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Look up the catalog description for `region`, if the partition table knows it.
    pub fn lookup(&self, region: &str) -> Option<&'static str> {
        PARTITIONS
            .iter()
            .flat_map(|(_, regions)| regions.iter())
            .find(|(code, _)| *code == region)
            .map(|(_, description)| *description)
    }

    /// Return the catalog description for `region`.
    ///
    /// Unknown regions resolve to [`DEFAULT_REGION_DESCRIPTION`] so that price
    /// lookups still target a sane region instead of failing outright.
    pub fn describe(&self, region: &str) -> &'static str {
        match self.lookup(region) {
            Some(description) => description,
            None => {
                tracing::warn!(
                    region,
                    fallback = DEFAULT_REGION_DESCRIPTION,
                    "unknown region, falling back to default pricing location"
                );
                DEFAULT_REGION_DESCRIPTION
            }
        }
    }

    pub fn is_known(&self, region: &str) -> bool {
        self.lookup(region).is_some()
    }

    /// Name of the partition `region` belongs to (`aws`, `aws-cn`, `aws-us-gov`).
    pub fn partition(&self, region: &str) -> Option<&'static str> {
        PARTITIONS
            .iter()
            .find(|(_, regions)| regions.iter().any(|(code, _)| *code == region))
            .map(|(name, _)| *name)
    }
}
