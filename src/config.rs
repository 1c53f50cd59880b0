use std::time::Duration;

/// Pricing catalog service code for EC2.
pub const SERVICE_CODE: &str = "AmazonEC2";

/// Spot product description used for every spot history request.
pub const PRODUCT_DESCRIPTION: &str = "Linux/UNIX (Amazon VPC)";

/// Region description used when the configured region is not in the partition table.
pub const DEFAULT_REGION_DESCRIPTION: &str = "US East (N. Virginia)";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Conventional spot history window, in days.
pub const DEFAULT_SPOT_DAYS_BACK: u32 = 30;

/// The pricing catalog only serves from us-east-1 (and ap-south-1), regardless
/// of the region being priced.
pub const DEFAULT_PRICING_ENDPOINT: &str = "https://api.pricing.us-east-1.amazonaws.com";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Page size requested from recorded sources when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

pub fn default_ec2_endpoint(region: &str) -> String {
    format!("https://ec2.{}.amazonaws.com", region)
}

/// Region from `AWS_REGION`, then `AWS_DEFAULT_REGION`, then [`DEFAULT_REGION`].
pub fn default_region() -> String {
    ["AWS_REGION", "AWS_DEFAULT_REGION"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
