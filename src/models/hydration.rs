use chrono::{DateTime, Utc};

use crate::error::{ParseErrors, PricingError, Result};

// ---------------------------------------------------------------------------
// HydrationReport — Outcome of a committed bulk refresh
// ---------------------------------------------------------------------------

/// Summary of a hydration that reached the commit step.
///
/// A report is only produced once the new cache has been swapped in. Records
/// that failed to parse were left out of the cache and are listed in
/// `parse_errors`.
#[derive(Debug, Clone)]
pub struct HydrationReport {
    /// Number of entries committed (instance types for on-demand,
    /// observations for spot).
    pub entries: usize,
    /// Freshness timestamp stamped on the new cache.
    pub refreshed_at: DateTime<Utc>,
    pub parse_errors: ParseErrors,
}

impl HydrationReport {
    /// `true` if every upstream record parsed.
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty()
    }

    /// Treat any parse failure as an error. The cache stays committed either way.
    pub fn into_result(self) -> Result<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(PricingError::Parse(self.parse_errors))
        }
    }
}
