//! File-backed collaborators for offline use.
//!
//! Each source reads a newline-delimited JSON file (gzip-compressed when the
//! name ends in `.gz`) once at open time, then serves it page by page with the
//! same filters the remote services apply.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::client::{
    PricingCatalog, PricingPage, ProductFilters, SpotHistoryQuery, SpotPriceHistory,
    SpotPricePage,
};
use crate::config;
use crate::error::{PricingError, Result};
use crate::models::SpotPriceEvent;

/// Read the non-blank lines of an NDJSON file, decompressing `.gz` transparently.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(file)
    };

    let mut lines = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Slice one page out of `items`, using the decimal offset as the continuation token.
fn page_of<T: Clone>(items: &[T], next_token: Option<&str>, page_size: usize) -> Result<(Vec<T>, Option<String>)> {
    let start = match next_token {
        None => 0,
        Some(t) => t.parse::<usize>().map_err(|_| {
            PricingError::InvalidArgument(format!("Invalid continuation token: {}", t))
        })?,
    };
    let end = start.saturating_add(page_size).min(items.len());
    let page = items.get(start..end).unwrap_or(&[]).to_vec();
    let next = (end < items.len()).then(|| end.to_string());
    Ok((page, next))
}

// ---------------------------------------------------------------------------
// RecordedCatalog
// ---------------------------------------------------------------------------

/// Pricing catalog records replayed from an NDJSON file, one record per line.
pub struct RecordedCatalog {
    path: PathBuf,
    records: Vec<Value>,
    page_size: usize,
}

impl RecordedCatalog {
    /// Load every record in `path`.
    ///
    /// A line that is not valid JSON is kept as a raw string, so it surfaces
    /// later as a malformed record instead of failing the whole file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = read_lines(&path)?
            .into_iter()
            .map(|line| serde_json::from_str(&line).unwrap_or(Value::String(line)))
            .collect();
        Ok(Self {
            path,
            records,
            page_size: config::DEFAULT_PAGE_SIZE,
        })
    }

    /// Set how many records each page carries. Zero is treated as one.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `false` only when the record carries the attribute and it differs.
/// Records without a readable attribute pass through to the parser.
fn attribute_matches(record: &Value, attribute: &str, expected: &str) -> bool {
    match record
        .pointer(&format!("/product/attributes/{}", attribute))
        .and_then(|v| v.as_str())
    {
        Some(actual) => actual.eq_ignore_ascii_case(expected),
        None => true,
    }
}

impl PricingCatalog for RecordedCatalog {
    fn get_products(
        &self,
        filters: &ProductFilters,
        next_token: Option<&str>,
    ) -> Result<PricingPage> {
        let matching: Vec<Value> = self
            .records
            .iter()
            .filter(|r| attribute_matches(r, "location", &filters.location))
            .filter(|r| match &filters.instance_type {
                Some(it) => attribute_matches(r, "instanceType", it),
                None => true,
            })
            .cloned()
            .collect();

        let (records, next_token) = page_of(&matching, next_token, self.page_size)?;
        Ok(PricingPage {
            records,
            next_token,
        })
    }
}

// ---------------------------------------------------------------------------
// RecordedSpotHistory
// ---------------------------------------------------------------------------

/// Spot price history events replayed from an NDJSON file, one event per line.
pub struct RecordedSpotHistory {
    path: PathBuf,
    events: Vec<SpotPriceEvent>,
    page_size: usize,
}

impl RecordedSpotHistory {
    /// Load every event in `path`. Any line that is not a valid event fails the load.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let events = read_lines(&path)?
            .iter()
            .map(|line| serde_json::from_str(line))
            .collect::<std::result::Result<Vec<SpotPriceEvent>, _>>()?;
        Ok(Self {
            path,
            events,
            page_size: config::DEFAULT_PAGE_SIZE,
        })
    }

    /// Set how many events each page carries. Zero is treated as one.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl SpotPriceHistory for RecordedSpotHistory {
    fn describe_spot_price_history(
        &self,
        query: &SpotHistoryQuery,
        next_token: Option<&str>,
    ) -> Result<SpotPricePage> {
        let matching: Vec<SpotPriceEvent> = self
            .events
            .iter()
            .filter(|e| e.timestamp >= query.start_time && e.timestamp <= query.end_time)
            .filter(|e| match &query.instance_type {
                Some(it) => &e.instance_type == it,
                None => true,
            })
            .filter(|e| match &e.product_description {
                Some(pd) => pd == &query.product_description,
                None => true,
            })
            .cloned()
            .collect();

        let (events, next_token) = page_of(&matching, next_token, self.page_size)?;
        Ok(SpotPricePage { events, next_token })
    }
}
