//! HTTP collaborators over a blocking reqwest client.
//!
//! The catalog client speaks the JSON 1.1 `GetProducts` shape of the price
//! list service. The spot client posts a JSON rendering of
//! `DescribeSpotPriceHistory`. Requests are sent unsigned, so the endpoints
//! are expected to be a credential-injecting proxy or a compatible mirror.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{
    PricingCatalog, PricingPage, ProductFilters, SpotHistoryQuery, SpotPriceHistory,
    SpotPricePage,
};
use crate::error::Result;
use crate::models::SpotPriceEvent;

const GET_PRODUCTS_TARGET: &str = "AWSPriceListService.GetProducts";
const DESCRIBE_SPOT_PRICE_HISTORY_TARGET: &str = "AmazonEC2.DescribeSpotPriceHistory";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const MAX_RESULTS: u32 = 100;

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetProductsRequest<'a> {
    service_code: &'a str,
    filters: Vec<TermFilter<'a>>,
    format_version: &'static str,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TermFilter<'a> {
    #[serde(rename = "Type")]
    kind: &'static str,
    field: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetProductsResponse {
    #[serde(default)]
    price_list: Vec<Value>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSpotPriceHistoryRequest<'a> {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    instance_types: Vec<&'a str>,
    product_descriptions: Vec<&'a str>,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSpotPriceHistoryResponse {
    #[serde(default)]
    spot_price_history: Vec<SpotPriceEvent>,
    next_token: Option<String>,
}

// ---------------------------------------------------------------------------
// HttpPricingCatalog
// ---------------------------------------------------------------------------

/// Pricing catalog reached over HTTP.
pub struct HttpPricingCatalog {
    client: Client,
    endpoint: String,
}

impl HttpPricingCatalog {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PricingCatalog for HttpPricingCatalog {
    fn get_products(
        &self,
        filters: &ProductFilters,
        next_token: Option<&str>,
    ) -> Result<PricingPage> {
        let body = GetProductsRequest {
            service_code: &filters.service_code,
            filters: filters
                .terms()
                .into_iter()
                .map(|(field, value)| TermFilter {
                    kind: "TERM_MATCH",
                    field,
                    value,
                })
                .collect(),
            format_version: "aws_v1",
            max_results: MAX_RESULTS,
            next_token,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            location = %filters.location,
            instance_type = filters.instance_type.as_deref().unwrap_or("*"),
            "fetching pricing catalog page"
        );

        let resp: GetProductsResponse = self
            .client
            .post(format!("{}/", self.endpoint))
            .header("Content-Type", AMZ_JSON)
            .header("X-Amz-Target", GET_PRODUCTS_TARGET)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(PricingPage {
            records: resp.price_list,
            next_token: resp.next_token,
        })
    }
}

// ---------------------------------------------------------------------------
// HttpSpotPriceHistory
// ---------------------------------------------------------------------------

/// Spot price history reached over HTTP.
pub struct HttpSpotPriceHistory {
    client: Client,
    endpoint: String,
}

impl HttpSpotPriceHistory {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SpotPriceHistory for HttpSpotPriceHistory {
    fn describe_spot_price_history(
        &self,
        query: &SpotHistoryQuery,
        next_token: Option<&str>,
    ) -> Result<SpotPricePage> {
        let body = DescribeSpotPriceHistoryRequest {
            start_time: query.start_time,
            end_time: query.end_time,
            instance_types: query.instance_type.as_deref().into_iter().collect(),
            product_descriptions: vec![query.product_description.as_str()],
            max_results: MAX_RESULTS,
            next_token,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            instance_type = query.instance_type.as_deref().unwrap_or("*"),
            start = %query.start_time,
            "fetching spot price history page"
        );

        let resp: DescribeSpotPriceHistoryResponse = self
            .client
            .post(format!("{}/", self.endpoint))
            .header("Content-Type", AMZ_JSON)
            .header("X-Amz-Target", DESCRIBE_SPOT_PRICE_HISTORY_TARGET)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(SpotPricePage {
            events: resp.spot_price_history,
            next_token: resp.next_token,
        })
    }
}
