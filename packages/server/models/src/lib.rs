#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the district map server.
//!
//! Every response is wrapped in an envelope carrying a `success` flag and a
//! timestamp, so the frontend can handle data and errors uniformly. The
//! payload types are kept separate from the core types so the API contract
//! can evolve independently.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use district_map_choropleth::{Bucket, CategoryLegendEntry, LegendEntry};
use district_map_compare_models::{ComparisonResult, VerdictReport};
use district_map_metrics::summary::MetricSummary;
use district_map_metrics_models::{MetricCategory, MetricDescriptor, MetricValue};
use serde::{Deserialize, Serialize};

/// Successful response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Response payload.
    pub data: T,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a success envelope stamped with the current time.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Error details inside an [`ApiErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: String,
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// What went wrong.
    pub error: ApiErrorBody,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl ApiErrorResponse {
    /// Builds an error envelope stamped with the current time.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorBody {
                message: message.into(),
                code: code.into(),
            },
            timestamp: Utc::now(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of loaded districts.
    pub district_count: usize,
    /// Number of cataloged metrics.
    pub metric_count: usize,
}

/// Dataset-wide statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    /// Number of loaded districts.
    pub district_count: usize,
    /// Number of cataloged metrics.
    pub metric_count: usize,
    /// One entry per metric, in catalog order.
    pub metrics: Vec<ApiMetricStats>,
}

/// Statistics for one metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetricStats {
    /// Metric identifier.
    pub metric: String,
    /// Metric label.
    pub label: String,
    /// Reporting category.
    pub category: MetricCategory,
    /// Summary of numeric values; `None` for ordinal metrics or when no
    /// district reports the metric.
    pub summary: Option<MetricSummary>,
    /// Number of districts per category, for ordinal metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<BTreeMap<String, usize>>,
    /// Number of districts without a value.
    pub missing: usize,
}

/// District list entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDistrictSummary {
    /// District identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Query parameters for the district list.
///
/// Both bounds are inclusive and apply to the current median price per
/// m². When either is given, districts without a price are left out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictQueryParams {
    /// Lowest accepted price per m².
    pub price_min: Option<f64>,
    /// Highest accepted price per m².
    pub price_max: Option<f64>,
}

impl DistrictQueryParams {
    /// Whether any bound was given.
    #[must_use]
    pub const fn is_filtering(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    /// Whether `price` falls within the bounds.
    #[must_use]
    pub fn accepts(&self, price: Option<f64>) -> bool {
        if !self.is_filtering() {
            return true;
        }
        price.is_some_and(|p| {
            self.price_min.is_none_or(|min| p >= min) && self.price_max.is_none_or(|max| p <= max)
        })
    }
}

/// Sort direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingOrder {
    /// Smallest value first.
    Asc,
    /// Largest value first.
    Desc,
}

/// Query parameters for the ranking endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQueryParams {
    /// Sort direction. Defaults to best first for the metric's polarity.
    pub order: Option<RankingOrder>,
}

/// Districts ordered by one metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRanking {
    /// Metric identifier.
    pub metric: String,
    /// Metric label.
    pub label: String,
    /// Applied sort direction.
    pub order: RankingOrder,
    /// Districts with a value, in rank order.
    pub entries: Vec<ApiRankingEntry>,
}

/// One district of a ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRankingEntry {
    /// 1-based rank; equal values share a rank.
    pub rank: usize,
    /// District identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Raw value.
    pub value: MetricValue,
    /// Formatted value.
    pub formatted: String,
    /// Bucket and color.
    pub bucket: Bucket,
}

/// Yearly median price per m² of one district.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPriceHistory {
    /// District identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// One point per year, oldest first.
    pub points: Vec<ApiPricePoint>,
}

/// One year of an [`ApiPriceHistory`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPricePoint {
    /// Calendar year.
    pub year: i32,
    /// Median price per m², `None` if the year has no data.
    pub value: Option<f64>,
    /// Formatted value, `None` if the year has no data.
    pub formatted: Option<String>,
}

/// Full district record with per-metric classification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDistrictDetail {
    /// District identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// One entry per cataloged metric.
    pub metrics: Vec<ApiDistrictMetric>,
}

/// One metric of a district.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDistrictMetric {
    /// Metric identifier.
    pub metric: String,
    /// Metric label.
    pub label: String,
    /// Reporting category.
    pub category: MetricCategory,
    /// Raw value, `None` if missing.
    pub value: Option<MetricValue>,
    /// Formatted value, `None` if missing.
    pub formatted: Option<String>,
    /// Bucket and color.
    pub bucket: Bucket,
    /// Share of districts with a value at or below this one (0-100).
    pub percentile: Option<u8>,
}

/// Choropleth layer for one metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChoropleth {
    /// The mapped metric.
    pub metric: MetricDescriptor,
    /// One entry per district, in identifier order.
    pub districts: Vec<ApiChoroplethEntry>,
    /// Legend for the layer.
    pub legend: ApiLegend,
}

/// One district of a choropleth layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChoroplethEntry {
    /// District identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Raw value, `None` if missing.
    pub value: Option<MetricValue>,
    /// Formatted value, `None` if missing.
    pub formatted: Option<String>,
    /// Bucket and color.
    pub bucket: Bucket,
}

/// Legend of a metric: breakpoints for numeric metrics, one entry per
/// category for ordinal ones.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "entries", rename_all = "snake_case")]
pub enum ApiLegend {
    /// Five breakpoints (or none when nothing is observed).
    Numeric(Vec<LegendEntry>),
    /// One entry per ordinal category.
    Categorical(Vec<CategoryLegendEntry>),
}

/// Query parameters for the compare endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQueryParams {
    /// First district identifier.
    pub a: Option<u32>,
    /// Second district identifier.
    pub b: Option<u32>,
    /// Comma-separated metric ids. Defaults to every cataloged metric.
    pub metrics: Option<String>,
}

impl CompareQueryParams {
    /// Requested metric ids, or `None` when the caller did not restrict
    /// them.
    #[must_use]
    pub fn metric_ids(&self) -> Option<Vec<&str>> {
        self.metrics.as_deref().map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect()
        })
    }
}

/// Compare endpoint response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComparison {
    /// Structured result.
    pub result: ComparisonResult,
    /// Display-ready breakdown.
    pub verdict: VerdictReport,
}
