#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric descriptor, value, and district record types.
//!
//! This crate defines the vocabulary shared by every other district-map
//! crate: what a metric *is* (its kind, polarity, and category), what a
//! metric value looks like, and the per-district record that carries them.
//! Nothing in here decides how a metric is colored or compared; those rules
//! live in the crates that consume these types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Semantic kind of a metric. Drives formatting and default thresholds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    /// Price per square meter (e.g. median €/m²).
    CurrencyPerArea,
    /// Absolute amount of money (e.g. median sale price).
    Currency,
    /// Share or change expressed in percent.
    Percentage,
    /// Plain count (stations, lines, residents).
    Count,
    /// Count normalized per 10,000 residents.
    RatePerCapita,
    /// Pollutant concentration in µg/m³.
    Concentration,
    /// Label drawn from a fixed, ordered set of categories.
    OrdinalCategory,
}

impl MetricKind {
    /// Domain-calibrated cutoffs for kinds that have them.
    ///
    /// The four values split the number line into five buckets:
    /// `< c0`, `< c1`, `< c2`, `< c3`, and `>= c3`.
    #[must_use]
    pub const fn default_thresholds(self) -> Option<[f64; 4]> {
        match self {
            Self::CurrencyPerArea => Some([9_000.0, 11_000.0, 13_000.0, 14_500.0]),
            Self::Currency
            | Self::Percentage
            | Self::Count
            | Self::RatePerCapita
            | Self::Concentration
            | Self::OrdinalCategory => None,
        }
    }

    /// Whether values of this kind are numbers rather than category labels.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::OrdinalCategory)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CurrencyPerArea,
            Self::Currency,
            Self::Percentage,
            Self::Count,
            Self::RatePerCapita,
            Self::Concentration,
            Self::OrdinalCategory,
        ]
    }
}

/// Direction in which a metric's value is considered favorable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Polarity {
    /// Smaller values are better (prices, pollution).
    LowerIsBetter,
    /// Larger values are better (transit coverage). For ordinal metrics,
    /// a later position in the declared order is better.
    HigherIsBetter,
    /// No preference; shown for context but never scored.
    Neutral,
}

/// Thematic group a metric is reported under.
///
/// Variant order is the order categories appear in comparison output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricCategory {
    /// Sale prices, volumes, and market trend.
    PriceMarket,
    /// Social housing and housing stock.
    Housing,
    /// Metro and RER coverage.
    Transit,
    /// Pollutant concentrations and overall air quality.
    AirQuality,
    /// Demographics and anything else.
    General,
}

impl MetricCategory {
    /// Human-readable section title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PriceMarket => "Price & market",
            Self::Housing => "Housing",
            Self::Transit => "Transit",
            Self::AirQuality => "Air quality",
            Self::General => "General",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PriceMarket,
            Self::Housing,
            Self::Transit,
            Self::AirQuality,
            Self::General,
        ]
    }
}

/// A single entry of the metric registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    /// Exact metric identifier (e.g. `"price_per_area"`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Semantic kind.
    pub kind: MetricKind,
    /// Preference direction.
    pub polarity: Polarity,
    /// Reporting category.
    pub category: MetricCategory,
    /// Why the favorable direction is favorable, e.g.
    /// "lower price is more affordable".
    pub rationale: String,
    /// Dataset column this metric is read from, when it differs from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Per-metric cutoffs, overriding the kind's defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<[f64; 4]>,
    /// Ordinal categories, worst first. Empty for numeric metrics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Raw dataset labels mapped onto entries of `categories`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    /// Raw dataset labels that mean "no data".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_markers: Vec<String>,
}

impl MetricDescriptor {
    /// Name of the dataset column holding this metric.
    #[must_use]
    pub fn source_column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.id)
    }

    /// Fixed cutoffs for this metric, if any: its own, or its kind's.
    #[must_use]
    pub fn fixed_thresholds(&self) -> Option<[f64; 4]> {
        self.thresholds.or_else(|| self.kind.default_thresholds())
    }

    /// Whether this metric takes part in comparison scoring.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.polarity != Polarity::Neutral
    }

    /// Position of `label` in the declared ordinal order (0 = worst).
    #[must_use]
    pub fn category_rank(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == label)
    }

    /// Maps a raw dataset label onto a declared category.
    ///
    /// Returns `Ok(None)` for a missing marker, `Ok(Some(_))` for a known
    /// category or alias, and `Err(label)` for anything else.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized label if it is neither a category, an
    /// alias, nor a missing marker.
    pub fn resolve_label<'a>(&'a self, label: &'a str) -> Result<Option<&'a str>, &'a str> {
        let label = label.trim();
        if self.missing_markers.iter().any(|m| m == label) {
            return Ok(None);
        }
        if let Some(category) = self.categories.iter().find(|c| *c == label) {
            return Ok(Some(category.as_str()));
        }
        self.aliases
            .get(label)
            .map(|alias| Some(alias.as_str()))
            .ok_or(label)
    }
}

/// A present metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric reading.
    Number(f64),
    /// Ordinal category label.
    Category(String),
}

impl MetricValue {
    /// Returns the number, if this is a numeric value.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Category(_) => None,
        }
    }

    /// Returns the label, if this is a category value.
    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Category(c) => Some(c),
        }
    }

    /// `NaN` carries no information and is treated like a missing value.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Category(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Category(value)
    }
}

/// One district and its metric readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Stable district identifier (1-20 for Paris arrondissements).
    pub id: u32,
    /// Display name, if the dataset carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Metric id to nullable value.
    pub metrics: BTreeMap<String, Option<MetricValue>>,
}

impl EntityRecord {
    /// Creates an empty record.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            metrics: BTreeMap::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a present value for `metric`.
    #[must_use]
    pub fn with_value(mut self, metric: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(metric.into(), Some(value.into()));
        self
    }

    /// Records `metric` as present in the dataset but null.
    #[must_use]
    pub fn with_missing(mut self, metric: impl Into<String>) -> Self {
        self.metrics.insert(metric.into(), None);
        self
    }

    /// Returns the value of `metric`, or `None` if it is absent, null, or
    /// `NaN`.
    #[must_use]
    pub fn value(&self, metric: &str) -> Option<&MetricValue> {
        self.metrics
            .get(metric)
            .and_then(Option::as_ref)
            .filter(|v| !v.is_missing())
    }

    /// Returns the numeric value of `metric`, if present and numeric.
    #[must_use]
    pub fn number(&self, metric: &str) -> Option<f64> {
        self.value(metric).and_then(MetricValue::as_number)
    }

    /// Name to show for this district.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("District {}", self.id))
    }
}

/// Magnitude level of a classified value, from 1 (lowest) to 5 (highest).
///
/// Levels describe where a value sits on its scale, not whether it is good;
/// a metric's [`Polarity`] decides which end is colored favorably.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketLevel {
    /// Level 1: lowest fifth of the scale
    VeryLow = 1,
    /// Level 2
    Low = 2,
    /// Level 3: middle of the scale
    Medium = 3,
    /// Level 4
    High = 4,
    /// Level 5: top of the scale
    VeryHigh = 5,
}

impl BucketLevel {
    /// Returns the numeric value of this level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Zero-based position of this level (0-4).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Creates a level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidBucketLevelError> {
        match value {
            1 => Ok(Self::VeryLow),
            2 => Ok(Self::Low),
            3 => Ok(Self::Medium),
            4 => Ok(Self::High),
            5 => Ok(Self::VeryHigh),
            _ => Err(InvalidBucketLevelError { value }),
        }
    }

    /// Creates a level from a zero-based position, clamping past the top.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::VeryLow,
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VeryLow,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::VeryHigh,
        ]
    }
}

/// Error returned when attempting to create a [`BucketLevel`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBucketLevelError {
    /// The invalid level value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidBucketLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid bucket level {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidBucketLevelError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend() -> MetricDescriptor {
        MetricDescriptor {
            id: "market_trend".to_string(),
            label: "Market trend".to_string(),
            kind: MetricKind::OrdinalCategory,
            polarity: Polarity::HigherIsBetter,
            category: MetricCategory::PriceMarket,
            rationale: "a rising market protects property value".to_string(),
            column: Some("tendance_prix_m2".to_string()),
            thresholds: None,
            categories: vec!["decline".to_string(), "stable".to_string(), "rise".to_string()],
            aliases: BTreeMap::from([("Hausse".to_string(), "rise".to_string())]),
            missing_markers: vec!["Données insuffisantes".to_string()],
        }
    }

    #[test]
    fn bucket_level_from_value_roundtrip() {
        for v in 1..=5u8 {
            let level = BucketLevel::from_value(v).unwrap();
            assert_eq!(level.value(), v);
            assert_eq!(BucketLevel::from_index(level.index()), level);
        }
        assert!(BucketLevel::from_value(0).is_err());
        assert!(BucketLevel::from_value(6).is_err());
    }

    #[test]
    fn only_currency_per_area_has_default_thresholds() {
        for kind in MetricKind::all() {
            assert_eq!(
                kind.default_thresholds().is_some(),
                *kind == MetricKind::CurrencyPerArea,
                "{kind:?}"
            );
        }
    }

    #[test]
    fn resolves_labels_aliases_and_markers() {
        let d = trend();
        assert_eq!(d.resolve_label("stable"), Ok(Some("stable")));
        assert_eq!(d.resolve_label(" Hausse "), Ok(Some("rise")));
        assert_eq!(d.resolve_label("Données insuffisantes"), Ok(None));
        assert_eq!(d.resolve_label("booming"), Err("booming"));
        assert_eq!(d.category_rank("rise"), Some(2));
        assert_eq!(d.source_column(), "tendance_prix_m2");
    }

    #[test]
    fn record_value_treats_null_and_nan_as_missing() {
        let record = EntityRecord::new(3)
            .with_value("price_per_area", 9_500.0)
            .with_value("no2_mean", f64::NAN)
            .with_missing("metro_lines");

        assert_eq!(record.number("price_per_area"), Some(9_500.0));
        assert!(record.value("no2_mean").is_none());
        assert!(record.value("metro_lines").is_none());
        assert!(record.value("unknown").is_none());
        assert_eq!(record.display_name(), "District 3");
    }

    #[test]
    fn metric_value_serializes_untagged() {
        let json = serde_json::to_string(&MetricValue::from(12.5)).unwrap();
        assert_eq!(json, "12.5");
        let json = serde_json::to_string(&MetricValue::from("stable")).unwrap();
        assert_eq!(json, "\"stable\"");
    }
}
