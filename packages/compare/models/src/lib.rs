#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Comparison result and verdict types.
//!
//! A [`ComparisonResult`] is the structured outcome of comparing two
//! districts metric by metric. A [`VerdictReport`] is the same outcome
//! shaped for display: formatted values, winner names, and a summary line.
//! Both are created fresh per comparison and never persisted.

use std::cmp::Ordering;

use district_map_metrics_models::{MetricCategory, MetricKind, MetricValue, Polarity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which side of a comparison came out ahead.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    /// The first district.
    A,
    /// The second district.
    B,
    /// Neither.
    Tie,
}

impl Winner {
    /// Converts a preference ordering of A relative to B into a winner.
    ///
    /// `Greater` means A is preferred.
    #[must_use]
    pub const fn from_preference(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Self::A,
            Ordering::Less => Self::B,
            Ordering::Equal => Self::Tie,
        }
    }

    /// Winner of a contest decided by strictly higher score.
    #[must_use]
    pub const fn from_scores(score_a: u32, score_b: u32) -> Self {
        if score_a > score_b {
            Self::A
        } else if score_b > score_a {
            Self::B
        } else {
            Self::Tie
        }
    }

    /// The same outcome with the sides swapped.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::Tie => Self::Tie,
        }
    }
}

/// Outcome for one metric present in both districts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    /// Metric identifier.
    pub metric: String,
    /// Human-readable metric label.
    pub label: String,
    /// Metric kind, kept for formatting.
    pub kind: MetricKind,
    /// Metric polarity.
    pub polarity: Polarity,
    /// District A's value. Ordinal values hold the resolved category id.
    pub value_a: MetricValue,
    /// District B's value.
    pub value_b: MetricValue,
    /// Which district is better on this metric.
    pub winner: Winner,
    /// Whether this metric counts toward the scores. Neutral metrics don't.
    pub scored: bool,
    /// Why the favorable direction is favorable.
    pub rationale: String,
}

/// All compared metrics of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// The category.
    pub category: MetricCategory,
    /// Compared metrics, in requested order.
    pub metrics: Vec<MetricComparison>,
    /// Metrics won by district A in this category.
    pub score_a: u32,
    /// Metrics won by district B in this category.
    pub score_b: u32,
}

/// A metric that could not be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricFailure {
    /// Metric identifier.
    pub metric: String,
    /// Machine-readable error code (e.g. `UNKNOWN_CATEGORY_VALUE`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Structured result of comparing two districts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Identifier of district A.
    pub entity_a: u32,
    /// Identifier of district B.
    pub entity_b: u32,
    /// Non-empty categories, in category order.
    pub categories: Vec<CategoryBreakdown>,
    /// Total metrics won by A.
    pub score_a: u32,
    /// Total metrics won by B.
    pub score_b: u32,
    /// Overall winner: strictly higher score, otherwise a tie.
    pub verdict: Winner,
    /// Metrics skipped because their values could not be interpreted.
    #[serde(default)]
    pub failures: Vec<MetricFailure>,
}

impl ComparisonResult {
    /// Iterates over every compared metric across categories.
    pub fn metrics(&self) -> impl Iterator<Item = &MetricComparison> {
        self.categories.iter().flat_map(|c| c.metrics.iter())
    }

    /// Number of compared metrics.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.categories.iter().map(|c| c.metrics.len()).sum()
    }

    /// Finds the comparison for `metric`, if it was compared.
    #[must_use]
    pub fn find(&self, metric: &str) -> Option<&MetricComparison> {
        self.metrics().find(|m| m.metric == metric)
    }

    /// Finds the failure recorded for `metric`, if any.
    #[must_use]
    pub fn failure(&self, metric: &str) -> Option<&MetricFailure> {
        self.failures.iter().find(|f| f.metric == metric)
    }
}

/// One displayed row of a verdict section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRow {
    /// Metric identifier.
    pub metric: String,
    /// Metric label.
    pub label: String,
    /// District A's formatted value.
    pub value_a: String,
    /// District B's formatted value.
    pub value_b: String,
    /// Winner of this row.
    pub winner: Winner,
    /// Name of the winning district; `None` on a tie.
    pub winner_label: Option<String>,
    /// Whether the row counts toward the scores.
    pub scored: bool,
    /// Why the favorable direction is favorable.
    pub rationale: String,
}

/// One category section of a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictSection {
    /// The category.
    pub category: MetricCategory,
    /// Section title.
    pub title: String,
    /// Rows in requested order.
    pub rows: Vec<VerdictRow>,
    /// A's subtotal.
    pub score_a: u32,
    /// B's subtotal.
    pub score_b: u32,
    /// Winner of this category.
    pub winner: Winner,
}

/// Overall line of a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallVerdict {
    /// A's total.
    pub score_a: u32,
    /// B's total.
    pub score_b: u32,
    /// Overall winner.
    pub winner: Winner,
    /// Name of the winning district; `None` on a tie.
    pub winner_label: Option<String>,
    /// One-sentence summary, e.g. "11e comes out ahead of 7e, 5 to 3."
    pub summary: String,
}

/// Presentable breakdown of a [`ComparisonResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictReport {
    /// Name of district A.
    pub label_a: String,
    /// Name of district B.
    pub label_b: String,
    /// One section per compared category.
    pub sections: Vec<VerdictSection>,
    /// Overall outcome.
    pub overall: OverallVerdict,
    /// Notes about metrics that could not be compared.
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_mirrors() {
        assert_eq!(Winner::A.mirrored(), Winner::B);
        assert_eq!(Winner::B.mirrored(), Winner::A);
        assert_eq!(Winner::Tie.mirrored(), Winner::Tie);
    }

    #[test]
    fn winner_from_scores_requires_strict_lead() {
        assert_eq!(Winner::from_scores(2, 1), Winner::A);
        assert_eq!(Winner::from_scores(1, 2), Winner::B);
        assert_eq!(Winner::from_scores(1, 1), Winner::Tie);
        assert_eq!(Winner::from_scores(0, 0), Winner::Tie);
    }

    #[test]
    fn winner_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Winner::A).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&Winner::Tie).unwrap(), "\"tie\"");
        assert_eq!("b".parse::<Winner>().unwrap(), Winner::B);
    }
}
