#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric registry, catalog, formatting, and summary statistics.
//!
//! The registry is the single source of truth for what each metric means.
//! It is built from TOML catalog files embedded at compile time, validated
//! once, and shared read-only for the life of the process. Everything that
//! formats, colors, or compares a metric looks the metric up here by its
//! exact identifier.

pub mod format;
pub mod registry;
pub mod summary;

pub use registry::{MetricRegistry, global};

use thiserror::Error;

/// Errors raised while resolving or interpreting metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    /// The metric identifier has no registry entry.
    #[error("Unknown metric '{metric}'")]
    UnknownMetric {
        /// The unresolved identifier.
        metric: String,
    },

    /// An ordinal value is not part of its metric's declared order.
    #[error("Unknown category value '{value}' for metric '{metric}'")]
    UnknownCategoryValue {
        /// Metric identifier.
        metric: String,
        /// The unrecognized label.
        value: String,
    },

    /// A value has the wrong shape for its metric (label vs number).
    #[error("Metric '{metric}' expects a {expected} value")]
    ValueTypeMismatch {
        /// Metric identifier.
        metric: String,
        /// `"numeric"` or `"category"`.
        expected: &'static str,
    },

    /// A numeric operation was requested on an ordinal metric.
    #[error("Metric '{metric}' is not numeric")]
    NotNumeric {
        /// Metric identifier.
        metric: String,
    },

    /// The embedded catalog failed to parse or validate.
    #[error("Invalid metric catalog: {message}")]
    InvalidCatalog {
        /// Description of what went wrong.
        message: String,
    },
}

impl MetricError {
    /// Shorthand for [`MetricError::UnknownMetric`].
    #[must_use]
    pub fn unknown_metric(metric: impl Into<String>) -> Self {
        Self::UnknownMetric {
            metric: metric.into(),
        }
    }

    /// Short machine-readable code for API error payloads.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownMetric { .. } => "UNKNOWN_METRIC",
            Self::UnknownCategoryValue { .. } => "UNKNOWN_CATEGORY_VALUE",
            Self::ValueTypeMismatch { .. } => "VALUE_TYPE_MISMATCH",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::InvalidCatalog { .. } => "INVALID_CATALOG",
        }
    }
}
