//! Metric registry. Loads every metric descriptor from embedded TOML
//! catalogs.
//!
//! Each `.toml` file in `packages/metrics/catalog/` holds the metrics of one
//! [`MetricCategory`] and is baked into the binary at compile time via
//! [`include_str!`]. Adding a metric means adding an entry to the right
//! file; adding a file means adding it to the list below.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use district_map_metrics_models::{MetricCategory, MetricDescriptor, MetricKind, Polarity};
use serde::Deserialize;

use crate::MetricError;

/// TOML catalogs embedded at compile time.
const CATALOG_TOMLS: &[(&str, &str)] = &[
    ("price_market", include_str!("../catalog/price_market.toml")),
    ("housing", include_str!("../catalog/housing.toml")),
    ("transit", include_str!("../catalog/transit.toml")),
    ("air_quality", include_str!("../catalog/air_quality.toml")),
    ("general", include_str!("../catalog/general.toml")),
];

/// Total number of cataloged metrics (used in tests).
#[cfg(test)]
const EXPECTED_METRIC_COUNT: usize = 22;

static GLOBAL: LazyLock<MetricRegistry> = LazyLock::new(|| {
    let registry = MetricRegistry::from_tomls(CATALOG_TOMLS)
        .unwrap_or_else(|e| panic!("Failed to load embedded metric catalog: {e}"));
    log::debug!("Loaded {} metric descriptors", registry.len());
    registry
});

/// Returns the process-wide registry built from the embedded catalog.
///
/// The catalog is parsed and validated on first access.
///
/// # Panics
///
/// Panics if the embedded catalog is malformed. Since the catalog is a
/// compile-time constant, this indicates a development error and is caught
/// by the tests in this module.
#[must_use]
pub fn global() -> &'static MetricRegistry {
    &GLOBAL
}

/// One catalog file: a category and the metrics filed under it.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    category: MetricCategory,
    metrics: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    label: String,
    kind: MetricKind,
    polarity: Polarity,
    rationale: String,
    #[serde(default)]
    column: Option<String>,
    #[serde(default)]
    thresholds: Option<[f64; 4]>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    missing_markers: Vec<String>,
}

impl CatalogEntry {
    fn into_descriptor(self, category: MetricCategory) -> MetricDescriptor {
        MetricDescriptor {
            id: self.id,
            label: self.label,
            kind: self.kind,
            polarity: self.polarity,
            category,
            rationale: self.rationale,
            column: self.column,
            thresholds: self.thresholds,
            categories: self.categories,
            aliases: self.aliases,
            missing_markers: self.missing_markers,
        }
    }
}

/// Read-only lookup table from metric identifier to descriptor.
///
/// Descriptors keep the order they were declared in, which is the order
/// they are listed by the API and compared by default.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    descriptors: Vec<MetricDescriptor>,
    by_id: BTreeMap<String, usize>,
    by_column: BTreeMap<String, usize>,
}

impl MetricRegistry {
    /// Builds a registry from `(name, toml)` catalog files.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidCatalog`] if a file fails to parse or
    /// the combined catalog fails validation.
    pub fn from_tomls(files: &[(&str, &str)]) -> Result<Self, MetricError> {
        let mut descriptors = Vec::new();

        for (name, toml_str) in files {
            let file: CatalogFile =
                toml::de::from_str(toml_str).map_err(|e| MetricError::InvalidCatalog {
                    message: format!("{name}.toml: {e}"),
                })?;
            let category = file.category;
            descriptors.extend(
                file.metrics
                    .into_iter()
                    .map(|entry| entry.into_descriptor(category)),
            );
        }

        Self::from_descriptors(descriptors)
    }

    /// Builds a registry from already-constructed descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidCatalog`] if any descriptor is invalid
    /// or two descriptors share an id or a source column.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = MetricDescriptor>,
    ) -> Result<Self, MetricError> {
        let descriptors: Vec<MetricDescriptor> = descriptors.into_iter().collect();
        let mut by_id = BTreeMap::new();
        let mut by_column = BTreeMap::new();

        for (idx, descriptor) in descriptors.iter().enumerate() {
            validate(descriptor)?;

            if by_id.insert(descriptor.id.clone(), idx).is_some() {
                return Err(invalid(format!("duplicate metric id '{}'", descriptor.id)));
            }
            if by_column
                .insert(descriptor.source_column().to_string(), idx)
                .is_some()
            {
                return Err(invalid(format!(
                    "metric '{}' reuses column '{}'",
                    descriptor.id,
                    descriptor.source_column()
                )));
            }
        }

        Ok(Self {
            descriptors,
            by_id,
            by_column,
        })
    }

    /// Looks up a metric by its exact identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::UnknownMetric`] if no descriptor has this id.
    pub fn describe(&self, metric_id: &str) -> Result<&MetricDescriptor, MetricError> {
        self.by_id
            .get(metric_id)
            .map(|&idx| &self.descriptors[idx])
            .ok_or_else(|| MetricError::unknown_metric(metric_id))
    }

    /// Looks up the metric read from a dataset column.
    #[must_use]
    pub fn by_column(&self, column: &str) -> Option<&MetricDescriptor> {
        self.by_column.get(column).map(|&idx| &self.descriptors[idx])
    }

    /// All descriptors in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter()
    }

    /// All metric ids in declaration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.id.as_str()).collect()
    }

    /// Number of registered metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry has no metrics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn invalid(message: String) -> MetricError {
    MetricError::InvalidCatalog { message }
}

fn validate(descriptor: &MetricDescriptor) -> Result<(), MetricError> {
    let id = &descriptor.id;

    if id.trim().is_empty() {
        return Err(invalid("metric with empty id".to_string()));
    }
    if descriptor.label.trim().is_empty() {
        return Err(invalid(format!("metric '{id}' has an empty label")));
    }

    if descriptor.kind == MetricKind::OrdinalCategory {
        if descriptor.categories.is_empty() {
            return Err(invalid(format!("ordinal metric '{id}' declares no categories")));
        }
        let unique: BTreeSet<&String> = descriptor.categories.iter().collect();
        if unique.len() != descriptor.categories.len() {
            return Err(invalid(format!("ordinal metric '{id}' repeats a category")));
        }
        // Categories run worst to best, so only "higher is better" can apply.
        if descriptor.polarity == Polarity::LowerIsBetter {
            return Err(invalid(format!(
                "ordinal metric '{id}' cannot be lower_is_better"
            )));
        }
        if let Some((raw, target)) = descriptor
            .aliases
            .iter()
            .find(|(_, target)| !unique.contains(target))
        {
            return Err(invalid(format!(
                "metric '{id}' aliases '{raw}' to undeclared category '{target}'"
            )));
        }
        if descriptor.thresholds.is_some() {
            return Err(invalid(format!(
                "ordinal metric '{id}' cannot declare thresholds"
            )));
        }
    } else {
        if !descriptor.categories.is_empty() || !descriptor.aliases.is_empty() {
            return Err(invalid(format!(
                "numeric metric '{id}' cannot declare categories or aliases"
            )));
        }
        if let Some(thresholds) = descriptor.thresholds {
            let finite = thresholds.iter().all(|t| t.is_finite());
            let ordered = thresholds.windows(2).all(|w| w[0] <= w[1]);
            if !finite || !ordered {
                return Err(invalid(format!(
                    "metric '{id}' thresholds must be finite and non-decreasing"
                )));
            }
        }
    }

    Ok(())
}
