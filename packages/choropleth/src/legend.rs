//! Legend entries for the choropleth map.

use district_map_metrics::format::{format_number, humanize};
use district_map_metrics::{MetricError, MetricRegistry};
use district_map_metrics_models::{BucketLevel, MetricDescriptor};
use serde::Serialize;

use crate::bucket::color_for;
use crate::classify::{Classifier, equal_interval_breakpoint, observed_range};

/// One breakpoint of a numeric legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Breakpoint value.
    pub threshold: f64,
    /// Level whose color is shown next to the breakpoint.
    pub level: BucketLevel,
    /// Hex display color.
    pub color: &'static str,
    /// Breakpoint formatted for display.
    pub label: String,
}

/// One category of an ordinal legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLegendEntry {
    /// Category id as declared in the catalog.
    pub category: String,
    /// Category formatted for display.
    pub label: String,
    /// Level the category maps to.
    pub level: BucketLevel,
    /// Hex display color.
    pub color: &'static str,
}

/// Builds the five-entry legend for a numeric metric.
///
/// Breakpoints are spaced evenly from the smallest to the largest observed
/// value. Missing and `NaN` values are ignored; when nothing is left the
/// legend is empty. When every value is the same, all five entries carry
/// that value and the middle color.
///
/// # Errors
///
/// * [`MetricError::UnknownMetric`] if the metric is not in the registry
/// * [`MetricError::NotNumeric`] if the metric is ordinal
pub fn build(
    registry: &MetricRegistry,
    metric_id: &str,
    values: &[Option<f64>],
) -> Result<Vec<LegendEntry>, MetricError> {
    let descriptor = registry.describe(metric_id)?;
    if !descriptor.kind.is_numeric() {
        return Err(MetricError::NotNumeric {
            metric: descriptor.id.clone(),
        });
    }

    let Some((min, max)) = observed_range(values) else {
        log::debug!("No values to build a legend for '{metric_id}'");
        return Ok(Vec::new());
    };

    if max <= min {
        let color = color_for(BucketLevel::Medium, descriptor.polarity);
        return Ok(BucketLevel::all()
            .iter()
            .map(|_| entry(descriptor, min, BucketLevel::Medium, color))
            .collect());
    }

    Ok(BucketLevel::all()
        .iter()
        .enumerate()
        .map(|(k, level)| {
            entry(
                descriptor,
                equal_interval_breakpoint(min, max, k),
                *level,
                color_for(*level, descriptor.polarity),
            )
        })
        .collect())
}

fn entry(
    descriptor: &MetricDescriptor,
    threshold: f64,
    level: BucketLevel,
    color: &'static str,
) -> LegendEntry {
    LegendEntry {
        threshold,
        level,
        color,
        label: format_number(threshold, descriptor.kind),
    }
}

/// Builds the legend for an ordinal metric: one entry per declared
/// category, worst first.
///
/// # Errors
///
/// * [`MetricError::UnknownMetric`] if the metric is not in the registry
/// * [`MetricError::ValueTypeMismatch`] expecting a category if the metric
///   is numeric
pub fn build_categorical(
    registry: &MetricRegistry,
    metric_id: &str,
) -> Result<Vec<CategoryLegendEntry>, MetricError> {
    let descriptor = registry.describe(metric_id)?;
    if descriptor.kind.is_numeric() {
        return Err(MetricError::ValueTypeMismatch {
            metric: descriptor.id.clone(),
            expected: "category",
        });
    }

    let classifier = Classifier::for_descriptor(descriptor, &[]);
    Ok(descriptor
        .categories
        .iter()
        .filter_map(|category| {
            let bucket = classifier.classify_category(category);
            bucket.level.map(|level| CategoryLegendEntry {
                category: category.clone(),
                label: humanize(category),
                level,
                color: bucket.color,
            })
        })
        .collect())
}
