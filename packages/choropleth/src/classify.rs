//! Maps metric values to buckets.

use district_map_metrics::summary::present_values;
use district_map_metrics::{MetricError, MetricRegistry};
use district_map_metrics_models::{BucketLevel, MetricDescriptor, MetricValue};

use crate::bucket::Bucket;

/// How values of one metric are split into levels.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scale {
    /// Four non-decreasing cutoffs; `v < c0` is the lowest level and
    /// `v >= c3` the highest.
    Cutoffs([f64; 4]),
    /// The observed range is a single value (or nothing was observed):
    /// every value sits in the middle level.
    Uniform,
    /// Ordinal metric with this many declared categories.
    Ordinal(usize),
}

/// Classifier for a single metric, built once per render and applied to
/// every district's value.
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    descriptor: &'a MetricDescriptor,
    scale: Scale,
}

impl<'a> Classifier<'a> {
    /// Builds a classifier for `metric_id`.
    ///
    /// `observed` is the full set of values for this metric across the
    /// dataset. It is only consulted when the metric has no fixed
    /// thresholds, to derive equal-interval cutoffs.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::UnknownMetric`] if the metric is not in the
    /// registry.
    pub fn new(
        registry: &'a MetricRegistry,
        metric_id: &str,
        observed: &[Option<f64>],
    ) -> Result<Self, MetricError> {
        let descriptor = registry.describe(metric_id)?;
        Ok(Self::for_descriptor(descriptor, observed))
    }

    /// Builds a classifier for an already-resolved descriptor.
    #[must_use]
    pub fn for_descriptor(descriptor: &'a MetricDescriptor, observed: &[Option<f64>]) -> Self {
        let scale = if !descriptor.kind.is_numeric() {
            Scale::Ordinal(descriptor.categories.len())
        } else if let Some(cutoffs) = descriptor.fixed_thresholds() {
            Scale::Cutoffs(cutoffs)
        } else {
            observed_range(observed).map_or(Scale::Uniform, |(min, max)| {
                if max > min {
                    Scale::Cutoffs(equal_interval_cutoffs(min, max))
                } else {
                    Scale::Uniform
                }
            })
        };

        Self { descriptor, scale }
    }

    /// The metric this classifier applies to.
    #[must_use]
    pub const fn descriptor(&self) -> &'a MetricDescriptor {
        self.descriptor
    }

    /// Classifies a nullable value.
    ///
    /// Missing values, and values of the wrong shape for the metric, land in
    /// the no-data bucket. The latter are logged, since they point at a
    /// dataset or catalog mismatch.
    #[must_use]
    pub fn classify(&self, value: Option<&MetricValue>) -> Bucket {
        let polarity = self.descriptor.polarity;
        let Some(value) = value.filter(|v| !v.is_missing()) else {
            return Bucket::no_data(polarity);
        };

        match (self.scale, value) {
            (Scale::Ordinal(_), MetricValue::Number(n)) => {
                log::warn!(
                    "Numeric value {n} for ordinal metric '{}'",
                    self.descriptor.id
                );
                Bucket::no_data(polarity)
            }
            (_, MetricValue::Number(n)) => self.classify_number(*n),
            (_, MetricValue::Category(label)) => self.classify_category(label),
        }
    }

    /// Classifies a numeric value. `NaN` lands in the no-data bucket.
    #[must_use]
    pub fn classify_number(&self, value: f64) -> Bucket {
        let polarity = self.descriptor.polarity;
        if value.is_nan() {
            return Bucket::no_data(polarity);
        }

        match self.scale {
            Scale::Cutoffs(cutoffs) => Bucket::new(cutoff_level(value, &cutoffs), polarity),
            Scale::Uniform => Bucket::new(BucketLevel::Medium, polarity),
            Scale::Ordinal(_) => Bucket::no_data(polarity),
        }
    }

    /// Classifies a raw category label, resolving aliases and missing
    /// markers first.
    #[must_use]
    pub fn classify_category(&self, label: &str) -> Bucket {
        let polarity = self.descriptor.polarity;
        let Scale::Ordinal(count) = self.scale else {
            log::warn!(
                "Category value '{label}' for numeric metric '{}'",
                self.descriptor.id
            );
            return Bucket::no_data(polarity);
        };

        match self.descriptor.resolve_label(label) {
            Ok(Some(category)) => self.descriptor.category_rank(category).map_or_else(
                || Bucket::no_data(polarity),
                |rank| Bucket::new(ordinal_level(rank, count), polarity),
            ),
            Ok(None) => Bucket::no_data(polarity),
            Err(unknown) => {
                log::warn!(
                    "Unknown category value '{unknown}' for metric '{}'",
                    self.descriptor.id
                );
                Bucket::no_data(polarity)
            }
        }
    }
}

/// Classifies one value of `metric_id` against the observed value set.
///
/// Convenience wrapper around [`Classifier`] for one-off lookups.
///
/// # Errors
///
/// Returns [`MetricError::UnknownMetric`] if the metric is not in the
/// registry.
pub fn classify(
    registry: &MetricRegistry,
    metric_id: &str,
    value: Option<&MetricValue>,
    observed: &[Option<f64>],
) -> Result<Bucket, MetricError> {
    Ok(Classifier::new(registry, metric_id, observed)?.classify(value))
}

/// Smallest and largest present value.
#[must_use]
pub fn observed_range(observed: &[Option<f64>]) -> Option<(f64, f64)> {
    present_values(observed).fold(None, |range, v| match range {
        None => Some((v, v)),
        Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
    })
}

/// The `k`-th of five evenly spaced breakpoints over `[min, max]`, with
/// `k = 0` at `min` and `k = 4` at `max`. Stays finite for any finite
/// `min` and `max`.
#[must_use]
pub fn equal_interval_breakpoint(min: f64, max: f64, k: usize) -> f64 {
    match k {
        0 => min,
        k if k >= 4 => max,
        k => {
            #[allow(clippy::cast_precision_loss)]
            let t = k as f64 / 4.0;
            min.mul_add(1.0 - t, max * t)
        }
    }
}

/// Inner breakpoints of an equal-interval scale over `[min, max]`.
#[must_use]
pub fn equal_interval_cutoffs(min: f64, max: f64) -> [f64; 4] {
    [1, 2, 3, 4].map(|k| equal_interval_breakpoint(min, max, k))
}

fn cutoff_level(value: f64, cutoffs: &[f64; 4]) -> BucketLevel {
    BucketLevel::from_index(cutoffs.iter().filter(|&&c| value >= c).count())
}

/// Spreads `count` ordinal ranks over the five levels, worst rank lowest.
fn ordinal_level(rank: usize, count: usize) -> BucketLevel {
    if count <= 1 {
        return BucketLevel::Medium;
    }
    let span = count - 1;
    BucketLevel::from_index((rank * 4 + span / 2) / span)
}
