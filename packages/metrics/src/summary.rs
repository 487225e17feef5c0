//! Descriptive statistics over the observed values of one metric.

use serde::Serialize;

/// Summary of a metric across all districts that report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    /// Number of non-missing values.
    pub count: usize,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (mean of the two middle values for an even count).
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// Keeps the values that carry information: present and not `NaN`.
pub fn present_values(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(|v| v.filter(|n| !n.is_nan()))
}

/// Summarizes `values`, ignoring missing and `NaN` entries.
///
/// Returns `None` when nothing is left to summarize.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(values: &[Option<f64>]) -> Option<MetricSummary> {
    let mut sorted: Vec<f64> = present_values(values).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        f64::midpoint(sorted[count / 2 - 1], sorted[count / 2])
    } else {
        sorted[count / 2]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Some(MetricSummary {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}

/// Share of observed values less than or equal to `value`, as 0-100.
///
/// Returns `None` if `value` is `NaN` or there are no observed values.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_rank(value: f64, values: &[Option<f64>]) -> Option<u8> {
    if value.is_nan() {
        return None;
    }
    let (total, at_or_below) = present_values(values).fold((0usize, 0usize), |(t, b), v| {
        (t + 1, if v <= value { b + 1 } else { b })
    });
    if total == 0 {
        return None;
    }
    Some((at_or_below as f64 / total as f64 * 100.0).floor() as u8)
}
