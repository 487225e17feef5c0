//! Metric-by-metric comparison of two districts.
//!
//! Every metric goes through the same loop: resolve the descriptor, skip
//! if either side has no value, order the two values by magnitude (numbers
//! directly, ordinal labels by rank) and let the polarity decide which
//! direction is preferred.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use district_map_compare_models::{
    CategoryBreakdown, ComparisonResult, MetricComparison, MetricFailure, Winner,
};
use district_map_metrics::{MetricError, MetricRegistry};
use district_map_metrics_models::{
    EntityRecord, MetricCategory, MetricDescriptor, MetricValue, Polarity,
};

/// Compares districts `a` and `b` on every metric in `metric_set`.
///
/// Metrics missing on either side are left out entirely. Metrics whose
/// values cannot be interpreted (an unknown ordinal label, a label where a
/// number is expected) are recorded in [`ComparisonResult::failures`] and
/// the remaining metrics are still compared. Duplicate ids are compared
/// once.
///
/// # Errors
///
/// Returns [`MetricError::UnknownMetric`] if any id in `metric_set` is not
/// in the registry. Nothing is compared in that case.
pub fn compare<S: AsRef<str>>(
    registry: &MetricRegistry,
    a: &EntityRecord,
    b: &EntityRecord,
    metric_set: &[S],
) -> Result<ComparisonResult, MetricError> {
    let mut seen = BTreeSet::new();
    let descriptors = metric_set
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| seen.insert(*id))
        .map(|id| registry.describe(id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_category: BTreeMap<MetricCategory, CategoryBreakdown> = BTreeMap::new();
    let mut failures = Vec::new();

    for descriptor in descriptors {
        let (Some(value_a), Some(value_b)) = (a.value(&descriptor.id), b.value(&descriptor.id))
        else {
            log::debug!(
                "Skipping '{}': missing for district {} or {}",
                descriptor.id,
                a.id,
                b.id
            );
            continue;
        };

        match compare_metric(descriptor, value_a, value_b) {
            Ok(Some(comparison)) => {
                let breakdown = by_category
                    .entry(descriptor.category)
                    .or_insert_with(|| CategoryBreakdown {
                        category: descriptor.category,
                        metrics: Vec::new(),
                        score_a: 0,
                        score_b: 0,
                    });
                if comparison.scored {
                    match comparison.winner {
                        Winner::A => breakdown.score_a += 1,
                        Winner::B => breakdown.score_b += 1,
                        Winner::Tie => {}
                    }
                }
                breakdown.metrics.push(comparison);
            }
            Ok(None) => {
                log::debug!("Skipping '{}': no usable value", descriptor.id);
            }
            Err(e) => {
                log::warn!(
                    "Could not compare '{}' between districts {} and {}: {e}",
                    descriptor.id,
                    a.id,
                    b.id
                );
                failures.push(MetricFailure {
                    metric: descriptor.id.clone(),
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let categories: Vec<CategoryBreakdown> = by_category.into_values().collect();
    let score_a = categories.iter().map(|c| c.score_a).sum();
    let score_b = categories.iter().map(|c| c.score_b).sum();

    Ok(ComparisonResult {
        entity_a: a.id,
        entity_b: b.id,
        categories,
        score_a,
        score_b,
        verdict: Winner::from_scores(score_a, score_b),
        failures,
    })
}

/// Compares one metric. `Ok(None)` means a value turned out to be a
/// missing marker.
fn compare_metric(
    descriptor: &MetricDescriptor,
    a: &MetricValue,
    b: &MetricValue,
) -> Result<Option<MetricComparison>, MetricError> {
    let (value_a, value_b, magnitude) = if descriptor.kind.is_numeric() {
        let x = expect_number(descriptor, a)?;
        let y = expect_number(descriptor, b)?;
        (
            MetricValue::Number(x),
            MetricValue::Number(y),
            x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        )
    } else {
        let (Some((cat_a, rank_a)), Some((cat_b, rank_b))) =
            (rank_of(descriptor, a)?, rank_of(descriptor, b)?)
        else {
            return Ok(None);
        };
        (
            MetricValue::from(cat_a),
            MetricValue::from(cat_b),
            rank_a.cmp(&rank_b),
        )
    };

    let preference = match descriptor.polarity {
        Polarity::LowerIsBetter => magnitude.reverse(),
        Polarity::HigherIsBetter => magnitude,
        Polarity::Neutral => Ordering::Equal,
    };

    Ok(Some(MetricComparison {
        metric: descriptor.id.clone(),
        label: descriptor.label.clone(),
        kind: descriptor.kind,
        polarity: descriptor.polarity,
        value_a,
        value_b,
        winner: Winner::from_preference(preference),
        scored: descriptor.is_scored(),
        rationale: descriptor.rationale.clone(),
    }))
}

fn expect_number(descriptor: &MetricDescriptor, value: &MetricValue) -> Result<f64, MetricError> {
    value.as_number().ok_or_else(|| MetricError::ValueTypeMismatch {
        metric: descriptor.id.clone(),
        expected: "numeric",
    })
}

/// Resolves an ordinal value to its category and rank. `Ok(None)` for a
/// missing marker.
fn rank_of<'a>(
    descriptor: &'a MetricDescriptor,
    value: &'a MetricValue,
) -> Result<Option<(&'a str, usize)>, MetricError> {
    let label = value
        .as_category()
        .ok_or_else(|| MetricError::ValueTypeMismatch {
            metric: descriptor.id.clone(),
            expected: "category",
        })?;

    let category = descriptor
        .resolve_label(label)
        .map_err(|unknown| MetricError::UnknownCategoryValue {
            metric: descriptor.id.clone(),
            value: unknown.to_string(),
        })?;

    Ok(category.and_then(|c| descriptor.category_rank(c).map(|rank| (c, rank))))
}

#[cfg(test)]
mod tests {
    use district_map_metrics::global;

    use super::*;

    fn district(id: u32) -> EntityRecord {
        EntityRecord::new(id)
    }

    fn full_set() -> Vec<&'static str> {
        vec![
            "price_per_area",
            "metro_lines",
            "market_trend",
            "social_housing_share",
            "no2_mean",
            "air_quality",
            "population",
        ]
    }

    fn sample_a() -> EntityRecord {
        district(11)
            .with_value("price_per_area", 10_200.0)
            .with_value("metro_lines", 9.0)
            .with_value("market_trend", "Hausse modérée")
            .with_value("social_housing_share", 18.0)
            .with_value("no2_mean", 38.0)
            .with_value("air_quality", "Moyenne")
            .with_value("population", 147_017.0)
    }

    fn sample_b() -> EntityRecord {
        district(7)
            .with_value("price_per_area", 14_900.0)
            .with_value("metro_lines", 5.0)
            .with_value("market_trend", "stable")
            .with_value("social_housing_share", 1.5)
            .with_value("no2_mean", 38.0)
            .with_value("air_quality", "Bonne")
            .with_value("population", 51_367.0)
    }

    #[test]
    fn polarity_decides_direction() {
        let a = district(1)
            .with_value("price_per_area", 9_500.0)
            .with_value("metro_lines", 3.0);
        let b = district(2)
            .with_value("price_per_area", 11_000.0)
            .with_value("metro_lines", 5.0);

        let result = compare(global(), &a, &b, &["price_per_area", "metro_lines"]).unwrap();

        assert_eq!(result.find("price_per_area").unwrap().winner, Winner::A);
        assert_eq!(result.find("metro_lines").unwrap().winner, Winner::B);
        assert_eq!((result.score_a, result.score_b), (1, 1));
        assert_eq!(result.verdict, Winner::Tie);
    }

    #[test]
    fn ordinal_metrics_compare_by_rank() {
        let a = district(1).with_value("market_trend", "stable");
        let b = district(2).with_value("market_trend", "moderate_rise");

        let result = compare(global(), &a, &b, &["market_trend"]).unwrap();
        let trend = result.find("market_trend").unwrap();

        assert_eq!(trend.winner, Winner::B);
        assert_eq!(trend.value_b, MetricValue::from("moderate_rise"));
        assert_eq!(result.verdict, Winner::B);
    }

    #[test]
    fn aliases_resolve_before_ranking() {
        let a = district(1).with_value("market_trend", "Forte hausse");
        let b = district(2).with_value("market_trend", "moderate_rise");

        let result = compare(global(), &a, &b, &["market_trend"]).unwrap();
        let trend = result.find("market_trend").unwrap();

        assert_eq!(trend.winner, Winner::A);
        assert_eq!(trend.value_a, MetricValue::from("strong_rise"));
    }

    #[test]
    fn unknown_category_fails_only_that_metric() {
        let a = district(1)
            .with_value("market_trend", "stable")
            .with_value("price_per_area", 9_500.0);
        let b = district(2)
            .with_value("market_trend", "booming")
            .with_value("price_per_area", 11_000.0);

        let result = compare(global(), &a, &b, &["market_trend", "price_per_area"]).unwrap();

        assert!(result.find("market_trend").is_none());
        let failure = result.failure("market_trend").unwrap();
        assert_eq!(failure.code, "UNKNOWN_CATEGORY_VALUE");
        assert!(failure.message.contains("booming"));

        assert_eq!(result.find("price_per_area").unwrap().winner, Winner::A);
        assert_eq!(result.verdict, Winner::A);
    }

    #[test]
    fn type_mismatch_is_recorded_as_failure() {
        let a = district(1).with_value("metro_lines", "many");
        let b = district(2).with_value("metro_lines", 4.0);

        let result = compare(global(), &a, &b, &["metro_lines"]).unwrap();
        assert_eq!(result.metric_count(), 0);
        assert_eq!(result.failure("metro_lines").unwrap().code, "VALUE_TYPE_MISMATCH");
    }

    #[test]
    fn missing_values_are_excluded() {
        let a = district(1).with_missing("price_per_area");
        let b = district(2).with_value("price_per_area", 9_000.0);

        let result = compare(global(), &a, &b, &["price_per_area"]).unwrap();

        assert!(result.categories.is_empty());
        assert_eq!((result.score_a, result.score_b), (0, 0));
        assert_eq!(result.verdict, Winner::Tie);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn missing_markers_are_excluded() {
        let a = district(1).with_value("market_trend", "Données insuffisantes");
        let b = district(2).with_value("market_trend", "stable");

        let result = compare(global(), &a, &b, &["market_trend"]).unwrap();
        assert_eq!(result.metric_count(), 0);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn self_comparison_ties_everywhere() {
        let a = sample_a();
        let result = compare(global(), &a, &a, &full_set()).unwrap();

        assert_eq!(result.metric_count(), full_set().len());
        assert!(result.metrics().all(|m| m.winner == Winner::Tie));
        assert_eq!((result.score_a, result.score_b), (0, 0));
        assert_eq!(result.verdict, Winner::Tie);
    }

    #[test]
    fn swapping_sides_mirrors_the_result() {
        let (a, b) = (sample_a(), sample_b());
        let forward = compare(global(), &a, &b, &full_set()).unwrap();
        let backward = compare(global(), &b, &a, &full_set()).unwrap();

        assert_eq!(forward.metric_count(), backward.metric_count());
        for m in forward.metrics() {
            let mirrored = backward.find(&m.metric).unwrap();
            assert_eq!(m.winner.mirrored(), mirrored.winner, "{}", m.metric);
        }
        assert_eq!(forward.score_a, backward.score_b);
        assert_eq!(forward.score_b, backward.score_a);
        assert_eq!(forward.verdict.mirrored(), backward.verdict);
    }

    #[test]
    fn neutral_metrics_are_shown_but_not_scored() {
        let result = compare(global(), &sample_a(), &sample_b(), &["population"]).unwrap();
        let population = result.find("population").unwrap();

        assert!(!population.scored);
        assert_eq!(population.winner, Winner::Tie);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.verdict, Winner::Tie);
    }

    #[test]
    fn categories_follow_category_order_with_subtotals() {
        let result = compare(global(), &sample_a(), &sample_b(), &full_set()).unwrap();

        let order: Vec<MetricCategory> = result.categories.iter().map(|c| c.category).collect();
        assert_eq!(
            order,
            vec![
                MetricCategory::PriceMarket,
                MetricCategory::Housing,
                MetricCategory::Transit,
                MetricCategory::AirQuality,
                MetricCategory::General,
            ]
        );

        // A: cheaper, more lines, rising trend, more social housing.
        // B: better air quality. NO2 ties, population is neutral.
        let price = &result.categories[0];
        assert_eq!((price.score_a, price.score_b), (2, 0));
        let air = &result.categories[3];
        assert_eq!((air.score_a, air.score_b), (0, 1));
        assert_eq!((result.score_a, result.score_b), (4, 1));
        assert_eq!(result.verdict, Winner::A);
        assert_eq!(
            result.score_a,
            result.categories.iter().map(|c| c.score_a).sum::<u32>()
        );
    }

    #[test]
    fn empty_metric_set_is_a_tie() {
        let result = compare::<&str>(global(), &sample_a(), &sample_b(), &[]).unwrap();
        assert!(result.categories.is_empty());
        assert_eq!(result.verdict, Winner::Tie);
    }

    #[test]
    fn duplicate_metrics_are_compared_once() {
        let result = compare(
            global(),
            &sample_a(),
            &sample_b(),
            &["price_per_area", "price_per_area"],
        )
        .unwrap();
        assert_eq!(result.metric_count(), 1);
        assert_eq!(result.score_a, 1);
    }

    #[test]
    fn unknown_metric_aborts() {
        let err = compare(global(), &sample_a(), &sample_b(), &["price_per_area", "prix"])
            .unwrap_err();
        assert_eq!(err, MetricError::unknown_metric("prix"));
    }
}
