//! Turns a [`ComparisonResult`] into a presentable breakdown.

use district_map_compare_models::{
    ComparisonResult, MetricComparison, OverallVerdict, VerdictReport, VerdictRow,
    VerdictSection, Winner,
};
use district_map_metrics::format::format_value_for_kind;

/// Renders `result` for display, naming district A `label_a` and district
/// B `label_b`.
#[must_use]
pub fn render(result: &ComparisonResult, label_a: &str, label_b: &str) -> VerdictReport {
    let name = |winner: Winner| match winner {
        Winner::A => Some(label_a.to_string()),
        Winner::B => Some(label_b.to_string()),
        Winner::Tie => None,
    };

    let sections = result
        .categories
        .iter()
        .map(|breakdown| VerdictSection {
            category: breakdown.category,
            title: breakdown.category.title().to_string(),
            rows: breakdown
                .metrics
                .iter()
                .map(|m| row(m, name(m.winner)))
                .collect(),
            score_a: breakdown.score_a,
            score_b: breakdown.score_b,
            winner: Winner::from_scores(breakdown.score_a, breakdown.score_b),
        })
        .collect();

    let overall = OverallVerdict {
        score_a: result.score_a,
        score_b: result.score_b,
        winner: result.verdict,
        winner_label: name(result.verdict),
        summary: summary(result, label_a, label_b),
    };

    let notes = result
        .failures
        .iter()
        .map(|f| format!("Not compared: {}", f.message))
        .collect();

    VerdictReport {
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        sections,
        overall,
        notes,
    }
}

fn row(comparison: &MetricComparison, winner_label: Option<String>) -> VerdictRow {
    VerdictRow {
        metric: comparison.metric.clone(),
        label: comparison.label.clone(),
        value_a: format_value_for_kind(&comparison.value_a, comparison.kind),
        value_b: format_value_for_kind(&comparison.value_b, comparison.kind),
        winner: comparison.winner,
        winner_label,
        scored: comparison.scored,
        rationale: comparison.rationale.clone(),
    }
}

fn summary(result: &ComparisonResult, label_a: &str, label_b: &str) -> String {
    let (a, b) = (result.score_a, result.score_b);
    match result.verdict {
        Winner::A => format!("{label_a} comes out ahead of {label_b}, {a} to {b}."),
        Winner::B => format!("{label_b} comes out ahead of {label_a}, {b} to {a}."),
        Winner::Tie if result.metric_count() == 0 => {
            format!("No metric could be compared between {label_a} and {label_b}.")
        }
        Winner::Tie => format!("{label_a} and {label_b} are tied, {a} to {b}."),
    }
}

#[cfg(test)]
mod tests {
    use district_map_metrics::global;
    use district_map_metrics_models::EntityRecord;

    use super::*;
    use crate::compare;

    fn pair() -> (EntityRecord, EntityRecord) {
        let a = EntityRecord::new(11)
            .with_name("11e")
            .with_value("price_per_area", 10_150.0)
            .with_value("metro_lines", 9.0)
            .with_value("market_trend", "Hausse modérée")
            .with_value("population", 147_017.0);
        let b = EntityRecord::new(7)
            .with_name("7e")
            .with_value("price_per_area", 14_860.0)
            .with_value("metro_lines", 5.0)
            .with_value("market_trend", "booming")
            .with_value("population", 51_367.0);
        (a, b)
    }

    #[test]
    fn renders_sections_rows_and_summary() {
        let (a, b) = pair();
        let result = compare(
            global(),
            &a,
            &b,
            &["price_per_area", "metro_lines", "market_trend", "population"],
        )
        .unwrap();

        let report = render(&result, "11e", "7e");

        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Price & market", "Transit", "General"]);

        let price = &report.sections[0].rows[0];
        assert_eq!(price.value_a, "10,150 €/m²");
        assert_eq!(price.value_b, "14,860 €/m²");
        assert_eq!(price.winner_label.as_deref(), Some("11e"));
        assert_eq!(price.rationale, "lower price per m² is more affordable");

        let population = &report.sections[2].rows[0];
        assert!(!population.scored);
        assert_eq!(population.winner_label, None);
        assert_eq!(population.value_a, "147,017");

        assert_eq!(report.overall.winner, Winner::A);
        assert_eq!(report.overall.winner_label.as_deref(), Some("11e"));
        assert_eq!(report.overall.summary, "11e comes out ahead of 7e, 2 to 0.");

        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("booming"));
    }

    #[test]
    fn ordinal_values_are_humanized() {
        let a = EntityRecord::new(1).with_value("market_trend", "Hausse modérée");
        let b = EntityRecord::new(2).with_value("market_trend", "stable");
        let result = compare(global(), &a, &b, &["market_trend"]).unwrap();

        let report = render(&result, "1er", "2e");
        let row = &report.sections[0].rows[0];
        assert_eq!(row.value_a, "Moderate rise");
        assert_eq!(row.value_b, "Stable");
        assert_eq!(report.sections[0].winner, Winner::A);
    }

    #[test]
    fn summary_leads_with_the_winner() {
        let (a, b) = pair();
        let result = compare(global(), &b, &a, &["price_per_area", "metro_lines"]).unwrap();
        let report = render(&result, "7e", "11e");
        assert_eq!(report.overall.winner, Winner::B);
        assert_eq!(report.overall.summary, "11e comes out ahead of 7e, 2 to 0.");
    }

    #[test]
    fn tie_and_empty_summaries() {
        let (a, _) = pair();
        let result = compare(global(), &a, &a, &["price_per_area"]).unwrap();
        let report = render(&result, "11e", "11e bis");
        assert_eq!(report.overall.winner_label, None);
        assert_eq!(report.overall.summary, "11e and 11e bis are tied, 0 to 0.");

        let result = compare::<&str>(global(), &a, &a, &[]).unwrap();
        let report = render(&result, "11e", "11e bis");
        assert!(report.sections.is_empty());
        assert_eq!(
            report.overall.summary,
            "No metric could be compared between 11e and 11e bis."
        );
    }

    #[test]
    fn report_serializes_camel_case() {
        let (a, b) = pair();
        let result = compare(global(), &a, &b, &["metro_lines"]).unwrap();
        let json = serde_json::to_value(render(&result, "11e", "7e")).unwrap();

        assert_eq!(json["labelA"], "11e");
        assert_eq!(json["overall"]["winner"], "a");
        assert_eq!(json["sections"][0]["category"], "transit");
        assert_eq!(json["sections"][0]["rows"][0]["valueB"], "5");
    }
}
