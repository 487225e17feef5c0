//! Display formatting for metric values.
//!
//! Formatting is a pure function of the value and the metric's
//! [`MetricKind`]. One fixed convention is used everywhere: a comma as the
//! thousands separator, a dot as the decimal separator, and the unit as a
//! suffix.

use district_map_metrics_models::{MetricDescriptor, MetricKind, MetricValue};

/// Formats a numeric value according to `kind`.
#[must_use]
pub fn format_number(value: f64, kind: MetricKind) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    match kind {
        MetricKind::CurrencyPerArea => format!("{} €/m²", group_thousands(value)),
        MetricKind::Currency => format!("{} €", group_thousands(value)),
        MetricKind::Percentage => format!("{value:.1}%"),
        MetricKind::Count | MetricKind::OrdinalCategory => group_thousands(value),
        MetricKind::RatePerCapita => format!("{value:.1} per 10k"),
        MetricKind::Concentration => format!("{value:.1} µg/m³"),
    }
}

/// Formats any value of the metric described by `descriptor`.
///
/// Category labels are humanized; numbers follow [`format_number`].
#[must_use]
pub fn format_value(descriptor: &MetricDescriptor, value: &MetricValue) -> String {
    format_value_for_kind(value, descriptor.kind)
}

/// Formats a value when only the metric's kind is at hand.
#[must_use]
pub fn format_value_for_kind(value: &MetricValue, kind: MetricKind) -> String {
    match value {
        MetricValue::Number(n) => format_number(*n, kind),
        MetricValue::Category(label) => humanize(label),
    }
}

/// Rounds `value` to an integer and inserts thousands separators.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Turns a `snake_case` identifier into a sentence-case label.
///
/// `"moderate_rise"` becomes `"Moderate rise"`.
#[must_use]
pub fn humanize(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(12_586.4), "12,586");
        assert_eq!(group_thousands(1_234_567.0), "1,234,567");
        assert_eq!(group_thousands(-4_500.0), "-4,500");
    }

    #[test]
    fn formats_each_kind() {
        assert_eq!(
            format_number(12_586.0, MetricKind::CurrencyPerArea),
            "12,586 €/m²"
        );
        assert_eq!(format_number(560_000.0, MetricKind::Currency), "560,000 €");
        assert_eq!(format_number(12.46, MetricKind::Percentage), "12.5%");
        assert_eq!(format_number(-3.0, MetricKind::Percentage), "-3.0%");
        assert_eq!(format_number(1_234.0, MetricKind::Count), "1,234");
        assert_eq!(format_number(3.24, MetricKind::RatePerCapita), "3.2 per 10k");
        assert_eq!(format_number(38.44, MetricKind::Concentration), "38.4 µg/m³");
        assert_eq!(format_number(2.0, MetricKind::OrdinalCategory), "2");
    }

    #[test]
    fn non_finite_values_are_not_formatted() {
        assert_eq!(format_number(f64::NAN, MetricKind::Count), "n/a");
        assert_eq!(format_number(f64::INFINITY, MetricKind::Currency), "n/a");
    }

    #[test]
    fn formats_values_by_kind() {
        assert_eq!(
            format_value_for_kind(&MetricValue::Number(10_400.0), MetricKind::CurrencyPerArea),
            "10,400 €/m²"
        );
        assert_eq!(
            format_value_for_kind(&MetricValue::from("moderate_rise"), MetricKind::OrdinalCategory),
            "Moderate rise"
        );

        let descriptor = crate::global().describe("price_per_area").unwrap();
        let value = MetricValue::Number(9_950.0);
        assert_eq!(
            format_value(descriptor, &value),
            format_value_for_kind(&value, descriptor.kind)
        );
    }

    #[test]
    fn humanizes_labels() {
        assert_eq!(humanize("moderate_rise"), "Moderate rise");
        assert_eq!(humanize("good"), "Good");
        assert_eq!(humanize(""), "");
    }
}
