//! Buckets and their colors.
//!
//! Scored metrics use a diverging green-to-red palette oriented by polarity,
//! so the favorable end is always green. Neutral metrics use a single-hue
//! sequential palette where darker only means "more".

use district_map_metrics_models::{BucketLevel, Polarity};
use serde::Serialize;

/// Color of the no-data bucket. Not part of either palette.
pub const NO_DATA_COLOR: &str = "#bdbdbd";

/// Diverging palette, most favorable first.
pub const FAVORABILITY_COLORS: [&str; 5] = ["#1a9850", "#91cf60", "#fee08b", "#fc8d59", "#d73027"];

/// Sequential palette for neutral metrics, lowest first.
pub const SEQUENTIAL_COLORS: [&str; 5] = ["#eff3ff", "#bdd7e7", "#6baed6", "#3182bd", "#08519c"];

/// Result of classifying one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Magnitude level, or `None` for the no-data bucket.
    pub level: Option<BucketLevel>,
    /// Polarity of the classified metric.
    pub polarity: Polarity,
    /// Hex display color.
    pub color: &'static str,
}

impl Bucket {
    /// A bucket holding a real value.
    #[must_use]
    pub const fn new(level: BucketLevel, polarity: Polarity) -> Self {
        Self {
            level: Some(level),
            polarity,
            color: color_for(level, polarity),
        }
    }

    /// The no-data bucket.
    #[must_use]
    pub const fn no_data(polarity: Polarity) -> Self {
        Self {
            level: None,
            polarity,
            color: NO_DATA_COLOR,
        }
    }

    /// Whether this is the no-data bucket.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        self.level.is_none()
    }

    /// Favorability rank from 1 (best) to 5 (worst).
    ///
    /// `None` for the no-data bucket and for neutral metrics.
    #[must_use]
    pub const fn favorability(&self) -> Option<u8> {
        match (self.level, self.polarity) {
            (None, _) | (_, Polarity::Neutral) => None,
            (Some(level), Polarity::LowerIsBetter) => Some(level.value()),
            (Some(level), Polarity::HigherIsBetter) => Some(6 - level.value()),
        }
    }
}

/// Display color for a level under the given polarity.
#[must_use]
pub const fn color_for(level: BucketLevel, polarity: Polarity) -> &'static str {
    let idx = level.index();
    match polarity {
        Polarity::LowerIsBetter => FAVORABILITY_COLORS[idx],
        Polarity::HigherIsBetter => FAVORABILITY_COLORS[4 - idx],
        Polarity::Neutral => SEQUENTIAL_COLORS[idx],
    }
}
