#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value-to-bucket classification and legend building for the district map.
//!
//! A metric value is mapped to one of five [`BucketLevel`]s by magnitude,
//! either through fixed cutoffs from the metric registry or through
//! equal-interval cutoffs over the observed values. The metric's polarity
//! then picks the color. Missing values get a dedicated no-data bucket.
//!
//! [`BucketLevel`]: district_map_metrics_models::BucketLevel

pub mod bucket;
pub mod classify;
pub mod legend;

pub use bucket::Bucket;
pub use classify::{Classifier, classify};
pub use legend::{CategoryLegendEntry, LegendEntry, build, build_categorical};
