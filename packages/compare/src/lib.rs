#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Side-by-side comparison of two districts.
//!
//! [`compare`] scores each requested metric using the polarity recorded in
//! the metric registry and aggregates the wins per category. [`render`]
//! turns the result into display-ready sections.

pub mod comparator;
pub mod verdict;

pub use comparator::compare;
pub use verdict::render;
