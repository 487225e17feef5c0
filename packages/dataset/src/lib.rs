#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the aggregated per-district flat file.
//!
//! The file is a `;`-delimited CSV with one row per district: an
//! `Arrondissement` identifier column, an optional `nom` display-name
//! column, and one column per catalog metric. Every other header must map
//! to a metric in the registry, either by its dataset column name or by
//! its id, so a renamed column fails at startup instead of silently
//! disappearing from the map.
//!
//! Yearly median price per m² columns (`prix_m2_median_<year>`) are the one
//! exception: they feed each district's price history, and the current
//! year's column is also read as its catalog metric.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use district_map_metrics::{MetricError, MetricRegistry};
use district_map_metrics_models::{EntityRecord, MetricDescriptor, MetricValue};

/// Column holding the district identifier.
pub const ID_COLUMN: &str = "Arrondissement";

/// Optional column holding the district display name.
pub const NAME_COLUMN: &str = "nom";

/// Header prefix of the yearly median price per m² columns.
pub const PRICE_HISTORY_PREFIX: &str = "prix_m2_median_";

/// Median price per m² of a district in one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Calendar year.
    pub year: i32,
    /// Median price per m², `None` if the year has no data.
    pub value: Option<f64>,
}

/// Errors that can occur while loading or querying the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A header does not map to any known metric.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// A cell could not be interpreted.
    #[error("Row {row}, column '{column}': {message}")]
    Parse {
        /// 1-based data row number.
        row: usize,
        /// Column header.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// No district has the requested identifier.
    #[error("District {id} not found")]
    NotFound {
        /// The requested identifier.
        id: u32,
    },
}

/// All districts, keyed by identifier. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: BTreeMap<u32, EntityRecord>,
    price_history: BTreeMap<u32, Vec<PricePoint>>,
}

impl Dataset {
    /// Loads the dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be opened or read
    /// * If the CSV is malformed or a header is unknown
    /// * If a cell cannot be parsed for its metric
    pub fn load(path: impl AsRef<Path>, registry: &MetricRegistry) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        log::info!("Loading district dataset from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, registry)
    }

    /// Loads the dataset from any CSV source.
    ///
    /// # Errors
    ///
    /// * If the CSV is malformed or a header is unknown
    /// * If a cell cannot be parsed for its metric
    pub fn from_reader(reader: impl Read, registry: &MetricRegistry) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
            .collect();

        let mut id_index = None;
        let mut name_index = None;
        let mut columns: Vec<(usize, &MetricDescriptor)> = Vec::new();
        let mut history_columns: Vec<(usize, i32)> = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            match header.as_str() {
                ID_COLUMN => id_index = Some(i),
                NAME_COLUMN => name_index = Some(i),
                other => {
                    let year = history_year(other);
                    if let Some(year) = year {
                        history_columns.push((i, year));
                    }
                    match registry.by_column(other) {
                        Some(descriptor) => columns.push((i, descriptor)),
                        None if year.is_some() => {}
                        None => columns.push((i, registry.describe(other)?)),
                    }
                }
            }
        }
        history_columns.sort_by_key(|&(_, year)| year);

        let Some(id_index) = id_index else {
            return Err(DatasetError::Parse {
                row: 0,
                column: ID_COLUMN.to_owned(),
                message: "identifier column is missing".to_owned(),
            });
        };

        let mut records = BTreeMap::new();
        let mut price_history = BTreeMap::new();
        for (row_index, result) in reader.records().enumerate() {
            let row = row_index + 1;
            let record = result?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            let id = parse_id(cell(id_index)).ok_or_else(|| DatasetError::Parse {
                row,
                column: ID_COLUMN.to_owned(),
                message: format!("invalid district identifier '{}'", cell(id_index)),
            })?;

            let mut entity = EntityRecord::new(id);
            if let Some(name) = name_index.map(cell).filter(|n| !n.is_empty()) {
                entity = entity.with_name(name);
            }

            for (i, descriptor) in &columns {
                let value = parse_cell(descriptor, cell(*i)).map_err(|message| {
                    DatasetError::Parse {
                        row,
                        column: headers[*i].clone(),
                        message,
                    }
                })?;
                entity.metrics.insert(descriptor.id.clone(), value);
            }

            if !history_columns.is_empty() {
                let points = history_columns
                    .iter()
                    .map(|&(i, year)| {
                        parse_number(cell(i))
                            .map(|value| PricePoint { year, value })
                            .map_err(|message| DatasetError::Parse {
                                row,
                                column: headers[i].clone(),
                                message,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                price_history.insert(id, points);
            }

            if records.insert(id, entity).is_some() {
                return Err(DatasetError::Parse {
                    row,
                    column: ID_COLUMN.to_owned(),
                    message: format!("duplicate district identifier {id}"),
                });
            }
        }

        log::info!(
            "Loaded {} districts with {} metrics and {} years of price history each",
            records.len(),
            columns.len(),
            history_columns.len()
        );

        Ok(Self {
            records,
            price_history,
        })
    }

    /// Builds a dataset from already-constructed records.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            price_history: BTreeMap::new(),
        }
    }

    /// Attaches a price history to district `id`, replacing any previous
    /// one. Points are kept in year order.
    #[must_use]
    pub fn with_price_history(
        mut self,
        id: u32,
        points: impl IntoIterator<Item = PricePoint>,
    ) -> Self {
        let mut points: Vec<PricePoint> = points.into_iter().collect();
        points.sort_by_key(|p| p.year);
        self.price_history.insert(id, points);
        self
    }

    /// Returns the district with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NotFound`] for an unknown identifier.
    pub fn get(&self, id: u32) -> Result<&EntityRecord, DatasetError> {
        self.records.get(&id).ok_or(DatasetError::NotFound { id })
    }

    /// Yearly median price per m² of district `id`, oldest first. Empty
    /// when the dataset carries no history columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NotFound`] for an unknown identifier.
    pub fn price_history(&self, id: u32) -> Result<&[PricePoint], DatasetError> {
        self.get(id)?;
        Ok(self
            .price_history
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// All districts in identifier order.
    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    /// Numeric values of `metric` across all districts, in identifier
    /// order. Missing, `NaN`, and category values are `None`.
    #[must_use]
    pub fn values(&self, metric: &str) -> Vec<Option<f64>> {
        self.records.values().map(|r| r.number(metric)).collect()
    }

    /// Number of districts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no districts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Accepts plain integers as well as float-formatted ones like `"11.0"`.
fn parse_id(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let id = f as u32;
                id
            })
    })
}

/// Year of a `prix_m2_median_<year>` header.
fn history_year(header: &str) -> Option<i32> {
    header
        .strip_prefix(PRICE_HISTORY_PREFIX)
        .filter(|year| year.len() == 4)
        .and_then(|year| year.parse().ok())
}

/// Parses a numeric cell, accepting a decimal comma. Empty cells and `NaN`
/// are `None`.
fn parse_number(raw: &str) -> Result<Option<f64>, String> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value = raw
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| format!("expected a number, got '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("expected a finite number, got '{raw}'"));
    }
    Ok(Some(value))
}

/// Interprets one cell for `descriptor`. Empty cells, `NaN`, and missing
/// markers are `None`; infinite numbers are rejected.
fn parse_cell(descriptor: &MetricDescriptor, raw: &str) -> Result<Option<MetricValue>, String> {
    if raw.is_empty()
        || raw.eq_ignore_ascii_case("nan")
        || descriptor.missing_markers.iter().any(|m| m == raw)
    {
        return Ok(None);
    }

    if descriptor.kind.is_numeric() {
        return Ok(parse_number(raw)?.map(MetricValue::Number));
    }

    match descriptor.resolve_label(raw) {
        Ok(Some(category)) => Ok(Some(MetricValue::from(category))),
        Ok(None) => Ok(None),
        Err(unknown) => Err(MetricError::UnknownCategoryValue {
            metric: descriptor.id.clone(),
            value: unknown.to_owned(),
        }
        .to_string()),
    }
}

#[cfg(test)]
mod tests {
    use district_map_metrics::global;

    use super::*;

    const SAMPLE: &str = "\u{feff}Arrondissement;nom;prix_m2_median_2024;tendance_prix_m2;nb_lignes_metro;qualite_air_dominante\n\
        1;1er;13250;Hausse modérée;10;Moyenne\n\
        2;2e;12100,5;Données insuffisantes;;Bonne\n\
        11;11e;NaN;Stable;9;Mauvaise\n";

    fn sample() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes(), global()).unwrap()
    }

    #[test]
    fn loads_records_keyed_by_id() {
        let dataset = sample();
        assert_eq!(dataset.len(), 3);

        let ids: Vec<u32> = dataset.records().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 11]);

        let first = dataset.get(1).unwrap();
        assert_eq!(first.name.as_deref(), Some("1er"));
        assert_eq!(first.number("price_per_area"), Some(13_250.0));
        assert_eq!(first.number("metro_lines"), Some(10.0));
    }

    #[test]
    fn resolves_ordinal_aliases() {
        let dataset = sample();
        assert_eq!(
            dataset.get(1).unwrap().value("market_trend"),
            Some(&MetricValue::from("moderate_rise"))
        );
        assert_eq!(
            dataset.get(11).unwrap().value("air_quality"),
            Some(&MetricValue::from("poor"))
        );
    }

    #[test]
    fn blanks_nan_and_markers_are_missing() {
        let dataset = sample();
        let second = dataset.get(2).unwrap();
        assert!(second.value("market_trend").is_none());
        assert!(second.value("metro_lines").is_none());
        assert!(second.metrics.contains_key("metro_lines"));
        assert_eq!(second.number("price_per_area"), Some(12_100.5));

        assert!(dataset.get(11).unwrap().value("price_per_area").is_none());
    }

    #[test]
    fn values_follow_id_order() {
        assert_eq!(
            sample().values("price_per_area"),
            vec![Some(13_250.0), Some(12_100.5), None]
        );
    }

    #[test]
    fn unknown_district_is_not_found() {
        assert!(matches!(
            sample().get(42),
            Err(DatasetError::NotFound { id: 42 })
        ));
    }

    #[test]
    fn unknown_column_fails() {
        let csv = "Arrondissement;loyer_moyen\n1;25\n";
        let err = Dataset::from_reader(csv.as_bytes(), global()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Metric(MetricError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn columns_may_use_metric_ids() {
        let csv = "Arrondissement;price_per_area\n4;12000\n";
        let dataset = Dataset::from_reader(csv.as_bytes(), global()).unwrap();
        assert_eq!(dataset.get(4).unwrap().number("price_per_area"), Some(12_000.0));
    }

    #[test]
    fn bad_cells_report_row_and_column() {
        let csv = "Arrondissement;nb_lignes_metro\n1;3\n2;many\n";
        let err = Dataset::from_reader(csv.as_bytes(), global()).unwrap_err();
        match err {
            DatasetError::Parse { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "nb_lignes_metro");
            }
            other => panic!("unexpected error: {other}"),
        }

        let csv = "Arrondissement;tendance_prix_m2\n1;booming\n";
        assert!(Dataset::from_reader(csv.as_bytes(), global()).is_err());
    }

    #[test]
    fn rejects_infinite_numbers() {
        for cell in ["inf", "-Infinity"] {
            let csv = format!("Arrondissement;nb_lignes_metro\n1;{cell}\n");
            match Dataset::from_reader(csv.as_bytes(), global()).unwrap_err() {
                DatasetError::Parse {
                    row,
                    column,
                    message,
                } => {
                    assert_eq!(row, 1);
                    assert_eq!(column, "nb_lignes_metro");
                    assert!(message.contains("finite"), "{message}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn rejects_missing_and_duplicate_ids() {
        let csv = "nom;nb_lignes_metro\n1er;3\n";
        assert!(Dataset::from_reader(csv.as_bytes(), global()).is_err());

        let csv = "Arrondissement;nb_lignes_metro\n1;3\n1.0;4\n";
        assert!(Dataset::from_reader(csv.as_bytes(), global()).is_err());
    }

    #[test]
    fn yearly_price_columns_form_the_history() {
        let csv = "Arrondissement;prix_m2_median_2025;prix_m2_median_2020;prix_m2_median_2024\n\
            1;13590;14630;13800\n\
            2;;13040;12400\n";
        let dataset = Dataset::from_reader(csv.as_bytes(), global()).unwrap();

        let history = dataset.price_history(1).unwrap();
        let years: Vec<i32> = history.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2020, 2024, 2025]);
        assert_eq!(history[0].value, Some(14_630.0));

        assert_eq!(dataset.price_history(2).unwrap()[2].value, None);
        assert_eq!(dataset.get(1).unwrap().number("price_per_area"), Some(13_800.0));
        assert!(!dataset.get(1).unwrap().metrics.contains_key("prix_m2_median_2020"));
    }

    #[test]
    fn history_is_empty_without_yearly_columns() {
        let dataset = sample();
        assert!(dataset.price_history(1).unwrap().is_empty());
        assert!(matches!(
            dataset.price_history(42),
            Err(DatasetError::NotFound { id: 42 })
        ));
    }

    #[test]
    fn bad_history_cells_fail() {
        let csv = "Arrondissement;prix_m2_median_2021\n1;cher\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), global()),
            Err(DatasetError::Parse { row: 1, .. })
        ));

        let csv = "Arrondissement;prix_m2_median_recent\n1;12000\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), global()),
            Err(DatasetError::Metric(MetricError::UnknownMetric { .. }))
        ));
    }

    #[test]
    fn attached_history_is_sorted() {
        let dataset = Dataset::from_records([EntityRecord::new(3)]).with_price_history(
            3,
            [
                PricePoint {
                    year: 2022,
                    value: Some(12_940.0),
                },
                PricePoint {
                    year: 2020,
                    value: None,
                },
            ],
        );
        let years: Vec<i32> = dataset
            .price_history(3)
            .unwrap()
            .iter()
            .map(|p| p.year)
            .collect();
        assert_eq!(years, vec![2020, 2022]);
    }

    #[test]
    fn bundled_sample_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/districts.csv");
        let dataset = Dataset::load(path, global()).unwrap();
        assert_eq!(dataset.len(), 20);
        for record in dataset.records() {
            assert!(record.name.is_some());
            assert_eq!(dataset.price_history(record.id).unwrap().len(), 6);
        }
    }
}
