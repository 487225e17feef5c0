//! HTTP handler functions for the district map API.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use district_map_choropleth::legend::{build, build_categorical};
use district_map_choropleth::{Bucket, Classifier};
use district_map_compare::{compare as compare_districts, render};
use district_map_dataset::DatasetError;
use district_map_metrics::format::{format_number, format_value};
use district_map_metrics::summary::{percentile_rank, summarize};
use district_map_metrics::{MetricError, MetricRegistry};
use district_map_metrics_models::{EntityRecord, MetricDescriptor, MetricValue, Polarity};
use district_map_server_models::{
    ApiChoropleth, ApiChoroplethEntry, ApiComparison, ApiDistrictDetail, ApiDistrictMetric,
    ApiDistrictSummary, ApiErrorResponse, ApiHealth, ApiLegend, ApiMetricStats, ApiPriceHistory,
    ApiPricePoint, ApiRanking, ApiRankingEntry, ApiResponse, ApiStats, CompareQueryParams,
    DistrictQueryParams, RankingOrder, RankingQueryParams,
};

use crate::AppState;

/// Metric the district price filter and price history refer to.
const PRICE_METRIC: &str = "price_per_area";

/// Failures a handler can answer with.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn into_response(self) -> HttpResponse {
        match &self {
            Self::Metric(MetricError::UnknownMetric { .. }) => {
                log::warn!("{self}");
                HttpResponse::NotFound()
                    .json(ApiErrorResponse::new("UNKNOWN_METRIC", self.to_string()))
            }
            Self::Dataset(DatasetError::NotFound { .. }) => {
                log::warn!("{self}");
                HttpResponse::NotFound()
                    .json(ApiErrorResponse::new("NOT_FOUND", self.to_string()))
            }
            Self::BadRequest(message) => {
                log::warn!("Bad request: {message}");
                HttpResponse::BadRequest().json(ApiErrorResponse::new("BAD_REQUEST", message))
            }
            Self::Metric(e) => {
                log::error!("Metric error: {e}");
                HttpResponse::InternalServerError()
                    .json(ApiErrorResponse::new(e.code(), e.to_string()))
            }
            Self::Dataset(e) => {
                log::error!("Dataset error: {e}");
                HttpResponse::InternalServerError()
                    .json(ApiErrorResponse::new("INTERNAL_ERROR", e.to_string()))
            }
        }
    }
}

fn respond<T: serde::Serialize>(result: Result<T, ApiError>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::new(data)),
        Err(e) => e.into_response(),
    }
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        district_count: state.dataset.len(),
        metric_count: state.registry.len(),
    }))
}

/// `GET /api/stats`
///
/// Summary statistics for every cataloged metric.
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    let dataset = &state.dataset;
    let metrics = state
        .registry
        .descriptors()
        .map(|descriptor| {
            let missing = dataset
                .records()
                .filter(|r| r.value(&descriptor.id).is_none())
                .count();

            let (summary, category_counts) = if descriptor.kind.is_numeric() {
                (summarize(&dataset.values(&descriptor.id)), None)
            } else {
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for label in dataset
                    .records()
                    .filter_map(|r| r.value(&descriptor.id))
                    .filter_map(MetricValue::as_category)
                {
                    *counts.entry(label.to_string()).or_default() += 1;
                }
                (None, Some(counts))
            };

            ApiMetricStats {
                metric: descriptor.id.clone(),
                label: descriptor.label.clone(),
                category: descriptor.category,
                summary,
                category_counts,
                missing,
            }
        })
        .collect();

    HttpResponse::Ok().json(ApiResponse::new(ApiStats {
        district_count: dataset.len(),
        metric_count: state.registry.len(),
        metrics,
    }))
}

/// `GET /api/metrics`
///
/// Returns the metric catalog.
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let descriptors: Vec<&MetricDescriptor> = state.registry.descriptors().collect();
    HttpResponse::Ok().json(ApiResponse::new(descriptors))
}

/// `GET /api/districts?price_min=&price_max=`
///
/// Lists districts, optionally only those whose price per m² lies within
/// the given bounds.
pub async fn districts(
    state: web::Data<AppState>,
    params: web::Query<DistrictQueryParams>,
) -> HttpResponse {
    respond(district_list(&state, &params))
}

fn district_list(
    state: &AppState,
    params: &DistrictQueryParams,
) -> Result<Vec<ApiDistrictSummary>, ApiError> {
    let bounds = [params.price_min, params.price_max];
    if bounds.iter().flatten().any(|b| !b.is_finite()) {
        return Err(ApiError::BadRequest(
            "price bounds must be finite numbers".to_string(),
        ));
    }
    if let [Some(min), Some(max)] = bounds
        && min > max
    {
        return Err(ApiError::BadRequest(format!(
            "price_min ({min}) is greater than price_max ({max})"
        )));
    }

    Ok(state
        .dataset
        .records()
        .filter(|r| params.accepts(r.number(PRICE_METRIC)))
        .map(|r| ApiDistrictSummary {
            id: r.id,
            name: r.display_name(),
        })
        .collect())
}

/// `GET /api/districts/{id}`
///
/// Full record of one district, with the bucket and percentile of every
/// metric relative to all districts.
pub async fn district(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    respond(district_detail(&state, path.into_inner()))
}

fn district_detail(state: &AppState, id: u32) -> Result<ApiDistrictDetail, ApiError> {
    let record = state.dataset.get(id)?;

    let metrics = state
        .registry
        .descriptors()
        .map(|descriptor| {
            let observed = state.dataset.values(&descriptor.id);
            let value = record.value(&descriptor.id);
            let bucket = Classifier::for_descriptor(descriptor, &observed).classify(value);
            ApiDistrictMetric {
                metric: descriptor.id.clone(),
                label: descriptor.label.clone(),
                category: descriptor.category,
                value: value.cloned(),
                formatted: value.map(|v| format_value(descriptor, v)),
                bucket,
                percentile: value
                    .and_then(MetricValue::as_number)
                    .and_then(|n| percentile_rank(n, &observed)),
            }
        })
        .collect();

    Ok(ApiDistrictDetail {
        id: record.id,
        name: record.display_name(),
        metrics,
    })
}

/// `GET /api/districts/{id}/history`
///
/// Median price per m² of one district for every year in the dataset.
pub async fn price_history(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    respond(district_price_history(&state, path.into_inner()))
}

fn district_price_history(state: &AppState, id: u32) -> Result<ApiPriceHistory, ApiError> {
    let record = state.dataset.get(id)?;
    let kind = state.registry.describe(PRICE_METRIC)?.kind;

    let points = state
        .dataset
        .price_history(id)?
        .iter()
        .map(|point| ApiPricePoint {
            year: point.year,
            value: point.value,
            formatted: point.value.map(|v| format_number(v, kind)),
        })
        .collect();

    Ok(ApiPriceHistory {
        id: record.id,
        name: record.display_name(),
        points,
    })
}

/// `GET /api/choropleth/{metric}`
///
/// Value, bucket, and color of every district for one metric, plus the
/// legend.
pub async fn choropleth(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    respond(choropleth_layer(&state, &path))
}

fn choropleth_layer(state: &AppState, metric_id: &str) -> Result<ApiChoropleth, ApiError> {
    let descriptor = state.registry.describe(metric_id)?;
    let observed = state.dataset.values(metric_id);
    let classifier = Classifier::for_descriptor(descriptor, &observed);

    let districts = state
        .dataset
        .records()
        .map(|record| {
            let value = record.value(metric_id);
            let bucket: Bucket = classifier.classify(value);
            ApiChoroplethEntry {
                id: record.id,
                name: record.display_name(),
                value: value.cloned(),
                formatted: value.map(|v| format_value(descriptor, v)),
                bucket,
            }
        })
        .collect();

    Ok(ApiChoropleth {
        metric: descriptor.clone(),
        districts,
        legend: metric_legend(state.registry, descriptor, &observed)?,
    })
}

fn metric_legend(
    registry: &MetricRegistry,
    descriptor: &MetricDescriptor,
    observed: &[Option<f64>],
) -> Result<ApiLegend, MetricError> {
    if descriptor.kind.is_numeric() {
        Ok(ApiLegend::Numeric(build(registry, &descriptor.id, observed)?))
    } else {
        Ok(ApiLegend::Categorical(build_categorical(
            registry,
            &descriptor.id,
        )?))
    }
}

/// `GET /api/legend/{metric}`
pub async fn legend(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let result = state
        .registry
        .describe(&path)
        .and_then(|descriptor| {
            metric_legend(
                state.registry,
                descriptor,
                &state.dataset.values(&descriptor.id),
            )
        })
        .map_err(ApiError::from);
    respond(result)
}

/// `GET /api/rankings/{metric}?order=asc|desc`
///
/// Districts ordered by one metric, best first for the metric's polarity
/// unless `order` says otherwise. Districts without a value are left out.
/// Ordinal metrics are ordered by category position.
pub async fn rankings(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<RankingQueryParams>,
) -> HttpResponse {
    respond(ranking(&state, &path, params.order))
}

fn ranking(
    state: &AppState,
    metric_id: &str,
    order: Option<RankingOrder>,
) -> Result<ApiRanking, ApiError> {
    let descriptor = state.registry.describe(metric_id)?;
    let order = order.unwrap_or(match descriptor.polarity {
        Polarity::LowerIsBetter => RankingOrder::Asc,
        Polarity::HigherIsBetter | Polarity::Neutral => RankingOrder::Desc,
    });

    let mut ranked: Vec<(f64, &EntityRecord, &MetricValue)> = state
        .dataset
        .records()
        .filter_map(|record| {
            let value = record.value(metric_id)?;
            rank_key(descriptor, value).map(|key| (key, record, value))
        })
        .collect();
    ranked.sort_by(|(a, ..), (b, ..)| match order {
        RankingOrder::Asc => a.total_cmp(b),
        RankingOrder::Desc => b.total_cmp(a),
    });

    let observed = state.dataset.values(metric_id);
    let classifier = Classifier::for_descriptor(descriptor, &observed);

    let mut entries: Vec<ApiRankingEntry> = Vec::with_capacity(ranked.len());
    let mut previous: Option<f64> = None;
    for (position, (key, record, value)) in ranked.into_iter().enumerate() {
        let rank = match (previous, entries.last()) {
            (Some(p), Some(last)) if p.total_cmp(&key).is_eq() => last.rank,
            _ => position + 1,
        };
        previous = Some(key);
        entries.push(ApiRankingEntry {
            rank,
            id: record.id,
            name: record.display_name(),
            value: value.clone(),
            formatted: format_value(descriptor, value),
            bucket: classifier.classify(Some(value)),
        });
    }

    log::debug!(
        "Ranked {} districts by '{metric_id}' ({order:?})",
        entries.len()
    );

    Ok(ApiRanking {
        metric: descriptor.id.clone(),
        label: descriptor.label.clone(),
        order,
        entries,
    })
}

/// Sort key of a value: the number itself, or the category's position for
/// ordinal metrics. `None` for values that cannot be ranked.
#[allow(clippy::cast_precision_loss)]
fn rank_key(descriptor: &MetricDescriptor, value: &MetricValue) -> Option<f64> {
    if descriptor.kind.is_numeric() {
        return value.as_number().filter(|n| !n.is_nan());
    }
    let category = descriptor.resolve_label(value.as_category()?).ok()??;
    descriptor.category_rank(category).map(|rank| rank as f64)
}

/// `GET /api/compare?a=&b=&metrics=`
///
/// Compares two districts. Without `metrics`, every cataloged metric is
/// compared.
pub async fn compare(
    state: web::Data<AppState>,
    params: web::Query<CompareQueryParams>,
) -> HttpResponse {
    respond(comparison(&state, &params))
}

fn comparison(state: &AppState, params: &CompareQueryParams) -> Result<ApiComparison, ApiError> {
    let (Some(a), Some(b)) = (params.a, params.b) else {
        return Err(ApiError::BadRequest(
            "both 'a' and 'b' district identifiers are required".to_string(),
        ));
    };

    let record_a = state.dataset.get(a)?;
    let record_b = state.dataset.get(b)?;

    let metric_ids = params
        .metric_ids()
        .unwrap_or_else(|| state.registry.ids());

    let result = compare_districts(
        state.registry,
        record_a,
        record_b,
        metric_ids.as_slice(),
    )?;
    let verdict = render(&result, &record_a.display_name(), &record_b.display_name());

    log::debug!(
        "Compared districts {a} and {b}: {} to {} ({})",
        result.score_a,
        result.score_b,
        result.verdict
    );

    Ok(ApiComparison { result, verdict })
}
