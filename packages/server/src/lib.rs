#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the district map dashboard.
//!
//! Serves the REST API for district metrics, choropleth layers, legends,
//! rankings, price history, and side-by-side comparisons, plus the static
//! frontend build. The
//! dataset is a flat CSV loaded once at startup and shared read-only; the
//! metric registry is embedded in the binary.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use district_map_dataset::Dataset;
use district_map_metrics::MetricRegistry;
use district_map_server_models::ApiErrorResponse;

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Path of the district CSV (`DATASET_PATH`).
    pub dataset_path: PathBuf,
    /// Directory of the frontend build (`STATIC_DIR`).
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            dataset_path: PathBuf::from("data/districts.csv"),
            static_dir: PathBuf::from("app/dist"),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from environment variables, falling back to
    /// the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dataset_path: lookup("DATASET_PATH").map_or(defaults.dataset_path, PathBuf::from),
            static_dir: lookup("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Metric catalog.
    pub registry: &'static MetricRegistry,
    /// All districts, loaded once at startup.
    pub dataset: Arc<Dataset>,
}

/// Registers the `/api` routes.
///
/// Malformed paths and query strings are answered with the same error
/// envelope as every other failure.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(err, bad_request(&message)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(err, bad_request(&message)).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/stats", web::get().to(handlers::stats))
            .route("/metrics", web::get().to(handlers::metrics))
            .route("/districts", web::get().to(handlers::districts))
            .route("/districts/{id}", web::get().to(handlers::district))
            .route(
                "/districts/{id}/history",
                web::get().to(handlers::price_history),
            )
            .route("/choropleth/{metric}", web::get().to(handlers::choropleth))
            .route("/legend/{metric}", web::get().to(handlers::legend))
            .route("/rankings/{metric}", web::get().to(handlers::rankings))
            .route("/compare", web::get().to(handlers::compare)),
    );
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiErrorResponse::new("BAD_REQUEST", message))
}

/// Starts the district map API server.
///
/// Loads the metric registry and the district dataset, then starts the
/// Actix-Web HTTP server. This is a regular async function; the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded, or
/// if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Loading metric registry...");
    let registry = district_map_metrics::global();
    log::info!("{} metrics cataloged", registry.len());

    let dataset = Dataset::load(&config.dataset_path, registry).map_err(|e| {
        log::error!(
            "Failed to load dataset from {}: {e}",
            config.dataset_path.display()
        );
        std::io::Error::other(e)
    })?;

    let state = web::Data::new(AppState {
        registry,
        dataset: Arc::new(dataset),
    });

    let ServerConfig {
        bind_addr,
        port,
        static_dir,
        ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.dataset_path, PathBuf::from("data/districts.csv"));
    }

    #[test]
    fn config_reads_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("0.0.0.0".to_string()),
            "PORT" => Some("9000".to_string()),
            "DATASET_PATH" => Some("/srv/gold.csv".to_string()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.dataset_path, PathBuf::from("/srv/gold.csv"));
        assert_eq!(config.static_dir, PathBuf::from("app/dist"));
    }

    #[test]
    fn unparseable_port_falls_back() {
        let config = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 8080);
    }
}
