#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District map API server binary.
//!
//! Configuration comes from the environment: `BIND_ADDR`, `PORT`,
//! `DATASET_PATH`, `STATIC_DIR`, and `RUST_LOG`.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    district_map_server::run_server().await
}
