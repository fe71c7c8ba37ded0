//! Health check endpoints

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// `<version>+<git hash>` stamped at build time
    pub build: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "muslib-songs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: env!("MUSLIB_BUILD_ID").to_string(),
    })
}

/// GET /ping
///
/// Plain-text liveness probe.
pub async fn ping() -> &'static str {
    "OK"
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
}
