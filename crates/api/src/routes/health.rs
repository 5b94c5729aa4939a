use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Every route the service answers, for discovery by clients.
pub const ENDPOINTS: &[&str] = &[
    "/api/video/analyze",
    "/api/video/frame",
    "/api/video/analyze-squat",
    "/api/video/analyze-sit",
    "/analyze/squat",
    "/analyze/sit",
    "/health",
];

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub message: &'static str,
    pub endpoints: &'static [&'static str],
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        message: "Posture analysis API is running",
        endpoints: ENDPOINTS,
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
