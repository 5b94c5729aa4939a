pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /video/analyze          full video upload (multipart: video, mode)
/// /video/frame            single frame (multipart: frame, mode)
/// /video/analyze-squat    single frame, squat rules
/// /video/analyze-sit      single frame, sitting rules
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/video/analyze", post(analysis::analyze_video))
        .route("/video/frame", post(analysis::analyze_frame))
        .route("/video/analyze-squat", post(analysis::analyze_squat))
        .route("/video/analyze-sit", post(analysis::analyze_sitting))
}

/// Feedback-only endpoints kept at the root for older clients.
pub fn legacy_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/squat", post(analysis::squat_feedback))
        .route("/analyze/sit", post(analysis::sit_feedback))
}
