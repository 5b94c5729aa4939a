//! Posture analysis endpoints: full videos, single frames and the legacy
//! feedback-only routes.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use poslyzer_core::ffmpeg;
use poslyzer_core::{decode_image, AnalysisMode, CoreError, FrameSummary, SessionReport};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::{parse_mode, read_frame_upload, read_video_upload};
use crate::state::AppState;

/// Single-frame analysis result.
#[derive(Debug, Serialize)]
pub struct FrameAnalysisResponse {
    #[serde(flatten)]
    pub summary: FrameSummary,
    pub analysis_type: AnalysisMode,
}

/// Legacy response: issue texts only.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: Vec<String>,
}

/// POST /api/video/analyze
///
/// Multipart fields: `video` (mp4/avi/mov/mkv/webm), optional `mode`.
pub async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SessionReport>> {
    let upload = read_video_upload(&mut multipart).await?;
    let mode = parse_mode(upload.mode.as_deref())?;
    let path = upload.file.path();

    let info = ffmpeg::video_info(path).await.map_err(CoreError::from)?;
    tracing::info!(
        %mode,
        bytes = upload.size,
        width = info.width,
        height = info.height,
        fps = info.fps,
        frame_count = info.frame_count,
        "Analyzing uploaded video",
    );

    let frames = ffmpeg::decode_frames(path, info.width, info.height).map_err(CoreError::from)?;
    let report = poslyzer_core::analyze_video(&state.analyzer, frames, info.fps, mode).await?;

    // `upload` (and its temp file) is dropped here.
    Ok(Json(report))
}

/// POST /api/video/frame
///
/// Multipart fields: `frame` (PNG/JPEG/WebP), optional `mode`.
pub async fn analyze_frame(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FrameAnalysisResponse>> {
    let upload = read_frame_upload(&mut multipart).await?;
    let mode = parse_mode(upload.mode.as_deref())?;
    frame_response(&state, upload.bytes, mode).await
}

/// POST /api/video/analyze-squat
pub async fn analyze_squat(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FrameAnalysisResponse>> {
    let upload = read_frame_upload(&mut multipart).await?;
    frame_response(&state, upload.bytes, AnalysisMode::Squat).await
}

/// POST /api/video/analyze-sit
pub async fn analyze_sitting(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FrameAnalysisResponse>> {
    let upload = read_frame_upload(&mut multipart).await?;
    frame_response(&state, upload.bytes, AnalysisMode::Sitting).await
}

/// POST /analyze/squat
pub async fn squat_feedback(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FeedbackResponse>> {
    let upload = read_frame_upload(&mut multipart).await?;
    feedback_response(&state, upload.bytes, AnalysisMode::Squat).await
}

/// POST /analyze/sit
pub async fn sit_feedback(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<FeedbackResponse>> {
    let upload = read_frame_upload(&mut multipart).await?;
    feedback_response(&state, upload.bytes, AnalysisMode::Sitting).await
}

// ---- helpers ----

async fn analyze_bytes(
    state: &AppState,
    bytes: Bytes,
    mode: AnalysisMode,
) -> AppResult<FrameSummary> {
    let image = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Image decoding task failed: {e}")))??;

    let verdict = state.analyzer.analyze_frame(&image, mode).await;
    tracing::debug!(
        %mode,
        status = %verdict.status(),
        score = ?verdict.score(),
        issues = verdict.issues().len(),
        "Frame analyzed",
    );
    Ok(verdict.summary())
}

async fn frame_response(
    state: &AppState,
    bytes: Bytes,
    mode: AnalysisMode,
) -> AppResult<Json<FrameAnalysisResponse>> {
    let summary = analyze_bytes(state, bytes, mode).await?;
    Ok(Json(FrameAnalysisResponse {
        summary,
        analysis_type: mode,
    }))
}

async fn feedback_response(
    state: &AppState,
    bytes: Bytes,
    mode: AnalysisMode,
) -> AppResult<Json<FeedbackResponse>> {
    let summary = analyze_bytes(state, bytes, mode).await?;
    Ok(Json(FeedbackResponse {
        feedback: summary.details,
    }))
}
