//! Integration tests for upload validation on the video endpoint.
//!
//! These paths are rejected before `ffprobe`/`ffmpeg` run, so they need no
//! external binaries.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_multipart, upright_sitter, Part};

fn video_part<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "video",
        filename,
        content_type: "application/octet-stream",
        data,
    }
}

#[tokio::test]
async fn rejects_disallowed_extension() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response =
        post_multipart(app, "/api/video/analyze", &[video_part("clip.gif", b"GIF89a")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Invalid file type. Allowed: mp4, avi, mov, mkv, webm"
    );
}

#[tokio::test]
async fn rejects_missing_video_field() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response =
        post_multipart(app, "/api/video/analyze", &[Part::Text("mode", "squat")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No video file provided");
}

#[tokio::test]
async fn rejects_empty_video() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response = post_multipart(app, "/api/video/analyze", &[video_part("clip.mp4", b"")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No file selected");
}

#[tokio::test]
async fn rejects_unknown_mode_before_decoding() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response = post_multipart(
        app,
        "/api/video/analyze",
        &[
            video_part("clip.mp4", b"not really a video"),
            Part::Text("mode", "jumping"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNSUPPORTED_MODE");
}
