//! Integration tests for the single-frame analysis endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, png_bytes, post_multipart, slouched_sitter, upright_sitter, Part};

fn frame_part(data: &[u8]) -> Part<'_> {
    Part::File {
        name: "frame",
        filename: "frame.png",
        content_type: "image/png",
        data,
    }
}

#[tokio::test]
async fn upright_sitter_is_good_form() {
    let app = common::build_test_app(Some(upright_sitter()));
    let png = png_bytes();
    let response = post_multipart(
        app,
        "/api/video/frame",
        &[frame_part(&png), Part::Text("mode", "sitting")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Good Form");
    assert_eq!(json["score"], 100);
    assert_eq!(json["details"].as_array().unwrap().len(), 0);
    assert_eq!(json["analysis_type"], "sitting");
}

#[tokio::test]
async fn slouched_sitter_lists_issues_in_rule_order() {
    let app = common::build_test_app(Some(slouched_sitter()));
    let png = png_bytes();
    let response = post_multipart(app, "/api/video/analyze-sit", &[frame_part(&png)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Needs Improvement");
    assert_eq!(json["score"], 60);
    assert_eq!(json["details"][0], "Neck bending forward");
    assert_eq!(json["details"][1], "Back is leaning");
}

#[tokio::test]
async fn missing_mode_defaults_to_squat() {
    // A seated upper body has no legs: squat joints are not visible.
    let app = common::build_test_app(Some(upright_sitter()));
    let png = png_bytes();
    let response = post_multipart(app, "/api/video/frame", &[frame_part(&png)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["analysis_type"], "squat");
}

#[tokio::test]
async fn no_detection_returns_analysis_error_with_null_score() {
    let app = common::build_test_app(None);
    let png = png_bytes();
    let response = post_multipart(app, "/api/video/analyze-squat", &[frame_part(&png)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "Analysis Error");
    assert!(json["score"].is_null());
    assert_eq!(json["details"][0], "No pose detected");
}

#[tokio::test]
async fn unknown_mode_is_rejected() {
    let app = common::build_test_app(Some(upright_sitter()));
    let png = png_bytes();
    let response = post_multipart(
        app,
        "/api/video/frame",
        &[frame_part(&png), Part::Text("mode", "jumping")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNSUPPORTED_MODE");
}

#[tokio::test]
async fn undecodable_image_is_invalid_input() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response = post_multipart(
        app,
        "/api/video/frame",
        &[frame_part(b"definitely not a png")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn missing_frame_field_is_bad_request() {
    let app = common::build_test_app(Some(upright_sitter()));
    let response = post_multipart(app, "/api/video/frame", &[Part::Text("mode", "squat")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "No frame file provided");
}

#[tokio::test]
async fn legacy_sit_returns_feedback_only() {
    let app = common::build_test_app(Some(slouched_sitter()));
    let png = png_bytes();
    let response = post_multipart(app, "/analyze/sit", &[frame_part(&png)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(
        json["feedback"],
        serde_json::json!(["Neck bending forward", "Back is leaning"])
    );
}

#[tokio::test]
async fn legacy_squat_without_legs_reports_missing_joints() {
    let app = common::build_test_app(Some(upright_sitter()));
    let png = png_bytes();
    let response = post_multipart(app, "/analyze/squat", &[frame_part(&png)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["feedback"], serde_json::json!(["Key body parts not visible"]));
}
