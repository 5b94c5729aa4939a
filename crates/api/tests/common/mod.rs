#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, RgbImage};
use poslyzer_api::config::ServerConfig;
use poslyzer_api::router::build_app_router;
use poslyzer_api::state::AppState;
use poslyzer_core::keypoint::{Keypoint, Landmark, PoseLandmarks};
use poslyzer_core::{CoreError, FrameAnalyzer, LandmarkSource};
use tower::ServiceExt;

pub const BOUNDARY: &str = "poslyzer-test-boundary";

/// Landmark source that returns the same detection for every frame.
pub struct FixedSource(pub Option<PoseLandmarks>);

#[async_trait]
impl LandmarkSource for FixedSource {
    async fn detect(&self, _image: &RgbImage) -> Result<Option<PoseLandmarks>, CoreError> {
        Ok(self.0.clone())
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        ..ServerConfig::default()
    }
}

/// Build the full application router (same middleware stack as production)
/// around a fixed landmark source.
pub fn build_test_app(landmarks: Option<PoseLandmarks>) -> Router {
    let config = test_config();
    let analyzer = FrameAnalyzer::new(Arc::new(FixedSource(landmarks)), config.engine.clone());
    let state = AppState {
        config: Arc::new(config.clone()),
        analyzer: Arc::new(analyzer),
    };
    build_app_router(state, &config)
}

/// Upright seated subject: shoulders straight over hips, ear over shoulders.
pub fn upright_sitter() -> PoseLandmarks {
    let kp = |l, x, y| Keypoint::new(l, x, y, 0.95);
    PoseLandmarks::new([
        kp(Landmark::LeftShoulder, 0.45, 0.40),
        kp(Landmark::RightShoulder, 0.55, 0.40),
        kp(Landmark::LeftHip, 0.45, 0.70),
        kp(Landmark::RightHip, 0.55, 0.70),
        kp(Landmark::LeftEar, 0.50, 0.20),
    ])
}

/// Seated subject leaning forward 45 degrees with the head pushed out.
pub fn slouched_sitter() -> PoseLandmarks {
    let kp = |l, x, y| Keypoint::new(l, x, y, 0.95);
    PoseLandmarks::new([
        kp(Landmark::LeftShoulder, 0.65, 0.40),
        kp(Landmark::RightShoulder, 0.75, 0.40),
        kp(Landmark::LeftHip, 0.35, 0.70),
        kp(Landmark::RightHip, 0.45, 0.70),
        kp(Landmark::LeftEar, 0.90, 0.30),
    ])
}

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::new(8, 8)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A multipart form part.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
