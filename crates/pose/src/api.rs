//! REST API client for the pose-estimation service.
//!
//! The service exposes a single `POST /detect` endpoint that accepts a PNG
//! frame as multipart field `image` and answers with the landmarks of the
//! most prominent person, or `null` when nobody is in frame.

use poslyzer_core::keypoint::{Keypoint, Landmark, PoseLandmarks};
use serde::Deserialize;

/// HTTP client for a single pose-estimation service instance.
pub struct PoseServiceApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response body of `POST /detect`.
#[derive(Debug, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub landmarks: Option<Vec<WireLandmark>>,
}

/// One landmark as sent by the service.
#[derive(Debug, Deserialize)]
pub struct WireLandmark {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
    pub visibility: f64,
}

/// Errors from the pose service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum PoseApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Pose service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl DetectResponse {
    /// Convert to engine landmarks. Unknown landmark names are skipped; an
    /// absent or empty list is no detection.
    pub fn into_landmarks(self) -> Option<PoseLandmarks> {
        let points: Vec<Keypoint> = self
            .landmarks?
            .into_iter()
            .filter_map(|wire| {
                let Some(landmark) = Landmark::from_name(&wire.name) else {
                    tracing::trace!(name = %wire.name, "Ignoring unknown landmark");
                    return None;
                };
                Some(Keypoint {
                    landmark,
                    x: wire.x,
                    y: wire.y,
                    z: wire.z,
                    visibility: wire.visibility,
                })
            })
            .collect();

        if points.is_empty() {
            None
        } else {
            Some(PoseLandmarks::new(points))
        }
    }
}

impl PoseServiceApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8500`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send a PNG-encoded frame to `POST /detect`.
    pub async fn detect(&self, png: Vec<u8>) -> Result<DetectResponse, PoseApiError> {
        let part = reqwest::multipart::Part::bytes(png)
            .file_name("frame.png")
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(format!("{}/detect", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PoseApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PoseApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PoseApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
