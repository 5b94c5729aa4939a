//! [`LandmarkSource`] backed by the pose-estimation service.

use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use poslyzer_core::keypoint::PoseLandmarks;
use poslyzer_core::{CoreError, LandmarkSource};

use crate::api::{PoseApiError, PoseServiceApi};

pub struct PoseServiceSource {
    api: PoseServiceApi,
}

impl PoseServiceSource {
    pub fn new(api: PoseServiceApi) -> Self {
        Self { api }
    }

    pub fn from_url(api_url: impl Into<String>) -> Self {
        Self::new(PoseServiceApi::new(api_url))
    }
}

/// PNG-encode a frame for upload.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

/// PNG-encode a frame on the blocking pool.
pub async fn encode_png_blocking(image: RgbImage) -> Result<Vec<u8>, CoreError> {
    tokio::task::spawn_blocking(move || encode_png(&image))
        .await
        .map_err(|e| CoreError::Internal(format!("PNG encoding task failed: {e}")))?
}

impl From<PoseApiError> for CoreError {
    fn from(err: PoseApiError) -> Self {
        CoreError::Internal(format!("pose service: {err}"))
    }
}

#[async_trait]
impl LandmarkSource for PoseServiceSource {
    async fn detect(&self, image: &RgbImage) -> Result<Option<PoseLandmarks>, CoreError> {
        let png = encode_png_blocking(image.clone()).await?;
        let response = self.api.detect(png).await.map_err(|e| {
            tracing::warn!(url = %self.api.api_url(), error = %e, "Pose service request failed");
            CoreError::from(e)
        })?;
        Ok(response.into_landmarks())
    }

    fn name(&self) -> &str {
        "pose-service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn encodes_png_signature() {
        let png = encode_png(&RgbImage::new(2, 2)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn blocking_encode_matches_inline_encode() {
        let mut image = RgbImage::new(4, 3);
        image.put_pixel(1, 2, image::Rgb([200, 10, 30]));
        let blocking = encode_png_blocking(image.clone()).await.unwrap();
        assert_eq!(blocking, encode_png(&image).unwrap());
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let source = PoseServiceSource::from_url("http://127.0.0.1:9");
        let result = source.detect(&RgbImage::new(2, 2)).await;
        assert_matches!(result, Err(CoreError::Internal(_)));
    }
}
