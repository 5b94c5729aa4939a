//! The landmark-detection seam.

use async_trait::async_trait;
use image::RgbImage;

use crate::error::CoreError;
use crate::keypoint::PoseLandmarks;

/// A pose-estimation backend.
///
/// Implementations return `Ok(None)` when no subject is found. Errors are
/// reserved for backend failures (unreachable service, malformed response);
/// the frame analyzer treats both the same way, as "no detection".
#[async_trait]
pub trait LandmarkSource: Send + Sync {
    async fn detect(&self, image: &RgbImage) -> Result<Option<PoseLandmarks>, CoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "landmark-source"
    }
}
