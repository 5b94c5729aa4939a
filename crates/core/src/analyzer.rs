//! Single-frame analysis: landmark source, angles, rules.

use std::sync::Arc;

use image::RgbImage;

use crate::angles::{self, AngleSet};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::evaluator::evaluate;
use crate::keypoint::PoseLandmarks;
use crate::landmarks::LandmarkSource;
use crate::mode::AnalysisMode;
use crate::verdict::FrameVerdict;

/// Decode an encoded still image (PNG, JPEG, WebP) into an RGB buffer.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::InvalidInput("image is empty".to_string()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| CoreError::InvalidInput(format!("unreadable image: {e}")))?;
    Ok(image.to_rgb8())
}

/// Runs one frame through detection, measurement and evaluation.
///
/// Stateless between calls; cheap to share behind an `Arc`.
pub struct FrameAnalyzer {
    source: Arc<dyn LandmarkSource>,
    config: EngineConfig,
}

impl FrameAnalyzer {
    pub fn new(source: Arc<dyn LandmarkSource>, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one frame. Never fails: no detection, a backend error or a
    /// detection timeout all produce an "Analysis Error" verdict.
    pub async fn analyze_frame(&self, image: &RgbImage, mode: AnalysisMode) -> FrameVerdict {
        match self.detect(image).await {
            Ok(landmarks) => self.analyze_landmarks(&landmarks, mode),
            Err(CoreError::NoDetection) => {
                tracing::debug!(%mode, "No pose detected in frame");
                FrameVerdict::no_detection()
            }
            Err(e) => {
                tracing::warn!(
                    source = self.source.name(),
                    %mode,
                    error = %e,
                    "Landmark detection failed, treating frame as undetected",
                );
                FrameVerdict::no_detection()
            }
        }
    }

    /// Evaluate already-detected landmarks.
    pub fn analyze_landmarks(&self, landmarks: &PoseLandmarks, mode: AnalysisMode) -> FrameVerdict {
        let angles = self.measure(landmarks, mode);
        let verdict = evaluate(mode, &angles, &self.config.scoring);
        tracing::trace!(
            %mode,
            status = %verdict.status(),
            issues = verdict.issues().len(),
            "Frame evaluated",
        );
        verdict
    }

    /// Keypoints to angles for `mode`.
    pub fn measure(&self, landmarks: &PoseLandmarks, mode: AnalysisMode) -> AngleSet {
        angles::measure(landmarks, mode, self.config.measure_options())
    }

    async fn detect(&self, image: &RgbImage) -> Result<PoseLandmarks, CoreError> {
        let timeout = self.config.detection_timeout;
        match tokio::time::timeout(timeout, self.source.detect(image)).await {
            Ok(Ok(Some(landmarks))) if !landmarks.is_empty() => Ok(landmarks),
            Ok(Ok(_)) => Err(CoreError::NoDetection),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CoreError::Internal(format!(
                "detection timed out after {} ms",
                timeout.as_millis()
            ))),
        }
    }
}
