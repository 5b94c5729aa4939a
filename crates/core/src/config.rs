//! Engine configuration.

use std::time::Duration;

use crate::angles::MeasureOptions;
use crate::error::CoreError;
use crate::verdict::ScoringConfig;

/// Default minimum keypoint visibility for a keypoint to be used.
pub const DEFAULT_MIN_VISIBILITY: f64 = 0.5;
/// Default sampling stride: analyze every 30th frame.
pub const DEFAULT_FRAME_INTERVAL: u32 = 30;
/// Default number of ranked issues kept in a session report.
pub const DEFAULT_TOP_ISSUES: usize = 5;
/// Default number of frames analyzed concurrently.
pub const DEFAULT_MAX_PARALLEL_FRAMES: usize = 4;
/// Default upper bound on one landmark-detection call.
pub const DEFAULT_DETECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Which frames of a video are run through the analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingPolicy {
    /// Analyze frame indices `0, n, 2n, ...`.
    EveryNth(u32),
    /// Aim for roughly `r` analyzed frames per second of video.
    TargetRate(f64),
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::EveryNth(DEFAULT_FRAME_INTERVAL)
    }
}

impl SamplingPolicy {
    /// Frame stride for a video at `fps`. Always at least 1.
    ///
    /// A target rate against an unknown (non-positive) fps analyzes every
    /// frame.
    pub fn stride(&self, fps: f64) -> u64 {
        match *self {
            Self::EveryNth(n) => u64::from(n.max(1)),
            Self::TargetRate(rate) => {
                if fps <= 0.0 || rate <= 0.0 {
                    return 1;
                }
                ((fps / rate).round() as u64).max(1)
            }
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        match *self {
            Self::EveryNth(0) => Err(CoreError::Validation(
                "frame interval must be >= 1".to_string(),
            )),
            Self::TargetRate(rate) if !(rate.is_finite() && rate > 0.0) => Err(
                CoreError::Validation(format!("target analysis fps must be > 0, got {rate}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Tunables for the posture-analysis engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Keypoints below this visibility are treated as not detected.
    pub min_visibility: f64,
    /// Use depth (`z`) in joint angles when every keypoint carries it.
    pub use_depth: bool,
    pub sampling: SamplingPolicy,
    /// Length of `most_common_issues` in session reports.
    pub top_issues: usize,
    pub max_parallel_frames: usize,
    /// A landmark source call that takes longer counts as no detection.
    pub detection_timeout: Duration,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_visibility: DEFAULT_MIN_VISIBILITY,
            use_depth: false,
            sampling: SamplingPolicy::default(),
            top_issues: DEFAULT_TOP_ISSUES,
            max_parallel_frames: DEFAULT_MAX_PARALLEL_FRAMES,
            detection_timeout: DEFAULT_DETECTION_TIMEOUT,
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(CoreError::Validation(format!(
                "min_visibility must be within [0, 1], got {}",
                self.min_visibility
            )));
        }
        if self.max_parallel_frames == 0 {
            return Err(CoreError::Validation(
                "max_parallel_frames must be >= 1".to_string(),
            ));
        }
        if self.detection_timeout.is_zero() {
            return Err(CoreError::Validation(
                "detection_timeout must be > 0".to_string(),
            ));
        }
        self.sampling.validate()?;
        self.scoring.validate()
    }

    pub fn measure_options(&self) -> MeasureOptions {
        MeasureOptions {
            min_visibility: self.min_visibility,
            use_depth: self.use_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling, SamplingPolicy::EveryNth(30));
        assert_eq!(config.top_issues, 5);
    }

    #[test]
    fn every_nth_stride() {
        assert_eq!(SamplingPolicy::EveryNth(30).stride(24.0), 30);
        assert_eq!(SamplingPolicy::EveryNth(0).stride(24.0), 1);
    }

    #[test]
    fn target_rate_stride() {
        assert_eq!(SamplingPolicy::TargetRate(5.0).stride(30.0), 6);
        assert_eq!(SamplingPolicy::TargetRate(10.0).stride(24.0), 2);
        assert_eq!(SamplingPolicy::TargetRate(60.0).stride(30.0), 1);
        assert_eq!(SamplingPolicy::TargetRate(5.0).stride(0.0), 1);
    }

    #[test]
    fn rejects_out_of_range_visibility() {
        let config = EngineConfig {
            min_visibility: 1.5,
            ..EngineConfig::default()
        };
        assert_matches!(config.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_zero_parallelism_and_interval() {
        let config = EngineConfig {
            max_parallel_frames: 0,
            ..EngineConfig::default()
        };
        assert_matches!(config.validate(), Err(CoreError::Validation(_)));

        let config = EngineConfig {
            sampling: SamplingPolicy::EveryNth(0),
            ..EngineConfig::default()
        };
        assert_matches!(config.validate(), Err(CoreError::Validation(_)));

        let config = EngineConfig {
            sampling: SamplingPolicy::TargetRate(-1.0),
            ..EngineConfig::default()
        };
        assert_matches!(config.validate(), Err(CoreError::Validation(_)));
    }
}
