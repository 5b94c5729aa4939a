//! Posture-analysis engine.
//!
//! Frame → landmarks → joint angles → rule evaluation → verdict, and for
//! videos, a sampled stream of verdicts folded into a session report. No
//! HTTP or transport concerns live here.

pub mod analyzer;
pub mod angles;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod ffmpeg;
pub mod geometry;
pub mod keypoint;
pub mod landmarks;
pub mod mode;
pub mod rules;
pub mod session;
pub mod verdict;

pub use analyzer::{decode_image, FrameAnalyzer};
pub use config::{EngineConfig, SamplingPolicy};
pub use error::CoreError;
pub use landmarks::LandmarkSource;
pub use mode::AnalysisMode;
pub use session::{analyze_video, SessionReport};
pub use verdict::{FrameSummary, FrameVerdict, PostureStatus};
