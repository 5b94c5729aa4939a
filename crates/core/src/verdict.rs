//! Frame verdicts, posture status bands and scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rules::JointAngle;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_GOOD_FORM: &str = "Good Form";
pub const STATUS_NEEDS_IMPROVEMENT: &str = "Needs Improvement";
pub const STATUS_POOR_FORM: &str = "Poor Form";
pub const STATUS_ANALYSIS_ERROR: &str = "Analysis Error";

/// Classification of a frame or a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostureStatus {
    #[serde(rename = "Good Form")]
    GoodForm,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Poor Form")]
    PoorForm,
    /// No subject (or no measurable joint) was found. Distinct from a poor
    /// but detected posture.
    #[serde(rename = "Analysis Error")]
    AnalysisError,
}

impl PostureStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::GoodForm => STATUS_GOOD_FORM,
            Self::NeedsImprovement => STATUS_NEEDS_IMPROVEMENT,
            Self::PoorForm => STATUS_POOR_FORM,
            Self::AnalysisError => STATUS_ANALYSIS_ERROR,
        }
    }
}

impl fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Default number of issues at which the score reaches 0.
pub const DEFAULT_ISSUE_CEILING: u32 = 5;
/// Largest accepted ceiling; keeps the per-issue penalty at one point or more.
pub const MAX_ISSUE_CEILING: u32 = 100;
/// Default lowest score still classified as "Good Form".
pub const DEFAULT_GOOD_BAND: u8 = 85;
/// Default lowest score still classified as "Needs Improvement".
pub const DEFAULT_FAIR_BAND: u8 = 50;

/// Penalty and band configuration for turning issue counts into scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Issue count at which the score bottoms out at 0.
    pub issue_ceiling: u32,
    pub good_band: u8,
    pub fair_band: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            issue_ceiling: DEFAULT_ISSUE_CEILING,
            good_band: DEFAULT_GOOD_BAND,
            fair_band: DEFAULT_FAIR_BAND,
        }
    }
}

impl ScoringConfig {
    /// Points deducted per issue.
    pub fn penalty_per_issue(&self) -> f64 {
        100.0 / f64::from(self.issue_ceiling.max(1))
    }

    /// `max(0, 100 - k * issue_count)`, rounded to the nearest integer.
    ///
    /// 100 only for zero issues and non-increasing in `issue_count`.
    pub fn score(&self, issue_count: usize) -> u8 {
        if issue_count == 0 {
            return 100;
        }
        let raw = 100.0 - self.penalty_per_issue() * issue_count as f64;
        raw.round().clamp(0.0, 99.0) as u8
    }

    /// Status band for a detected frame's score.
    pub fn status(&self, score: u8) -> PostureStatus {
        if score >= self.good_band {
            PostureStatus::GoodForm
        } else if score >= self.fair_band {
            PostureStatus::NeedsImprovement
        } else {
            PostureStatus::PoorForm
        }
    }

    /// Check the bands are ordered and the ceiling is in `1..=MAX_ISSUE_CEILING`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.issue_ceiling == 0 || self.issue_ceiling > MAX_ISSUE_CEILING {
            return Err(CoreError::Validation(format!(
                "issue_ceiling must be between 1 and {MAX_ISSUE_CEILING}, got {}",
                self.issue_ceiling
            )));
        }
        if self.good_band > 100 || self.fair_band > self.good_band {
            return Err(CoreError::Validation(format!(
                "bands must satisfy fair_band ({}) <= good_band ({}) <= 100",
                self.fair_band, self.good_band
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

pub const ISSUE_NO_POSE: &str = "No pose detected";
pub const ISSUE_NO_JOINTS: &str = "Key body parts not visible";

/// A violated rule (or an unmeasurable joint) in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub message: String,
    /// Joint the issue refers to; `None` for frame-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joint: Option<JointAngle>,
    /// Measured angle that broke the rule, in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<f64>,
}

impl Issue {
    pub fn violation(joint: JointAngle, message: &str, measured: f64) -> Self {
        Self {
            message: message.to_string(),
            joint: Some(joint),
            measured: Some(measured),
        }
    }

    pub fn missing_joint(joint: JointAngle) -> Self {
        Self {
            message: format!("{} not visible - keep full body in frame", joint.label()),
            joint: Some(joint),
            measured: None,
        }
    }

    pub fn frame(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            joint: None,
            measured: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameVerdict
// ---------------------------------------------------------------------------

/// Classification result for one analyzed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameVerdict {
    status: PostureStatus,
    issues: Vec<Issue>,
    score: Option<u8>,
}

impl FrameVerdict {
    /// A verdict for a frame whose posture was measured.
    pub fn scored(issues: Vec<Issue>, scoring: &ScoringConfig) -> Self {
        let score = scoring.score(issues.len());
        Self {
            status: scoring.status(score),
            issues,
            score: Some(score),
        }
    }

    /// An "Analysis Error" verdict with no score.
    pub fn analysis_error(issue: Issue) -> Self {
        Self {
            status: PostureStatus::AnalysisError,
            issues: vec![issue],
            score: None,
        }
    }

    /// The verdict for a frame in which no subject was found.
    pub fn no_detection() -> Self {
        Self::analysis_error(Issue::frame(ISSUE_NO_POSE))
    }

    pub fn status(&self) -> PostureStatus {
        self.status
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn is_error(&self) -> bool {
        self.status == PostureStatus::AnalysisError
    }

    /// Issue texts in evaluation order.
    pub fn details(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }

    /// Wire form: `{status, score|null, details}`.
    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            status: self.status,
            score: self.score,
            details: self.details(),
        }
    }
}

/// Serializable single-frame result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub status: PostureStatus,
    pub score: Option<u8>,
    pub details: Vec<String>,
}
