//! Per-mode rule tables (joint-angle thresholds and issue texts).
//!
//! Rule tables are static, ordered data. Evaluation order is table order,
//! which is also the order issues appear in a verdict.

use serde::{Deserialize, Serialize};

use crate::keypoint::PairedLandmark;
use crate::mode::AnalysisMode;

// ---------------------------------------------------------------------------
// Joint angles
// ---------------------------------------------------------------------------

/// A named angle measured on the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointAngle {
    /// Angle at the knee between thigh and shin.
    KneeFlexion,
    /// Angle at the ankle between shin and foot; shrinks as the knee travels
    /// past the toes.
    KneeOverToe,
    /// Angle at the hip between torso and thigh.
    BackAngle,
    /// Ear-to-shoulder line deviation from vertical (forward head).
    NeckBend,
    /// Torso deviation from vertical.
    TorsoLean,
}

impl JointAngle {
    /// Human-readable label used in missing-joint issues.
    pub fn label(self) -> &'static str {
        match self {
            Self::KneeFlexion => "Knee angle",
            Self::KneeOverToe => "Shin angle",
            Self::BackAngle => "Back angle",
            Self::NeckBend => "Neck angle",
            Self::TorsoLean => "Torso angle",
        }
    }

    /// How this angle is derived from keypoints.
    pub fn definition(self) -> AngleDefinition {
        use PairedLandmark::*;
        use PointRef::*;

        match self {
            Self::KneeFlexion => AngleDefinition::Joint {
                vertex: Side(Knee),
                a: Side(Hip),
                b: Side(Ankle),
            },
            Self::KneeOverToe => AngleDefinition::Joint {
                vertex: Side(Ankle),
                a: Side(Knee),
                b: Side(FootIndex),
            },
            Self::BackAngle => AngleDefinition::Joint {
                vertex: Side(Hip),
                a: Side(Shoulder),
                b: Side(Knee),
            },
            Self::NeckBend => AngleDefinition::FromVertical {
                top: EitherSide(Ear),
                bottom: Midline(Shoulder),
            },
            Self::TorsoLean => AngleDefinition::FromVertical {
                top: Midline(Shoulder),
                bottom: Midline(Hip),
            },
        }
    }
}

/// Where a measurement point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRef {
    /// A paired landmark on the body side selected for the frame.
    Side(PairedLandmark),
    /// The left landmark if visible, else the right one.
    EitherSide(PairedLandmark),
    /// Midpoint of both sides when both are visible, else whichever is.
    Midline(PairedLandmark),
}

/// Geometric construction of a [`JointAngle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleDefinition {
    /// Included angle at `vertex` between rays to `a` and `b`.
    Joint {
        vertex: PointRef,
        a: PointRef,
        b: PointRef,
    },
    /// Angle of the `top -> bottom` segment from the downward vertical.
    FromVertical { top: PointRef, bottom: PointRef },
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Accepted interval for a measured angle, in degrees. Bounds are inclusive;
/// a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AcceptedRange {
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn contains(&self, degrees: f64) -> bool {
        self.min.map_or(true, |min| degrees >= min) && self.max.map_or(true, |max| degrees <= max)
    }
}

/// One threshold check: a joint, its accepted range and the issue emitted
/// when a measurement falls outside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub joint: JointAngle,
    pub range: AcceptedRange,
    pub issue: &'static str,
}

pub const ISSUE_KNEE_RANGE: &str = "Knee angle outside squat range";
pub const ISSUE_KNEE_OVER_TOE: &str = "Knee goes beyond toe";
pub const ISSUE_BACK_BENT: &str = "Back too bent";
pub const ISSUE_NECK_BEND: &str = "Neck bending forward";
pub const ISSUE_BACK_LEANING: &str = "Back is leaning";

pub const SQUAT_RULES: &[Rule] = &[
    Rule {
        joint: JointAngle::KneeFlexion,
        range: AcceptedRange::between(90.0, 160.0),
        issue: ISSUE_KNEE_RANGE,
    },
    Rule {
        joint: JointAngle::KneeOverToe,
        range: AcceptedRange::at_least(60.0),
        issue: ISSUE_KNEE_OVER_TOE,
    },
    Rule {
        joint: JointAngle::BackAngle,
        range: AcceptedRange::at_least(150.0),
        issue: ISSUE_BACK_BENT,
    },
];

pub const SITTING_RULES: &[Rule] = &[
    Rule {
        joint: JointAngle::NeckBend,
        range: AcceptedRange::at_most(30.0),
        issue: ISSUE_NECK_BEND,
    },
    Rule {
        joint: JointAngle::TorsoLean,
        range: AcceptedRange::at_most(15.0),
        issue: ISSUE_BACK_LEANING,
    },
];

/// Paired landmarks whose visibility decides which body side a squat frame
/// is measured on.
pub const SQUAT_SIDE_PARTS: &[PairedLandmark] = &[
    PairedLandmark::Shoulder,
    PairedLandmark::Hip,
    PairedLandmark::Knee,
    PairedLandmark::Ankle,
    PairedLandmark::FootIndex,
];

/// The ordered rule table for `mode`.
pub fn rule_table(mode: AnalysisMode) -> &'static [Rule] {
    match mode {
        AnalysisMode::Squat => SQUAT_RULES,
        AnalysisMode::Sitting => SITTING_RULES,
    }
}

/// Distinct joints measured for `mode`, in first-use order.
pub fn required_joints(mode: AnalysisMode) -> Vec<JointAngle> {
    let mut joints = Vec::new();
    for rule in rule_table(mode) {
        if !joints.contains(&rule.joint) {
            joints.push(rule.joint);
        }
    }
    joints
}
