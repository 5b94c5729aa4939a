//! Keypoints to joint-angle measurements.
//!
//! Every joint required by a mode produces exactly one [`AngleMeasurement`].
//! A measurement is invalid when any contributing keypoint is below the
//! visibility threshold or the geometry is degenerate; invalid measurements
//! carry no value at all, so nothing downstream can mistake them for a pass.

use serde::Serialize;

use crate::geometry::{angle_from_vertical, compute_angle, compute_angle_3d, midpoint};
use crate::keypoint::{BodySide, Keypoint, PairedLandmark, PoseLandmarks};
use crate::mode::AnalysisMode;
use crate::rules::{required_joints, AngleDefinition, JointAngle, PointRef, SQUAT_SIDE_PARTS};

/// A derived angle for one joint in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleMeasurement {
    pub joint: JointAngle,
    /// Degrees in `[0, 180]`; `None` when the measurement is invalid.
    pub degrees: Option<f64>,
}

impl AngleMeasurement {
    pub fn valid(joint: JointAngle, degrees: f64) -> Self {
        Self {
            joint,
            degrees: Some(degrees),
        }
    }

    pub fn invalid(joint: JointAngle) -> Self {
        Self {
            joint,
            degrees: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.degrees.is_some()
    }
}

/// All angle measurements taken for a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AngleSet {
    measurements: Vec<AngleMeasurement>,
    /// Body side used for side-relative joints, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<BodySide>,
}

impl AngleSet {
    pub fn new(measurements: Vec<AngleMeasurement>) -> Self {
        Self {
            measurements,
            side: None,
        }
    }

    pub fn with_side(mut self, side: BodySide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn side(&self) -> Option<BodySide> {
        self.side
    }

    pub fn get(&self, joint: JointAngle) -> Option<&AngleMeasurement> {
        self.measurements.iter().find(|m| m.joint == joint)
    }

    /// The measured value for `joint`, only if the measurement is valid.
    pub fn degrees(&self, joint: JointAngle) -> Option<f64> {
        self.get(joint).and_then(|m| m.degrees)
    }

    pub fn has_valid(&self) -> bool {
        self.measurements.iter().any(AngleMeasurement::is_valid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AngleMeasurement> {
        self.measurements.iter()
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

/// Options controlling how keypoints become angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureOptions {
    /// Keypoints below this visibility do not take part in any measurement.
    pub min_visibility: f64,
    /// Use the `z` coordinate when every keypoint of a joint has one.
    pub use_depth: bool,
}

/// Pick the body side with the higher summed visibility over `parts`.
/// Ties go to the left side.
pub fn select_side(landmarks: &PoseLandmarks, parts: &[PairedLandmark]) -> BodySide {
    let left = landmarks.side_visibility(BodySide::Left, parts);
    let right = landmarks.side_visibility(BodySide::Right, parts);
    if right > left {
        BodySide::Right
    } else {
        BodySide::Left
    }
}

/// Measure every joint `mode` needs.
pub fn measure(landmarks: &PoseLandmarks, mode: AnalysisMode, opts: MeasureOptions) -> AngleSet {
    let side = match mode {
        AnalysisMode::Squat => Some(select_side(landmarks, SQUAT_SIDE_PARTS)),
        AnalysisMode::Sitting => None,
    };

    let measurements = required_joints(mode)
        .into_iter()
        .map(|joint| match measure_joint(joint, landmarks, side, opts) {
            Some(degrees) => AngleMeasurement::valid(joint, degrees),
            None => AngleMeasurement::invalid(joint),
        })
        .collect();

    let set = AngleSet::new(measurements);
    match side {
        Some(side) => set.with_side(side),
        None => set,
    }
}

fn measure_joint(
    joint: JointAngle,
    landmarks: &PoseLandmarks,
    side: Option<BodySide>,
    opts: MeasureOptions,
) -> Option<f64> {
    let point = |p: PointRef| resolve(p, landmarks, side, opts.min_visibility);

    match joint.definition() {
        AngleDefinition::Joint { vertex, a, b } => {
            let (vertex, a, b) = (point(vertex)?, point(a)?, point(b)?);
            if opts.use_depth {
                compute_angle_3d(&vertex, &a, &b)
            } else {
                compute_angle(&vertex, &a, &b)
            }
        }
        AngleDefinition::FromVertical { top, bottom } => {
            angle_from_vertical(&point(top)?, &point(bottom)?)
        }
    }
}

fn resolve(
    point: PointRef,
    landmarks: &PoseLandmarks,
    side: Option<BodySide>,
    min_visibility: f64,
) -> Option<Keypoint> {
    let visible = |l| landmarks.visible(l, min_visibility).copied();

    match point {
        PointRef::Side(part) => visible(part.on(side.unwrap_or(BodySide::Left))),
        PointRef::EitherSide(part) => {
            visible(part.on(BodySide::Left)).or_else(|| visible(part.on(BodySide::Right)))
        }
        PointRef::Midline(part) => {
            match (visible(part.on(BodySide::Left)), visible(part.on(BodySide::Right))) {
                (Some(l), Some(r)) => Some(midpoint(&l, &r)),
                (Some(one), None) | (None, Some(one)) => Some(one),
                (None, None) => None,
            }
        }
    }
}
