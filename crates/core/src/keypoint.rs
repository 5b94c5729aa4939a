//! Body landmark identifiers and per-frame keypoint sets.
//!
//! Landmarks follow the 33-point body topology used by common single-person
//! pose estimators. A [`PoseLandmarks`] value is produced once per frame by a
//! [`LandmarkSource`](crate::landmarks::LandmarkSource) and is read-only from
//! then on.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// Anatomical landmark identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Landmark {
    /// All landmarks in model output order.
    pub const ALL: [Landmark; 33] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Snake-case wire name, e.g. `"left_hip"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }

    /// Parse a wire name. Accepts `-` as well as `_` separators and ignores case.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.iter().copied().find(|l| l.name() == normalized)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Body sides
// ---------------------------------------------------------------------------

/// Left or right half of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Left,
    Right,
}

/// A paired landmark that exists on both sides of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedLandmark {
    Ear,
    Shoulder,
    Hip,
    Knee,
    Ankle,
    FootIndex,
}

impl PairedLandmark {
    /// Resolve to the concrete landmark on `side`.
    pub fn on(self, side: BodySide) -> Landmark {
        match (self, side) {
            (Self::Ear, BodySide::Left) => Landmark::LeftEar,
            (Self::Ear, BodySide::Right) => Landmark::RightEar,
            (Self::Shoulder, BodySide::Left) => Landmark::LeftShoulder,
            (Self::Shoulder, BodySide::Right) => Landmark::RightShoulder,
            (Self::Hip, BodySide::Left) => Landmark::LeftHip,
            (Self::Hip, BodySide::Right) => Landmark::RightHip,
            (Self::Knee, BodySide::Left) => Landmark::LeftKnee,
            (Self::Knee, BodySide::Right) => Landmark::RightKnee,
            (Self::Ankle, BodySide::Left) => Landmark::LeftAnkle,
            (Self::Ankle, BodySide::Right) => Landmark::RightAnkle,
            (Self::FootIndex, BodySide::Left) => Landmark::LeftFootIndex,
            (Self::FootIndex, BodySide::Right) => Landmark::RightFootIndex,
        }
    }
}

// ---------------------------------------------------------------------------
// Keypoint
// ---------------------------------------------------------------------------

/// A detected landmark position with its visibility score.
///
/// `x`/`y` are normalized image coordinates (or pixels, as long as a frame
/// uses one convention throughout). `z` is relative depth when the backend
/// provides it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub landmark: Landmark,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// 0 = not visible, 1 = fully visible.
    pub visibility: f64,
}

impl Keypoint {
    pub fn new(landmark: Landmark, x: f64, y: f64, visibility: f64) -> Self {
        Self {
            landmark,
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn with_depth(landmark: Landmark, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            landmark,
            x,
            y,
            z: Some(z),
            visibility,
        }
    }

    /// Whether this keypoint is confident enough to take part in a measurement.
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility >= min_visibility
    }
}

// ---------------------------------------------------------------------------
// PoseLandmarks
// ---------------------------------------------------------------------------

/// The keypoints detected for a single subject in a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseLandmarks {
    points: HashMap<Landmark, Keypoint>,
}

impl PoseLandmarks {
    /// Build from detected keypoints. A later duplicate of the same landmark
    /// replaces the earlier one.
    pub fn new(keypoints: impl IntoIterator<Item = Keypoint>) -> Self {
        Self {
            points: keypoints.into_iter().map(|k| (k.landmark, k)).collect(),
        }
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.points.get(&landmark)
    }

    /// The keypoint for `landmark`, only if its visibility meets the threshold.
    pub fn visible(&self, landmark: Landmark, min_visibility: f64) -> Option<&Keypoint> {
        self.get(landmark).filter(|k| k.is_visible(min_visibility))
    }

    /// Summed visibility of `parts` on `side`; absent landmarks count as 0.
    pub fn side_visibility(&self, side: BodySide, parts: &[PairedLandmark]) -> f64 {
        parts
            .iter()
            .filter_map(|p| self.get(p.on(side)))
            .map(|k| k.visibility)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves_back() {
        for landmark in Landmark::ALL {
            assert_eq!(Landmark::from_name(landmark.name()), Some(landmark));
        }
    }

    #[test]
    fn from_name_is_lenient() {
        assert_eq!(Landmark::from_name("left_hip"), Some(Landmark::LeftHip));
        assert_eq!(Landmark::from_name("Right-Knee"), Some(Landmark::RightKnee));
        assert_eq!(Landmark::from_name(" nose "), Some(Landmark::Nose));
        assert_eq!(Landmark::from_name("tail"), None);
    }

    #[test]
    fn visible_filters_by_threshold() {
        let pose = PoseLandmarks::new([
            Keypoint::new(Landmark::LeftHip, 0.5, 0.5, 0.9),
            Keypoint::new(Landmark::RightHip, 0.6, 0.5, 0.2),
        ]);
        assert!(pose.visible(Landmark::LeftHip, 0.5).is_some());
        assert!(pose.visible(Landmark::RightHip, 0.5).is_none());
        assert!(pose.visible(Landmark::Nose, 0.5).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let kp = Keypoint::new(Landmark::Nose, 0.0, 0.0, 0.5);
        assert!(kp.is_visible(0.5));
    }

    #[test]
    fn side_visibility_sums_present_parts() {
        let pose = PoseLandmarks::new([
            Keypoint::new(Landmark::LeftKnee, 0.0, 0.0, 0.8),
            Keypoint::new(Landmark::LeftHip, 0.0, 0.0, 0.7),
            Keypoint::new(Landmark::RightKnee, 0.0, 0.0, 0.3),
        ]);
        let parts = [PairedLandmark::Knee, PairedLandmark::Hip];
        assert!((pose.side_visibility(BodySide::Left, &parts) - 1.5).abs() < 1e-9);
        assert!((pose.side_visibility(BodySide::Right, &parts) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let pose = PoseLandmarks::new([
            Keypoint::new(Landmark::Nose, 0.1, 0.1, 0.4),
            Keypoint::new(Landmark::Nose, 0.2, 0.2, 0.9),
        ]);
        assert_eq!(pose.len(), 1);
        assert!((pose.get(Landmark::Nose).unwrap().x - 0.2).abs() < 1e-9);
    }
}
