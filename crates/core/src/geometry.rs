//! Joint-angle geometry.
//!
//! Pure functions over [`Keypoint`] coordinates. Callers are responsible for
//! only passing keypoints that met the visibility threshold; the functions
//! here assume geometrically meaningful input and report degenerate cases
//! (zero-length segments) as `None` rather than failing.

use crate::keypoint::Keypoint;

/// Segments shorter than this are treated as degenerate.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

type Vec3 = [f64; 3];

fn sub(a: &Keypoint, b: &Keypoint, depth: bool) -> Vec3 {
    let dz = if depth {
        a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0)
    } else {
        0.0
    };
    [a.x - b.x, a.y - b.y, dz]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Angle in degrees between two vectors, in `[0, 180]`.
///
/// Returns `None` if either vector is shorter than [`MIN_SEGMENT_LENGTH`].
pub fn angle_between(u: Vec3, v: Vec3) -> Option<f64> {
    let (nu, nv) = (norm(u), norm(v));
    if nu < MIN_SEGMENT_LENGTH || nv < MIN_SEGMENT_LENGTH {
        return None;
    }
    // Rounding can push the cosine just outside [-1, 1].
    let cos = (dot(u, v) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Included angle at `vertex` between the rays to `a` and `b`, in 2D.
pub fn compute_angle(vertex: &Keypoint, a: &Keypoint, b: &Keypoint) -> Option<f64> {
    angle_between(sub(a, vertex, false), sub(b, vertex, false))
}

/// Like [`compute_angle`] but includes depth when all three keypoints carry a
/// `z` coordinate. Falls back to 2D otherwise.
pub fn compute_angle_3d(vertex: &Keypoint, a: &Keypoint, b: &Keypoint) -> Option<f64> {
    let depth = vertex.z.is_some() && a.z.is_some() && b.z.is_some();
    angle_between(sub(a, vertex, depth), sub(b, vertex, depth))
}

/// Angle between the `top -> bottom` segment and the downward image vertical.
///
/// 0 means `bottom` sits straight below `top` (upright torso).
pub fn angle_from_vertical(top: &Keypoint, bottom: &Keypoint) -> Option<f64> {
    angle_between(sub(bottom, top, false), [0.0, 1.0, 0.0])
}

/// A synthetic keypoint halfway between `a` and `b`.
///
/// Keeps `a`'s landmark identity and takes the lower of the two visibilities,
/// so a midpoint is never more trustworthy than its weakest input.
pub fn midpoint(a: &Keypoint, b: &Keypoint) -> Keypoint {
    let z = match (a.z, b.z) {
        (Some(za), Some(zb)) => Some((za + zb) / 2.0),
        _ => None,
    };
    Keypoint {
        landmark: a.landmark,
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        z,
        visibility: a.visibility.min(b.visibility),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::Landmark;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(Landmark::Nose, x, y, 1.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn right_angle() {
        let angle = compute_angle(&kp(0.0, 0.0), &kp(1.0, 0.0), &kp(0.0, 1.0)).unwrap();
        assert!(close(angle, 90.0));
    }

    #[test]
    fn straight_line_is_180() {
        let angle = compute_angle(&kp(0.5, 0.5), &kp(0.5, 0.2), &kp(0.5, 0.9)).unwrap();
        assert!(close(angle, 180.0));
    }

    #[test]
    fn coincident_rays_are_0() {
        let angle = compute_angle(&kp(0.0, 0.0), &kp(1.0, 1.0), &kp(2.0, 2.0)).unwrap();
        assert!(close(angle, 0.0));
    }

    #[test]
    fn zero_length_ray_is_undefined() {
        assert!(compute_angle(&kp(0.3, 0.3), &kp(0.3, 0.3), &kp(0.9, 0.1)).is_none());
    }

    #[test]
    fn angle_is_symmetric_and_in_range() {
        let points = [
            (0.1, 0.2),
            (0.9, 0.4),
            (0.5, 0.5),
            (0.3, 0.95),
            (0.72, 0.05),
            (0.0, 1.0),
        ];
        for &v in &points {
            for &a in &points {
                for &b in &points {
                    let (v, a, b) = (kp(v.0, v.1), kp(a.0, a.1), kp(b.0, b.1));
                    let ab = compute_angle(&v, &a, &b);
                    let ba = compute_angle(&v, &b, &a);
                    match (ab, ba) {
                        (Some(x), Some(y)) => {
                            assert!((0.0..=180.0).contains(&x));
                            assert!(close(x, y));
                        }
                        (None, None) => {}
                        other => panic!("asymmetric definedness: {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn depth_used_only_when_all_points_have_it() {
        let v = Keypoint::with_depth(Landmark::LeftKnee, 0.0, 0.0, 0.0, 1.0);
        let a = Keypoint::with_depth(Landmark::LeftHip, 1.0, 0.0, 0.0, 1.0);
        let b = Keypoint::with_depth(Landmark::LeftAnkle, 0.0, 0.0, 1.0, 1.0);
        // Projected to 2D `b` collapses onto the vertex.
        assert!(compute_angle(&v, &a, &b).is_none());
        assert!(close(compute_angle_3d(&v, &a, &b).unwrap(), 90.0));

        let flat_b = Keypoint::new(Landmark::LeftAnkle, 0.0, 1.0, 1.0);
        assert!(close(compute_angle_3d(&v, &a, &flat_b).unwrap(), 90.0));
    }

    #[test]
    fn vertical_torso_is_upright() {
        let shoulder = kp(0.5, 0.3);
        let hip = kp(0.5, 0.6);
        assert!(close(angle_from_vertical(&shoulder, &hip).unwrap(), 0.0));
    }

    #[test]
    fn leaning_torso_measures_from_vertical() {
        let shoulder = kp(0.7, 0.3);
        let hip = kp(0.4, 0.6);
        assert!(close(angle_from_vertical(&shoulder, &hip).unwrap(), 45.0));
    }

    #[test]
    fn midpoint_takes_weaker_visibility() {
        let a = Keypoint::new(Landmark::LeftShoulder, 0.2, 0.4, 0.9);
        let b = Keypoint::new(Landmark::RightShoulder, 0.6, 0.2, 0.6);
        let m = midpoint(&a, &b);
        assert_eq!(m.landmark, Landmark::LeftShoulder);
        assert!(close(m.x, 0.4));
        assert!(close(m.y, 0.3));
        assert!(close(m.visibility, 0.6));
        assert!(m.z.is_none());
    }
}
