//! Geometry helpers shared by the kinematics and the optimizer.
//!
//! Orientations are unit quaternions stored in the conformation vector in
//! (w, x, y, z) order. The helpers here are the only place that order is
//! encoded, so the random initializer, the evaluator, the line search, and
//! the result composer cannot drift apart.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// Builds the rotation of `angle` radians about a unit `axis`.
pub fn axis_angle_to_quat(axis: &Unit<Vector3<f64>>, angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(axis, angle)
}

/// Builds the rotation encoded by a rotation vector, whose norm is the
/// rotation angle in radians. The zero vector maps to the identity.
pub fn rotation_vector_to_quat(v: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_scaled_axis(*v)
}

/// Reassembles a unit quaternion from its (w, x, y, z) components.
///
/// The components are renormalized, so a conformation vector that drifted
/// slightly off the unit sphere is accepted.
pub fn quat_from_wxyz(w: f64, x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
}

/// Splits a unit quaternion into its (w, x, y, z) components.
pub fn quat_wxyz(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Normalizes four reals onto the unit 3-sphere. Used to draw a uniformly
/// random orientation from four iid uniform samples. A degenerate all-zero
/// draw falls back to the identity orientation.
pub fn normalize4(v: [f64; 4]) -> [f64; 4] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2] + v[3] * v[3]).sqrt();
    if norm > 0.0 {
        [v[0] / norm, v[1] / norm, v[2] / norm, v[3] / norm]
    } else {
        [1.0, 0.0, 0.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_angle_half_turn() {
        let axis = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let q = axis_angle_to_quat(&axis, std::f64::consts::PI);
        let rotated = q.to_rotation_matrix() * Vector3::new(1.0, 0.0, 0.0);
        assert!((rotated - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_vector_zero_is_identity() {
        let q = rotation_vector_to_quat(&Vector3::zeros());
        assert!((q.angle()).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_vector_matches_axis_angle() {
        let axis = Unit::new_normalize(Vector3::new(1.0, 2.0, -0.5));
        let angle = 0.73;
        let qa = axis_angle_to_quat(&axis, angle);
        let qb = rotation_vector_to_quat(&(axis.into_inner() * angle));
        assert!((qa.w - qb.w).abs() < 1e-12);
        assert!((qa.i - qb.i).abs() < 1e-12);
        assert!((qa.j - qb.j).abs() < 1e-12);
        assert!((qa.k - qb.k).abs() < 1e-12);
    }

    #[test]
    fn test_wxyz_round_trip() {
        let q = quat_from_wxyz(0.5, 0.5, 0.5, 0.5);
        let [w, x, y, z] = quat_wxyz(&q);
        assert!((w - 0.5).abs() < 1e-12);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
        assert!((z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize4_unit_norm() {
        let v = normalize4([0.3, -1.2, 0.8, 2.0]);
        let norm_sqr: f64 = v.iter().map(|c| c * c).sum();
        assert!((norm_sqr - 1.0).abs() < 1e-12);
        assert_eq!(normalize4([0.0; 4]), [1.0, 0.0, 0.0, 0.0]);
    }
}
