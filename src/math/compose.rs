//! Matrix composition and inverse composition
//!
//! `compose` builds `T * R * S`. `decompose_local_from_world` is its partial
//! inverse against a parent: given a child's world values and the parent's
//! world state it recovers the child's parent-relative values.

use std::fmt;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Quaternions shorter than this (squared) cannot be normalized meaningfully.
const MIN_ROTATION_LENGTH_SQUARED: f32 = 1e-12;

/// Build `T(position) * R(rotation) * S(scale)`.
#[must_use]
#[inline]
pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Parent-relative values recovered from a world-space pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent, normalized
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
}

/// A parent scale with a zero (or non-finite) component, which makes the
/// inverse composition undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateScale {
    /// The offending parent scale
    pub scale: Vec3,
}

impl fmt::Display for DegenerateScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "degenerate parent scale {}", self.scale)
    }
}

impl std::error::Error for DegenerateScale {}

/// Recover a child's local values from its world values and its parent's
/// world state.
///
/// The position goes through the inverse of the full parent matrix, the
/// rotation through the inverse parent rotation, and the scale is divided
/// component-wise.
///
/// # Errors
///
/// Returns [`DegenerateScale`] if any component of `parent_scale` is zero or
/// not finite. Nothing is computed in that case.
pub fn decompose_local_from_world(
    child_position: Vec3,
    child_rotation: Quat,
    child_scale: Vec3,
    parent_matrix: Mat4,
    parent_rotation: Quat,
    parent_scale: Vec3,
) -> Result<LocalPose, DegenerateScale> {
    if !parent_scale.is_finite() || parent_scale.cmpeq(Vec3::ZERO).any() {
        return Err(DegenerateScale {
            scale: parent_scale,
        });
    }

    let position = parent_matrix.inverse().transform_point3(child_position);
    let rotation = sanitize_rotation(sanitize_rotation(parent_rotation).conjugate() * child_rotation);
    let scale = child_scale / parent_scale;

    Ok(LocalPose {
        position,
        rotation,
        scale,
    })
}

/// Normalize a rotation that may have drifted.
///
/// Non-finite or near-zero quaternions collapse to identity rather than
/// producing NaN downstream.
#[must_use]
pub fn sanitize_rotation(rotation: Quat) -> Quat {
    let length_squared = rotation.length_squared();
    if !length_squared.is_finite() || length_squared < MIN_ROTATION_LENGTH_SQUARED {
        return Quat::IDENTITY;
    }
    rotation / length_squared.sqrt()
}

/// Build a rotation from XYZ Euler angles in degrees.
#[must_use]
pub fn quat_from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Extract XYZ Euler angles in degrees.
#[must_use]
pub fn euler_degrees_from_quat(rotation: Quat) -> Vec3 {
    let (x, y, z) = sanitize_rotation(rotation).to_euler(EulerRot::XYZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_compose_translation_only() {
        let matrix = compose(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
        assert_eq!(matrix.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_compose_scale_applies_before_rotation() {
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let matrix = compose(Vec3::ZERO, rotation, Vec3::new(2.0, 1.0, 1.0));

        // Local X is stretched first, then rotated onto Y
        let point = matrix.transform_point3(Vec3::X);
        assert!((point - Vec3::new(0.0, 2.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_decompose_recovers_local_values() {
        let parent_position = Vec3::new(3.0, -1.0, 2.0);
        let parent_rotation = Quat::from_rotation_y(0.7);
        let parent_scale = Vec3::new(2.0, 2.0, 2.0);
        let parent_matrix = compose(parent_position, parent_rotation, parent_scale);

        let local_position = Vec3::new(0.5, 1.0, -2.0);
        let local_rotation = Quat::from_rotation_x(0.3);
        let local_scale = Vec3::new(1.0, 0.5, 3.0);

        let world_position = parent_matrix.transform_point3(local_position);
        let world_rotation = parent_rotation * local_rotation;
        let world_scale = parent_scale * local_scale;

        let local = decompose_local_from_world(
            world_position,
            world_rotation,
            world_scale,
            parent_matrix,
            parent_rotation,
            parent_scale,
        )
        .unwrap();

        assert!((local.position - local_position).length() < EPSILON);
        assert!(local.rotation.angle_between(local_rotation) < EPSILON);
        assert!((local.scale - local_scale).length() < EPSILON);
    }

    #[test]
    fn test_decompose_rejects_zero_scale() {
        let parent_scale = Vec3::new(0.0, 1.0, 1.0);
        let result = decompose_local_from_world(
            Vec3::ONE,
            Quat::IDENTITY,
            Vec3::ONE,
            compose(Vec3::ZERO, Quat::IDENTITY, parent_scale),
            Quat::IDENTITY,
            parent_scale,
        );

        assert_eq!(
            result,
            Err(DegenerateScale {
                scale: parent_scale
            })
        );
    }

    #[test]
    fn test_decompose_renormalizes_drifted_rotation() {
        // Unnormalized input, as produced by chained multiplication
        let drifted = Quat::from_xyzw(0.0, 0.0, 0.0, 1.0003);
        let local = decompose_local_from_world(
            Vec3::ZERO,
            drifted,
            Vec3::ONE,
            Mat4::IDENTITY,
            Quat::IDENTITY,
            Vec3::ONE,
        )
        .unwrap();

        assert!((local.rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_degenerate_rotation() {
        assert_eq!(sanitize_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)), Quat::IDENTITY);
        assert_eq!(
            sanitize_rotation(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)),
            Quat::IDENTITY
        );
    }

    #[test]
    fn test_euler_round_trip() {
        let degrees = Vec3::new(30.0, -45.0, 10.0);
        let back = euler_degrees_from_quat(quat_from_euler_degrees(degrees));
        assert!((back - degrees).length() < 1e-2);
    }
}
