//! Degree-based transform builders on top of the bevy math types.
//!
//! All vectors and matrices are plain `Copy` values; scratch values live on
//! the stack and there is nothing to release.

pub use bevy_math::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::MathError;

/// Determinants with a smaller magnitude are treated as singular.
pub const SINGULAR_EPSILON: f32 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

pub fn rotation2(degrees: f32) -> Mat2 {
    Mat2::from_angle(degrees.to_radians())
}

pub fn axis_rotation3(axis: RotationAxis, degrees: f32) -> Mat3 {
    let rad = degrees.to_radians();
    match axis {
        RotationAxis::X => Mat3::from_rotation_x(rad),
        RotationAxis::Y => Mat3::from_rotation_y(rad),
        RotationAxis::Z => Mat3::from_rotation_z(rad),
    }
}

pub fn axis_rotation4(axis: RotationAxis, degrees: f32) -> Mat4 {
    Mat4::from_mat3(axis_rotation3(axis, degrees))
}

/// `Rz * Ry * Rx`: the X rotation is applied to a point first.
pub fn zyx_rotation3(degrees: Vec3) -> Mat3 {
    axis_rotation3(RotationAxis::Z, degrees.z)
        * axis_rotation3(RotationAxis::Y, degrees.y)
        * axis_rotation3(RotationAxis::X, degrees.x)
}

pub fn zyx_rotation4(degrees: Vec3) -> Mat4 {
    Mat4::from_mat3(zyx_rotation3(degrees))
}

pub fn translation4(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

pub fn scale4(scale: Vec3) -> Mat4 {
    Mat4::from_scale(scale)
}

/// 2D affine translation used for UV transforms.
pub fn translation3(offset: Vec2) -> Mat3 {
    Mat3::from_translation(offset)
}

pub fn try_inverse3(m: Mat3) -> Result<Mat3, MathError> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(MathError::Singular { determinant: det });
    }
    Ok(m.inverse())
}

pub fn try_inverse4(m: Mat4) -> Result<Mat4, MathError> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(MathError::Singular { determinant: det });
    }
    Ok(m.inverse())
}

/// Inverse-transpose of the upper 3x3, rescaled to unit determinant
/// magnitude the same way vanilla pose stacks renormalize after a scale.
///
/// A singular matrix (for example a zero scale) yields the identity, so
/// lighting stays defined for collapsed parts.
pub fn normal_matrix(m: &Mat4) -> Mat3 {
    let Ok(inv) = try_inverse3(Mat3::from_mat4(*m)) else {
        return Mat3::IDENTITY;
    };
    let n = inv.transpose();
    let k = n.determinant().abs().cbrt();
    n * (1.0 / k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn axis_rotations_follow_right_hand_rule() {
        let x = axis_rotation3(RotationAxis::X, 90.0);
        assert!(approx(x * Vec3::Y, Vec3::Z));
        let y = axis_rotation3(RotationAxis::Y, 90.0);
        assert!(approx(y * Vec3::Z, Vec3::X));
        let z = axis_rotation3(RotationAxis::Z, 90.0);
        assert!(approx(z * Vec3::X, Vec3::Y));
    }

    #[test]
    fn zyx_applies_x_first() {
        let m = zyx_rotation3(Vec3::new(90.0, 0.0, 90.0));
        // X turns +Y into +Z, Z then leaves +Z alone.
        assert!(approx(m * Vec3::Y, Vec3::Z));
        // X leaves +X alone, Z turns it into +Y.
        assert!(approx(m * Vec3::X, Vec3::Y));
    }

    #[test]
    fn singular_inverse_is_an_error() {
        let m = scale4(Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(try_inverse4(m), Err(MathError::Singular { .. })));
        let ok = try_inverse4(translation4(Vec3::new(1.0, 2.0, 3.0))).unwrap();
        assert!(approx(ok.transform_point3(Vec3::new(1.0, 2.0, 3.0)), Vec3::ZERO));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = scale4(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(&m);
        let normal = (n * Vec3::new(1.0, 1.0, 0.0)).normalize();
        // Surface x = y stretched along X tilts its normal toward Y.
        assert!(normal.y > normal.x);
        assert_eq!(normal_matrix(&scale4(Vec3::ZERO)), Mat3::IDENTITY);
    }
}
