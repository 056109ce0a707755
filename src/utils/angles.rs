//! Source engine orientation conventions.
//!
//! Angles are given in degrees as `(pitch, yaw, roll)`. Objects are rotated around the X axis
//! first (roll), then around Y (pitch), then around Z (yaw).

use crate::math::{Matrix, Point, Real, Rotation, Transform, Vector};
use na::{Rotation3, Translation3};

/// The rotation matrix `Rz(yaw) * Ry(pitch) * Rx(roll)` of the given angles.
pub fn rotation_matrix_from_angles(angles: &Vector<Real>) -> Rotation3<Real> {
    let pitch = angles[0].to_radians();
    let yaw = angles[1].to_radians();
    let roll = angles[2].to_radians();

    Rotation3::from_axis_angle(&Vector::z_axis(), yaw)
        * Rotation3::from_axis_angle(&Vector::y_axis(), pitch)
        * Rotation3::from_axis_angle(&Vector::x_axis(), roll)
}

/// The rotation of the given angles, as a unit quaternion.
pub fn rotation_from_angles(angles: &Vector<Real>) -> Rotation<Real> {
    Rotation::from_rotation_matrix(&rotation_matrix_from_angles(angles))
}

/// The model matrix `T(origin) * R(angles) * S(uniform_scale)`.
pub fn transform_from_angles(
    origin: &Vector<Real>,
    angles: &Vector<Real>,
    uniform_scale: Real,
) -> Transform<Real> {
    Translation3::from(*origin).to_homogeneous()
        * rotation_matrix_from_angles(angles).to_homogeneous()
        * Transform::new_scaling(uniform_scale)
}

/// The upper-left 3x3 block (rotation and scaling) of a model matrix.
#[inline]
pub fn rotation_scaling(transform: &Transform<Real>) -> Matrix<Real> {
    transform.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Applies a model matrix to a point.
#[inline]
pub fn transform_point(transform: &Transform<Real>, pt: &Point<Real>) -> Point<Real> {
    transform.transform_point(pt)
}
