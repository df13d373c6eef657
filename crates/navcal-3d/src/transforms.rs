use nalgebra::{Rotation3, Unit, Vector3};

use crate::linalg::LinalgError;
use crate::utils::{array33_to_matrix3, matrix3_to_array33};

/// Compute the rotation matrix from an axis and angle.
///
/// The axis does not need to be normalized.
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix, or [`LinalgError::ZeroAxis`] for a zero-length axis.
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], LinalgError> {
    let axis = Vector3::new(axis[0], axis[1], axis[2]);
    if axis.norm() < 1e-10 {
        return Err(LinalgError::ZeroAxis);
    }
    let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
    Ok(matrix3_to_array33(rotation.matrix()))
}

/// Geodesic distance between two rotation matrices, in degrees.
///
/// Returns the angle of the relative rotation `a^T * b`, clamped against
/// numerical drift just outside the valid `acos` domain.
pub fn rotation_angle_deg(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> f64 {
    let relative = array33_to_matrix3(a).transpose() * array33_to_matrix3(b);
    let cos_angle = ((relative.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}
