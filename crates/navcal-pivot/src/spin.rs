use nalgebra::{Matrix3, Rotation3, Vector3};

use navcal_3d::utils::{array33_to_matrix3, matrix3_to_array33, vector3_to_array3};
use navcal_3d::RigidTransform;

use crate::calibrator::CalibrationError;

// Needle orientation protocol: the shaft points down the tool tip's -z axis.
const SHAFT_AXIS: Vector3<f64> = Vector3::new(0.0, 0.0, -1.0);

// At least two relative rotations are needed to distinguish an axis from
// an arbitrary direction.
const MIN_POSES: usize = 3;

/// Estimate the common rotation axis of a spin motion.
///
/// Each consecutive pose pair contributes the instantaneous rotation
/// `dR_i = R_i^T * R_{i-1}` expressed in the tool frame. A direction `a`
/// lying on every rotation axis satisfies `dR_i * a = a`, so the best-fit
/// axis minimizes `sum ||(dR_i - I) * a||^2`: the eigenvector of
/// `A = sum (dR_i - I)^T (dR_i - I)` with the smallest eigenvalue.
///
/// Returns `(rotation, axis, rmse)` where the rotation maps the canonical
/// shaft axis onto the recovered axis and the RMSE is the RMS of the
/// per-pair axis residuals `||(dR_i - I) * a||`.
pub(crate) fn solve_spin(
    samples: &[RigidTransform],
) -> Result<([[f64; 3]; 3], [f64; 3], f64), CalibrationError> {
    if samples.len() < MIN_POSES {
        return Err(CalibrationError::InsufficientSamples {
            required: MIN_POSES,
            actual: samples.len(),
        });
    }

    let mut a = Matrix3::zeros();
    let mut residual_terms = Vec::with_capacity(samples.len() - 1);
    for pair in samples.windows(2) {
        let delta = array33_to_matrix3(&pair[1].rotation).transpose()
            * array33_to_matrix3(&pair[0].rotation);
        let deviation = delta - Matrix3::identity();
        a += deviation.transpose() * deviation;
        residual_terms.push(deviation);
    }

    let eigen = a.symmetric_eigen();
    let mut min_index = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] < eigen.eigenvalues[min_index] {
            min_index = i;
        }
    }
    let mut axis: Vector3<f64> = eigen.eigenvectors.column(min_index).into_owned();
    axis.normalize_mut();
    // keep the axis in the shaft hemisphere so the aligning rotation is
    // minimal
    if axis.z > 0.0 {
        axis = -axis;
    }

    // rotation_between only fails for anti-parallel inputs, which the sign
    // fix above excludes; the fallback is the exact half-turn for that case
    let rotation = Rotation3::rotation_between(&SHAFT_AXIS, &axis)
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI));

    let sum_square_error: f64 = residual_terms
        .iter()
        .map(|deviation| (deviation * axis).norm_squared())
        .sum();
    let rmse = (sum_square_error / residual_terms.len() as f64).sqrt();

    Ok((
        matrix3_to_array33(rotation.matrix()),
        vector3_to_array3(&axis),
        rmse,
    ))
}
