use nalgebra::{DMatrix, DVector};

use navcal_3d::RigidTransform;

use crate::calibrator::CalibrationError;

// Hard floor below which the 6-unknown system is meaningless regardless of
// the configured minimum.
const MIN_POSES: usize = 3;

// Singular value ratio below which the solve is rejected.
const SINGULAR_VALUE_RATIO_EPS: f64 = 1e-6;

/// Solve the pivot-calibration least-squares system.
///
/// While the tool rotates about a fixed physical point, every sampled
/// tool-to-reference pose `(R_i, t_i)` observes the same tip: with the tip
/// offset `x_tip` in the tool frame and the pivot point `x_pivot` in the
/// reference frame, `R_i * x_tip + t_i = x_pivot`. Stacking all samples
/// gives the `3n x 6` system `[R_i | -I] * [x_tip; x_pivot] = -t_i`, solved
/// here by SVD.
///
/// Returns `(tip offset, pivot point, rmse)` where the RMSE is the RMS
/// distance of the reconstructed tip positions from the fitted pivot, mm.
pub(crate) fn solve_pivot(
    samples: &[RigidTransform],
) -> Result<([f64; 3], [f64; 3], f64), CalibrationError> {
    if samples.len() < MIN_POSES {
        return Err(CalibrationError::InsufficientSamples {
            required: MIN_POSES,
            actual: samples.len(),
        });
    }

    let rows = 3 * samples.len();
    let mut a = DMatrix::<f64>::zeros(rows, 6);
    let mut b = DVector::<f64>::zeros(rows);
    for (k, pose) in samples.iter().enumerate() {
        let row = 3 * k;
        for i in 0..3 {
            for j in 0..3 {
                a[(row + i, j)] = pose.rotation[i][j];
            }
            a[(row + i, 3 + i)] = -1.0;
            b[row + i] = -pose.translation[i];
        }
    }

    let svd = a.svd(true, true);
    let sigma = &svd.singular_values;
    let ratio = sigma[5] / sigma[0];
    if !ratio.is_finite() || ratio < SINGULAR_VALUE_RATIO_EPS {
        // no rotation diversity: the tip offset component along the motion
        // axis is unobservable
        return Err(CalibrationError::IllConditioned { ratio });
    }

    let x = svd
        .solve(&b, 0.0)
        .map_err(|e| CalibrationError::SvdFailed(e.to_string()))?;
    let tip = [x[0], x[1], x[2]];
    let pivot = [x[3], x[4], x[5]];

    let mut sum_square_error = 0.0;
    for pose in samples {
        let tip_in_reference = pose.transform_point(&tip);
        sum_square_error += (tip_in_reference[0] - pivot[0]).powi(2)
            + (tip_in_reference[1] - pivot[1]).powi(2)
            + (tip_in_reference[2] - pivot[2]).powi(2);
    }
    let rmse = (sum_square_error / samples.len() as f64).sqrt();

    Ok((tip, pivot, rmse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use navcal_3d::transforms::axis_angle_to_rotation_matrix;
    use navcal_3d::utils::{array3_to_vector3, array33_to_matrix3, vector3_to_array3};

    // Poses of a tool rotating about a fixed world point: the tip stays put.
    fn pivot_poses(tip: &[f64; 3], pivot: &[f64; 3], count: usize) -> Vec<RigidTransform> {
        (0..count)
            .map(|i| {
                let swing = 0.7 * (i as f64 / count as f64) - 0.35;
                let axis = [swing.sin(), (2.0 * swing).cos(), 0.4];
                let rotation = axis_angle_to_rotation_matrix(&axis, 0.8 * swing).unwrap();
                let t = array3_to_vector3(pivot)
                    - array33_to_matrix3(&rotation) * array3_to_vector3(tip);
                RigidTransform::new(rotation, vector3_to_array3(&t))
            })
            .collect()
    }

    #[test]
    fn test_recovers_exact_pivot() {
        let tip = [1.2, -3.4, 210.0];
        let pivot = [100.0, 50.0, 75.0];
        let samples = pivot_poses(&tip, &pivot, 60);

        let (tip_fit, pivot_fit, rmse) = solve_pivot(&samples).unwrap();
        for i in 0..3 {
            assert_relative_eq!(tip_fit[i], tip[i], epsilon = 1e-6);
            assert_relative_eq!(pivot_fit[i], pivot[i], epsilon = 1e-6);
        }
        assert!(rmse < 1e-6, "expected near-zero rmse, got {rmse}");
    }

    #[test]
    fn test_recovers_pivot_from_random_orientations() {
        let tip = [-4.0, 6.5, 95.0];
        let pivot = [20.0, -10.0, 260.0];
        let samples: Vec<RigidTransform> = (0..50)
            .map(|_| {
                let axis = [
                    rand::random::<f64>() - 0.5,
                    rand::random::<f64>() - 0.5,
                    rand::random::<f64>() - 0.5,
                ];
                let rotation =
                    axis_angle_to_rotation_matrix(&axis, rand::random::<f64>() * 0.8).unwrap();
                let t = array3_to_vector3(&pivot)
                    - array33_to_matrix3(&rotation) * array3_to_vector3(&tip);
                RigidTransform::new(rotation, vector3_to_array3(&t))
            })
            .collect();

        let (tip_fit, pivot_fit, rmse) = solve_pivot(&samples).unwrap();
        for i in 0..3 {
            assert_relative_eq!(tip_fit[i], tip[i], epsilon = 1e-6);
            assert_relative_eq!(pivot_fit[i], pivot[i], epsilon = 1e-6);
        }
        assert!(rmse < 1e-6);
    }

    #[test]
    fn test_too_few_poses() {
        let samples = vec![RigidTransform::IDENTITY; 2];
        assert!(matches!(
            solve_pivot(&samples),
            Err(CalibrationError::InsufficientSamples { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_static_orientation_is_ill_conditioned() {
        // translations vary but the orientation never changes; the system
        // cannot separate tip offset from pivot position
        let samples: Vec<RigidTransform> = (0..20)
            .map(|i| {
                RigidTransform::new(RigidTransform::IDENTITY.rotation, [i as f64, 2.0, 3.0])
            })
            .collect();
        assert!(matches!(
            solve_pivot(&samples),
            Err(CalibrationError::IllConditioned { .. })
        ));
    }
}
