use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use navcal_3d::ops::centroid;
use navcal_3d::utils::{
    array3_to_vector3, array33_to_matrix3, matrix3_to_array33, vector3_to_array3,
};

/// Minimum number of landmark pairs for a well-posed similarity fit.
pub const MIN_LANDMARK_PAIRS: usize = 3;

// Rank and determinant threshold below which the fit is rejected.
const DEGENERACY_EPS: f64 = 1e-8;

/// Error types for landmark registration.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The two landmark sets must be paired index by index.
    #[error("landmark sets differ in size: {from} from-points, {to} to-points")]
    CountMismatch {
        /// Number of from-points.
        from: usize,
        /// Number of to-points.
        to: usize,
    },

    /// Fewer pairs than a similarity fit can be solved from.
    #[error("similarity registration requires at least {required} point pairs, got {actual}")]
    TooFewPoints {
        /// Minimum number of pairs required.
        required: usize,
        /// Actual number of pairs provided.
        actual: usize,
    },

    /// Collinear or otherwise rank-deficient input; the fitted transform is
    /// rejected rather than returned.
    #[error("unstable registration, check input for collinear points (determinant {determinant:.3e})")]
    Degenerate {
        /// Determinant of the rejected transform's linear part.
        determinant: f64,
    },

    /// Singular value decomposition failed.
    #[error("SVD computation failed: {0}")]
    SvdFailed(String),
}

/// A fitted similarity transform with its residual error.
///
/// Maps from-space into to-space as `p_to = scale * R * p_from + t`. The
/// caller owns the decision to apply it, typically by comparing `rmse`
/// against an application-level threshold before writing the transform into
/// a coordinate-frame edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityTransform {
    /// Rotation matrix in row-major order.
    pub rotation: [[f64; 3]; 3],
    /// Uniform scale factor.
    pub scale: f64,
    /// Translation vector.
    pub translation: [f64; 3],
    /// Root-mean-square Euclidean residual over the input pairs, in mm.
    pub rmse: f64,
}

impl SimilarityTransform {
    /// Apply the transform to a point.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = self.scale * array33_to_matrix3(&self.rotation) * array3_to_vector3(point)
            + array3_to_vector3(&self.translation);
        vector3_to_array3(&p)
    }

    /// The 4x4 homogeneous form, linear part `scale * R`.
    pub fn to_homogeneous(&self) -> [[f64; 4]; 4] {
        let mut matrix = [[0.0; 4]; 4];
        for i in 0..3 {
            for j in 0..3 {
                matrix[i][j] = self.scale * self.rotation[i][j];
            }
            matrix[i][3] = self.translation[i];
        }
        matrix[3][3] = 1.0;
        matrix
    }
}

/// Fit the similarity transform best mapping paired landmarks onto each other.
///
/// Closed-form orthogonal Procrustes with uniform scale (Umeyama): centroids
/// of both sets, cross-covariance, SVD for the optimal rotation with the
/// reflection fix, scale from the ratio of point-set spreads, and the
/// translation closing the loop. `from_points[i]` corresponds to
/// `to_points[i]`, aligned by insertion order.
///
/// # Arguments
///
/// * `from_points` - Landmarks in the source frame.
/// * `to_points` - The same landmarks observed in the target frame.
///
/// # Returns
///
/// The fitted [`SimilarityTransform`] carrying its RMS residual in mm.
/// Preconditions are checked in order: equal lengths, then at least
/// [`MIN_LANDMARK_PAIRS`] pairs. Rank-deficient geometry (e.g. collinear
/// landmarks) is computed but rejected as [`RegistrationError::Degenerate`].
pub fn register_landmarks(
    from_points: &[[f64; 3]],
    to_points: &[[f64; 3]],
) -> Result<SimilarityTransform, RegistrationError> {
    log::debug!(
        "landmark registration with {} point pairs",
        from_points.len()
    );

    if from_points.len() != to_points.len() {
        return Err(RegistrationError::CountMismatch {
            from: from_points.len(),
            to: to_points.len(),
        });
    }
    if from_points.len() < MIN_LANDMARK_PAIRS {
        return Err(RegistrationError::TooFewPoints {
            required: MIN_LANDMARK_PAIRS,
            actual: from_points.len(),
        });
    }

    let n = from_points.len() as f64;
    let mu_from = array3_to_vector3(&centroid(from_points));
    let mu_to = array3_to_vector3(&centroid(to_points));

    // Cross-covariance (to x from) and the source spread the scale is
    // normalized by.
    let mut covariance = Matrix3::zeros();
    let mut var_from = 0.0;
    for (from, to) in from_points.iter().zip(to_points.iter()) {
        let from_centered = array3_to_vector3(from) - mu_from;
        let to_centered = array3_to_vector3(to) - mu_to;
        covariance += to_centered * from_centered.transpose();
        var_from += from_centered.norm_squared();
    }
    covariance /= n;
    var_from /= n;

    if var_from < DEGENERACY_EPS {
        // all from-points coincide; nothing to fit a spread or rotation from
        return Err(RegistrationError::Degenerate { determinant: 0.0 });
    }

    let svd = covariance.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| RegistrationError::SvdFailed("failed to compute U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| RegistrationError::SvdFailed("failed to compute V^T".to_string()))?;
    let sigma = svd.singular_values;

    // Reflection fix: force det(R) = +1.
    let d = if (u * v_t).determinant() < 0.0 { -1.0 } else { 1.0 };
    let s = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));

    let rotation = u * s * v_t;
    let scale = (sigma[0] + sigma[1] + d * sigma[2]) / var_from;
    let translation = mu_to - scale * rotation * mu_from;

    let result = SimilarityTransform {
        rotation: matrix3_to_array33(&rotation),
        scale,
        translation: vector3_to_array3(&translation),
        rmse: 0.0,
    };

    // Degeneracy guard: a rank-deficient cross-covariance (collinear
    // landmarks leave the in-line rotation unconstrained) or a collapsed
    // linear part. The transform is computed but not returned.
    let determinant = scale.powi(3) * rotation.determinant();
    let rank_ratio = if sigma[0] > 0.0 { sigma[1] / sigma[0] } else { 0.0 };
    if rank_ratio < DEGENERACY_EPS || determinant.abs() < DEGENERACY_EPS {
        log::debug!(
            "registration rejected: rank ratio {rank_ratio:.3e}, determinant {determinant:.3e}"
        );
        return Err(RegistrationError::Degenerate { determinant });
    }

    let sum_square_error: f64 = from_points
        .iter()
        .zip(to_points.iter())
        .map(|(from, to)| {
            let fitted = result.transform_point(from);
            (fitted[0] - to[0]).powi(2) + (fitted[1] - to[1]).powi(2) + (fitted[2] - to[2]).powi(2)
        })
        .sum();
    let rmse = (sum_square_error / n).sqrt();

    log::debug!("registration succeeded with rmse {rmse:.3} mm");

    Ok(SimilarityTransform { rmse, ..result })
}
