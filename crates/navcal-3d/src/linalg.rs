use thiserror::Error;

use crate::utils::{array3_to_vector3, array33_to_matrix3, matrix3_to_array33, vector3_to_array3};

/// Errors produced by the batch linear algebra helpers.
#[derive(Debug, Error)]
pub enum LinalgError {
    /// Source and destination buffers must have the same length.
    #[error("mismatched point buffers: {src} source points, {dst} destination points")]
    MismatchedPointBuffers {
        /// Number of source points.
        src: usize,
        /// Number of destination points.
        dst: usize,
    },

    /// A rotation axis must have a nonzero length.
    #[error("cannot compute a rotation from a zero-length axis")]
    ZeroAxis,
}

/// Transform a set of points using a rotation and translation.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `dst_points` - A pre-allocated buffer to store the transformed points.
///
/// PRECONDITION: `dst_points` is pre-allocated with the same length as
/// `src_points`.
pub fn transform_points3d(
    src_points: &[[f64; 3]],
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
    dst_points: &mut [[f64; 3]],
) -> Result<(), LinalgError> {
    if src_points.len() != dst_points.len() {
        return Err(LinalgError::MismatchedPointBuffers {
            src: src_points.len(),
            dst: dst_points.len(),
        });
    }

    let rotation = array33_to_matrix3(dst_r_src);
    let translation = array3_to_vector3(dst_t_src);

    for (src, dst) in src_points.iter().zip(dst_points.iter_mut()) {
        let p = rotation * array3_to_vector3(src) + translation;
        *dst = vector3_to_array3(&p);
    }

    Ok(())
}

/// Multiply two 3x3 matrices.
pub fn matmul33(lhs: &[[f64; 3]; 3], rhs: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    matrix3_to_array33(&(array33_to_matrix3(lhs) * array33_to_matrix3(rhs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_points3d_identity() {
        let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let translation = [0.0, 0.0, 0.0];
        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points3d(&src_points, &rotation, &translation, &mut dst_points).unwrap();

        assert_eq!(dst_points, src_points);
    }

    #[test]
    fn test_transform_points3d_rotation_translation() {
        let src_points = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        // 90 degrees about z
        let rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let translation = [1.0, 2.0, 3.0];
        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points3d(&src_points, &rotation, &translation, &mut dst_points).unwrap();

        assert_eq!(dst_points[0], [1.0, 3.0, 3.0]);
        assert_eq!(dst_points[1], [0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_transform_points3d_length_mismatch() {
        let src_points = vec![[0.0; 3]; 2];
        let mut dst_points = vec![[0.0; 3]; 3];
        let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let result = transform_points3d(&src_points, &rotation, &[0.0; 3], &mut dst_points);
        assert!(matches!(
            result,
            Err(LinalgError::MismatchedPointBuffers { src: 2, dst: 3 })
        ));
    }

    #[test]
    fn test_matmul33_with_identity() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(matmul33(&m, &eye), m);
        assert_eq!(matmul33(&eye, &m), m);
    }
}
