use serde::{Deserialize, Serialize};

use crate::utils::{array3_to_vector3, array33_to_matrix3, matrix3_to_array33, vector3_to_array3};

/// A rigid transform between two coordinate frames.
///
/// The rotation and translation map points from the child frame into the
/// parent frame: `p_parent = R * p_child + t`. Tracked tool poses
/// (tool-to-reference) and calibration offsets (tool-tip-to-tool) are both
/// carried as this type. Values are immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Rotation matrix in row-major order.
    pub rotation: [[f64; 3]; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0, 0.0, 0.0],
    };

    /// Create a transform from rotation and translation parts.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a transform from the upper 3x4 block of a homogeneous matrix.
    ///
    /// The bottom row is ignored.
    pub fn from_homogeneous(matrix: &[[f64; 4]; 4]) -> Self {
        let mut rotation = [[0.0; 3]; 3];
        let mut translation = [0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                rotation[i][j] = matrix[i][j];
            }
            translation[i] = matrix[i][3];
        }
        Self {
            rotation,
            translation,
        }
    }

    /// The 4x4 homogeneous form of the transform.
    pub fn to_homogeneous(&self) -> [[f64; 4]; 4] {
        let mut matrix = [[0.0; 4]; 4];
        for i in 0..3 {
            for j in 0..3 {
                matrix[i][j] = self.rotation[i][j];
            }
            matrix[i][3] = self.translation[i];
        }
        matrix[3][3] = 1.0;
        matrix
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = array33_to_matrix3(&self.rotation) * array3_to_vector3(point)
            + array3_to_vector3(&self.translation);
        vector3_to_array3(&p)
    }

    /// The inverse transform: `R' = R^T`, `t' = -R^T * t`.
    pub fn inverse(&self) -> Self {
        let r_inv = array33_to_matrix3(&self.rotation).transpose();
        let t_inv = -(r_inv * array3_to_vector3(&self.translation));
        Self {
            rotation: matrix3_to_array33(&r_inv),
            translation: vector3_to_array3(&t_inv),
        }
    }

    /// Compose two transforms: `self * other`, applying `other` first.
    ///
    /// With `self` mapping B into A and `other` mapping C into B, the
    /// result maps C into A.
    pub fn compose(&self, other: &Self) -> Self {
        let r_self = array33_to_matrix3(&self.rotation);
        let r = r_self * array33_to_matrix3(&other.rotation);
        let t = r_self * array3_to_vector3(&other.translation)
            + array3_to_vector3(&self.translation);
        Self {
            rotation: matrix3_to_array33(&r),
            translation: vector3_to_array3(&t),
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // 90 degrees about z: x -> y, y -> -x
    fn rot_z90() -> [[f64; 3]; 3] {
        [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn test_homogeneous_roundtrip() {
        let pose = RigidTransform::new(rot_z90(), [1.0, 2.0, 3.0]);
        let roundtrip = RigidTransform::from_homogeneous(&pose.to_homogeneous());
        assert_eq!(pose, roundtrip);
        assert_eq!(pose.to_homogeneous()[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_transform_point() {
        let pose = RigidTransform::new(rot_z90(), [10.0, 0.0, 0.0]);
        let p = pose.transform_point(&[1.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let pose = RigidTransform::new(rot_z90(), [1.0, -2.0, 3.0]);
        let eye = pose.compose(&pose.inverse());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    eye.rotation[i][j],
                    RigidTransform::IDENTITY.rotation[i][j],
                    epsilon = 1e-12
                );
            }
            assert_relative_eq!(eye.translation[i], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let a = RigidTransform::new(rot_z90(), [0.0, 0.0, 0.0]);
        let b = RigidTransform::new(RigidTransform::IDENTITY.rotation, [1.0, 0.0, 0.0]);
        // b first: translate then rotate
        let p = a.compose(&b).transform_point(&[0.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
    }
}
