use crate::pose::RigidTransform;

/// Centroid of a point set.
///
/// Returns the origin for an empty set.
pub fn centroid(points: &[[f64; 3]]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let mut center = [0.0; 3];
    for point in points {
        for (c, p) in center.iter_mut().zip(point.iter()) {
            *c += p;
        }
    }
    let n = points.len() as f64;
    for c in &mut center {
        *c /= n;
    }
    center
}

/// Mean Euclidean distance of a point set from its centroid, in mm.
///
/// Used as a reproducibility metric for repeated observations of the same
/// physical point: a perfectly consistent tool and calibration yields 0.
pub fn mean_distance_to_centroid(points: &[[f64; 3]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let center = centroid(points);
    let total: f64 = points
        .iter()
        .map(|p| {
            ((p[0] - center[0]).powi(2) + (p[1] - center[1]).powi(2) + (p[2] - center[2]).powi(2))
                .sqrt()
        })
        .sum();
    total / points.len() as f64
}

/// Position of a calibrated tool tip in the reference frame.
///
/// # Arguments
///
/// * `tool_to_reference` - The tracked pose of the tool.
/// * `tip_to_tool` - The calibrated tip offset.
pub fn tip_position_in_reference(
    tool_to_reference: &RigidTransform,
    tip_to_tool: &RigidTransform,
) -> [f64; 3] {
    tool_to_reference.compose(tip_to_tool).translation
}

/// Recover the transform A -> B given A -> C and B -> C.
///
/// In a frame hierarchy `A -> B -> C` this is the missing edge between the
/// two known ones.
pub fn relative_transform(a_to_c: &RigidTransform, b_to_c: &RigidTransform) -> RigidTransform {
    b_to_c.inverse().compose(a_to_c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centroid() {
        let points = vec![[1.0, 2.0, 3.0], [3.0, 4.0, 5.0]];
        assert_eq!(centroid(&points), [2.0, 3.0, 4.0]);
        assert_eq!(centroid(&[]), [0.0; 3]);
    }

    #[test]
    fn test_mean_distance_to_centroid() {
        // four points on a unit circle around (5, 5, 0)
        let points = vec![
            [6.0, 5.0, 0.0],
            [4.0, 5.0, 0.0],
            [5.0, 6.0, 0.0],
            [5.0, 4.0, 0.0],
        ];
        assert_relative_eq!(mean_distance_to_centroid(&points), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            mean_distance_to_centroid(&[[7.0, 8.0, 9.0]]),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tip_position_in_reference() {
        // tool rotated 90 degrees about z, tip 10mm down the tool x axis
        let tool_to_reference = RigidTransform::new(
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [1.0, 1.0, 0.0],
        );
        let tip_to_tool = RigidTransform::new(RigidTransform::IDENTITY.rotation, [10.0, 0.0, 0.0]);
        let tip = tip_position_in_reference(&tool_to_reference, &tip_to_tool);
        assert_relative_eq!(tip[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(tip[1], 11.0, epsilon = 1e-12);
        assert_relative_eq!(tip[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_transform_closes_hierarchy() {
        let a_to_b = RigidTransform::new(
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [1.0, 2.0, 3.0],
        );
        let b_to_c = RigidTransform::new(
            [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]],
            [-4.0, 0.0, 2.0],
        );
        let a_to_c = b_to_c.compose(&a_to_b);
        let recovered = relative_transform(&a_to_c, &b_to_c);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(recovered.rotation[i][j], a_to_b.rotation[i][j], epsilon = 1e-12);
            }
            assert_relative_eq!(recovered.translation[i], a_to_b.translation[i], epsilon = 1e-12);
        }
    }
}
