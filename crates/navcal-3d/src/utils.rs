use nalgebra::{Matrix3, Vector3};

/// Utility function to convert a 3-vector array to a nalgebra column vector.
///
/// # Arguments
///
/// * `array` - A 3-vector array.
///
/// # Returns
///
/// A nalgebra column vector.
pub fn array3_to_vector3(array: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(array[0], array[1], array[2])
}

/// Utility function to convert a nalgebra column vector to a 3-vector array.
pub fn vector3_to_array3(vector: &Vector3<f64>) -> [f64; 3] {
    [vector.x, vector.y, vector.z]
}

/// Utility function to convert a row-major 3x3 array to a nalgebra matrix.
///
/// # Arguments
///
/// * `array` - A 3x3 array in row-major order.
///
/// # Returns
///
/// A nalgebra 3x3 matrix.
pub fn array33_to_matrix3(array: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::new(
        array[0][0], array[0][1], array[0][2], array[1][0], array[1][1], array[1][2], array[2][0],
        array[2][1], array[2][2],
    )
}

/// Utility function to convert a nalgebra 3x3 matrix to a row-major array.
pub fn matrix3_to_array33(matrix: &Matrix3<f64>) -> [[f64; 3]; 3] {
    let mut array = [[0.0; 3]; 3];
    for (i, row) in array.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = matrix[(i, j)];
        }
    }
    array
}
