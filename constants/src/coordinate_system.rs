/// Coordinate transformation matrix (row-major: [x_new, y_new, z_new])
/// Exchanges the Y and Z axes of source points (Z-up scanners to Y-up scenes).
pub const EXCHANGE_YZ_TRANSFORM: [[f64; 3]; 3] = [
    [1.0, 0.0, 0.0], // X = X
    [0.0, 0.0, 1.0], // Y = Z
    [0.0, 1.0, 0.0], // Z = Y
];

/// Apply a coordinate transformation matrix to a single position.
pub fn transform_coordinates(transform: &[[f64; 3]; 3], x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += transform[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}
