//! Helpers for row-major `[[f64; 3]; 3]` matrices and `[f64; 3]` vectors.
//!
//! Rotations cross crate boundaries as plain arrays; these helpers keep the
//! conversions to and from `glam` in one place.

use glam::{DMat3, DVec3};

/// The 3x3 identity matrix.
pub const IDENTITY33: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Compute the matrix product `a * b`.
///
/// Example:
///
/// ```
/// use pointreg_linalg::mat33::{matmul33, IDENTITY33};
///
/// let a = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
/// assert_eq!(matmul33(&a, &IDENTITY33), a);
/// ```
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Compute the matrix-vector product `m * v`.
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Transpose a 3x3 matrix.
pub fn transpose33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Determinant of a 3x3 matrix by cofactor expansion along the first row.
pub fn determinant33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Convert a row-major array matrix to a column-major `glam` matrix.
pub fn array33_to_dmat3(m: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(m[0][0], m[1][0], m[2][0]),
        DVec3::new(m[0][1], m[1][1], m[2][1]),
        DVec3::new(m[0][2], m[1][2], m[2][2]),
    )
}

/// Convert a column-major `glam` matrix to a row-major array matrix.
pub fn dmat3_to_array33(m: &DMat3) -> [[f64; 3]; 3] {
    // to_cols_array_2d is column-major, so transposing first yields rows
    m.transpose().to_cols_array_2d()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matmul33() {
        let a = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let b = [[9.0, 8.0, 7.0], [6.0, 5.0, 4.0], [3.0, 2.0, 1.0]];
        let c = matmul33(&a, &b);
        assert_eq!(
            c,
            [[30.0, 24.0, 18.0], [84.0, 69.0, 54.0], [138.0, 114.0, 90.0]]
        );
    }

    #[test]
    fn test_mat33_mul_vec3() {
        let m = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(mat33_mul_vec3(&m, &[1.0, 0.0, 5.0]), [0.0, 1.0, 5.0]);
    }

    #[test]
    fn test_determinant33() {
        assert_relative_eq!(determinant33(&IDENTITY33), 1.0);
        let reflection = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
        assert_relative_eq!(determinant33(&reflection), -1.0);
        let m = [[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 2.0]];
        assert_relative_eq!(determinant33(&m), 6.0);
    }

    #[test]
    fn test_dmat3_roundtrip() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]];
        let g = array33_to_dmat3(&m);
        assert_eq!(g.row(0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(dmat3_to_array33(&g), m);
        assert_eq!(transpose33(&transpose33(&m)), m);
    }
}
