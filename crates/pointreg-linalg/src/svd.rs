//! 3×3 Singular Value Decomposition (SVD) in double precision.
//!
//! The rigid transform solver needs the SVD of a 3×3 cross-covariance
//! matrix. This module computes it with the classic three-stage scheme:
//!
//! ```text
//! A = U Σ Vᵀ
//! ```
//!
//! 1. The eigenvectors of the symmetric matrix `AᵀA` are found with cyclic
//!    Jacobi sweeps, giving `V`.
//! 2. `B = A V` has mutually orthogonal columns whose norms are the singular
//!    values; the columns are sorted in descending order of norm.
//! 3. A Givens QR decomposition `B = Q R` gives `U = Q` and `Σ = |diag(R)|`.
//!
//! The input is divided by its largest absolute entry first, so every
//! tolerance is relative to the magnitude of the matrix and the result does
//! not depend on the scale of the input.
//!
//! Rank-deficient inputs (including the zero matrix) are well defined: `U`
//! and `V` are always products of plane rotations and column sign flips,
//! so both stay orthogonal no matter how small the singular values get.
//!
//! # Example
//!
//! ```
//! use glam::{DMat3, DVec3};
//! use pointreg_linalg::svd::svd3;
//!
//! let matrix = DMat3::from_diagonal(DVec3::new(1.0, 2.0, 3.0));
//!
//! let svd_result = svd3(&matrix);
//! let u = svd_result.u();
//! let s = svd_result.s();
//! let v = svd_result.v();
//! assert!((s.x_axis.x - 3.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! * McAdams, Selle, Tamstorf, Teran, and Sifakis (2011).
//!   "Computing the Singular Value Decomposition of 3x3 matrices with minimal
//!   branching and elementary floating point operations."
//!   University of Wisconsin-Madison Technical Report TR1690.
//!
//! The sorting and QR stages follow that report. The Jacobi stage uses exact
//! rotation angles and iterates to convergence instead of the fixed
//! approximate sweeps of the single precision variant.

use glam::{DMat3, DVec3};

const SVD3_EPSILON: f64 = 1e-12;
const MAX_SWEEPS: usize = 16;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-24;

/// Lower triangle of a symmetric 3x3 matrix.
#[derive(Debug, Clone)]
struct Symmetric3x3 {
    m_00: f64,
    m_10: f64,
    m_11: f64,
    m_20: f64,
    m_21: f64,
    m_22: f64,
}

impl Symmetric3x3 {
    fn from_dmat3(mat: &DMat3) -> Self {
        Symmetric3x3 {
            m_00: mat.x_axis.x,
            m_10: mat.x_axis.y,
            m_11: mat.y_axis.y,
            m_20: mat.x_axis.z,
            m_21: mat.y_axis.z,
            m_22: mat.z_axis.z,
        }
    }

    fn off_diagonal_norm_squared(&self) -> f64 {
        self.m_10 * self.m_10 + self.m_20 * self.m_20 + self.m_21 * self.m_21
    }

    fn diagonal_norm_squared(&self) -> f64 {
        self.m_00 * self.m_00 + self.m_11 * self.m_11 + self.m_22 * self.m_22
    }
}

/// Cosine and sine of a plane rotation.
#[derive(Debug)]
struct Givens {
    cos_theta: f64,
    sin_theta: f64,
}

#[derive(Debug)]
struct QR3 {
    q: DMat3,
    r: DMat3,
}

/// Result of [`svd3`]: `A = U * S * Vᵀ`.
#[derive(Debug, Clone)]
pub struct SVD3Set {
    u: DMat3,
    s: DMat3,
    v: DMat3,
}

impl SVD3Set {
    /// Get the left singular vectors matrix.
    #[inline]
    pub fn u(&self) -> &DMat3 {
        &self.u
    }

    /// Get the diagonal matrix of singular values, sorted in descending order.
    #[inline]
    pub fn s(&self) -> &DMat3 {
        &self.s
    }

    /// Get the right singular vectors matrix.
    #[inline]
    pub fn v(&self) -> &DMat3 {
        &self.v
    }

    /// Get the singular values as an array, largest first.
    #[inline]
    pub fn singular_values(&self) -> [f64; 3] {
        [self.s.x_axis.x, self.s.y_axis.y, self.s.z_axis.z]
    }
}

/// Rotation angle that annihilates `s_pq` in the 2x2 block `[[s_pp, s_pq], [s_pq, s_qq]]`.
#[inline(always)]
fn jacobi_rotation(s_pp: f64, s_qq: f64, s_pq: f64) -> Givens {
    if s_pq == 0.0 {
        return Givens {
            cos_theta: 1.0,
            sin_theta: 0.0,
        };
    }
    let theta = 0.5 * (2.0 * s_pq).atan2(s_pp - s_qq);
    Givens {
        cos_theta: theta.cos(),
        sin_theta: theta.sin(),
    }
}

#[inline(always)]
fn conjugate_xy(s: &mut Symmetric3x3, v: &mut DMat3) {
    let g = jacobi_rotation(s.m_00, s.m_11, s.m_10);
    let (a, b) = (g.cos_theta, g.sin_theta);

    let s00 = s.m_00;
    let s10 = s.m_10;
    let s11 = s.m_11;
    let s20 = s.m_20;
    let s21 = s.m_21;

    s.m_00 = a * (a * s00 + b * s10) + b * (a * s10 + b * s11);
    s.m_10 = a * (-b * s00 + a * s10) + b * (-b * s10 + a * s11);
    s.m_11 = -b * (-b * s00 + a * s10) + a * (-b * s10 + a * s11);
    s.m_20 = a * s20 + b * s21;
    s.m_21 = -b * s20 + a * s21;

    *v *= DMat3::from_cols(DVec3::new(a, b, 0.0), DVec3::new(-b, a, 0.0), DVec3::Z);
}

#[inline(always)]
fn conjugate_yz(s: &mut Symmetric3x3, v: &mut DMat3) {
    let g = jacobi_rotation(s.m_11, s.m_22, s.m_21);
    let (a, b) = (g.cos_theta, g.sin_theta);

    let s11 = s.m_11;
    let s21 = s.m_21;
    let s22 = s.m_22;
    let s10 = s.m_10;
    let s20 = s.m_20;

    s.m_11 = a * (a * s11 + b * s21) + b * (a * s21 + b * s22);
    s.m_21 = a * (-b * s11 + a * s21) + b * (-b * s21 + a * s22);
    s.m_22 = -b * (-b * s11 + a * s21) + a * (-b * s21 + a * s22);
    s.m_10 = a * s10 + b * s20;
    s.m_20 = -b * s10 + a * s20;

    *v *= DMat3::from_cols(DVec3::X, DVec3::new(0.0, a, b), DVec3::new(0.0, -b, a));
}

#[inline(always)]
fn conjugate_xz(s: &mut Symmetric3x3, v: &mut DMat3) {
    let g = jacobi_rotation(s.m_00, s.m_22, s.m_20);
    let (a, b) = (g.cos_theta, g.sin_theta);

    let s00 = s.m_00;
    let s20 = s.m_20;
    let s22 = s.m_22;
    let s10 = s.m_10;
    let s21 = s.m_21;

    s.m_00 = a * (a * s00 + b * s20) + b * (a * s20 + b * s22);
    s.m_20 = a * (-b * s00 + a * s20) + b * (-b * s20 + a * s22);
    s.m_22 = -b * (-b * s00 + a * s20) + a * (-b * s20 + a * s22);
    s.m_10 = a * s10 + b * s21;
    s.m_21 = -b * s10 + a * s21;

    *v *= DMat3::from_cols(DVec3::new(a, 0.0, b), DVec3::Y, DVec3::new(-b, 0.0, a));
}

/// Eigenvectors of a symmetric matrix as the columns of a rotation matrix.
fn jacobi_eigenanalysis(mut s: Symmetric3x3) -> DMat3 {
    let mut v = DMat3::IDENTITY;
    for _ in 0..MAX_SWEEPS {
        conjugate_xy(&mut s, &mut v);
        conjugate_yz(&mut s, &mut v);
        conjugate_xz(&mut s, &mut v);

        if s.off_diagonal_norm_squared() <= OFF_DIAGONAL_TOLERANCE * s.diagonal_norm_squared() {
            break;
        }
    }
    v
}

/// Swaps two columns and negates the one moved into the second slot, which
/// keeps the determinant of `v` unchanged.
#[inline(always)]
fn swap_columns(x: &mut DVec3, y: &mut DVec3) {
    let tmp = *x;
    *x = *y;
    *y = -tmp;
}

/// Sorts the singular values in descending order and adjusts the corresponding singular vectors accordingly
pub fn sort_singular_values(b: &mut DMat3, v: &mut DMat3) {
    let mut rho1 = b.x_axis.length_squared();
    let mut rho2 = b.y_axis.length_squared();
    let mut rho3 = b.z_axis.length_squared();

    if rho1 < rho2 {
        std::mem::swap(&mut rho1, &mut rho2);
        swap_columns(&mut b.x_axis, &mut b.y_axis);
        swap_columns(&mut v.x_axis, &mut v.y_axis);
    }

    if rho1 < rho3 {
        std::mem::swap(&mut rho1, &mut rho3);
        swap_columns(&mut b.x_axis, &mut b.z_axis);
        swap_columns(&mut v.x_axis, &mut v.z_axis);
    }

    if rho2 < rho3 {
        swap_columns(&mut b.y_axis, &mut b.z_axis);
        swap_columns(&mut v.y_axis, &mut v.z_axis);
    }
}

/// Half-angle Givens parameters zeroing `a2` against `a1` (Algorithm 4).
#[inline(always)]
fn qr_givens_quaternion(a1: f64, a2: f64) -> Givens {
    let rho = (a1 * a1 + a2 * a2).sqrt();

    let mut g = Givens {
        cos_theta: a1.abs() + rho.max(SVD3_EPSILON),
        sin_theta: if rho > SVD3_EPSILON { a2 } else { 0.0 },
    };

    if a1 < 0.0 {
        std::mem::swap(&mut g.sin_theta, &mut g.cos_theta);
    }

    let w = (g.cos_theta * g.cos_theta + g.sin_theta * g.sin_theta)
        .sqrt()
        .recip();
    g.cos_theta *= w;
    g.sin_theta *= w;
    g
}

/// Applies the plane rotation `(a, b)` on rows `p` and `q` of every column of `m`.
#[inline(always)]
fn rotate_rows(m: &mut DMat3, p: usize, q: usize, a: f64, b: f64) {
    for col in [&mut m.x_axis, &mut m.y_axis, &mut m.z_axis] {
        let cp = col[p];
        let cq = col[q];
        col[p] = a * cp + b * cq;
        col[q] = -b * cp + a * cq;
    }
}

/// QR decomposition of `b_mat` with three Givens rotations.
fn qr_decomposition(b_mat: &mut DMat3) -> QR3 {
    // zero out b[1][0]
    let g1 = qr_givens_quaternion(b_mat.x_axis.x, b_mat.x_axis.y);
    let a1 = -2.0 * g1.sin_theta * g1.sin_theta + 1.0;
    let b1 = 2.0 * g1.cos_theta * g1.sin_theta;
    rotate_rows(b_mat, 0, 1, a1, b1);

    // zero out b[2][0]
    let g2 = qr_givens_quaternion(b_mat.x_axis.x, b_mat.x_axis.z);
    let a2 = -2.0 * g2.sin_theta * g2.sin_theta + 1.0;
    let b2 = 2.0 * g2.cos_theta * g2.sin_theta;
    rotate_rows(b_mat, 0, 2, a2, b2);

    // zero out b[2][1]
    let g3 = qr_givens_quaternion(b_mat.y_axis.y, b_mat.y_axis.z);
    let a3 = -2.0 * g3.sin_theta * g3.sin_theta + 1.0;
    let b3 = 2.0 * g3.cos_theta * g3.sin_theta;
    rotate_rows(b_mat, 1, 2, a3, b3);

    let r = *b_mat;

    let q1 = DMat3::from_cols(DVec3::new(a1, b1, 0.0), DVec3::new(-b1, a1, 0.0), DVec3::Z);
    let q2 = DMat3::from_cols(DVec3::new(a2, 0.0, b2), DVec3::Y, DVec3::new(-b2, 0.0, a2));
    let q3 = DMat3::from_cols(DVec3::X, DVec3::new(0.0, a3, b3), DVec3::new(0.0, -b3, a3));

    QR3 {
        q: q1 * q2 * q3,
        r,
    }
}

/// Computes the singular value decomposition `A = U * S * Vᵀ` of a 3x3 matrix.
///
/// The singular values are non-negative and sorted in descending order.
/// `U` and `V` are orthogonal; their determinants are not normalized, so
/// callers building rotations must handle the reflection case themselves.
pub fn svd3(a: &DMat3) -> SVD3Set {
    let max_abs = a
        .x_axis
        .abs()
        .max(a.y_axis.abs())
        .max(a.z_axis.abs())
        .max_element();
    let scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let a = *a * scale.recip();

    // eigenvectors of A^T * A are the right singular vectors
    let mut v = jacobi_eigenanalysis(Symmetric3x3::from_dmat3(&(a.transpose() * a)));
    let mut b = a * v;

    sort_singular_values(&mut b, &mut v);

    let qr = qr_decomposition(&mut b);

    let mut u = qr.q;
    let mut s = qr.r;

    if s.x_axis.x < 0.0 {
        u.x_axis = -u.x_axis;
    }
    if s.y_axis.y < 0.0 {
        u.y_axis = -u.y_axis;
    }
    if s.z_axis.z < 0.0 {
        u.z_axis = -u.z_axis;
    }

    s = DMat3::from_diagonal(
        DVec3::new(s.x_axis.x.abs(), s.y_axis.y.abs(), s.z_axis.z.abs()) * scale,
    );

    SVD3Set { u, s, v }
}
