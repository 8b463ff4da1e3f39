//! # Closed-form Determinant and Inverse-Transpose Utilities
//!
//! Reference dimensions never exceed three, so determinants and inverses of the Jacobian
//! are formed directly from cofactors instead of through a general factorization.
//!
//! ### Key Relations
//!
//! For a square matrix `J` with cofactor matrix `C` (so that `adj(J) = C^T`):
//!
//! ```text
//! det(J)  = sum_j J[0][j] C[0][j]
//! J^{-T}  = C / det(J)
//! ```
//!
//! `J^{-T}` maps reference-space gradients to physical-space gradients:
//! `grad_x f = J^{-T} grad_xi f`.
//!
//! ### Numeric policy
//! No tolerance is applied. A zero determinant produces non-finite inverse entries; deciding
//! whether such a point is acceptable is left to the quality checks.

use nalgebra::{Matrix2, Matrix3};
use ndarray::{ArrayView2, ArrayViewMut2};

/// Cofactor matrix of a 2x2 matrix (the transpose of its adjugate).
pub fn cofactor2x2(m: &Matrix2<f64>) -> Matrix2<f64> {
    Matrix2::new(
        m[(1, 1)], -m[(1, 0)],
       -m[(0, 1)],  m[(0, 0)],
    )
}

/// Cofactor matrix of a 3x3 matrix (the transpose of its adjugate).
pub fn cofactor3x3(m: &Matrix3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
        m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
        m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
        m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
        m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
        m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
    )
}

/// Determinant of `jacobian` (`n x n`, `n <= 3`); writes `J^{-T}` into `inverse_transpose`.
///
/// # Panics
/// Panics if the matrix is not square or larger than 3x3.
pub fn determinant_and_inverse_transpose(
    jacobian: ArrayView2<f64>,
    mut inverse_transpose: ArrayViewMut2<f64>,
) -> f64 {
    let n: usize = jacobian.nrows();
    assert_eq!(jacobian.ncols(), n, "jacobian must be square");
    assert_eq!(inverse_transpose.dim(), (n, n));

    match n {
        1 => {
            let det: f64 = jacobian[[0, 0]];
            inverse_transpose[[0, 0]] = det.recip();
            det
        }
        2 => {
            let m = Matrix2::from_fn(|r, c| jacobian[[r, c]]);
            let cofactor = cofactor2x2(&m);
            let det: f64 = m[(0, 0)] * cofactor[(0, 0)] + m[(0, 1)] * cofactor[(0, 1)];
            let inv_det: f64 = det.recip();
            for r in 0..2 {
                for c in 0..2 {
                    inverse_transpose[[r, c]] = cofactor[(r, c)] * inv_det;
                }
            }
            det
        }
        3 => {
            let m = Matrix3::from_fn(|r, c| jacobian[[r, c]]);
            let cofactor = cofactor3x3(&m);
            let det: f64 = m[(0, 0)] * cofactor[(0, 0)]
                + m[(0, 1)] * cofactor[(0, 1)]
                + m[(0, 2)] * cofactor[(0, 2)];
            let inv_det: f64 = det.recip();
            for r in 0..3 {
                for c in 0..3 {
                    inverse_transpose[[r, c]] = cofactor[(r, c)] * inv_det;
                }
            }
            det
        }
        _ => panic!("closed-form inverse is only available up to 3x3, got {n}x{n}"),
    }
}
