//! One-dimensional Gauss-Jacobi, Gauss-Legendre and Gauss-Lobatto point sets.
//!
//! ### Overview
//! All 1D rules live on `[-1, 1]`. Points are the eigenvalues of the symmetric tridiagonal
//! Jacobi matrix of the orthogonal polynomial family (Golub-Welsch); weights are the squared
//! first components of the normalized eigenvectors times the integral of the weight function.
//!
//! | rule                         | weight function        | exact for degree |
//! |------------------------------|------------------------|------------------|
//! | `gauss_legendre(n)`          | 1                      | 2n - 1           |
//! | `gauss_jacobi(n, alpha, 0)`  | (1 - x)^alpha          | 2n - 1           |
//! | `gauss_lobatto_points(n)`    | nodes only             | -                |
//!
//! The Gauss-Legendre rules used by the integration rules are memoized in a lazily built
//! table, the remaining rules are computed on demand.

use nalgebra::{DMatrix, SymmetricEigen};
use once_cell::sync::Lazy;

/// Largest number of points per direction handed out by the memoized Gauss-Legendre table.
pub const MAX_MEMOIZED_POINTS: usize = 24;

/// Points and weights of a 1D rule, points sorted in increasing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule1D {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Rule1D {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + Clone + '_ {
        self.points.iter().copied().zip(self.weights.iter().copied())
    }
}

static GAUSS_LEGENDRE: Lazy<Vec<Rule1D>> = Lazy::new(|| {
    (0..=MAX_MEMOIZED_POINTS)
        .map(|n| golub_welsch(n, 0.0, 0.0))
        .collect()
});

/// Gauss-Legendre rule with `n` points, exact for polynomials of degree `2n - 1`.
pub fn gauss_legendre(n: usize) -> Rule1D {
    match GAUSS_LEGENDRE.get(n) {
        Some(rule) => rule.clone(),
        None => golub_welsch(n, 0.0, 0.0),
    }
}

/// Gauss-Jacobi rule with `n` points for the weight `(1 - x)^alpha`.
pub fn gauss_jacobi(n: usize, alpha: f64) -> Rule1D {
    if alpha == 0.0 {
        return gauss_legendre(n);
    }
    golub_welsch(n, alpha, 0.0)
}

/// Gauss-Jacobi points for the weight `(1 - x)^alpha (1 + x)^beta` (no weights).
pub fn gauss_jacobi_points(n: usize, alpha: f64, beta: f64) -> Vec<f64> {
    jacobi_eigen_decomposition(n, alpha, beta)
        .into_iter()
        .map(|(x, _)| x)
        .collect()
}

/// Legendre-Gauss-Lobatto points: the end points plus the roots of `P'_{n-1}`.
///
/// # Panics
/// Panics if `n < 2`, since the set always contains both end points.
pub fn gauss_lobatto_points(n: usize) -> Vec<f64> {
    assert!(n >= 2, "a Gauss-Lobatto set needs at least two points");
    let mut points: Vec<f64> = Vec::with_capacity(n);
    points.push(-1.0);
    points.extend(gauss_jacobi_points(n - 2, 1.0, 1.0));
    points.push(1.0);
    points
}

fn golub_welsch(n: usize, alpha: f64, beta: f64) -> Rule1D {
    debug_assert!(beta == 0.0, "weights are only available for beta = 0");
    // Integral of (1 - x)^alpha over [-1, 1]
    let mu0: f64 = 2.0_f64.powf(alpha + 1.0) / (alpha + 1.0);

    let (points, weights): (Vec<f64>, Vec<f64>) = jacobi_eigen_decomposition(n, alpha, beta)
        .into_iter()
        .map(|(x, v0)| (x, v0 * v0 * mu0))
        .unzip();

    Rule1D { points, weights }
}

/// Eigenvalues of the Jacobi matrix paired with the first component of their eigenvector,
/// sorted by eigenvalue.
fn jacobi_eigen_decomposition(n: usize, alpha: f64, beta: f64) -> Vec<(f64, f64)> {
    if n == 0 {
        return Vec::new();
    }

    let ab: f64 = alpha + beta;
    let h = |i: usize| 2.0 * i as f64 + ab;

    let diagonal: Vec<f64> = (0..n)
        .map(|i| {
            let hi = h(i);
            if hi.abs() < f64::EPSILON {
                0.0
            } else {
                (beta * beta - alpha * alpha) / ((hi + 2.0) * hi)
            }
        })
        .collect();

    let off_diagonal: Vec<f64> = (1..n)
        .map(|i| {
            let fi = i as f64;
            let hi = h(i - 1);
            2.0 / (hi + 2.0)
                * (fi * (fi + ab) * (fi + alpha) * (fi + beta) / ((hi + 1.0) * (hi + 3.0))).sqrt()
        })
        .collect();

    let jacobi_matrix: DMatrix<f64> = DMatrix::from_fn(n, n, |r, c| {
        if r == c {
            diagonal[r]
        } else if r == c + 1 {
            off_diagonal[c]
        } else if c == r + 1 {
            off_diagonal[r]
        } else {
            0.0
        }
    });

    let eigen_decomp = SymmetricEigen::new(jacobi_matrix);

    let mut xw: Vec<(f64, f64)> = eigen_decomp
        .eigenvalues
        .iter()
        .copied()
        .zip(eigen_decomp.eigenvectors.row(0).iter().copied())
        .collect();

    xw.sort_by(|a, b| a.0.total_cmp(&b.0));

    // The symmetric Jacobi matrix gives the exact interval symmetry only up to round-off;
    // restore it so tabulations on symmetric rules are symmetric as well.
    if alpha == beta {
        for i in 0..n / 2 {
            let x = 0.5 * (xw[n - 1 - i].0 - xw[i].0);
            let w = 0.5 * (xw[i].1.abs() + xw[n - 1 - i].1.abs());
            xw[i] = (-x, w);
            xw[n - 1 - i] = (x, w);
        }
        if n % 2 == 1 {
            xw[n / 2].0 = 0.0;
        }
    }

    xw
}

/// Values and first derivatives of the Jacobi polynomials `P_0^{(alpha, beta)} ..= P_max_degree^{(alpha, beta)}`
/// at `x`, by the three-term recurrence and its derivative. `alpha = beta = 0` gives Legendre.
pub fn jacobi_with_derivatives(max_degree: usize, alpha: f64, beta: f64, x: f64) -> (Vec<f64>, Vec<f64>) {
    let mut values: Vec<f64> = vec![0.0; max_degree + 1];
    let mut derivatives: Vec<f64> = vec![0.0; max_degree + 1];

    values[0] = 1.0;
    if max_degree >= 1 {
        values[1] = 0.5 * ((alpha + beta + 2.0) * x + alpha - beta);
        derivatives[1] = 0.5 * (alpha + beta + 2.0);
    }
    for n in 2..=max_degree {
        let fnn = n as f64;
        let c = 2.0 * fnn + alpha + beta;
        let a1 = 2.0 * fnn * (fnn + alpha + beta) * (c - 2.0);
        let a2 = (c - 1.0) * (alpha * alpha - beta * beta);
        let a3 = (c - 2.0) * (c - 1.0) * c;
        let a4 = 2.0 * (fnn + alpha - 1.0) * (fnn + beta - 1.0) * c;
        values[n] = ((a2 + a3 * x) * values[n - 1] - a4 * values[n - 2]) / a1;
        derivatives[n] = ((a2 + a3 * x) * derivatives[n - 1] + a3 * values[n - 1] - a4 * derivatives[n - 2]) / a1;
    }

    (values, derivatives)
}
