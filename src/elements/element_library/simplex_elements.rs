//! Nodal Lagrange bases for triangles, tetrahedra and prisms.
//!
//! ### Theory
//! These shapes have no 1D tensor structure in their nodes, so the nodal basis is obtained
//! from a modal one. With modes `phi_m` spanning the polynomial space of the element and
//! the generalized Vandermonde matrix `V[n, m] = phi_m(x_n)` at the nodes `x_n`, the
//! Lagrange functions are
//!
//! ```text
//! L(x) = phi(x)^T V^{-1}          (row vector over the nodes)
//! dL/dxi_d(x) = dphi/dxi_d(x)^T V^{-1}
//! ```
//!
//! The modes are the orthonormal Dubiner (PKD) polynomials, written in the collapsed
//! coordinates of the simplex:
//!
//! ```text
//! triangle     a = 2 (1 + xi) / (1 - eta) - 1               b = eta
//! tetrahedron  a = 2 (1 + xi) / (-eta - zeta) - 1           b = 2 (1 + eta) / (1 - zeta) - 1    c = zeta
//!
//! triangle     phi_ij  = P_i(a) (1 - b)^i P_j^{(2i+1,0)}(b)                                       i + j <= p
//! tetrahedron  phi_ijk = P_i(a) (1 - b)^i P_j^{(2i+1,0)}(b) (1 - c)^(i+j) P_k^{(2i+2j+2,0)}(c)    i + j + k <= p
//! prism        phi_ijk = phi_ij(xi, eta) P_k(zeta)                                                i + j <= p, k <= p
//! ```
//!
//! with `P^{(alpha,0)}` the Jacobi polynomials normalized on their weight. Derivatives are
//! taken by the chain rule with the `(1 - b)` and `(1 - c)` powers already cancelled, so they
//! stay finite on the collapsed edge and at the top vertex, where `a` (and `b`) are set to -1.

use crate::config::NodeDistribution;
use crate::elements::element_interfaces::{NodalBasedShapeFunctions, Tabulation};
use crate::elements::element_library::node_distributions::reference_nodes;
use crate::elements::geometry_kind::GeometryKind;
use crate::elements::quadrature::gauss_jacobi::jacobi_with_derivatives;
use crate::error::{FemError, Result};
use itertools::iproduct;
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::f64::consts::SQRT_2;

/// Distance to a collapsed edge or vertex below which the collapsed coordinate is pinned to -1.
const COLLAPSE_TOLERANCE: f64 = 1e-13;

#[derive(Debug, Clone, PartialEq)]
pub struct VandermondeShapeFunctions {
    kind: GeometryKind,
    degree: usize,
    nodes: Array2<f64>,
    /// Dubiner indices `[i, j, k]` per mode.
    modes: Vec<[usize; 3]>,
    /// `V^{-1}`, `[n_modes, n_basis]`.
    inverse_vandermonde: Array2<f64>,
}

impl VandermondeShapeFunctions {
    pub fn new(kind: GeometryKind, degree: usize, distribution: NodeDistribution) -> Result<Self> {
        let p: usize = degree;
        let modes: Vec<[usize; 3]> = match kind {
            GeometryKind::Triangle => iproduct!(0..=p, 0..=p)
                .filter(|(i, j)| i + j <= p)
                .map(|(i, j)| [i, j, 0])
                .collect(),
            GeometryKind::Tetrahedron => iproduct!(0..=p, 0..=p, 0..=p)
                .filter(|(i, j, k)| i + j + k <= p)
                .map(|(i, j, k)| [i, j, k])
                .collect(),
            GeometryKind::Prism => iproduct!(0..=p, 0..=p, 0..=p)
                .filter(|(i, j, _)| i + j <= p)
                .map(|(i, j, k)| [i, j, k])
                .collect(),
            _ => {
                return Err(FemError::NotImplemented {
                    operation: "vandermonde_shape_functions",
                    kind,
                });
            }
        };

        let nodes: Array2<f64> = reference_nodes(kind, degree, distribution);
        let n_basis: usize = nodes.nrows();
        debug_assert_eq!(modes.len(), n_basis);

        let vandermonde: DMatrix<f64> = {
            let (values, _) = evaluate_modes(kind, &modes, p, nodes.view(), false);
            DMatrix::from_fn(n_basis, n_basis, |r, c| values[[r, c]])
        };

        let inverse: DMatrix<f64> = vandermonde.try_inverse().ok_or_else(|| FemError::Configuration {
            kind,
            degree,
            order_exact: 0,
            reason: format!("{distribution:?} nodes are not unisolvent"),
        })?;

        let inverse_vandermonde = Array2::from_shape_fn((n_basis, n_basis), |(r, c)| inverse[(r, c)]);

        Ok(Self {
            kind,
            degree,
            nodes,
            modes,
            inverse_vandermonde,
        })
    }
}

/// Values and derivatives of `P_0 ..= P_max_degree`, orthonormal for the weight `(1 - x)^alpha`.
fn orthonormal_jacobi(max_degree: usize, alpha: usize, x: f64) -> (Vec<f64>, Vec<f64>) {
    let (mut values, mut derivatives) = jacobi_with_derivatives(max_degree, alpha as f64, 0.0, x);
    let weight_integral: f64 = 2.0_f64.powi(alpha as i32 + 1);
    for (n, (value, derivative)) in values.iter_mut().zip(derivatives.iter_mut()).enumerate() {
        let scale: f64 = ((2 * n + alpha + 1) as f64 / weight_integral).sqrt();
        *value *= scale;
        *derivative *= scale;
    }
    (values, derivatives)
}

/// `x^e`, or zero for a negative exponent. Negative exponents only appear in terms whose
/// polynomial factor vanishes.
fn power(x: f64, e: isize) -> f64 {
    if e < 0 { 0.0 } else { x.powi(e as i32) }
}

/// The Jacobi families needed by every mode, evaluated once per point.
struct CollapsedPoint {
    kind: GeometryKind,
    a: f64,
    b: f64,
    c: f64,
    /// `P_i(a)`
    fa: (Vec<f64>, Vec<f64>),
    /// `gb[i]`: `P_j^{(2i+1,0)}(b)`
    gb: Vec<(Vec<f64>, Vec<f64>)>,
    /// Tetrahedron: `hc[i + j]` holds `P_k^{(2i+2j+2,0)}(c)`. Prism: `hc[0]` holds `P_k(zeta)`.
    hc: Vec<(Vec<f64>, Vec<f64>)>,
}

impl CollapsedPoint {
    fn new(kind: GeometryKind, degree: usize, point: ArrayView1<f64>) -> Self {
        let p: usize = degree;
        let (a, b, c) = match kind {
            GeometryKind::Tetrahedron => {
                let (xi, eta, zeta) = (point[0], point[1], point[2]);
                let a = if -eta - zeta > COLLAPSE_TOLERANCE {
                    2.0 * (1.0 + xi) / (-eta - zeta) - 1.0
                } else {
                    -1.0
                };
                let b = if 1.0 - zeta > COLLAPSE_TOLERANCE {
                    2.0 * (1.0 + eta) / (1.0 - zeta) - 1.0
                } else {
                    -1.0
                };
                (a, b, zeta)
            }
            _ => {
                let (xi, eta) = (point[0], point[1]);
                let a = if 1.0 - eta > COLLAPSE_TOLERANCE {
                    2.0 * (1.0 + xi) / (1.0 - eta) - 1.0
                } else {
                    -1.0
                };
                let c = if kind == GeometryKind::Prism { point[2] } else { 0.0 };
                (a, eta, c)
            }
        };

        let fa = orthonormal_jacobi(p, 0, a);
        let gb = (0..=p).map(|i| orthonormal_jacobi(p - i, 2 * i + 1, b)).collect();
        let hc = match kind {
            GeometryKind::Tetrahedron => (0..=p).map(|m| orthonormal_jacobi(p - m, 2 * m + 2, c)).collect(),
            GeometryKind::Prism => vec![orthonormal_jacobi(p, 0, c)],
            _ => Vec::new(),
        };

        Self { kind, a, b, c, fa, gb, hc }
    }

    /// Value and reference gradient of the triangle mode `phi_ij`.
    fn triangle_mode(&self, i: usize, j: usize) -> (f64, [f64; 2]) {
        let (f, df) = (self.fa.0[i], self.fa.1[i]);
        let (g, dg) = (self.gb[i].0[j], self.gb[i].1[j]);
        let ob: f64 = 1.0 - self.b;
        let ob_i: f64 = power(ob, i as isize);
        let ob_im1: f64 = power(ob, i as isize - 1);

        let value = SQRT_2 * f * g * ob_i;
        let d_xi = SQRT_2 * 2.0 * df * g * ob_im1;
        let d_eta = SQRT_2 * (df * (1.0 + self.a) * g * ob_im1 + f * dg * ob_i - i as f64 * f * g * ob_im1);
        (value, [d_xi, d_eta])
    }

    fn tetrahedron_mode(&self, i: usize, j: usize, k: usize) -> (f64, [f64; 3]) {
        let scale: f64 = 2.0 * SQRT_2;
        let m: usize = i + j;
        let (f, df) = (self.fa.0[i], self.fa.1[i]);
        let (g, dg) = (self.gb[i].0[j], self.gb[i].1[j]);
        let (h, dh) = (self.hc[m].0[k], self.hc[m].1[k]);
        let (ob, oc) = (1.0 - self.b, 1.0 - self.c);
        let ob_i: f64 = power(ob, i as isize);
        let ob_im1: f64 = power(ob, i as isize - 1);
        let oc_m: f64 = power(oc, m as isize);
        let oc_mm1: f64 = power(oc, m as isize - 1);

        // d/db of P_j^{(2i+1,0)}(b) (1 - b)^i
        let g_b: f64 = dg * ob_i - i as f64 * g * ob_im1;
        // common part of the derivatives through a
        let through_a: f64 = 2.0 * df * (1.0 + self.a) * g * ob_im1 * h * oc_mm1;

        let value = scale * f * g * ob_i * h * oc_m;
        let d_xi = scale * 4.0 * df * g * ob_im1 * h * oc_mm1;
        let d_eta = scale * (through_a + 2.0 * f * g_b * h * oc_mm1);
        let d_zeta = scale
            * (through_a
                + f * g_b * (1.0 + self.b) * h * oc_mm1
                + f * g * ob_i * (dh * oc_m - m as f64 * h * oc_mm1));
        (value, [d_xi, d_eta, d_zeta])
    }

    fn prism_mode(&self, i: usize, j: usize, k: usize) -> (f64, [f64; 3]) {
        let (value, [d_xi, d_eta]) = self.triangle_mode(i, j);
        let (l, dl) = (self.hc[0].0[k], self.hc[0].1[k]);
        (value * l, [d_xi * l, d_eta * l, value * dl])
    }

    fn mode(&self, [i, j, k]: [usize; 3]) -> (f64, [f64; 3]) {
        match self.kind {
            GeometryKind::Tetrahedron => self.tetrahedron_mode(i, j, k),
            GeometryKind::Prism => self.prism_mode(i, j, k),
            _ => {
                let (value, [d_xi, d_eta]) = self.triangle_mode(i, j);
                (value, [d_xi, d_eta, 0.0])
            }
        }
    }
}

/// Mode values `[n_points, n_modes]` and, if requested, their reference derivatives.
fn evaluate_modes(
    kind: GeometryKind,
    modes: &[[usize; 3]],
    degree: usize,
    points: ArrayView2<f64>,
    with_derivatives: bool,
) -> (Array2<f64>, Vec<Array2<f64>>) {
    let dim: usize = points.ncols();
    let n_points: usize = points.nrows();
    let mut values: Array2<f64> = Array2::zeros((n_points, modes.len()));
    let mut derivatives: Vec<Array2<f64>> = if with_derivatives {
        vec![Array2::zeros((n_points, modes.len())); dim]
    } else {
        Vec::new()
    };

    for (p, point) in points.rows().into_iter().enumerate() {
        let collapsed = CollapsedPoint::new(kind, degree, point);

        for (m, &mode) in modes.iter().enumerate() {
            let (value, gradient) = collapsed.mode(mode);
            values[[p, m]] = value;
            for (d, derivative) in derivatives.iter_mut().enumerate() {
                derivative[[p, m]] = gradient[d];
            }
        }
    }

    (values, derivatives)
}

impl NodalBasedShapeFunctions for VandermondeShapeFunctions {
    fn kind(&self) -> GeometryKind {
        self.kind
    }

    fn degree(&self) -> usize {
        self.degree
    }

    fn nodes(&self) -> &Array2<f64> {
        &self.nodes
    }

    fn tabulate(&self, points: ArrayView2<f64>) -> Tabulation {
        let (values, derivatives) = evaluate_modes(self.kind, &self.modes, self.degree, points, true);
        Tabulation {
            values: values.dot(&self.inverse_vandermonde),
            derivatives: derivatives
                .iter()
                .map(|derivative| derivative.dot(&self.inverse_vandermonde))
                .collect(),
        }
    }
}
