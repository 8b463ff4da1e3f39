//! Lagrange shape functions for line, quadrilateral and hexahedral elements.
//!
//! # Construction
//!
//! The basis is the tensor product of the 1D Lagrange polynomials on `degree + 1` nodes
//! (equidistant or Gauss-Lobatto). For node index `n = (k (p+1) + j)(p+1) + i`:
//!
//! ```text
//! N_n(xi, eta, zeta)    = l_i(xi) l_j(eta) l_k(zeta)
//! dN_n/dxi              = l'_i(xi) l_j(eta) l_k(zeta)
//! dN_n/deta             = l_i(xi) l'_j(eta) l_k(zeta)
//! dN_n/dzeta            = l_i(xi) l_j(eta) l'_k(zeta)
//! ```
//!
//! # Example: degree 2 quadrilateral, equidistant nodes
//!
//! ```text
//!     xi  eta
//!     -1  -1
//!      0  -1
//!      1  -1
//!     -1   0
//!      0   0
//!      1   0
//!     -1   1
//!      0   1
//!      1   1
//! ```

use crate::config::NodeDistribution;
use crate::elements::element_interfaces::{NodalBasedShapeFunctions, Tabulation};
use crate::elements::element_library::node_distributions::{nodes_1d, reference_nodes};
use crate::elements::geometry_kind::GeometryKind;
use ndarray::{Array2, ArrayView2};

/// 1D Lagrange polynomials on an arbitrary set of distinct nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShapeFunctions {
    nodes: Vec<f64>,
}

impl LineShapeFunctions {
    pub fn new(nodes: Vec<f64>) -> Self {
        Self { nodes }
    }

    /// `l_i(x)` for every node `i`.
    pub fn evaluate_shape_functions(&self, x: f64) -> Vec<f64> {
        let n: usize = self.nodes.len();
        (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&m| m != i)
                    .map(|m| (x - self.nodes[m]) / (self.nodes[i] - self.nodes[m]))
                    .product()
            })
            .collect()
    }

    /// `l'_i(x)` for every node `i`.
    pub fn evaluate_derivatives(&self, x: f64) -> Vec<f64> {
        let n: usize = self.nodes.len();
        let nodes = &self.nodes;
        (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&k| k != i)
                    .map(|k| {
                        let partial: f64 = (0..n)
                            .filter(|&m| m != i && m != k)
                            .map(|m| (x - nodes[m]) / (nodes[i] - nodes[m]))
                            .product();
                        partial / (nodes[i] - nodes[k])
                    })
                    .sum()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HypercubeShapeFunctions {
    kind: GeometryKind,
    degree: usize,
    line: LineShapeFunctions,
    nodes: Array2<f64>,
}

impl HypercubeShapeFunctions {
    pub fn new(kind: GeometryKind, degree: usize, distribution: NodeDistribution) -> Self {
        debug_assert!(kind.is_hypercube());
        Self {
            kind,
            degree,
            line: LineShapeFunctions::new(nodes_1d(degree, distribution)),
            nodes: reference_nodes(kind, degree, distribution),
        }
    }
}

impl NodalBasedShapeFunctions for HypercubeShapeFunctions {
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
        let dim: usize = self.kind.reference_dimension();
        let n1: usize = self.degree + 1;
        let n_basis: usize = n1.pow(dim as u32);
        let mut table = Tabulation::zeros(points.nrows(), n_basis, dim);

        for (p, point) in points.rows().into_iter().enumerate() {
            // per direction: 1D values and derivatives
            let line_values: Vec<Vec<f64>> = point
                .iter()
                .map(|&x| self.line.evaluate_shape_functions(x))
                .collect();
            let line_derivatives: Vec<Vec<f64>> = point
                .iter()
                .map(|&x| self.line.evaluate_derivatives(x))
                .collect();

            for n in 0..n_basis {
                let mut index: [usize; 3] = [0; 3];
                let mut rest = n;
                for entry in index.iter_mut().take(dim) {
                    *entry = rest % n1;
                    rest /= n1;
                }

                table.values[[p, n]] = (0..dim).map(|d| line_values[d][index[d]]).product();
                for (d, derivative) in table.derivatives.iter_mut().enumerate() {
                    derivative[[p, n]] = (0..dim)
                        .map(|e| {
                            if e == d {
                                line_derivatives[e][index[e]]
                            } else {
                                line_values[e][index[e]]
                            }
                        })
                        .product();
                }
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_linear_line_shape_functions() {
        let line = LineShapeFunctions::new(vec![-1.0, 1.0]);
        let values = line.evaluate_shape_functions(0.5);
        assert_relative_eq!(values[0], 0.25, epsilon = 1e-15);
        assert_relative_eq!(values[1], 0.75, epsilon = 1e-15);
        let derivatives = line.evaluate_derivatives(0.5);
        assert_relative_eq!(derivatives[0], -0.5, epsilon = 1e-15);
        assert_relative_eq!(derivatives[1], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_quadratic_line_shape_functions() {
        // N1 = x(x-1)/2, N2 = 1 - x^2, N3 = x(x+1)/2
        let line = LineShapeFunctions::new(vec![-1.0, 0.0, 1.0]);
        let x = 0.3;
        let values = line.evaluate_shape_functions(x);
        assert_relative_eq!(values[0], 0.5 * x * (x - 1.0), epsilon = 1e-15);
        assert_relative_eq!(values[1], 1.0 - x * x, epsilon = 1e-15);
        assert_relative_eq!(values[2], 0.5 * x * (x + 1.0), epsilon = 1e-15);
        let derivatives = line.evaluate_derivatives(x);
        assert_relative_eq!(derivatives[0], x - 0.5, epsilon = 1e-15);
        assert_relative_eq!(derivatives[1], -2.0 * x, epsilon = 1e-15);
        assert_relative_eq!(derivatives[2], x + 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_bilinear_quadrilateral_at_center() {
        let basis =
            HypercubeShapeFunctions::new(GeometryKind::Quadrilateral, 1, NodeDistribution::Equidistant);
        let table = basis.tabulate(array![[0.0, 0.0]].view());
        let expected_dxi = [-0.25, 0.25, -0.25, 0.25];
        let expected_deta = [-0.25, -0.25, 0.25, 0.25];
        for n in 0..4 {
            assert_relative_eq!(table.values[[0, n]], 0.25, epsilon = 1e-15);
            assert_relative_eq!(table.derivatives[0][[0, n]], expected_dxi[n], epsilon = 1e-15);
            assert_relative_eq!(table.derivatives[1][[0, n]], expected_deta[n], epsilon = 1e-15);
        }
    }

    #[test]
    fn test_trilinear_hexahedron_at_center() {
        let basis =
            HypercubeShapeFunctions::new(GeometryKind::Hexahedron, 1, NodeDistribution::LegendreGaussLobatto);
        let table = basis.tabulate(array![[0.0, 0.0, 0.0]].view());
        for n in 0..8 {
            assert_relative_eq!(table.values[[0, n]], 0.125, epsilon = 1e-15);
            for d in 0..3 {
                let sign = if (n >> d) & 1 == 1 { 1.0 } else { -1.0 };
                assert_relative_eq!(table.derivatives[d][[0, n]], sign * 0.125, epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let basis =
            HypercubeShapeFunctions::new(GeometryKind::Hexahedron, 3, NodeDistribution::LegendreGaussLobatto);
        let point = [0.21, -0.47, 0.63];
        let h = 1e-6;
        let table = basis.tabulate(array![[point[0], point[1], point[2]]].view());
        for d in 0..3 {
            let mut plus = point;
            let mut minus = point;
            plus[d] += h;
            minus[d] -= h;
            let t_plus = basis.tabulate(array![[plus[0], plus[1], plus[2]]].view());
            let t_minus = basis.tabulate(array![[minus[0], minus[1], minus[2]]].view());
            for n in 0..basis.number_of_nodes() {
                let numerical = (t_plus.values[[0, n]] - t_minus.values[[0, n]]) / (2.0 * h);
                assert_relative_eq!(table.derivatives[d][[0, n]], numerical, epsilon = 1e-7);
            }
        }
    }
}
