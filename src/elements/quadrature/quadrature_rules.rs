//! Integration rules on the reference elements.
//!
//! ### Overview
//! An [`IntegrationRule`] integrates every polynomial of total degree `order_exact` exactly
//! over the reference element of its [`GeometryKind`]. With `n = order_exact / 2 + 1` points
//! per direction:
//! - **Line, quadrilateral, hexahedron**: tensor products of the n-point Gauss-Legendre rule.
//! - **Triangle, tetrahedron, prism, pyramid**: tensor products in collapsed coordinates.
//!   The collapsing factors `(1 - b)` and `(1 - c)^2` of the Duffy transformation are
//!   absorbed into Gauss-Jacobi rules with `alpha = 1` and `alpha = 2`, so the point count
//!   per direction does not grow.
//!
//! ### Collapsed maps
//! ```text
//! triangle    xi = (1 + a)(1 - b)/2 - 1,        eta = b
//! tetrahedron xi = (1 + a)(1 - b)(1 - c)/4 - 1, eta = (1 + b)(1 - c)/2 - 1, zeta = c
//! pyramid     xi = a (1 - c)/2,                 eta = b (1 - c)/2,            zeta = c
//! ```
//!
//! Points are stored row-wise (`[n_points, dim]`), the first coordinate varying fastest.

use crate::elements::geometry_kind::GeometryKind;
use crate::elements::quadrature::gauss_jacobi::{Rule1D, gauss_jacobi, gauss_legendre};
use crate::error::{FemError, Result};
use itertools::iproduct;
use ndarray::{Array1, Array2};

/// Highest supported exactness order.
pub const MAX_INTEGRATION_ORDER: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationRule {
    kind: GeometryKind,
    order_exact: usize,
    points: Array2<f64>,
    weights: Array1<f64>,
}

impl IntegrationRule {
    pub fn new(kind: GeometryKind, order_exact: usize) -> Result<Self> {
        if order_exact > MAX_INTEGRATION_ORDER {
            return Err(FemError::Configuration {
                kind,
                degree: 0,
                order_exact,
                reason: format!("integration order above {MAX_INTEGRATION_ORDER}"),
            });
        }

        let n: usize = order_exact / 2 + 1;
        let gl: Rule1D = gauss_legendre(n);

        let (points, weights): (Vec<Vec<f64>>, Vec<f64>) = match kind {
            GeometryKind::Line => gl.iter().map(|(x, w)| (vec![x], w)).unzip(),
            GeometryKind::Quadrilateral => iproduct!(gl.iter(), gl.iter())
                .map(|((y, wy), (x, wx))| (vec![x, y], wx * wy))
                .unzip(),
            GeometryKind::Hexahedron => iproduct!(gl.iter(), gl.iter(), gl.iter())
                .map(|((z, wz), (y, wy), (x, wx))| (vec![x, y, z], wx * wy * wz))
                .unzip(),
            GeometryKind::Triangle => collapsed_triangle(&gl, &gauss_jacobi(n, 1.0)),
            GeometryKind::Prism => {
                let (triangle_points, triangle_weights) =
                    collapsed_triangle(&gl, &gauss_jacobi(n, 1.0));
                iproduct!(gl.iter(), triangle_points.iter().zip(triangle_weights.iter()))
                    .map(|((z, wz), (p, &w))| (vec![p[0], p[1], z], w * wz))
                    .unzip()
            }
            GeometryKind::Tetrahedron => {
                let gj1: Rule1D = gauss_jacobi(n, 1.0);
                let gj2: Rule1D = gauss_jacobi(n, 2.0);
                iproduct!(gj2.iter(), gj1.iter(), gl.iter())
                    .map(|((c, wc), (b, wb), (a, wa))| {
                        let xi = 0.25 * (1.0 + a) * (1.0 - b) * (1.0 - c) - 1.0;
                        let eta = 0.5 * (1.0 + b) * (1.0 - c) - 1.0;
                        (vec![xi, eta, c], 0.125 * wa * wb * wc)
                    })
                    .unzip()
            }
            GeometryKind::Pyramid => {
                let gj2: Rule1D = gauss_jacobi(n, 2.0);
                iproduct!(gj2.iter(), gl.iter(), gl.iter())
                    .map(|((c, wc), (b, wb), (a, wa))| {
                        let scale = 0.5 * (1.0 - c);
                        (vec![a * scale, b * scale, c], 0.25 * wa * wb * wc)
                    })
                    .unzip()
            }
        };

        let dim: usize = kind.reference_dimension();
        let n_points: usize = weights.len();
        let points = Array2::from_shape_vec((n_points, dim), points.concat())?;

        Ok(IntegrationRule {
            kind,
            order_exact,
            points,
            weights: Array1::from(weights),
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn order_exact(&self) -> usize {
        self.order_exact
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Reference coordinates, `[n_points, dim]`.
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Apply the rule to a function of the reference coordinates.
    pub fn integrate(&self, f: impl Fn(&[f64]) -> f64) -> f64 {
        self.points
            .rows()
            .into_iter()
            .zip(self.weights.iter())
            .map(|(point, w)| w * f(&point.to_vec()))
            .sum()
    }
}

fn collapsed_triangle(gl: &Rule1D, gj1: &Rule1D) -> (Vec<Vec<f64>>, Vec<f64>) {
    iproduct!(gj1.iter(), gl.iter())
        .map(|((b, wb), (a, wa))| {
            let xi = 0.5 * (1.0 + a) * (1.0 - b) - 1.0;
            (vec![xi, b], 0.5 * wa * wb)
        })
        .unzip()
}
