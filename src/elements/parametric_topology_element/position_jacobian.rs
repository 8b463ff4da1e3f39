//! # Batched Jacobian Computation
//!
//! This module maps the nodal coordinates of a batch of elements to interpolated
//! coordinates, Jacobian matrices and metric terms at a set of reference points.
//!
//! ### Overview
//! With the basis tabulation `N` (`[n_points, n_basis]`), its derivative blocks `dN/dxi_d`
//! and a [`CoordinateBatch`] `X` (`[n_basis, n_elements * n_dim]`), one matrix product per
//! reference direction evaluates every element of the batch at once:
//!
//! ```text
//! values        = N         X      [n_points, n_elements * n_dim]
//! derivative_d  = dN/dxi_d  X      [n_points, n_elements * n_dim]
//! ```
//!
//! ### Theory
//! Column `e * n_dim + s` of `derivative_d` holds `d x_s / d xi_d` of element `e`, so the
//! Jacobian of element `e` at point `p` is
//!
//! ```text
//! J[s][d] = derivative_d[p, e * n_dim + s] = sum_i x_{i,s} dN_i/dxi_d (xi_p)
//! ```
//!
//! Determinants and inverse transposes follow in closed form (see
//! [`determinant_and_adjugate`](super::determinant_and_adjugate)).
//!
//! ### Performance
//! The products go through `ndarray::linalg::general_mat_mul`, so the fixed cost of the
//! reference tabulation is amortized over the whole batch. Batch size only affects speed;
//! every column is computed from the same row of the tabulation regardless of how many
//! elements are packed next to it.

use crate::elements::element_interfaces::Tabulation;
use crate::elements::parametric_topology_element::coordinate_batch::CoordinateBatch;
use crate::elements::parametric_topology_element::determinant_and_adjugate::determinant_and_inverse_transpose;
use crate::error::{FemError, Result};
use ndarray::linalg::general_mat_mul;
use ndarray::{Array1, Array2, Array4, ArrayView1, ArrayView2, ArrayViewMut2, s};

/// Largest Jacobian handled by the closed-form determinant.
const MAX_METRIC_DIMENSION: usize = 3;

/// Interpolated coordinates and their reference derivatives for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationPointData {
    /// `[n_points, n_elements * n_dim]`
    pub values: Array2<f64>,
    /// One `[n_points, n_elements * n_dim]` block per reference direction, empty when
    /// derivatives were not requested.
    pub derivatives: Vec<Array2<f64>>,
    n_elements: usize,
    n_dim: usize,
}

impl IntegrationPointData {
    pub fn n_points(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_elements(&self) -> usize {
        self.n_elements
    }

    pub fn n_dim(&self) -> usize {
        self.n_dim
    }

    /// Physical coordinates of point `p` of element `e`.
    pub fn point(&self, e: usize, p: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![p, e * self.n_dim..(e + 1) * self.n_dim])
    }
}

fn check_basis_count(table: &Tabulation, coordinates: &CoordinateBatch) -> Result<()> {
    if table.n_basis() != coordinates.n_basis() {
        return Err(FemError::DimensionMismatch {
            context: "nodes per element",
            kind: None,
            expected: table.n_basis(),
            found: coordinates.n_basis(),
        });
    }
    Ok(())
}

fn check_output(output: &ArrayViewMut2<f64>, rows: usize, columns: usize) -> Result<()> {
    if output.dim() != (rows, columns) {
        return Err(FemError::DimensionMismatch {
            context: "integration point output block",
            kind: None,
            expected: rows * columns,
            found: output.len(),
        });
    }
    Ok(())
}

/// Evaluate the batch into caller-owned blocks.
///
/// `derivatives` is either empty (values only) or holds one block per reference direction.
pub fn compute_integration_point_data_into(
    table: &Tabulation,
    coordinates: &CoordinateBatch,
    mut values: ArrayViewMut2<f64>,
    derivatives: &mut [ArrayViewMut2<f64>],
) -> Result<()> {
    check_basis_count(table, coordinates)?;
    let rows: usize = table.n_points();
    let columns: usize = coordinates.n_elements() * coordinates.n_dim();

    if !derivatives.is_empty() && derivatives.len() != table.derivatives.len() {
        return Err(FemError::DimensionMismatch {
            context: "derivative blocks",
            kind: None,
            expected: table.derivatives.len(),
            found: derivatives.len(),
        });
    }
    check_output(&values, rows, columns)?;
    for block in derivatives.iter() {
        check_output(block, rows, columns)?;
    }

    let x: ArrayView2<f64> = coordinates.view();
    general_mat_mul(1.0, &table.values, &x, 0.0, &mut values);
    for (block, table_derivative) in derivatives.iter_mut().zip(table.derivatives.iter()) {
        general_mat_mul(1.0, table_derivative, &x, 0.0, block);
    }

    Ok(())
}

/// Evaluate the batch into newly allocated blocks.
pub fn compute_integration_point_data(
    table: &Tabulation,
    coordinates: &CoordinateBatch,
    with_derivatives: bool,
) -> Result<IntegrationPointData> {
    let rows: usize = table.n_points();
    let columns: usize = coordinates.n_elements() * coordinates.n_dim();
    let n_derivatives: usize = if with_derivatives { table.derivatives.len() } else { 0 };

    let mut values: Array2<f64> = Array2::zeros((rows, columns));
    let mut derivatives: Vec<Array2<f64>> = vec![Array2::zeros((rows, columns)); n_derivatives];
    {
        let mut derivative_views: Vec<ArrayViewMut2<f64>> =
            derivatives.iter_mut().map(|block| block.view_mut()).collect();
        compute_integration_point_data_into(table, coordinates, values.view_mut(), &mut derivative_views)?;
    }

    Ok(IntegrationPointData {
        values,
        derivatives,
        n_elements: coordinates.n_elements(),
        n_dim: coordinates.n_dim(),
    })
}

/// Jacobians, determinants and inverse transposes per element and point.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTerms {
    /// `[n_elements, n_points, n_dim, n_dim]`, entry `[e, p, s, d] = d x_s / d xi_d`
    jacobians: Array4<f64>,
    /// `[n_elements, n_points]`
    determinants: Array2<f64>,
    /// `[n_elements, n_points, n_dim, n_dim]`
    inverse_transposes: Array4<f64>,
}

impl MetricTerms {
    /// Assemble metric terms from the derivative blocks of a batch evaluation.
    ///
    /// Requires as many reference directions as spatial dimensions, at most three, and every
    /// block shaped `[n_points, n_elements * n_dim]`.
    pub fn from_derivatives(
        derivatives: &[Array2<f64>],
        n_elements: usize,
        n_dim: usize,
    ) -> Result<Self> {
        if n_dim > MAX_METRIC_DIMENSION {
            return Err(FemError::DimensionMismatch {
                context: "metric terms spatial dimension",
                kind: None,
                expected: MAX_METRIC_DIMENSION,
                found: n_dim,
            });
        }
        if derivatives.len() != n_dim {
            return Err(FemError::DimensionMismatch {
                context: "metric terms need square jacobians",
                kind: None,
                expected: derivatives.len(),
                found: n_dim,
            });
        }
        let n_points: usize = derivatives.first().map_or(0, |block| block.nrows());
        for block in derivatives {
            if block.dim() != (n_points, n_elements * n_dim) {
                return Err(FemError::DimensionMismatch {
                    context: "metric terms derivative block",
                    kind: None,
                    expected: n_points * n_elements * n_dim,
                    found: block.len(),
                });
            }
        }

        let jacobians: Array4<f64> =
            Array4::from_shape_fn((n_elements, n_points, n_dim, n_dim), |(e, p, s, d)| {
                derivatives[d][[p, e * n_dim + s]]
            });
        let mut determinants: Array2<f64> = Array2::zeros((n_elements, n_points));
        let mut inverse_transposes: Array4<f64> = Array4::zeros((n_elements, n_points, n_dim, n_dim));

        for e in 0..n_elements {
            for p in 0..n_points {
                determinants[[e, p]] = determinant_and_inverse_transpose(
                    jacobians.slice(s![e, p, .., ..]),
                    inverse_transposes.slice_mut(s![e, p, .., ..]),
                );
            }
        }

        Ok(Self {
            jacobians,
            determinants,
            inverse_transposes,
        })
    }

    pub fn n_elements(&self) -> usize {
        self.determinants.nrows()
    }

    pub fn n_points(&self) -> usize {
        self.determinants.ncols()
    }

    pub fn n_dim(&self) -> usize {
        self.jacobians.shape()[2]
    }

    pub fn jacobian(&self, e: usize, p: usize) -> ArrayView2<'_, f64> {
        self.jacobians.slice(s![e, p, .., ..])
    }

    pub fn inverse_transpose(&self, e: usize, p: usize) -> ArrayView2<'_, f64> {
        self.inverse_transposes.slice(s![e, p, .., ..])
    }

    /// Jacobian determinants, `[n_elements, n_points]`.
    pub fn determinants(&self) -> &Array2<f64> {
        &self.determinants
    }

    /// `sum_p w_p det J_p` per element.
    pub fn element_volumes(&self, weights: &Array1<f64>) -> Result<Array1<f64>> {
        if weights.len() != self.n_points() {
            return Err(FemError::DimensionMismatch {
                context: "integration weights",
                kind: None,
                expected: self.n_points(),
                found: weights.len(),
            });
        }
        Ok(self.determinants.dot(weights))
    }

    /// Map a reference-space gradient at point `p` of element `e` to physical space.
    ///
    /// # Panics
    /// Panics if `reference_gradient` does not hold `n_dim` entries.
    pub fn physical_gradient(&self, e: usize, p: usize, reference_gradient: &[f64]) -> Vec<f64> {
        let gradient: ArrayView1<f64> = ArrayView1::from(reference_gradient);
        self.inverse_transpose(e, p).dot(&gradient).to_vec()
    }
}
