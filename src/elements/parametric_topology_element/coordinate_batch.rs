//! Strided views over packed nodal coordinates.
//!
//! ### Layout
//! A batch of `n_elements` elements with `n_basis` nodes in `n_dim` spatial dimensions is a
//! column-major matrix with `n_basis` logical rows and `n_elements * n_dim` columns:
//!
//! ```text
//!            element 0          element 1
//!          x    y    z        x    y    z
//! node 0 | .    .    .   |   .    .    .   | ...
//! node 1 | .    .    .   |   .    .    .   |
//!  ...
//! (padding rows up to the leading dimension)
//! ```
//!
//! Column `e * n_dim + s` holds coordinate `s` of element `e`; consecutive columns are
//! `leading_dimension` entries apart. The leading dimension may exceed `n_basis` so that
//! every column starts on a padded boundary.
//!
//! [`CoordinateBatch`] borrows the storage for the duration of one evaluation call and
//! validates on construction that the slice covers the whole view.

use crate::error::{FemError, Result};
use ndarray::{Array2, ArrayView2, ShapeBuilder, s};

/// Column padding used by [`padded_leading_dimension`].
pub const PADDING: usize = 8;

/// Smallest multiple of [`PADDING`] that holds `n_rows` rows.
pub fn padded_leading_dimension(n_rows: usize) -> usize {
    n_rows.next_multiple_of(PADDING)
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinateBatch<'a> {
    view: ArrayView2<'a, f64>,
    n_elements: usize,
    n_dim: usize,
    leading_dimension: usize,
}

impl<'a> CoordinateBatch<'a> {
    pub fn new(
        data: &'a [f64],
        n_basis: usize,
        n_elements: usize,
        n_dim: usize,
        leading_dimension: usize,
    ) -> Result<Self> {
        if leading_dimension < n_basis.max(1) {
            return Err(FemError::Layout(format!(
                "leading dimension {leading_dimension} is smaller than the {n_basis} logical rows"
            )));
        }
        if n_dim == 0 {
            return Err(FemError::Layout("coordinates need at least one dimension".into()));
        }
        let n_columns: usize = n_elements * n_dim;
        let required: usize = if n_columns == 0 {
            0
        } else {
            leading_dimension * (n_columns - 1) + n_basis
        };
        if data.len() < required {
            return Err(FemError::Layout(format!(
                "{} values cannot hold {n_columns} columns of {n_basis} rows with leading dimension {leading_dimension}",
                data.len()
            )));
        }

        let view = ArrayView2::from_shape(
            (n_basis, n_columns).strides((1, leading_dimension)),
            &data[..required],
        )?;

        Ok(Self {
            view,
            n_elements,
            n_dim,
            leading_dimension,
        })
    }

    /// Logical rows: nodes per element.
    pub fn n_basis(&self) -> usize {
        self.view.nrows()
    }

    pub fn n_elements(&self) -> usize {
        self.n_elements
    }

    pub fn n_dim(&self) -> usize {
        self.n_dim
    }

    pub fn leading_dimension(&self) -> usize {
        self.leading_dimension
    }

    /// The `[n_basis, n_elements * n_dim]` matrix view.
    pub fn view(&self) -> ArrayView2<'a, f64> {
        self.view
    }

    /// Sub-batch holding only element `e`.
    ///
    /// # Panics
    /// Panics if `e >= n_elements`.
    pub fn element(&self, e: usize) -> CoordinateBatch<'a> {
        assert!(e < self.n_elements, "element {e} outside a batch of {}", self.n_elements);
        let columns = e * self.n_dim..(e + 1) * self.n_dim;
        CoordinateBatch {
            view: self.view.slice_move(s![.., columns]),
            n_elements: 1,
            n_dim: self.n_dim,
            leading_dimension: self.leading_dimension,
        }
    }

    /// Coordinates of node `n` of element `e`.
    pub fn node(&self, e: usize, n: usize) -> Vec<f64> {
        (0..self.n_dim)
            .map(|s| self.view[[n, e * self.n_dim + s]])
            .collect()
    }
}

/// Owned, padded storage for a coordinate batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMatrix {
    data: Vec<f64>,
    n_basis: usize,
    n_elements: usize,
    n_dim: usize,
    leading_dimension: usize,
}

impl CoordinateMatrix {
    /// Pack per-element node coordinates (`[n_basis, n_dim]` each) into one batch.
    pub fn from_elements(elements: &[Array2<f64>]) -> Result<Self> {
        let (n_basis, n_dim) = match elements.first() {
            Some(first) => first.dim(),
            None => return Err(FemError::Layout("cannot pack an empty batch".into())),
        };
        let leading_dimension: usize = padded_leading_dimension(n_basis);
        let mut data: Vec<f64> = vec![0.0; leading_dimension * n_dim * elements.len()];

        for (e, element) in elements.iter().enumerate() {
            if element.dim() != (n_basis, n_dim) {
                return Err(FemError::DimensionMismatch {
                    context: "packed element coordinates",
                    kind: None,
                    expected: n_basis * n_dim,
                    found: element.len(),
                });
            }
            for s in 0..n_dim {
                let offset = (e * n_dim + s) * leading_dimension;
                for (n, &x) in element.column(s).iter().enumerate() {
                    data[offset + n] = x;
                }
            }
        }

        Ok(Self {
            data,
            n_basis,
            n_elements: elements.len(),
            n_dim,
            leading_dimension,
        })
    }

    /// Gather element coordinates from a global node table through the element connectivity.
    ///
    /// `all_nodal_coords` is `[n_dim, n_nodes]`; each connectivity entry lists the global
    /// node ids of one element in the node order of its standard element.
    pub fn gather(all_nodal_coords: ArrayView2<f64>, connectivity: &[Vec<usize>]) -> Result<Self> {
        let n_dim: usize = all_nodal_coords.nrows();
        let n_nodes: usize = all_nodal_coords.ncols();
        let elements: Vec<Array2<f64>> = connectivity
            .iter()
            .map(|node_ids| {
                if let Some(&bad) = node_ids.iter().find(|&&id| id >= n_nodes) {
                    return Err(FemError::Layout(format!(
                        "node {bad} outside a table of {n_nodes} nodes"
                    )));
                }
                Ok(Array2::from_shape_fn((node_ids.len(), n_dim), |(n, s)| {
                    all_nodal_coords[[s, node_ids[n]]]
                }))
            })
            .collect::<Result<_>>()?;
        Self::from_elements(&elements)
    }

    pub fn as_batch(&self) -> Result<CoordinateBatch<'_>> {
        CoordinateBatch::new(
            &self.data,
            self.n_basis,
            self.n_elements,
            self.n_dim,
            self.leading_dimension,
        )
    }

    pub fn n_elements(&self) -> usize {
        self.n_elements
    }
}
