//! Shape function interface shared by the element library.
//!
//! A [`NodalBasedShapeFunctions`] implementation tabulates the Lagrange basis of one
//! (shape, degree, node distribution) at arbitrary reference points. The concrete
//! families are selected through the [`LagrangeShapeFunctions`] variant instead of trait
//! objects, so a standard element carries its basis by value.

use crate::config::NodeDistribution;
use crate::elements::element_library::hypercube_elements::HypercubeShapeFunctions;
use crate::elements::element_library::simplex_elements::VandermondeShapeFunctions;
use crate::elements::geometry_kind::GeometryKind;
use crate::error::{FemError, Result};
use ndarray::{Array2, ArrayView2};

/// Basis values and reference derivatives at a set of points.
///
/// `values` is `[n_points, n_basis]`; `derivatives[d]` holds the derivative with respect to
/// reference coordinate `d` with the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulation {
    pub values: Array2<f64>,
    pub derivatives: Vec<Array2<f64>>,
}

impl Tabulation {
    pub fn zeros(n_points: usize, n_basis: usize, dim: usize) -> Self {
        Tabulation {
            values: Array2::zeros((n_points, n_basis)),
            derivatives: vec![Array2::zeros((n_points, n_basis)); dim],
        }
    }

    pub fn n_points(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_basis(&self) -> usize {
        self.values.ncols()
    }
}

pub trait NodalBasedShapeFunctions {
    fn kind(&self) -> GeometryKind;

    fn degree(&self) -> usize;

    fn number_of_nodes(&self) -> usize {
        self.kind().number_of_nodes(self.degree())
    }

    /// Reference nodes the basis interpolates, `[n_nodes, dim]`.
    fn nodes(&self) -> &Array2<f64>;

    /// Values and first derivatives at `points` (`[n_points, dim]`).
    fn tabulate(&self, points: ArrayView2<f64>) -> Tabulation;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LagrangeShapeFunctions {
    Hypercube(HypercubeShapeFunctions),
    Vandermonde(VandermondeShapeFunctions),
}

impl LagrangeShapeFunctions {
    /// Lagrange basis of `degree` on the nodes of `distribution`.
    ///
    /// Pyramids have no nodal basis and report `NotImplemented`.
    pub fn new(kind: GeometryKind, degree: usize, distribution: NodeDistribution) -> Result<Self> {
        match kind {
            GeometryKind::Line | GeometryKind::Quadrilateral | GeometryKind::Hexahedron => Ok(
                LagrangeShapeFunctions::Hypercube(HypercubeShapeFunctions::new(kind, degree, distribution)),
            ),
            GeometryKind::Triangle | GeometryKind::Tetrahedron | GeometryKind::Prism => Ok(
                LagrangeShapeFunctions::Vandermonde(VandermondeShapeFunctions::new(
                    kind,
                    degree,
                    distribution,
                )?),
            ),
            GeometryKind::Pyramid => Err(FemError::NotImplemented {
                operation: "lagrange_shape_functions",
                kind,
            }),
        }
    }
}

impl NodalBasedShapeFunctions for LagrangeShapeFunctions {
    fn kind(&self) -> GeometryKind {
        match self {
            LagrangeShapeFunctions::Hypercube(basis) => basis.kind(),
            LagrangeShapeFunctions::Vandermonde(basis) => basis.kind(),
        }
    }

    fn degree(&self) -> usize {
        match self {
            LagrangeShapeFunctions::Hypercube(basis) => basis.degree(),
            LagrangeShapeFunctions::Vandermonde(basis) => basis.degree(),
        }
    }

    fn nodes(&self) -> &Array2<f64> {
        match self {
            LagrangeShapeFunctions::Hypercube(basis) => basis.nodes(),
            LagrangeShapeFunctions::Vandermonde(basis) => basis.nodes(),
        }
    }

    fn tabulate(&self, points: ArrayView2<f64>) -> Tabulation {
        match self {
            LagrangeShapeFunctions::Hypercube(basis) => basis.tabulate(points),
            LagrangeShapeFunctions::Vandermonde(basis) => basis.tabulate(points),
        }
    }
}
