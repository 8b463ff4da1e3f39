//! Reference shapes supported by the standard elements.
//!
//! Every reference element lives on `[-1, 1]` in each direction:
//! - Line `[-1, 1]`
//! - Triangle with vertices (-1,-1), (1,-1), (-1,1)
//! - Quadrilateral `[-1, 1]^2`
//! - Tetrahedron with vertices (-1,-1,-1), (1,-1,-1), (-1,1,-1), (-1,-1,1)
//! - Hexahedron `[-1, 1]^3`
//! - Prism: reference triangle extruded over `[-1, 1]`
//! - Pyramid with base `[-1, 1]^2` at zeta = -1 and apex (0, 0, 1)

use num_integer::binomial;
use std::fmt;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    Line,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 7] = [
        GeometryKind::Line,
        GeometryKind::Triangle,
        GeometryKind::Quadrilateral,
        GeometryKind::Tetrahedron,
        GeometryKind::Hexahedron,
        GeometryKind::Prism,
        GeometryKind::Pyramid,
    ];

    /// Number of reference coordinates.
    pub fn reference_dimension(self) -> usize {
        match self {
            GeometryKind::Line => 1,
            GeometryKind::Triangle | GeometryKind::Quadrilateral => 2,
            GeometryKind::Tetrahedron
            | GeometryKind::Hexahedron
            | GeometryKind::Prism
            | GeometryKind::Pyramid => 3,
        }
    }

    /// Length, area or volume of the reference element.
    pub fn reference_measure(self) -> f64 {
        match self {
            GeometryKind::Line => 2.0,
            GeometryKind::Triangle => 2.0,
            GeometryKind::Quadrilateral => 4.0,
            GeometryKind::Tetrahedron => 4.0 / 3.0,
            GeometryKind::Hexahedron => 8.0,
            GeometryKind::Prism => 4.0,
            GeometryKind::Pyramid => 8.0 / 3.0,
        }
    }

    /// Number of shape-defining nodes (basis functions) for a Lagrange element of `degree`.
    pub fn number_of_nodes(self, degree: usize) -> usize {
        let p = degree;
        match self {
            GeometryKind::Line => p + 1,
            GeometryKind::Quadrilateral => (p + 1).pow(2),
            GeometryKind::Hexahedron => (p + 1).pow(3),
            GeometryKind::Triangle => binomial(p + 2, 2),
            GeometryKind::Tetrahedron => binomial(p + 3, 3),
            GeometryKind::Prism => (p + 1) * binomial(p + 2, 2),
            GeometryKind::Pyramid => (p + 1) * (p + 2) * (2 * p + 3) / 6,
        }
    }

    /// Tensor-product shapes (line, quadrilateral, hexahedron).
    pub fn is_hypercube(self) -> bool {
        matches!(
            self,
            GeometryKind::Line | GeometryKind::Quadrilateral | GeometryKind::Hexahedron
        )
    }

    /// Vertices of the reference element, one row per vertex.
    pub fn vertices(self) -> Vec<Vec<f64>> {
        match self {
            GeometryKind::Line => vec![vec![-1.0], vec![1.0]],
            GeometryKind::Triangle => vec![vec![-1.0, -1.0], vec![1.0, -1.0], vec![-1.0, 1.0]],
            GeometryKind::Quadrilateral => vec![
                vec![-1.0, -1.0],
                vec![1.0, -1.0],
                vec![-1.0, 1.0],
                vec![1.0, 1.0],
            ],
            GeometryKind::Tetrahedron => vec![
                vec![-1.0, -1.0, -1.0],
                vec![1.0, -1.0, -1.0],
                vec![-1.0, 1.0, -1.0],
                vec![-1.0, -1.0, 1.0],
            ],
            GeometryKind::Hexahedron => itertools::iproduct!([-1.0, 1.0], [-1.0, 1.0], [-1.0, 1.0])
                .map(|(z, y, x)| vec![x, y, z])
                .collect(),
            GeometryKind::Prism => vec![
                vec![-1.0, -1.0, -1.0],
                vec![1.0, -1.0, -1.0],
                vec![-1.0, 1.0, -1.0],
                vec![-1.0, -1.0, 1.0],
                vec![1.0, -1.0, 1.0],
                vec![-1.0, 1.0, 1.0],
            ],
            GeometryKind::Pyramid => vec![
                vec![-1.0, -1.0, -1.0],
                vec![1.0, -1.0, -1.0],
                vec![-1.0, 1.0, -1.0],
                vec![1.0, 1.0, -1.0],
                vec![0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Line => "line",
            GeometryKind::Triangle => "triangle",
            GeometryKind::Quadrilateral => "quadrilateral",
            GeometryKind::Tetrahedron => "tetrahedron",
            GeometryKind::Hexahedron => "hexahedron",
            GeometryKind::Prism => "prism",
            GeometryKind::Pyramid => "pyramid",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
