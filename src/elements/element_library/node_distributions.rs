//! Reference positions of the shape-defining nodes.
//!
//! Hypercube shapes tensorize a 1D node set. Triangles and tetrahedra use the
//! Blyth-Pozrikidis construction, which builds the simplex nodes from the 1D set so that the
//! nodes on every edge coincide with the 1D nodes, and reduces to the equidistant lattice
//! for equidistant 1D nodes. Prisms are triangle layers, pyramids shrinking square layers.
//!
//! Node ordering (first index fastest):
//! ```text
//! line           i
//! quadrilateral  (i, j)
//! hexahedron     (i, j, k)
//! triangle       (i, j)      i + j <= p
//! tetrahedron    (i, j, k)   i + j + k <= p
//! prism          triangle (i, j), then layer k
//! pyramid        (i, j) in a (p - k + 1)^2 layer, then layer k
//! ```

use crate::config::NodeDistribution;
use crate::elements::geometry_kind::GeometryKind;
use crate::elements::quadrature::gauss_jacobi::gauss_lobatto_points;
use itertools::iproduct;
use ndarray::Array2;

/// 1D node set with `degree + 1` points on `[-1, 1]`.
pub fn nodes_1d(degree: usize, distribution: NodeDistribution) -> Vec<f64> {
    if degree == 0 {
        return vec![0.0];
    }
    match distribution {
        NodeDistribution::Equidistant => (0..=degree)
            .map(|i| -1.0 + 2.0 * i as f64 / degree as f64)
            .collect(),
        NodeDistribution::LegendreGaussLobatto => gauss_lobatto_points(degree + 1),
    }
}

/// Reference nodes of a Lagrange element, `[number_of_nodes, dim]`.
pub fn reference_nodes(
    kind: GeometryKind,
    degree: usize,
    distribution: NodeDistribution,
) -> Array2<f64> {
    let p: usize = degree;
    let x: Vec<f64> = nodes_1d(p, distribution);
    // Same set on [0, 1] for the barycentric constructions
    let v: Vec<f64> = x.iter().map(|t| 0.5 * (t + 1.0)).collect();

    let nodes: Vec<Vec<f64>> = match kind {
        GeometryKind::Line => x.iter().map(|&xi| vec![xi]).collect(),
        GeometryKind::Quadrilateral => iproduct!(x.iter(), x.iter())
            .map(|(&y, &xi)| vec![xi, y])
            .collect(),
        GeometryKind::Hexahedron => iproduct!(x.iter(), x.iter(), x.iter())
            .map(|(&z, &y, &xi)| vec![xi, y, z])
            .collect(),
        GeometryKind::Triangle => triangle_nodes(p, &v),
        GeometryKind::Prism => iproduct!(x.iter(), triangle_nodes(p, &v))
            .map(|(&z, node)| vec![node[0], node[1], z])
            .collect(),
        GeometryKind::Tetrahedron => tetrahedron_nodes(p, &v),
        GeometryKind::Pyramid => pyramid_nodes(p, distribution),
    };

    let dim: usize = kind.reference_dimension();
    let n_nodes: usize = nodes.len();
    debug_assert_eq!(n_nodes, kind.number_of_nodes(p));
    Array2::from_shape_fn((n_nodes, dim), |(n, d)| nodes[n][d])
}

fn triangle_nodes(p: usize, v: &[f64]) -> Vec<Vec<f64>> {
    let mut nodes: Vec<Vec<f64>> = Vec::with_capacity((p + 1) * (p + 2) / 2);
    for j in 0..=p {
        for i in 0..=(p - j) {
            let k = p - i - j;
            let u = (1.0 + 2.0 * v[i] - v[j] - v[k]) / 3.0;
            let w = (1.0 + 2.0 * v[j] - v[i] - v[k]) / 3.0;
            nodes.push(vec![2.0 * u - 1.0, 2.0 * w - 1.0]);
        }
    }
    nodes
}

fn tetrahedron_nodes(p: usize, v: &[f64]) -> Vec<Vec<f64>> {
    let mut nodes: Vec<Vec<f64>> = Vec::with_capacity((p + 1) * (p + 2) * (p + 3) / 6);
    for k in 0..=p {
        for j in 0..=(p - k) {
            for i in 0..=(p - j - k) {
                let l = p - i - j - k;
                let u = (1.0 + 3.0 * v[i] - v[j] - v[k] - v[l]) / 4.0;
                let w = (1.0 + 3.0 * v[j] - v[i] - v[k] - v[l]) / 4.0;
                let s = (1.0 + 3.0 * v[k] - v[i] - v[j] - v[l]) / 4.0;
                nodes.push(vec![2.0 * u - 1.0, 2.0 * w - 1.0, 2.0 * s - 1.0]);
            }
        }
    }
    nodes
}

fn pyramid_nodes(p: usize, distribution: NodeDistribution) -> Vec<Vec<f64>> {
    let z: Vec<f64> = nodes_1d(p, distribution);
    let mut nodes: Vec<Vec<f64>> = Vec::new();
    for (k, &zeta) in z.iter().enumerate() {
        let scale = 0.5 * (1.0 - zeta);
        let layer: Vec<f64> = nodes_1d(p - k, distribution);
        for (&y, &x) in iproduct!(layer.iter(), layer.iter()) {
            nodes.push(vec![x * scale, y * scale, zeta]);
        }
    }
    nodes
}
