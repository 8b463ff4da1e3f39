use approx::assert_relative_eq;
use femgeom::{
    CoordinateBatch, CoordinateMatrix, FemError, GeometryConfig, GeometryKind, NodeDistribution, SamplingPolicy,
    StandardElement, StandardElementCache, StandardElementKey,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SUPPORTED: [GeometryKind; 6] = [
    GeometryKind::Line,
    GeometryKind::Triangle,
    GeometryKind::Quadrilateral,
    GeometryKind::Tetrahedron,
    GeometryKind::Hexahedron,
    GeometryKind::Prism,
];

/// Random well-conditioned affine map `x = A xi + b`.
fn random_affine_map(rng: &mut StdRng, dim: usize) -> (Array2<f64>, Array1<f64>) {
    let a = Array2::from_shape_fn((dim, dim), |(r, c)| {
        if r == c {
            rng.random_range(1.0..2.0)
        } else {
            rng.random_range(-0.3..0.3)
        }
    });
    let b = Array1::from_shape_fn(dim, |_| rng.random_range(-5.0..5.0));
    (a, b)
}

fn map_nodes(nodes: &Array2<f64>, a: &Array2<f64>, b: &Array1<f64>) -> Array2<f64> {
    let mut mapped = nodes.dot(&a.t());
    for mut row in mapped.rows_mut() {
        row += b;
    }
    mapped
}

#[test]
fn weights_sum_to_reference_measure() {
    for kind in GeometryKind::ALL {
        for order in [0, 1, 5, 12, 25, 40] {
            let element = StandardElement::new(kind, 1, order).unwrap();
            assert_relative_eq!(
                element.integration_weights().sum(),
                kind.reference_measure(),
                epsilon = 1e-11
            );
        }
    }
}

#[test]
fn affine_elements_have_constant_determinant() {
    let mut rng = StdRng::seed_from_u64(7);
    for kind in SUPPORTED {
        let dim = kind.reference_dimension();
        for distribution in NodeDistribution::ALL {
            let element = StandardElement::new(kind, 3, 6).unwrap();
            let config = GeometryConfig::default().with_node_distribution(distribution);
            let (a, b) = random_affine_map(&mut rng, dim);
            let expected = DMatrix::from_fn(dim, dim, |r, c| a[[r, c]]).determinant();

            let nodes = element.reference_nodes(distribution).unwrap();
            let packed = CoordinateMatrix::from_elements(&[map_nodes(nodes, &a, &b)]).unwrap();
            let metric = element.metric_terms(&config, &packed.as_batch().unwrap()).unwrap();

            for det in metric.determinants().iter() {
                assert_relative_eq!(*det, expected, max_relative = 1e-10);
            }
            let volumes = metric.element_volumes(element.integration_weights()).unwrap();
            assert_relative_eq!(volumes[0], expected * kind.reference_measure(), max_relative = 1e-10);
        }
    }
}

#[test]
fn interpolated_coordinates_follow_the_map() {
    let mut rng = StdRng::seed_from_u64(11);
    let element = StandardElement::new(GeometryKind::Prism, 2, 4).unwrap();
    let config = GeometryConfig::default();
    let (a, b) = random_affine_map(&mut rng, 3);
    let nodes = element.reference_nodes(config.node_distribution).unwrap();
    let packed = CoordinateMatrix::from_elements(&[map_nodes(nodes, &a, &b)]).unwrap();

    let data = element
        .evaluate_integration_point_data(&config, &packed.as_batch().unwrap())
        .unwrap();
    let expected = map_nodes(&element.integration_points().to_owned(), &a, &b);
    for p in 0..element.n_integration_points() {
        for s in 0..3 {
            assert_relative_eq!(data.point(0, p)[s], expected[[p, s]], epsilon = 1e-11);
        }
    }
}

#[test]
fn batching_does_not_change_results() {
    let mut rng = StdRng::seed_from_u64(42);
    let element = StandardElement::new(GeometryKind::Hexahedron, 2, 4).unwrap();
    let config = GeometryConfig::default();
    let nodes = element.reference_nodes(config.node_distribution).unwrap().clone();

    let elements: Vec<Array2<f64>> = (0..5)
        .map(|_| nodes.mapv(|x| x + rng.random_range(-0.05..0.05)))
        .collect();
    let packed = CoordinateMatrix::from_elements(&elements).unwrap();
    let batch = packed.as_batch().unwrap();

    let batched = element.evaluate_integration_point_data(&config, &batch).unwrap();
    let batched_extrema = element.compute_jacobian_extrema(&config, &batch).unwrap();

    for e in 0..5 {
        let single = element
            .evaluate_integration_point_data(&config, &batch.element(e))
            .unwrap();
        for p in 0..element.n_integration_points() {
            for s in 0..3 {
                assert_relative_eq!(single.values[[p, s]], batched.values[[p, e * 3 + s]], epsilon = 1e-13);
                for d in 0..3 {
                    assert_relative_eq!(
                        single.derivatives[d][[p, s]],
                        batched.derivatives[d][[p, e * 3 + s]],
                        epsilon = 1e-13
                    );
                }
            }
        }

        let single_extrema = element.compute_jacobian_extrema(&config, &batch.element(e)).unwrap();
        assert_relative_eq!(single_extrema.extrema[0].min, batched_extrema.extrema[e].min, epsilon = 1e-13);
        assert_relative_eq!(single_extrema.extrema[0].max, batched_extrema.extrema[e].max, epsilon = 1e-13);
    }
}

#[test]
fn leading_dimension_does_not_change_results() {
    let element = StandardElement::new(GeometryKind::Triangle, 1, 2).unwrap();
    let config = GeometryConfig::default();
    // two triangles, x/y columns, tight (3) and padded (5) leading dimensions
    let tight = vec![
        0.0, 2.0, 0.0, // e0 x
        0.0, 0.0, 1.0, // e0 y
        1.0, 0.0, 1.0, // e1 x
        1.0, 1.0, 3.0, // e1 y
    ];
    let padded: Vec<f64> = tight
        .chunks(3)
        .flat_map(|column| column.iter().copied().chain([f64::NAN, f64::NAN]))
        .collect();

    let a = element
        .compute_jacobian_extrema(&config, &CoordinateBatch::new(&tight, 3, 2, 2, 3).unwrap())
        .unwrap();
    let b = element
        .compute_jacobian_extrema(&config, &CoordinateBatch::new(&padded, 3, 2, 2, 5).unwrap())
        .unwrap();
    assert_eq!(a.jacobian_field, b.jacobian_field);
    // e0: (0,0), (2,0), (0,1) -> det = 2 * 1 / (2 * 2)
    assert_relative_eq!(a.extrema[0].min, 0.5, epsilon = 1e-14);
    // e1: (1,1), (0,1), (1,3) -> mirrored, det = -1 * 2 / 4
    assert_relative_eq!(a.extrema[1].max, -0.5, epsilon = 1e-14);
    assert!(matches!(
        a.diagnostics.as_slice(),
        [FemError::InvalidElementGeometry { element: 1, .. }]
    ));
}

#[test]
fn inverted_tetrahedron_is_flagged() {
    let element = StandardElement::new(GeometryKind::Tetrahedron, 1, 2).unwrap();
    let config = GeometryConfig::default().with_sampling(SamplingPolicy::NodalPoints);
    let valid = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    // apex pushed through the opposite face
    let inverted = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.2, 0.2, -0.5]];
    let packed = CoordinateMatrix::from_elements(&[valid, inverted]).unwrap();

    let output = element
        .compute_jacobian_extrema(&config, &packed.as_batch().unwrap())
        .unwrap();
    assert!(output.extrema[0].min > 0.0);
    assert!(output.extrema[1].min <= 0.0);
    assert!(!output.is_valid());
    assert_eq!(output.diagnostics.len(), 1);
    let batch = output.batch_extrema().unwrap();
    assert!(batch.min <= 0.0);
}

#[test]
fn curved_quadrilateral_degenerates_between_integration_points() {
    // the midside node of the bottom edge is pulled far into the element, so the
    // determinant turns negative near the edge but stays positive at the Gauss points
    let element = StandardElement::new(GeometryKind::Quadrilateral, 2, 2).unwrap();
    let config = GeometryConfig::default().with_node_distribution(NodeDistribution::Equidistant);
    let mut nodes = element.reference_nodes(NodeDistribution::Equidistant).unwrap().clone();
    nodes[[1, 1]] = 0.2;
    let packed = CoordinateMatrix::from_elements(&[nodes]).unwrap();
    let batch = packed.as_batch().unwrap();

    let at_integration_points = element.compute_jacobian_extrema(&config, &batch).unwrap();
    assert!(at_integration_points.extrema[0].min > 0.0);

    let lattice = config.with_sampling(SamplingPolicy::Lattice { points_per_edge: 9 });
    let dense = element.compute_jacobian_extrema(&lattice, &batch).unwrap();
    assert!(dense.extrema[0].min <= 0.0);
    assert!(!dense.is_valid());
}

#[test]
fn gathered_connectivity_covers_the_domain() {
    let cache = StandardElementCache::new();
    let element =
        StandardElement::from_cache(StandardElementKey::new(GeometryKind::Triangle, 1, 1), &cache).unwrap();
    let all_nodal_coords = array![[0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]];
    let connectivity = vec![vec![0, 1, 3], vec![2, 3, 1]];
    let packed = CoordinateMatrix::gather(all_nodal_coords.view(), &connectivity).unwrap();

    let output = element
        .compute_jacobian_extrema(&GeometryConfig::default(), &packed.as_batch().unwrap())
        .unwrap();
    assert!(output.is_valid());
    let volumes = output
        .metric_terms
        .element_volumes(element.integration_weights())
        .unwrap();
    assert_relative_eq!(volumes.sum(), 1.0, epsilon = 1e-14);
}

#[test]
fn physical_gradients_of_a_linear_field() {
    // f(x) = 3 x - 2 y on an arbitrary straight-sided quadrilateral
    let element = StandardElement::new(GeometryKind::Quadrilateral, 1, 3).unwrap();
    let coordinates = array![[0.0, 0.0], [2.0, 0.2], [0.3, 1.0], [1.9, 1.4]];
    let nodal: Array1<f64> = coordinates.rows().into_iter().map(|x| 3.0 * x[0] - 2.0 * x[1]).collect();
    let packed = CoordinateMatrix::from_elements(&[coordinates]).unwrap();
    let config = GeometryConfig::default();
    let metric = element.metric_terms(&config, &packed.as_batch().unwrap()).unwrap();

    let tabulation = element.table().tabulation(config.node_distribution, "test").unwrap();
    for p in 0..element.n_integration_points() {
        let reference_gradient: Vec<f64> = (0..2)
            .map(|d| tabulation.derivatives[d].row(p).dot(&nodal))
            .collect();
        let gradient = metric.physical_gradient(0, p, &reference_gradient);
        assert_relative_eq!(gradient[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(gradient[1], -2.0, epsilon = 1e-12);
    }
}

#[test]
fn embedded_surface_is_a_dimension_mismatch() {
    let element = StandardElement::new(GeometryKind::Triangle, 1, 2).unwrap();
    let surface = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.5], [0.0, 1.0, 0.5]];
    let packed = CoordinateMatrix::from_elements(&[surface]).unwrap();
    let batch = packed.as_batch().unwrap();
    let config = GeometryConfig::default();

    assert!(element.evaluate_integration_point_data(&config, &batch).is_ok());
    assert!(matches!(
        element.compute_jacobian_extrema(&config, &batch),
        Err(FemError::DimensionMismatch { .. })
    ));
}
