//! # Standard Element
//!
//! One reusable (shape, degree, integration order) configuration together with its
//! evaluation entry points:
//!
//! - [`StandardElement::evaluate_integration_point_data`] interpolates the physical
//!   coordinates of a batch of elements and their reference derivatives at the integration
//!   points.
//! - [`StandardElement::compute_jacobian_extrema`] forms the metric terms at the integration
//!   points and reduces the Jacobian determinants over the configured sampling set to a
//!   minimum and maximum per element.
//!
//! ### Sampling sets
//! Curved elements can degenerate between integration points. Besides the integration
//! points themselves, the determinant can be sampled at the reference nodes of the node
//! distribution or on a uniform lattice ([`SamplingPolicy`]). Each additional sampling set
//! is tabulated once per element configuration and reused for every batch.
//!
//! ### Failure modes
//! Shapes without a nodal basis report `NotImplemented` from every evaluation. That error is
//! fatal: it is logged at error level and must end the run, no fallback geometry exists.

use crate::config::{GeometryConfig, NodeDistribution, SamplingPolicy};
use crate::elements::element_interfaces::{NodalBasedShapeFunctions, Tabulation};
use crate::elements::element_library::node_distributions::reference_nodes;
use crate::elements::geometry_kind::GeometryKind;
use crate::elements::parametric_topology_element::coordinate_batch::CoordinateBatch;
use crate::elements::parametric_topology_element::jacobian_quality::{
    JacobianExtrema, batch_extrema, min_max, validate_batch,
};
use crate::elements::parametric_topology_element::position_jacobian::{
    IntegrationPointData, MetricTerms, compute_integration_point_data, compute_integration_point_data_into,
};
use crate::elements::standard_element::element_cache::{BuildOnceMap, StandardElementCache};
use crate::elements::standard_element::reference_basis_table::{ReferenceBasisTable, StandardElementKey};
use crate::error::{FemError, Result};
use log::{debug, error};
use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut2, Axis, concatenate};
use std::sync::Arc;

const EVALUATE_INTEGRATION_POINT_DATA: &str = "evaluate_integration_point_data";
const COMPUTE_JACOBIAN_EXTREMA: &str = "compute_jacobian_extrema";

/// Metric data and determinant extrema of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianExtremaOutput {
    /// Metric terms at the integration points.
    pub metric_terms: MetricTerms,
    /// Determinants at every sample, `[n_elements, n_samples]`; the integration points come
    /// first, in rule order.
    pub jacobian_field: Array2<f64>,
    pub extrema: Vec<JacobianExtrema>,
    /// One `InvalidElementGeometry` per failing element, ids local to the batch.
    pub diagnostics: Vec<FemError>,
}

impl JacobianExtremaOutput {
    /// Extrema over the whole batch.
    pub fn batch_extrema(&self) -> Option<JacobianExtrema> {
        batch_extrema(&self.extrema)
    }

    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug)]
pub struct StandardElement {
    table: Arc<ReferenceBasisTable>,
    /// Basis tabulations at the extra sampling points, per (node distribution, policy).
    sampling_tables: BuildOnceMap<(NodeDistribution, SamplingPolicy), Tabulation>,
}

impl StandardElement {
    /// Builds a private reference table for the configuration.
    pub fn new(kind: GeometryKind, degree: usize, order_exact: usize) -> Result<Self> {
        let key = StandardElementKey::new(kind, degree, order_exact);
        Ok(Self::from_table(Arc::new(ReferenceBasisTable::build(key)?)))
    }

    /// Shares the reference table held by `cache`, building it on first use.
    pub fn from_cache(key: StandardElementKey, cache: &StandardElementCache) -> Result<Self> {
        Ok(Self::from_table(cache.get_or_build(key)?))
    }

    pub fn from_table(table: Arc<ReferenceBasisTable>) -> Self {
        Self {
            table,
            sampling_tables: BuildOnceMap::default(),
        }
    }

    pub fn key(&self) -> StandardElementKey {
        self.table.key()
    }

    pub fn kind(&self) -> GeometryKind {
        self.table.kind()
    }

    pub fn degree(&self) -> usize {
        self.table.key().degree
    }

    pub fn order_exact(&self) -> usize {
        self.table.key().order_exact
    }

    pub fn reference_dimension(&self) -> usize {
        self.kind().reference_dimension()
    }

    pub fn n_basis(&self) -> usize {
        self.table.n_basis()
    }

    pub fn n_integration_points(&self) -> usize {
        self.table.n_integration_points()
    }

    pub fn integration_points(&self) -> ArrayView2<'_, f64> {
        self.table.integration_points()
    }

    pub fn integration_weights(&self) -> &Array1<f64> {
        self.table.integration_weights()
    }

    pub fn table(&self) -> &Arc<ReferenceBasisTable> {
        &self.table
    }

    /// Reference nodes of `distribution` in the order the coordinate batch must follow.
    pub fn reference_nodes(&self, distribution: NodeDistribution) -> Result<&Array2<f64>> {
        report_fatal(self.table.nodes(distribution, "reference_nodes"))
    }

    fn integration_point_table(&self, config: &GeometryConfig, operation: &'static str) -> Result<&Tabulation> {
        report_fatal(self.table.tabulation(config.node_distribution, operation))
    }

    /// Interpolated coordinates and reference derivatives at the integration points.
    ///
    /// Values and derivatives are `[n_integration_points, n_elements * n_dim]`.
    pub fn evaluate_integration_point_data(
        &self,
        config: &GeometryConfig,
        coordinates: &CoordinateBatch,
    ) -> Result<IntegrationPointData> {
        let table = self.integration_point_table(config, EVALUATE_INTEGRATION_POINT_DATA)?;
        self.with_kind(compute_integration_point_data(table, coordinates, true))
    }

    /// As [`evaluate_integration_point_data`](Self::evaluate_integration_point_data), writing
    /// into caller-owned blocks. Pass no derivative blocks to skip them.
    pub fn evaluate_integration_point_data_into(
        &self,
        config: &GeometryConfig,
        coordinates: &CoordinateBatch,
        values: ArrayViewMut2<f64>,
        derivatives: &mut [ArrayViewMut2<f64>],
    ) -> Result<()> {
        let table = self.integration_point_table(config, EVALUATE_INTEGRATION_POINT_DATA)?;
        self.with_kind(compute_integration_point_data_into(table, coordinates, values, derivatives))
    }

    /// Jacobians, determinants and inverse transposes at the integration points.
    pub fn metric_terms(&self, config: &GeometryConfig, coordinates: &CoordinateBatch) -> Result<MetricTerms> {
        let table = self.integration_point_table(config, COMPUTE_JACOBIAN_EXTREMA)?;
        let data = self.with_kind(compute_integration_point_data(table, coordinates, true))?;
        self.with_kind(MetricTerms::from_derivatives(
            &data.derivatives,
            coordinates.n_elements(),
            coordinates.n_dim(),
        ))
    }

    /// Metric terms at the integration points plus determinant extrema over the sampling set.
    pub fn compute_jacobian_extrema(
        &self,
        config: &GeometryConfig,
        coordinates: &CoordinateBatch,
    ) -> Result<JacobianExtremaOutput> {
        let metric_terms: MetricTerms = self.metric_terms(config, coordinates)?;

        let jacobian_field: Array2<f64> = match self.sampling_table(config)? {
            None => metric_terms.determinants().clone(),
            Some(extra) => {
                let data = self.with_kind(compute_integration_point_data(&extra, coordinates, true))?;
                let extra_terms = self.with_kind(MetricTerms::from_derivatives(
                    &data.derivatives,
                    coordinates.n_elements(),
                    coordinates.n_dim(),
                ))?;
                concatenate(
                    Axis(1),
                    &[metric_terms.determinants().view(), extra_terms.determinants().view()],
                )?
            }
        };

        let extrema: Vec<JacobianExtrema> = min_max(jacobian_field.view());
        let diagnostics: Vec<FemError> = validate_batch(&extrema, 0, config.distortion_bound);

        Ok(JacobianExtremaOutput {
            metric_terms,
            jacobian_field,
            extrema,
            diagnostics,
        })
    }

    /// Names this element's shape in dimension mismatches raised by the batch evaluation.
    fn with_kind<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|err| err.with_kind(self.kind()))
    }

    /// Tabulation at the points added by the sampling policy, `None` for integration points only.
    fn sampling_table(&self, config: &GeometryConfig) -> Result<Option<Arc<Tabulation>>> {
        if config.sampling == SamplingPolicy::IntegrationPoints {
            return Ok(None);
        }
        let shape_functions = report_fatal(
            self.table
                .shape_functions(config.node_distribution, COMPUTE_JACOBIAN_EXTREMA),
        )?;
        let (table, built) = self
            .sampling_tables
            .get_or_try_build((config.node_distribution, config.sampling), || {
                let points: Array2<f64> = self.sampling_points(config)?;
                Ok(shape_functions.tabulate(points.view()))
            })?;
        if built {
            debug!(
                "tabulated {} {} sampling points ({:?}, {:?})",
                table.n_points(),
                self.kind(),
                config.node_distribution,
                config.sampling
            );
        }
        Ok(Some(table))
    }

    fn sampling_points(&self, config: &GeometryConfig) -> Result<Array2<f64>> {
        match config.sampling {
            SamplingPolicy::IntegrationPoints => Ok(self.integration_points().to_owned()),
            SamplingPolicy::NodalPoints => Ok(self.reference_nodes(config.node_distribution)?.clone()),
            SamplingPolicy::Lattice { points_per_edge } if points_per_edge < 2 => Err(FemError::Configuration {
                kind: self.kind(),
                degree: self.degree(),
                order_exact: self.order_exact(),
                reason: format!("sampling lattice needs at least 2 points per edge, got {points_per_edge}"),
            }),
            SamplingPolicy::Lattice { points_per_edge } => Ok(reference_nodes(
                self.kind(),
                points_per_edge - 1,
                NodeDistribution::Equidistant,
            )),
        }
    }
}

fn report_fatal<T>(result: Result<T>) -> Result<T> {
    result.inspect_err(|err| {
        if matches!(err, FemError::NotImplemented { .. }) {
            error!("{err}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::parametric_topology_element::coordinate_batch::CoordinateMatrix;
    use crate::elements::standard_element::reference_basis_table::MAX_DEGREE;
    use approx::assert_relative_eq;

    /// Nodes of `element` mapped through `map`, `[n_basis, dim]`.
    fn mapped_nodes(element: &StandardElement, map: impl Fn(&[f64]) -> Vec<f64>) -> Array2<f64> {
        let nodes = element.reference_nodes(NodeDistribution::LegendreGaussLobatto).unwrap();
        let dim = nodes.ncols();
        let mut mapped = Array2::zeros(nodes.dim());
        for (n, node) in nodes.rows().into_iter().enumerate() {
            let x = map(&node.to_vec());
            for s in 0..dim {
                mapped[[n, s]] = x[s];
            }
        }
        mapped
    }

    #[test]
    fn test_three_reference_squares() {
        let element = StandardElement::new(GeometryKind::Quadrilateral, 2, 4).unwrap();
        let square = mapped_nodes(&element, |x| x.to_vec());
        let packed = CoordinateMatrix::from_elements(&[square.clone(), square.clone(), square]).unwrap();
        let batch = packed.as_batch().unwrap();

        let output = element
            .compute_jacobian_extrema(&GeometryConfig::default(), &batch)
            .unwrap();
        assert_eq!(output.jacobian_field.dim(), (3, 9));
        for e in 0..3 {
            for p in 0..9 {
                assert_relative_eq!(output.jacobian_field[[e, p]], 1.0, epsilon = 1e-12);
            }
            assert_relative_eq!(output.extrema[e].min, 1.0, epsilon = 1e-12);
            assert_relative_eq!(output.extrema[e].max, 1.0, epsilon = 1e-12);
        }
        assert!(output.is_valid());
    }

    #[test]
    fn test_unit_square_volume() {
        let element = StandardElement::new(GeometryKind::Quadrilateral, 2, 4).unwrap();
        let unit_square = mapped_nodes(&element, |x| vec![0.5 * (x[0] + 1.0), 0.5 * (x[1] + 1.0)]);
        let packed = CoordinateMatrix::from_elements(&[unit_square]).unwrap();
        let metric = element
            .metric_terms(&GeometryConfig::default(), &packed.as_batch().unwrap())
            .unwrap();
        for det in metric.determinants().iter() {
            assert_relative_eq!(*det, 0.25, epsilon = 1e-13);
        }
        let volumes = metric.element_volumes(element.integration_weights()).unwrap();
        assert_relative_eq!(volumes[0], 1.0, epsilon = 1e-13);
    }

    #[test]
    fn test_identity_map_has_identity_metric() {
        for kind in [GeometryKind::Triangle, GeometryKind::Quadrilateral, GeometryKind::Tetrahedron] {
            let element = StandardElement::new(kind, 3, 5).unwrap();
            let identity = mapped_nodes(&element, |x| x.to_vec());
            let packed = CoordinateMatrix::from_elements(&[identity]).unwrap();
            let metric = element
                .metric_terms(&GeometryConfig::default(), &packed.as_batch().unwrap())
                .unwrap();
            let dim = kind.reference_dimension();
            for p in 0..element.n_integration_points() {
                assert_relative_eq!(metric.determinants()[[0, p]], 1.0, epsilon = 1e-10);
                for r in 0..dim {
                    for c in 0..dim {
                        let expected = if r == c { 1.0 } else { 0.0 };
                        assert!((metric.inverse_transpose(0, p)[[r, c]] - expected).abs() < 1e-10);
                    }
                }
            }
        }
    }

    #[test]
    fn test_identity_map_at_highest_degree() {
        for kind in [GeometryKind::Triangle, GeometryKind::Tetrahedron, GeometryKind::Prism] {
            let element = StandardElement::new(kind, MAX_DEGREE, 4).unwrap();
            for distribution in NodeDistribution::ALL {
                let identity = element.reference_nodes(distribution).unwrap().clone();
                let packed = CoordinateMatrix::from_elements(&[identity]).unwrap();
                let config = GeometryConfig::default().with_node_distribution(distribution);
                let metric = element.metric_terms(&config, &packed.as_batch().unwrap()).unwrap();
                for det in metric.determinants().iter() {
                    assert!((det - 1.0).abs() < 1e-11, "{kind} {distribution:?}: det = {det}");
                }
            }
        }
    }

    #[test]
    fn test_curved_element_sampled_on_lattice() {
        // bulge the top edge of a quadratic quadrilateral outwards
        let element = StandardElement::new(GeometryKind::Quadrilateral, 2, 2).unwrap();
        let curved = mapped_nodes(&element, |x| vec![x[0], x[1] + 0.3 * (1.0 + x[1]) * (1.0 - x[0] * x[0])]);
        let packed = CoordinateMatrix::from_elements(&[curved]).unwrap();
        let batch = packed.as_batch().unwrap();

        let coarse = element
            .compute_jacobian_extrema(&GeometryConfig::default(), &batch)
            .unwrap();
        let config = GeometryConfig::default().with_sampling(SamplingPolicy::Lattice { points_per_edge: 5 });
        let fine = element.compute_jacobian_extrema(&config, &batch).unwrap();

        assert_eq!(fine.jacobian_field.ncols(), element.n_integration_points() + 25);
        assert!(fine.extrema[0].min <= coarse.extrema[0].min);
        assert!(fine.extrema[0].max >= coarse.extrema[0].max);
        // dy/deta = 1 + 0.3 (1 - xi^2) peaks at xi = 0
        assert_relative_eq!(fine.extrema[0].max, 1.3, epsilon = 1e-12);
        assert_relative_eq!(fine.extrema[0].min, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nodal_sampling_adds_nodes() {
        let element = StandardElement::new(GeometryKind::Triangle, 2, 4).unwrap();
        let identity = mapped_nodes(&element, |x| x.to_vec());
        let packed = CoordinateMatrix::from_elements(&[identity]).unwrap();
        let config = GeometryConfig::default().with_sampling(SamplingPolicy::NodalPoints);
        let output = element
            .compute_jacobian_extrema(&config, &packed.as_batch().unwrap())
            .unwrap();
        assert_eq!(output.jacobian_field.ncols(), element.n_integration_points() + element.n_basis());
    }

    #[test]
    fn test_degenerate_lattice_rejected() {
        let element = StandardElement::new(GeometryKind::Quadrilateral, 1, 2).unwrap();
        let square = mapped_nodes(&element, |x| x.to_vec());
        let packed = CoordinateMatrix::from_elements(&[square]).unwrap();
        let config = GeometryConfig::default().with_sampling(SamplingPolicy::Lattice { points_per_edge: 1 });
        assert!(matches!(
            element.compute_jacobian_extrema(&config, &packed.as_batch().unwrap()),
            Err(FemError::Configuration { .. })
        ));
    }

    #[test]
    fn test_distortion_bound_flags_stretched_element() {
        let element = StandardElement::new(GeometryKind::Quadrilateral, 2, 4).unwrap();
        let trapezoid = mapped_nodes(&element, |x| vec![x[0] * (2.0 + 1.5 * x[1]), x[1]]);
        let packed = CoordinateMatrix::from_elements(&[trapezoid]).unwrap();
        let batch = packed.as_batch().unwrap();

        let lenient = element
            .compute_jacobian_extrema(&GeometryConfig::default(), &batch)
            .unwrap();
        assert!(lenient.is_valid());

        let strict = element
            .compute_jacobian_extrema(&GeometryConfig::default().with_distortion_bound(2.0), &batch)
            .unwrap();
        assert!(matches!(
            strict.diagnostics.as_slice(),
            [FemError::InvalidElementGeometry { element: 0, .. }]
        ));
    }

    #[test]
    fn test_dimension_mismatch_names_the_shape() {
        let element = StandardElement::new(GeometryKind::Tetrahedron, 1, 2).unwrap();
        let config = GeometryConfig::default();
        // a linear triangle handed to a linear tetrahedron
        let data = vec![0.0; 3 * 3];
        let batch = CoordinateBatch::new(&data, 3, 1, 3, 3).unwrap();

        let err = element.evaluate_integration_point_data(&config, &batch).unwrap_err();
        assert!(matches!(
            err,
            FemError::DimensionMismatch {
                kind: Some(GeometryKind::Tetrahedron),
                expected: 4,
                found: 3,
                ..
            }
        ));
        assert!(err.to_string().contains("tetrahedron"));

        let err = element.compute_jacobian_extrema(&config, &batch).unwrap_err();
        assert!(matches!(
            err,
            FemError::DimensionMismatch {
                kind: Some(GeometryKind::Tetrahedron),
                ..
            }
        ));
    }

    #[test]
    fn test_pyramid_operations_are_not_implemented() {
        let element = StandardElement::new(GeometryKind::Pyramid, 2, 4).unwrap();
        assert!(element.n_integration_points() > 0);
        let data = vec![0.0; 14 * 3];
        let batch = CoordinateBatch::new(&data, 14, 1, 3, 14).unwrap();
        let config = GeometryConfig::default();

        let err = element.evaluate_integration_point_data(&config, &batch).unwrap_err();
        assert_eq!(
            err,
            FemError::NotImplemented {
                operation: EVALUATE_INTEGRATION_POINT_DATA,
                kind: GeometryKind::Pyramid
            }
        );
        let err = element.compute_jacobian_extrema(&config, &batch).unwrap_err();
        assert!(err.to_string().contains("compute_jacobian_extrema"));
        assert!(err.to_string().contains("pyramid"));
    }

    #[test]
    fn test_unsupported_configuration() {
        assert!(matches!(
            StandardElement::new(GeometryKind::Hexahedron, 0, 4),
            Err(FemError::Configuration { .. })
        ));
        assert!(matches!(
            StandardElement::new(GeometryKind::Prism, 2, 99),
            Err(FemError::Configuration { .. })
        ));
    }

    #[test]
    fn test_from_cache_shares_table() {
        let cache = StandardElementCache::new();
        let key = StandardElementKey::new(GeometryKind::Prism, 2, 4);
        let first = StandardElement::from_cache(key, &cache).unwrap();
        let second = StandardElement::from_cache(key, &cache).unwrap();
        assert!(Arc::ptr_eq(first.table(), second.table()));
        assert_eq!(cache.len(), 1);
    }
}
