//! Reference-space data shared by every physical element of one configuration.
//!
//! A [`ReferenceBasisTable`] is keyed by [`StandardElementKey`] and holds the integration
//! rule together with the Lagrange basis tabulated at the integration points, once for each
//! [`NodeDistribution`]. Building is deterministic, so equal keys give bit-identical tables.
//! Shapes without a nodal basis (pyramids) still carry their integration rule; asking them
//! for basis data reports `NotImplemented`.

use crate::config::NodeDistribution;
use crate::elements::element_interfaces::{LagrangeShapeFunctions, NodalBasedShapeFunctions, Tabulation};
use crate::elements::geometry_kind::GeometryKind;
use crate::elements::quadrature::quadrature_rules::{IntegrationRule, MAX_INTEGRATION_ORDER};
use crate::error::{FemError, Result};
use log::debug;
use ndarray::{Array1, Array2, ArrayView2};

pub const MIN_DEGREE: usize = 1;
pub const MAX_DEGREE: usize = 10;

/// Identifies one (shape, polynomial degree, integration exactness) configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardElementKey {
    pub kind: GeometryKind,
    pub degree: usize,
    pub order_exact: usize,
}

impl StandardElementKey {
    pub fn new(kind: GeometryKind, degree: usize, order_exact: usize) -> Self {
        Self {
            kind,
            degree,
            order_exact,
        }
    }

    fn configuration_error(&self, reason: String) -> FemError {
        FemError::Configuration {
            kind: self.kind,
            degree: self.degree,
            order_exact: self.order_exact,
            reason,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&self.degree) {
            return Err(self.configuration_error(format!(
                "polynomial degree must lie in {MIN_DEGREE}..={MAX_DEGREE}"
            )));
        }
        if self.order_exact > MAX_INTEGRATION_ORDER {
            return Err(self.configuration_error(format!(
                "integration order must not exceed {MAX_INTEGRATION_ORDER}"
            )));
        }
        Ok(())
    }
}

/// Basis of one node distribution and its tabulation at the integration points.
#[derive(Debug, Clone, PartialEq)]
struct NodalBasis {
    shape_functions: LagrangeShapeFunctions,
    integration_points: Tabulation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceBasisTable {
    key: StandardElementKey,
    rule: IntegrationRule,
    /// Indexed by `NodeDistribution::index`, `None` when the shape has no nodal basis.
    bases: Option<[NodalBasis; 2]>,
}

impl ReferenceBasisTable {
    /// Validates `key` and tabulates the nodal bases of both distributions at the integration
    /// points.
    ///
    /// A shape without a nodal basis still gets a table holding only its integration rule.
    /// The `lagrange_shape_functions` error raised while building is dropped; basis lookups
    /// on such a table report `NotImplemented` under the operation passed by the caller.
    pub fn build(key: StandardElementKey) -> Result<Self> {
        key.validate()?;
        let rule: IntegrationRule = IntegrationRule::new(key.kind, key.order_exact)
            .map_err(|_| key.configuration_error("no integration rule of this order".into()))?;

        let tabulate = |distribution: NodeDistribution| -> Result<NodalBasis> {
            let shape_functions = LagrangeShapeFunctions::new(key.kind, key.degree, distribution)?;
            let integration_points = shape_functions.tabulate(rule.points().view());
            Ok(NodalBasis {
                shape_functions,
                integration_points,
            })
        };

        let bases: Option<[NodalBasis; 2]> = match (
            tabulate(NodeDistribution::Equidistant),
            tabulate(NodeDistribution::LegendreGaussLobatto),
        ) {
            (Ok(equidistant), Ok(lobatto)) => Some([equidistant, lobatto]),
            (Err(FemError::NotImplemented { .. }), _) | (_, Err(FemError::NotImplemented { .. })) => None,
            (Err(err), _) | (_, Err(err)) => return Err(err),
        };

        debug!(
            "built reference basis table for {} (degree {}, order {}): {} integration points, {} basis functions",
            key.kind,
            key.degree,
            key.order_exact,
            rule.len(),
            key.kind.number_of_nodes(key.degree),
        );

        Ok(Self { key, rule, bases })
    }

    pub fn key(&self) -> StandardElementKey {
        self.key
    }

    pub fn kind(&self) -> GeometryKind {
        self.key.kind
    }

    pub fn rule(&self) -> &IntegrationRule {
        &self.rule
    }

    pub fn n_integration_points(&self) -> usize {
        self.rule.len()
    }

    pub fn n_basis(&self) -> usize {
        self.key.kind.number_of_nodes(self.key.degree)
    }

    /// Reference coordinates of the integration points, `[n_points, dim]`.
    pub fn integration_points(&self) -> ArrayView2<'_, f64> {
        self.rule.points().view()
    }

    pub fn integration_weights(&self) -> &Array1<f64> {
        self.rule.weights()
    }

    pub fn has_basis(&self) -> bool {
        self.bases.is_some()
    }

    fn basis(&self, distribution: NodeDistribution, operation: &'static str) -> Result<&NodalBasis> {
        self.bases
            .as_ref()
            .map(|bases| &bases[distribution.index()])
            .ok_or(FemError::NotImplemented {
                operation,
                kind: self.key.kind,
            })
    }

    pub fn shape_functions(
        &self,
        distribution: NodeDistribution,
        operation: &'static str,
    ) -> Result<&LagrangeShapeFunctions> {
        Ok(&self.basis(distribution, operation)?.shape_functions)
    }

    /// Basis values and derivatives at the integration points.
    pub fn tabulation(&self, distribution: NodeDistribution, operation: &'static str) -> Result<&Tabulation> {
        Ok(&self.basis(distribution, operation)?.integration_points)
    }

    /// Reference nodes of `distribution`, `[n_basis, dim]`.
    pub fn nodes(&self, distribution: NodeDistribution, operation: &'static str) -> Result<&Array2<f64>> {
        Ok(self.shape_functions(distribution, operation)?.nodes())
    }
}
