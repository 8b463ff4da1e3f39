//! High-order standard elements and metric terms for curved meshes.
//!
//! A [`StandardElement`] represents one (shape, polynomial degree, integration order)
//! configuration. It owns the reference basis data for that configuration and maps batches
//! of physical elements to Jacobians, determinants and inverse-transpose metric terms at the
//! integration points, and checks the resulting mapping for inverted or distorted elements.

pub mod config;
pub mod error;

pub mod elements {
    pub mod element_interfaces;
    pub mod geometry_kind;
    pub mod quadrature {
        pub mod gauss_jacobi;
        pub mod quadrature_rules;
    }
    pub mod element_library {
        pub mod hypercube_elements;
        pub mod node_distributions;
        pub mod simplex_elements;
    }
    pub mod parametric_topology_element {
        pub mod coordinate_batch;
        pub mod determinant_and_adjugate;
        pub mod jacobian_quality;
        pub mod position_jacobian;
    }
    pub mod standard_element {
        pub mod element_cache;
        pub mod reference_basis_table;
        pub mod standard_element;
    }
}

pub use config::{GeometryConfig, NodeDistribution, SamplingPolicy};
pub use elements::geometry_kind::GeometryKind;
pub use elements::parametric_topology_element::coordinate_batch::{CoordinateBatch, CoordinateMatrix};
pub use elements::parametric_topology_element::jacobian_quality::JacobianExtrema;
pub use elements::parametric_topology_element::position_jacobian::{IntegrationPointData, MetricTerms};
pub use elements::standard_element::element_cache::StandardElementCache;
pub use elements::standard_element::reference_basis_table::{ReferenceBasisTable, StandardElementKey};
pub use elements::standard_element::standard_element::{JacobianExtremaOutput, StandardElement};
pub use error::{FemError, Result};
