//! Configuration read by the metric evaluation and quality checks.
//!
//! Only the fields the geometric core consumes live here: which reference node layout the
//! nodal coordinates were generated with, which points the Jacobian is sampled at when
//! validating elements, and an optional distortion bound.

/// Reference-space layout of the shape-defining nodes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeDistribution {
    /// Uniformly spaced nodes.
    Equidistant,
    /// Nodes clustered at the Legendre-Gauss-Lobatto points.
    #[default]
    LegendreGaussLobatto,
}

impl NodeDistribution {
    pub const ALL: [NodeDistribution; 2] = [
        NodeDistribution::Equidistant,
        NodeDistribution::LegendreGaussLobatto,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            NodeDistribution::Equidistant => 0,
            NodeDistribution::LegendreGaussLobatto => 1,
        }
    }
}

/// Points at which Jacobian determinants are sampled for min/max extraction.
///
/// The integration points are always part of the sample set; the other variants add points
/// so that degeneracies between integration points of curved elements are caught.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplingPolicy {
    #[default]
    IntegrationPoints,
    /// Integration points plus the nodes of the configured distribution.
    NodalPoints,
    /// Integration points plus a uniform lattice with `points_per_edge` points on each edge.
    Lattice { points_per_edge: usize },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryConfig {
    pub node_distribution: NodeDistribution,
    pub sampling: SamplingPolicy,
    /// Largest admissible `max / min` Jacobian ratio, `None` to only reject non-positive ones.
    pub distortion_bound: Option<f64>,
}

impl GeometryConfig {
    pub fn with_node_distribution(mut self, node_distribution: NodeDistribution) -> Self {
        self.node_distribution = node_distribution;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_distortion_bound(mut self, bound: f64) -> Self {
        self.distortion_bound = Some(bound);
        self
    }
}
