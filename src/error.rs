//! Error taxonomy for standard element construction and metric evaluation.

use crate::elements::geometry_kind::GeometryKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FemError {
    /// Unsupported (shape, degree, integration order) combination.
    #[error("unsupported {kind} configuration (degree {degree}, integration order {order_exact}): {reason}")]
    Configuration {
        kind: GeometryKind,
        degree: usize,
        order_exact: usize,
        reason: String,
    },

    /// The shape has no algorithm for the requested operation.
    ///
    /// This is never recoverable: continuing would hand invalid metric data to the solver,
    /// so callers are expected to abort the run after reporting it.
    #[error("operation `{operation}` is not implemented for {kind} standard elements")]
    NotImplemented {
        operation: &'static str,
        kind: GeometryKind,
    },

    /// Non-positive Jacobian determinant or exceeded distortion bound.
    #[error("invalid geometry for element {element}: jacobian min = {min:e}, max = {max:e}")]
    InvalidElementGeometry { element: usize, min: f64, max: f64 },

    /// Array shapes disagree. `kind` is filled in by the standard element entry points.
    #[error("dimension mismatch in {context}{}: expected {expected}, found {found}", on_kind(.kind))]
    DimensionMismatch {
        context: &'static str,
        kind: Option<GeometryKind>,
        expected: usize,
        found: usize,
    },

    #[error("invalid matrix layout: {0}")]
    Layout(String),
}

impl From<ndarray::ShapeError> for FemError {
    fn from(err: ndarray::ShapeError) -> Self {
        FemError::Layout(err.to_string())
    }
}

impl FemError {
    /// Attaches `kind` to a `DimensionMismatch` raised below the standard element.
    pub fn with_kind(self, kind: GeometryKind) -> Self {
        match self {
            FemError::DimensionMismatch {
                context,
                kind: None,
                expected,
                found,
            } => FemError::DimensionMismatch {
                context,
                kind: Some(kind),
                expected,
                found,
            },
            other => other,
        }
    }
}

fn on_kind(kind: &Option<GeometryKind>) -> String {
    kind.map(|kind| format!(" for {kind} elements")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, FemError>;
