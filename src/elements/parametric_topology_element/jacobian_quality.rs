//! Reduction of sampled Jacobian determinants to per-element validity diagnostics.
//!
//! An element is geometrically valid when its determinant is positive at every sample and,
//! if a distortion bound is configured, `max / min` stays below that bound. Samples are
//! rows of a `[n_elements, n_samples]` field; NaN samples always invalidate their element.

use crate::error::{FemError, Result};
use log::warn;
use ndarray::ArrayView2;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianExtrema {
    pub min: f64,
    pub max: f64,
}

impl JacobianExtrema {
    /// Extrema of one row of samples. NaN propagates into both bounds.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a f64>) -> Self {
        samples.into_iter().fold(
            JacobianExtrema {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |acc, &x| {
                if x.is_nan() || acc.min.is_nan() {
                    JacobianExtrema { min: f64::NAN, max: f64::NAN }
                } else {
                    JacobianExtrema {
                        min: acc.min.min(x),
                        max: acc.max.max(x),
                    }
                }
            },
        )
    }

    /// `max / min`.
    pub fn distortion(&self) -> f64 {
        self.max / self.min
    }

    pub fn is_valid(&self, distortion_bound: Option<f64>) -> bool {
        if self.min.is_nan() || self.max.is_nan() || self.min <= 0.0 {
            return false;
        }
        distortion_bound.is_none_or(|bound| self.distortion() <= bound)
    }

    pub fn validate(&self, element: usize, distortion_bound: Option<f64>) -> Result<()> {
        if self.is_valid(distortion_bound) {
            Ok(())
        } else {
            Err(FemError::InvalidElementGeometry {
                element,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Per-element extrema of a `[n_elements, n_samples]` determinant field.
pub fn min_max(field: ArrayView2<f64>) -> Vec<JacobianExtrema> {
    field
        .rows()
        .into_iter()
        .map(|row| JacobianExtrema::from_samples(row.iter()))
        .collect()
}

/// One `InvalidElementGeometry` diagnostic per failing element, in element order.
///
/// `first_element` is the global id of the first element of the batch.
pub fn validate_batch(
    extrema: &[JacobianExtrema],
    first_element: usize,
    distortion_bound: Option<f64>,
) -> Vec<FemError> {
    extrema
        .iter()
        .enumerate()
        .filter_map(|(e, element_extrema)| element_extrema.validate(first_element + e, distortion_bound).err())
        .inspect(|diagnostic| warn!("{diagnostic}"))
        .collect()
}

/// Smallest minimum and largest maximum over a batch, `None` for an empty batch.
///
/// Any NaN extremum makes both bounds NaN, as in [`JacobianExtrema::from_samples`].
pub fn batch_extrema(extrema: &[JacobianExtrema]) -> Option<JacobianExtrema> {
    let (first, rest) = extrema.split_first()?;
    let start = JacobianExtrema::from_samples([first.min, first.max].iter());
    Some(rest.iter().fold(start, |acc, x| {
        if acc.min.is_nan() || x.min.is_nan() || x.max.is_nan() {
            JacobianExtrema { min: f64::NAN, max: f64::NAN }
        } else {
            JacobianExtrema {
                min: acc.min.min(x.min),
                max: acc.max.max(x.max),
            }
        }
    }))
}
