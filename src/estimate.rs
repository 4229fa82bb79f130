//! Error estimates attached to value components.

use crate::units::{fun, Unit};
use ndarray::Array2;

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(feature = "for-testing")]
use approx::{AbsDiffEq, RelativeEq};

/// Magnitude of the uncertainty of a collection of values, along with
/// their mean and the number of values that were not missing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct ErrorEstimate {
    error: fun,
    mean: fun,
    number_not_missing: usize,
    unit: Option<Unit>,
}

impl ErrorEstimate {
    /// Creates a new error estimate from precomputed statistics.
    ///
    /// A NaN error or mean marks the whole estimate as missing.
    pub fn new(error: fun, mean: fun, number_not_missing: usize, unit: Option<Unit>) -> Self {
        if error.is_nan() || mean.is_nan() {
            Self::missing(unit)
        } else {
            Self {
                error,
                mean,
                number_not_missing,
                unit,
            }
        }
    }

    /// Creates an error estimate for the given values, whose mean is computed
    /// over the values that are not NaN.
    pub fn from_values(values: &[fun], error: fun, unit: Option<Unit>) -> Self {
        let (sum, count) = values
            .iter()
            .filter(|value| !value.is_nan())
            .fold((0.0, 0), |(sum, count), &value| (sum + value, count + 1));
        if count == 0 {
            Self::missing(unit)
        } else {
            Self::new(error, sum / count as fun, count, unit)
        }
    }

    fn missing(unit: Option<Unit>) -> Self {
        Self {
            error: fun::NAN,
            mean: fun::NAN,
            number_not_missing: 0,
            unit,
        }
    }

    pub fn error(&self) -> fun {
        self.error
    }

    pub fn mean(&self) -> fun {
        self.mean
    }

    pub fn number_not_missing(&self) -> usize {
        self.number_not_missing
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn is_missing(&self) -> bool {
        self.number_not_missing == 0
    }

    /// Builds the perturbed value matrix used for propagating the given
    /// errors through a coordinate transform.
    ///
    /// The result has one row per component and two columns per component.
    /// Row `i` holds the mean of component `i` everywhere except in columns
    /// `2i` and `2i + 1`, which hold `mean - error/2` and `mean + error/2`.
    /// Missing estimates contribute NaN.
    pub fn init_error_values(errors: &[Option<ErrorEstimate>]) -> Array2<fun> {
        let n = errors.len();
        let mut error_values = Array2::from_elem((n, 2 * n), fun::NAN);
        for (i, estimate) in errors.iter().enumerate() {
            let (mean, half_error) = match estimate {
                Some(estimate) => (estimate.mean(), 0.5 * estimate.error()),
                None => (fun::NAN, fun::NAN),
            };
            error_values.row_mut(i).fill(mean);
            error_values[[i, 2 * i]] = mean - half_error;
            error_values[[i, 2 * i + 1]] = mean + half_error;
        }
        error_values
    }
}

#[cfg(feature = "for-testing")]
impl AbsDiffEq for ErrorEstimate {
    type Epsilon = fun;

    fn default_epsilon() -> fun {
        <fun as AbsDiffEq>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: fun) -> bool {
        self.number_not_missing == other.number_not_missing
            && self.unit == other.unit
            && ((self.is_missing() && other.is_missing())
                || (self.error.abs_diff_eq(&other.error, epsilon)
                    && self.mean.abs_diff_eq(&other.mean, epsilon)))
    }
}

#[cfg(feature = "for-testing")]
impl RelativeEq for ErrorEstimate {
    fn default_max_relative() -> fun {
        <fun as RelativeEq>::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: fun, max_relative: fun) -> bool {
        self.number_not_missing == other.number_not_missing
            && self.unit == other.unit
            && ((self.is_missing() && other.is_missing())
                || (self.error.relative_eq(&other.error, epsilon, max_relative)
                    && self.mean.relative_eq(&other.mean, epsilon, max_relative)))
    }
}
