//! Utilities related to numbers.

use ieee754;
use ndarray::{Array2, ArrayView2};
use num;
use std::{cmp, fmt};

/// Floating point marker trait for easier control over trait bounds.
///
/// Sets are generic over this trait, so single and double precision
/// share one implementation.
pub trait BFloat:
    'static
    + Sync
    + Send
    + num::Float
    + num::cast::FromPrimitive
    + ieee754::Ieee754
    + fmt::Debug
    + fmt::Display
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Converts a double into the given precision, giving NaN if not representable.
pub fn from_f64<F: BFloat>(value: f64) -> F {
    F::from_f64(value).unwrap_or_else(F::nan)
}

/// Converts a value of the given precision into a double.
pub fn to_f64<F: BFloat>(value: F) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Converts a component-major value array between precisions.
pub fn convert_values<F: BFloat, G: BFloat>(values: ArrayView2<F>) -> Array2<G> {
    values.mapv(|value| from_f64(to_f64(value)))
}

/// Integer-float pair that can be ordered based on the float.
pub struct OrderableIndexValuePair<I: num::Integer, F: BFloat>(pub I, pub F);

impl<I: num::Integer, F: BFloat> PartialEq for OrderableIndexValuePair<I, F> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<I: num::Integer, F: BFloat> PartialOrd for OrderableIndexValuePair<I, F> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: num::Integer, F: BFloat> Eq for OrderableIndexValuePair<I, F> {}

impl<I: num::Integer, F: BFloat> Ord for OrderableIndexValuePair<I, F> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // Set samples are validated finite, so only the NaN fallback is total.
        self.1.partial_cmp(&other.1).unwrap_or(cmp::Ordering::Equal)
    }
}
