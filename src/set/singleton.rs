//! Sets holding a single sample.

use super::{gather_samples, sample_extents, Interpolant, SampledSet, SetFrame};
use crate::{ensure, error::Result, num::BFloat};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::borrow::Cow;

/// Set of one point in a domain of any dimension.
///
/// The manifold is zero-dimensional, so every query value maps onto the
/// single sample.
#[derive(Clone, Debug)]
pub struct SingletonSet<F: BFloat> {
    frame: SetFrame,
    samples: Array2<F>,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> SingletonSet<F> {
    /// Creates a new singleton set holding the given point.
    ///
    /// # Parameters
    ///
    /// - `frame`: Domain type, coordinate system and units.
    /// - `point`: One finite component per domain dimension.
    pub fn new(frame: SetFrame, point: &[F]) -> Result<Self> {
        ensure!(
            point.len() == frame.dimension(),
            DimensionMismatch,
            "point has {} components, domain dimension is {}",
            point.len(),
            frame.dimension()
        );
        let samples = Array1::from(point.to_vec()).insert_axis(Axis(1));
        let (low, hi) = sample_extents(&frame, &samples)?;
        Ok(Self {
            frame,
            samples,
            low,
            hi,
        })
    }

    /// Returns the components of the single sample.
    pub fn point(&self) -> Vec<F> {
        self.samples.column(0).to_vec()
    }
}

impl<F: BFloat> SampledSet<F> for SingletonSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        0
    }

    fn len(&self) -> usize {
        1
    }

    fn low(&self) -> &[F] {
        &self.low
    }

    fn hi(&self) -> &[F] {
        &self.hi
    }

    fn samples(&self) -> Cow<'_, Array2<F>> {
        Cow::Borrowed(&self.samples)
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        Ok(gather_samples(&self.samples, indices))
    }

    /// Every value without missing components maps to index 0.
    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        self.check_values(&values)?;
        Ok(values
            .axis_iter(Axis(1))
            .map(|value| {
                if value.iter().any(|v| v.is_nan()) {
                    None
                } else {
                    Some(0)
                }
            })
            .collect())
    }

    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        Ok(self
            .value_to_index(values)?
            .into_iter()
            .map(|idx| idx.map(Interpolant::single))
            .collect())
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        Ok(vec![Vec::new()])
    }
}

impl<F: BFloat> PartialEq for SingletonSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.samples == other.samples
    }
}
