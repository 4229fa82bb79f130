//! Gridded sets of monotonic samples along a single axis.

use super::{
    gather_samples,
    gridded::{grid_neighbors, grid_to_index, grid_to_interp},
    sample_extents, GriddedGeometry, Interpolant, SampledSet, SetFrame,
};
use crate::{
    constants::GRID_EDGE,
    ensure,
    error::Result,
    num::{from_f64, to_f64, BFloat},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::borrow::Cow;

/// One-dimensional set of strictly increasing or strictly decreasing samples.
#[derive(Clone, Debug)]
pub struct Gridded1DSet<F: BFloat> {
    frame: SetFrame,
    samples: Array2<F>,
    lengths: [usize; 1],
    ascending: bool,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> Gridded1DSet<F> {
    /// Creates a new one-dimensional gridded set.
    ///
    /// # Parameters
    ///
    /// - `frame`: One-dimensional domain type, coordinate system and units.
    /// - `samples`: Sample values with shape `(1, length)`.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new `Gridded1DSet`.
    /// - `Err`: `DimensionMismatch` if the frame or samples are not one-dimensional,
    /// or `InvalidGrid` if the samples are not finite and strictly monotonic.
    pub fn new(frame: SetFrame, samples: Array2<F>) -> Result<Self> {
        ensure!(
            frame.dimension() == 1,
            DimensionMismatch,
            "domain dimension must be 1, not {}",
            frame.dimension()
        );
        let (low, hi) = sample_extents(&frame, &samples)?;
        let row = samples.row(0);
        let length = row.len();
        let ascending = length < 2 || row[length - 1] > row[0];
        for i in 1..length {
            let ordered = if ascending {
                row[i] > row[i - 1]
            } else {
                row[i] < row[i - 1]
            };
            ensure!(
                ordered,
                InvalidGrid,
                "samples do not form a valid grid ({})",
                i
            );
        }
        Ok(Self {
            frame,
            samples,
            lengths: [length],
            ascending,
            low,
            hi,
        })
    }

    /// Creates a new one-dimensional gridded set from a plain list of samples.
    pub fn from_values(frame: SetFrame, values: Vec<F>) -> Result<Self> {
        let samples = Array1::from(values).insert_axis(ndarray::Axis(0));
        Self::new(frame, samples)
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Returns the sample values along the axis.
    pub fn sample_values(&self) -> ArrayView1<'_, F> {
        self.samples.row(0)
    }

    fn grid_length(&self) -> usize {
        self.lengths[0]
    }
}

impl<F: BFloat> SampledSet<F> for Gridded1DSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        1
    }

    fn len(&self) -> usize {
        self.grid_length()
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

    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        let grid = self.value_to_grid(values)?;
        Ok(grid_to_index(&self.lengths, grid.view()))
    }

    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        let grid = self.value_to_grid(values)?;
        Ok(grid_to_interp(&self.lengths, grid.view()))
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        Ok(grid_neighbors(&self.lengths))
    }
}

impl<F: BFloat> GriddedGeometry<F> for Gridded1DSet<F> {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_grid(&grid)?;
        let samples = self.samples.row(0);
        let length = self.grid_length();
        let upper = length as f64 - 1.0 + GRID_EDGE;
        Ok(grid.mapv(|g| {
            let g = to_f64(g);
            if !(g >= -GRID_EDGE && g <= upper) {
                return F::nan();
            }
            if length == 1 {
                return samples[0];
            }
            let ig = if g < 0.0 {
                0
            } else if g >= (length - 1) as f64 {
                length - 2
            } else {
                g as usize
            };
            let a = g - ig as f64;
            from_f64((1.0 - a) * to_f64(samples[ig]) + a * to_f64(samples[ig + 1]))
        }))
    }

    /// Brackets each value between two adjacent samples with a binary search,
    /// then corrects the grid coordinate with one linear Newton step.
    ///
    /// The bracketing interval found for one value seeds the search for the
    /// next, and is reset to the middle of the grid after a value outside.
    fn value_to_grid(&self, values: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_values(&values)?;
        let samples: Vec<f64> = self.samples.row(0).iter().map(|&s| to_f64(s)).collect();
        let length = samples.len();
        let upper_edge = length as f64 - 1.0 + GRID_EDGE;
        let midpoint = length.saturating_sub(1) / 2;
        let mut ig = midpoint;
        let mut outside = 0;
        let grid = values.mapv(|value| {
            let v = to_f64(value);
            if v.is_nan() {
                return F::nan();
            }
            if length == 1 {
                return F::zero();
            }
            let mut lower = 0;
            let mut upper = length - 1;
            while lower < upper {
                if (v - samples[ig]) * (v - samples[ig + 1]) <= 0.0 {
                    break;
                }
                let beyond_next = if self.ascending {
                    samples[ig + 1] < v
                } else {
                    samples[ig + 1] > v
                };
                if beyond_next {
                    lower = ig + 1;
                } else {
                    let before_current = if self.ascending {
                        samples[ig] > v
                    } else {
                        samples[ig] < v
                    };
                    if before_current {
                        upper = ig;
                    }
                }
                if lower < upper {
                    ig = (lower + upper) / 2;
                }
            }
            let solution = ig as f64 + (v - samples[ig]) / (samples[ig + 1] - samples[ig]);
            if solution >= -GRID_EDGE && solution <= upper_edge {
                from_f64(solution)
            } else {
                outside += 1;
                ig = midpoint;
                F::nan()
            }
        });
        if outside > 0 {
            log::trace!("{} of {} values lie outside the grid", outside, values.ncols());
        }
        Ok(grid)
    }
}

impl<F: BFloat> PartialEq for Gridded1DSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.samples == other.samples
    }
}
