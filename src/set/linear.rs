//! Gridded sets with uniformly spaced samples along every axis.

use super::{
    gridded::{grid_neighbors, grid_to_index, grid_to_interp, split_index},
    AnySet, GriddedGeometry, Interpolant, SampledSet, SetFrame,
};
use crate::{
    constants::GRID_EDGE,
    ensure,
    error::Result,
    num::{from_f64, to_f64, BFloat},
};
use ndarray::{Array2, ArrayView2, Axis};
use std::borrow::Cow;

/// Creates the most specific uniformly spaced set: a `Linear1DSet` for a
/// single axis, otherwise a `LinearNDSet`.
///
/// # Parameters
///
/// - `frame`: Domain type, coordinate system and units, with one component per axis.
/// - `firsts`: First value along each axis.
/// - `lasts`: Last value along each axis.
/// - `lengths`: Number of samples along each axis.
pub fn create<F: BFloat>(
    frame: SetFrame,
    firsts: &[F],
    lasts: &[F],
    lengths: &[usize],
) -> Result<AnySet<F>> {
    if lengths.len() == 1 && frame.dimension() == 1 {
        ensure!(
            firsts.len() == 1 && lasts.len() == 1,
            DimensionMismatch,
            "expected one first and last value, got {} and {}",
            firsts.len(),
            lasts.len()
        );
        Ok(Linear1DSet::new(frame, firsts[0], lasts[0], lengths[0])?.into())
    } else {
        Ok(LinearNDSet::new(frame, firsts, lasts, lengths)?.into())
    }
}

/// One-dimensional set of samples forming an arithmetic progression.
#[derive(Clone, Debug)]
pub struct Linear1DSet<F: BFloat> {
    frame: SetFrame,
    first: F,
    last: F,
    step: f64,
    inverse_step: f64,
    lengths: [usize; 1],
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> Linear1DSet<F> {
    /// Creates a new set of `length` samples from `first` to `last`.
    ///
    /// A single sample is placed at `first`. With more samples, `first` and
    /// `last` must differ.
    pub fn new(frame: SetFrame, first: F, last: F, length: usize) -> Result<Self> {
        ensure!(
            frame.dimension() == 1,
            DimensionMismatch,
            "domain dimension must be 1, not {}",
            frame.dimension()
        );
        ensure!(length >= 1, InvalidGrid, "length must be at least 1");
        ensure!(
            first.is_finite() && last.is_finite(),
            InvalidGrid,
            "first ({}) and last ({}) must be finite",
            first,
            last
        );
        ensure!(
            length == 1 || first != last,
            InvalidGrid,
            "first and last must differ for {} samples",
            length
        );
        let step = if length < 2 {
            1.0
        } else {
            (to_f64(last) - to_f64(first)) / (length - 1) as f64
        };
        let last = if length < 2 { first } else { last };
        Ok(Self {
            frame,
            first,
            last,
            step,
            inverse_step: 1.0 / step,
            lengths: [length],
            low: vec![first.min(last)],
            hi: vec![first.max(last)],
        })
    }

    pub fn first(&self) -> F {
        self.first
    }

    pub fn last(&self) -> F {
        self.last
    }

    pub fn step(&self) -> F {
        from_f64(self.step)
    }

    fn grid_length(&self) -> usize {
        self.lengths[0]
    }

    fn grid_coordinate_to_value(&self, g: F) -> F {
        let g = to_f64(g);
        if g >= -GRID_EDGE && g <= self.grid_length() as f64 - 1.0 + GRID_EDGE {
            from_f64(to_f64(self.first) + g * self.step)
        } else {
            F::nan()
        }
    }

    fn value_to_grid_coordinate(&self, value: F) -> F {
        let g = (to_f64(value) - to_f64(self.first)) * self.inverse_step;
        if g >= -GRID_EDGE && g <= self.grid_length() as f64 - 1.0 + GRID_EDGE {
            from_f64(g)
        } else {
            F::nan()
        }
    }
}

impl<F: BFloat> SampledSet<F> for Linear1DSet<F> {
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
        Cow::Owned(Array2::from_shape_fn((1, self.grid_length()), |(_, i)| {
            from_f64(to_f64(self.first) + i as f64 * self.step)
        }))
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        Ok(Array2::from_shape_fn((1, indices.len()), |(_, i)| {
            if indices[i] < self.grid_length() {
                from_f64(to_f64(self.first) + indices[i] as f64 * self.step)
            } else {
                F::nan()
            }
        }))
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

impl<F: BFloat> GriddedGeometry<F> for Linear1DSet<F> {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_grid(&grid)?;
        Ok(grid.mapv(|g| self.grid_coordinate_to_value(g)))
    }

    fn value_to_grid(&self, values: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_values(&values)?;
        Ok(values.mapv(|value| self.value_to_grid_coordinate(value)))
    }
}

impl<F: BFloat> PartialEq for Linear1DSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && self.first == other.first
            && self.last == other.last
            && self.lengths == other.lengths
    }
}

/// Set whose samples form the Cartesian product of uniformly spaced axes,
/// with one axis per domain component.
#[derive(Clone, Debug)]
pub struct LinearNDSet<F: BFloat> {
    frame: SetFrame,
    axes: Vec<Linear1DSet<F>>,
    lengths: Vec<usize>,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> LinearNDSet<F> {
    /// Creates a new set with `lengths[i]` samples from `firsts[i]` to
    /// `lasts[i]` along each axis.
    pub fn new(frame: SetFrame, firsts: &[F], lasts: &[F], lengths: &[usize]) -> Result<Self> {
        let dimension = frame.dimension();
        ensure!(
            firsts.len() == dimension && lasts.len() == dimension && lengths.len() == dimension,
            DimensionMismatch,
            "got {} firsts, {} lasts and {} lengths for domain dimension {}",
            firsts.len(),
            lasts.len(),
            lengths.len(),
            dimension
        );
        let axes = (0..dimension)
            .map(|axis| {
                Linear1DSet::new(frame.component(axis), firsts[axis], lasts[axis], lengths[axis])
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_axes(frame, axes)
    }

    /// Creates a new set from existing one-dimensional axes.
    ///
    /// The number of axes must equal the domain dimension.
    pub fn from_axes(frame: SetFrame, axes: Vec<Linear1DSet<F>>) -> Result<Self> {
        ensure!(
            axes.len() == frame.dimension(),
            DimensionMismatch,
            "{} axes given for domain dimension {}",
            axes.len(),
            frame.dimension()
        );
        ensure!(!axes.is_empty(), InvalidGrid, "set must have at least one axis");
        let lengths = axes.iter().map(|axis| axis.grid_length()).collect();
        let low = axes.iter().map(|axis| axis.low[0]).collect();
        let hi = axes.iter().map(|axis| axis.hi[0]).collect();
        Ok(Self {
            frame,
            axes,
            lengths,
            low,
            hi,
        })
    }

    pub fn axes(&self) -> &[Linear1DSet<F>] {
        &self.axes
    }

    fn values_at(&self, index: usize) -> Vec<F> {
        split_index(&self.lengths, index)
            .into_iter()
            .zip(&self.axes)
            .map(|(idx, axis)| from_f64(to_f64(axis.first) + idx as f64 * axis.step))
            .collect()
    }
}

impl<F: BFloat> SampledSet<F> for LinearNDSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        self.axes.len()
    }

    fn len(&self) -> usize {
        self.lengths.iter().product()
    }

    fn low(&self) -> &[F] {
        &self.low
    }

    fn hi(&self) -> &[F] {
        &self.hi
    }

    fn samples(&self) -> Cow<'_, Array2<F>> {
        let indices: Vec<usize> = (0..self.len()).collect();
        let mut samples = Array2::zeros((self.axes.len(), indices.len()));
        for (mut column, index) in samples.axis_iter_mut(Axis(1)).zip(indices) {
            column
                .iter_mut()
                .zip(self.values_at(index))
                .for_each(|(sample, value)| *sample = value);
        }
        Cow::Owned(samples)
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        let length = self.len();
        let mut values = Array2::from_elem((self.axes.len(), indices.len()), F::nan());
        for (mut column, &index) in values.axis_iter_mut(Axis(1)).zip(indices) {
            if index < length {
                column
                    .iter_mut()
                    .zip(self.values_at(index))
                    .for_each(|(value, sample)| *value = sample);
            }
        }
        Ok(values)
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

impl<F: BFloat> GriddedGeometry<F> for LinearNDSet<F> {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_grid(&grid)?;
        let mut values = grid.to_owned();
        for (mut row, axis) in values.axis_iter_mut(Axis(0)).zip(&self.axes) {
            row.mapv_inplace(|g| axis.grid_coordinate_to_value(g));
        }
        Ok(values)
    }

    fn value_to_grid(&self, values: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_values(&values)?;
        let mut grid = values.to_owned();
        for (mut row, axis) in grid.axis_iter_mut(Axis(0)).zip(&self.axes) {
            row.mapv_inplace(|value| axis.value_to_grid_coordinate(value));
        }
        Ok(grid)
    }
}

impl<F: BFloat> PartialEq for LinearNDSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.axes == other.axes
    }
}
