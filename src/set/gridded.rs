//! Sets of samples on a logical grid embedded in a domain space.

use super::{
    gather_samples, gridded_1d::Gridded1DSet, sample_extents, AnySet, GriddedGeometry,
    Interpolant, SampledSet, SetFrame,
};
use crate::{
    constants::{
        CELL_EDGE_TOLERANCE, GRID_EDGE, MAX_CELL_WALK_STEPS, MAX_NEWTON_ITERATIONS,
        NEWTON_TOLERANCE,
    },
    ensure,
    error::Result,
    fail,
    num::{from_f64, to_f64, BFloat},
};
use ndarray::{Array2, ArrayView2, Axis, Zip};
use rayon::prelude::*;
use std::borrow::Cow;

/// Gridded set of any manifold dimension not exceeding its domain dimension.
///
/// Values between grid points are found by multilinear interpolation over
/// each grid cell.
#[derive(Clone, Debug)]
pub struct GriddedSet<F: BFloat> {
    frame: SetFrame,
    samples: Array2<F>,
    lengths: Vec<usize>,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> GriddedSet<F> {
    /// Creates a new gridded set.
    ///
    /// # Parameters
    ///
    /// - `frame`: Domain type, coordinate system and units.
    /// - `samples`: Sample values with shape `(domain dimension, product of lengths)`, first axis varying fastest.
    /// - `lengths`: Number of samples along each manifold axis.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new `GriddedSet`.
    /// - `Err`: `InvalidGrid` if any length is zero, the manifold dimension exceeds
    /// the domain dimension, a sample is not finite or the cells of a 2D or 3D grid
    /// fold over each other, or `DimensionMismatch` if the sample array does not
    /// match the frame and lengths.
    pub fn new(frame: SetFrame, samples: Array2<F>, lengths: Vec<usize>) -> Result<Self> {
        check_lengths(&lengths, frame.dimension())?;
        let length: usize = lengths.iter().product();
        ensure!(
            samples.ncols() == length,
            DimensionMismatch,
            "{} samples given for grid lengths {:?}",
            samples.ncols(),
            lengths
        );
        if lengths.len() == frame.dimension() {
            check_orientation(&samples, &lengths)?;
        }
        let (low, hi) = sample_extents(&frame, &samples)?;
        Ok(Self {
            frame,
            samples,
            lengths,
            low,
            hi,
        })
    }

    /// Creates the most specific gridded set for the given samples: a
    /// `Gridded1DSet` when both domain and manifold are one-dimensional,
    /// otherwise a general `GriddedSet`.
    pub fn create(frame: SetFrame, samples: Array2<F>, lengths: Vec<usize>) -> Result<AnySet<F>> {
        if frame.dimension() == 1 && lengths.len() == 1 {
            ensure!(
                samples.ncols() == lengths[0],
                DimensionMismatch,
                "{} samples given for grid length {}",
                samples.ncols(),
                lengths[0]
            );
            Ok(Gridded1DSet::new(frame, samples)?.into())
        } else {
            Ok(Self::new(frame, samples, lengths)?.into())
        }
    }

    fn strides(&self) -> Vec<usize> {
        grid_strides(&self.lengths)
    }

    /// Interpolates the samples multilinearly inside the given cell.
    fn cell_value(&self, cell: &[usize], t: &[f64], value: &mut [f64]) {
        let strides = self.strides();
        let active: Vec<usize> = (0..self.lengths.len())
            .filter(|&axis| self.lengths[axis] > 1)
            .collect();
        let base: usize = cell.iter().zip(&strides).map(|(i, s)| i * s).sum();
        value.iter_mut().for_each(|v| *v = 0.0);
        for corner in 0..(1usize << active.len()) {
            let mut weight = 1.0;
            let mut idx = base;
            for (bit, &axis) in active.iter().enumerate() {
                if corner & (1 << bit) != 0 {
                    weight *= t[axis];
                    idx += strides[axis];
                } else {
                    weight *= 1.0 - t[axis];
                }
            }
            for (dim, v) in value.iter_mut().enumerate() {
                *v += weight * to_f64(self.samples[[dim, idx]]);
            }
        }
    }

    /// Computes the value and the Jacobian with respect to the local cell
    /// coordinates at `t` inside the given cell.
    fn cell_value_and_jacobian(&self, cell: &[usize], t: &[f64]) -> (Vec<f64>, Vec<Vec<f64>>) {
        let n = self.frame.dimension();
        let m = self.lengths.len();
        let strides = self.strides();
        let base: usize = cell.iter().zip(&strides).map(|(i, s)| i * s).sum();
        let mut value = vec![0.0; n];
        let mut jacobian = vec![vec![0.0; m]; n];
        for corner in 0..(1usize << m) {
            let mut idx = base;
            let factors: Vec<f64> = (0..m)
                .map(|axis| {
                    if corner & (1 << axis) != 0 {
                        idx += strides[axis];
                        t[axis]
                    } else {
                        1.0 - t[axis]
                    }
                })
                .collect();
            let weight: f64 = factors.iter().product();
            for dim in 0..n {
                let sample = to_f64(self.samples[[dim, idx]]);
                value[dim] += weight * sample;
                for axis in 0..m {
                    let sign = if corner & (1 << axis) != 0 { 1.0 } else { -1.0 };
                    let others: f64 = factors
                        .iter()
                        .enumerate()
                        .filter(|&(other, _)| other != axis)
                        .map(|(_, factor)| factor)
                        .product();
                    jacobian[dim][axis] += sign * others * sample;
                }
            }
        }
        (value, jacobian)
    }

    /// Solves for the local coordinates of `target` in the multilinear
    /// extension of the given cell using Newton's method.
    fn newton_in_cell(&self, cell: &[usize], target: &[f64]) -> Option<Vec<f64>> {
        let m = self.lengths.len();
        let mut t = vec![0.5; m];
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (value, jacobian) = self.cell_value_and_jacobian(cell, &t);
            let residual: Vec<f64> = target.iter().zip(&value).map(|(a, b)| a - b).collect();
            let step = solve_linear_system(jacobian, residual)?;
            let mut largest_step: f64 = 0.0;
            for (t, step) in t.iter_mut().zip(&step) {
                *t += step;
                largest_step = largest_step.max(step.abs());
            }
            if !largest_step.is_finite() {
                return None;
            }
            if largest_step < NEWTON_TOLERANCE {
                return Some(t);
            }
        }
        None
    }

    /// Inverts the grid at a single value by walking between cells, starting
    /// from the given cell.
    ///
    /// The walk stays in a cell once the local coordinates are within
    /// `CELL_EDGE_TOLERANCE` of it, and never steps straight back to the
    /// neighboring cell it just came from.
    fn invert_point(&self, target: &[f64], cell: &mut Vec<usize>) -> Option<Vec<f64>> {
        let m = self.lengths.len();
        let mut last_move = vec![0isize; m];
        for _ in 0..MAX_CELL_WALK_STEPS {
            let t = self.newton_in_cell(cell, target)?;
            let mut next = cell.clone();
            for axis in 0..m {
                let outside = t[axis] < -CELL_EDGE_TOLERANCE || t[axis] > 1.0 + CELL_EDGE_TOLERANCE;
                let mut shift = if outside {
                    t[axis].floor().max(-(cell[axis] as f64)) as isize
                } else {
                    0
                };
                if last_move[axis].abs() == 1 && shift.signum() == -last_move[axis] {
                    shift = 0;
                }
                let moved = (cell[axis] as isize + shift).clamp(0, self.lengths[axis] as isize - 2);
                next[axis] = moved as usize;
            }
            if next == *cell {
                let grid: Vec<f64> = (0..m).map(|axis| cell[axis] as f64 + t[axis]).collect();
                let inside = grid.iter().zip(&self.lengths).all(|(&g, &length)| {
                    g >= -GRID_EDGE && g <= length as f64 - 1.0 + GRID_EDGE
                });
                return if inside { Some(grid) } else { None };
            }
            for axis in 0..m {
                if next[axis] != cell[axis] {
                    last_move[axis] = next[axis] as isize - cell[axis] as isize;
                }
            }
            *cell = next;
        }
        None
    }
}

impl<F: BFloat> SampledSet<F> for GriddedSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        self.lengths.len()
    }

    fn len(&self) -> usize {
        self.samples.ncols()
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

impl<F: BFloat> GriddedGeometry<F> for GriddedSet<F> {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_grid(&grid)?;
        let n = self.frame.dimension();
        let mut values = Array2::from_elem((n, grid.ncols()), F::nan());
        Zip::from(values.axis_iter_mut(Axis(1)))
            .and(grid.axis_iter(Axis(1)))
            .par_for_each(|mut value, point| {
                let mut cell = vec![0; self.lengths.len()];
                let mut t = vec![0.0; self.lengths.len()];
                for (axis, &g) in point.iter().enumerate() {
                    let length = self.lengths[axis];
                    let g = to_f64(g);
                    if !(g >= -GRID_EDGE && g <= length as f64 - 1.0 + GRID_EDGE) {
                        return;
                    }
                    if length > 1 {
                        let lower = g.floor().clamp(0.0, (length - 2) as f64);
                        cell[axis] = lower as usize;
                        t[axis] = g - lower;
                    }
                }
                let mut result = vec![0.0; n];
                self.cell_value(&cell, &t, &mut result);
                value
                    .iter_mut()
                    .zip(result)
                    .for_each(|(v, r)| *v = from_f64(r));
            });
        Ok(values)
    }

    fn value_to_grid(&self, values: ArrayView2<F>) -> Result<Array2<F>> {
        self.check_values(&values)?;
        let m = self.lengths.len();
        if m < self.frame.dimension() {
            fail!(
                Unimplemented,
                "value to grid conversion for a {}-dimensional manifold in {}-dimensional space",
                m,
                self.frame.dimension()
            );
        }
        ensure!(
            self.lengths.iter().all(|&length| length >= 2),
            InvalidGrid,
            "value to grid conversion requires at least 2 samples along each axis, lengths are {:?}",
            self.lengths
        );
        let center: Vec<usize> = self.lengths.iter().map(|&length| (length - 2) / 2).collect();
        let mut cell = center.clone();
        let mut grid = Array2::from_elem((m, values.ncols()), F::nan());
        let mut outside = 0;
        for (mut grid_point, point) in grid.axis_iter_mut(Axis(1)).zip(values.axis_iter(Axis(1))) {
            let target: Vec<f64> = point.iter().map(|&v| to_f64(v)).collect();
            if target.iter().any(|v| v.is_nan()) {
                continue;
            }
            match self.invert_point(&target, &mut cell) {
                Some(coordinates) => grid_point
                    .iter_mut()
                    .zip(coordinates)
                    .for_each(|(g, c)| *g = from_f64(c)),
                None => {
                    outside += 1;
                    cell.clone_from(&center);
                }
            }
        }
        if outside > 0 {
            log::trace!("{} of {} values lie outside the grid", outside, values.ncols());
        }
        Ok(grid)
    }
}

impl<F: BFloat> PartialEq for GriddedSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.lengths == other.lengths && self.frame == other.frame && self.samples == other.samples
    }
}

/// Verifies grid lengths against the domain dimension.
pub(crate) fn check_lengths(lengths: &[usize], domain_dimension: usize) -> Result<()> {
    ensure!(
        !lengths.is_empty(),
        InvalidGrid,
        "grid must have at least one axis"
    );
    ensure!(
        lengths.len() <= domain_dimension,
        InvalidGrid,
        "manifold dimension {} exceeds domain dimension {}",
        lengths.len(),
        domain_dimension
    );
    ensure!(
        lengths.iter().all(|&length| length >= 1),
        InvalidGrid,
        "each grid length must be at least 1, got {:?}",
        lengths
    );
    Ok(())
}

/// Verifies that every corner of every cell of a 2D or 3D grid filling its
/// domain has the same orientation as the first one.
///
/// Grids with an axis of length 1 are not checked.
fn check_orientation<F: BFloat>(samples: &Array2<F>, lengths: &[usize]) -> Result<()> {
    let m = lengths.len();
    if !(2..=3).contains(&m) || samples.nrows() != m || lengths.iter().any(|&length| length < 2) {
        return Ok(());
    }
    let strides = grid_strides(lengths);
    let cells: Vec<usize> = lengths.iter().map(|&length| length - 1).collect();
    let num_cells: usize = cells.iter().product();
    let mut orientation = None;
    for cell_index in 0..num_cells {
        let cell = split_index(&cells, cell_index);
        let base: usize = cell.iter().zip(&strides).map(|(i, s)| i * s).sum();
        for corner in 0..(1usize << m) {
            let idx = (0..m)
                .filter(|&axis| corner & (1 << axis) != 0)
                .fold(base, |idx, axis| idx + strides[axis]);
            let mut sign = 1.0;
            let edges: Vec<Vec<f64>> = (0..m)
                .map(|axis| {
                    let other = if corner & (1 << axis) != 0 {
                        sign = -sign;
                        idx - strides[axis]
                    } else {
                        idx + strides[axis]
                    };
                    (0..m)
                        .map(|dim| to_f64(samples[[dim, other]]) - to_f64(samples[[dim, idx]]))
                        .collect()
                })
                .collect();
            let positive = sign * determinant(&edges) > 0.0;
            match orientation {
                None => orientation = Some(positive),
                Some(first) => ensure!(
                    first == positive,
                    InvalidGrid,
                    "samples do not form a valid grid at cell {:?}",
                    cell
                ),
            }
        }
    }
    Ok(())
}

/// Determinant of a 2x2 or 3x3 matrix given as rows.
fn determinant(rows: &[Vec<f64>]) -> f64 {
    match rows.len() {
        2 => rows[0][0] * rows[1][1] - rows[0][1] * rows[1][0],
        _ => {
            rows[0][0] * (rows[1][1] * rows[2][2] - rows[1][2] * rows[2][1])
                - rows[0][1] * (rows[1][0] * rows[2][2] - rows[1][2] * rows[2][0])
                + rows[0][2] * (rows[1][0] * rows[2][1] - rows[1][1] * rows[2][0])
        }
    }
}

/// Returns the linear index offset of a unit step along each axis.
pub fn grid_strides(lengths: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(lengths.len());
    let mut stride = 1;
    for &length in lengths {
        strides.push(stride);
        stride *= length;
    }
    strides
}

/// Splits a linear index into per-axis indices, first axis fastest.
pub fn split_index(lengths: &[usize], mut index: usize) -> Vec<usize> {
    lengths
        .iter()
        .map(|&length| {
            let idx = index % length;
            index /= length;
            idx
        })
        .collect()
}

/// Rounds a grid coordinate to the nearest index along an axis of the
/// given length, with halfway values going to the higher index.
pub fn grid_coordinate_to_index<F: BFloat>(coordinate: F, length: usize) -> Option<usize> {
    let coordinate = to_f64(coordinate);
    if !(coordinate >= -GRID_EDGE && coordinate <= length as f64 - 1.0 + GRID_EDGE) {
        return None;
    }
    let idx = (coordinate + 0.5).floor().max(0.0) as usize;
    Some(idx.min(length - 1))
}

/// Computes the linear index closest to each point of grid coordinates.
pub fn grid_to_index<F: BFloat>(lengths: &[usize], grid: ArrayView2<F>) -> Vec<Option<usize>> {
    grid.axis_iter(Axis(1))
        .map(|point| {
            let mut index = 0;
            for axis in (0..lengths.len()).rev() {
                let idx = grid_coordinate_to_index(point[axis], lengths[axis])?;
                index = idx + lengths[axis] * index;
            }
            Some(index)
        })
        .collect()
}

/// Computes the grid corners and multilinear weights surrounding each
/// point of grid coordinates.
///
/// An axis is not split when the coordinate lies on a grid line or beyond
/// the outermost grid point, so a point gives up to `2^M` corners.
pub fn grid_to_interp<F: BFloat>(
    lengths: &[usize],
    grid: ArrayView2<F>,
) -> Vec<Option<Interpolant<F>>> {
    let strides = grid_strides(lengths);
    let points: Vec<_> = grid.axis_iter(Axis(1)).collect();
    points
        .into_par_iter()
        .map(|point| {
            let mut base = 0;
            let mut splits = Vec::with_capacity(lengths.len());
            for (axis, &length) in lengths.iter().enumerate() {
                let g = to_f64(point[axis]);
                if !(g >= -GRID_EDGE && g <= length as f64 - 1.0 + GRID_EDGE) {
                    return None;
                }
                let l = ((g + 0.5).floor().max(0.0) as usize).min(length - 1);
                let c = g - l as f64;
                base += l * strides[axis];
                let one_sided = (l == 0 && c <= 0.0) || (l == length - 1 && c >= 0.0);
                if !one_sided && c != 0.0 {
                    splits.push((strides[axis], c));
                }
            }
            let mut indices = vec![base];
            let mut weights = vec![1.0];
            for (stride, c) in splits {
                let (a, b) = if c >= 0.0 { (1.0 - c, c) } else { (1.0 + c, -c) };
                let count = indices.len();
                for k in 0..count {
                    let shifted = if c >= 0.0 {
                        indices[k] + stride
                    } else {
                        indices[k] - stride
                    };
                    indices.push(shifted);
                    weights.push(weights[k] * b);
                    weights[k] *= a;
                }
            }
            Some(Interpolant {
                indices,
                weights: weights.into_iter().map(from_f64).collect(),
            })
        })
        .collect()
}

/// Returns, for each linear index, the indices one step away along each axis.
pub fn grid_neighbors(lengths: &[usize]) -> Vec<Vec<usize>> {
    let strides = grid_strides(lengths);
    let length: usize = lengths.iter().product();
    (0..length)
        .into_par_iter()
        .map(|index| {
            let position = split_index(lengths, index);
            let mut neighbors = Vec::with_capacity(2 * lengths.len());
            for (axis, &idx) in position.iter().enumerate() {
                if idx > 0 {
                    neighbors.push(index - strides[axis]);
                }
                if idx + 1 < lengths[axis] {
                    neighbors.push(index + strides[axis]);
                }
            }
            neighbors
        })
        .collect()
}

/// Returns the linear indices of a grid in zig-zag order, reversing the
/// traversal direction of each axis for every step along the next axis.
pub fn wedge(lengths: &[usize]) -> Vec<usize> {
    let total: usize = lengths.iter().product();
    let mut wedge = Vec::with_capacity(total);
    wedge.extend(0..lengths[0]);
    let mut len = lengths[0];
    for &length in &lengths[1..] {
        let mut base = len;
        let mut flip = true;
        for _ in 1..length {
            for i in 0..len {
                let source = if flip { len - 1 - i } else { i };
                let shifted = wedge[source] + base;
                wedge.push(shifted);
            }
            base += len;
            flip = !flip;
        }
        len *= length;
    }
    wedge
}

/// Solves the square linear system `matrix * x = rhs` with Gaussian
/// elimination and partial pivoting. Returns `None` if the matrix is singular.
fn solve_linear_system(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| {
            matrix[a][col]
                .abs()
                .partial_cmp(&matrix[b][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if matrix[pivot][col].abs() < f64::MIN_POSITIVE {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let sum: f64 = ((row + 1)..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - sum) / matrix[row][row];
    }
    Some(solution)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::SetError;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    /// Grid of `(x, y)` with `x = x0 + sx*i + shear*j` and `y = y0 + sy*j + bend*i*j`.
    fn warped_grid(nx: usize, ny: usize) -> GriddedSet<f64> {
        let mut samples = Array2::zeros((2, nx * ny));
        for j in 0..ny {
            for i in 0..nx {
                let (fi, fj) = (i as f64, j as f64);
                samples[[0, i + nx * j]] = -1.0 + 0.5 * fi + 0.1 * fj;
                samples[[1, i + nx * j]] = 2.0 + 0.8 * fj + 0.05 * fi * fj;
            }
        }
        GriddedSet::new(SetFrame::generic(2), samples, vec![nx, ny]).unwrap()
    }

    /// Grid of `(x, y, z)` with each coordinate mostly following one axis.
    fn warped_grid_3d(nx: usize, ny: usize, nz: usize) -> GriddedSet<f64> {
        let mut samples = Array2::zeros((3, nx * ny * nz));
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let (fi, fj, fk) = (i as f64, j as f64, k as f64);
                    let idx = i + nx * (j + ny * k);
                    samples[[0, idx]] = fi + 0.1 * fj + 0.05 * fk;
                    samples[[1, idx]] = 0.9 * fj + 0.05 * fi * fj;
                    samples[[2, idx]] = 1.2 * fk + 0.02 * fi * fk - 0.1 * fj;
                }
            }
        }
        GriddedSet::new(SetFrame::generic(3), samples, vec![nx, ny, nz]).unwrap()
    }

    #[test]
    fn wedge_zig_zags_over_grid() {
        assert_eq!(wedge(&[3]), vec![0, 1, 2]);
        assert_eq!(wedge(&[3, 3]), vec![0, 1, 2, 5, 4, 3, 6, 7, 8]);
        let w = wedge(&[2, 2, 2]);
        assert_eq!(w, vec![0, 1, 3, 2, 6, 7, 5, 4]);
    }

    #[test]
    fn interpolation_splits_interior_axes() {
        let grid = array![[1.25, 0.0, 2.0, -0.25], [0.5, 1.0, 0.0, 0.0]];
        let interps = grid_to_interp(&[3, 2], grid.view());

        let first = interps[0].as_ref().unwrap();
        assert_eq!(first.indices, vec![4, 5, 1, 2]);
        assert_abs_diff_eq!(first.weights[0], 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(first.weights[1], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(first.weights[2], 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(first.weights[3], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(first.total_weight(), 1.0, epsilon = 1e-12);

        assert_eq!(interps[1], Some(Interpolant::single(3)));
        assert_eq!(interps[2], Some(Interpolant::single(2)));
        assert_eq!(interps[3], Some(Interpolant::single(0)));

        let outside = grid_to_interp(&[3, 2], array![[f64::NAN], [0.0]].view());
        assert_eq!(outside, vec![None]);
    }

    #[test]
    fn halfway_grid_coordinates_round_up() {
        let grid = array![[0.5, 1.49, -0.5, 2.5, 2.6], [0.0, 0.0, 0.0, 1.0, 0.0]];
        assert_eq!(
            grid_to_index(&[3, 2], grid.view()),
            vec![Some(1), Some(1), Some(0), Some(5), None]
        );
    }

    #[test]
    fn neighbors_step_along_each_axis() {
        let neighbors = grid_neighbors(&[3, 2]);
        assert_eq!(neighbors[0], vec![1, 3]);
        assert_eq!(neighbors[1], vec![0, 2, 4]);
        assert_eq!(neighbors[5], vec![4, 2]);
    }

    #[test]
    fn warped_grid_round_trips() {
        let set = warped_grid(6, 5);
        let grid = array![[0.0, 2.5, 4.75, -0.4, 5.3, 3.0], [0.0, 1.5, 3.2, 2.0, 4.4, 4.0]];
        let values = set.grid_to_value(grid.view()).unwrap();
        let recovered = set.value_to_grid(values.view()).unwrap();
        for (g, r) in grid.iter().zip(recovered.iter()) {
            assert_abs_diff_eq!(*g, *r, epsilon = 1e-6);
        }
    }

    #[test]
    fn grid_points_map_to_samples() {
        let set = warped_grid(4, 3);
        let values = set.grid_to_value(array![[2.0], [1.0]].view()).unwrap();
        assert_abs_diff_eq!(values[[0, 0]], set.samples[[0, 6]], epsilon = 1e-12);
        assert_abs_diff_eq!(values[[1, 0]], set.samples[[1, 6]], epsilon = 1e-12);
        assert_eq!(set.value_to_index(values.view()).unwrap(), vec![Some(6)]);
        let outside = set.grid_to_value(array![[-0.6], [0.0]].view()).unwrap();
        assert!(outside[[0, 0]].is_nan());
    }

    #[test]
    fn every_sample_node_inverts_to_its_index() {
        for set in [warped_grid(6, 5), warped_grid_3d(4, 3, 3)] {
            let samples = set.samples().into_owned();
            let expected: Vec<_> = (0..set.len()).map(Some).collect();
            assert_eq!(set.value_to_index(samples.view()).unwrap(), expected);

            let grid = set.value_to_grid(samples.view()).unwrap();
            for (index, point) in grid.axis_iter(Axis(1)).enumerate() {
                for (g, position) in point.iter().zip(split_index(&set.lengths, index)) {
                    assert_abs_diff_eq!(*g, position as f64, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn values_on_cell_faces_round_trip() {
        let set = warped_grid(6, 5);
        let grid = array![[2.0, 3.5, 1.0, 4.0], [1.5, 2.0, 3.0, 0.25]];
        let values = set.grid_to_value(grid.view()).unwrap();
        let recovered = set.value_to_grid(values.view()).unwrap();
        for (g, r) in grid.iter().zip(recovered.iter()) {
            assert_abs_diff_eq!(*g, *r, epsilon = 1e-6);
        }
    }

    #[test]
    fn folded_grids_are_rejected() {
        let bow_tie = array![[0.0, 1.0, 1.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        let err = GriddedSet::new(SetFrame::generic(2), bow_tie, vec![2, 2]).unwrap_err();
        assert!(matches!(err, SetError::InvalidGrid(_)));

        let mut cube = Array2::zeros((3, 8));
        for idx in 0..8 {
            for dim in 0..3 {
                cube[[dim, idx]] = ((idx >> dim) & 1) as f64;
            }
        }
        assert!(GriddedSet::new(SetFrame::generic(3), cube.clone(), vec![2, 2, 2]).is_ok());
        cube[[0, 6]] = 1.0;
        cube[[0, 7]] = 0.0;
        let err = GriddedSet::new(SetFrame::generic(3), cube, vec![2, 2, 2]).unwrap_err();
        assert!(matches!(err, SetError::InvalidGrid(_)));

        let curve = array![[0.0, 1.0, 0.5], [0.0, 1.0, 0.0]];
        assert!(GriddedSet::new(SetFrame::generic(2), curve, vec![3]).is_ok());
    }

    #[test]
    fn far_values_are_outside() {
        let set = warped_grid(4, 3);
        let grid = set
            .value_to_grid(array![[100.0, f64::NAN], [2.5, 2.5]].view())
            .unwrap();
        assert!(grid.iter().all(|g| g.is_nan()));
        assert_eq!(
            set.value_to_interp(array![[100.0], [2.5]].view()).unwrap(),
            vec![None]
        );
    }

    #[test]
    fn embedded_manifold_cannot_be_inverted() {
        let samples = array![[0.0, 1.0, 2.0], [0.0, 1.0, 4.0]];
        let curve = GriddedSet::new(SetFrame::generic(2), samples, vec![3]).unwrap();
        let midpoint = curve.grid_to_value(array![[1.5]].view()).unwrap();
        assert_eq!(midpoint, array![[1.5], [2.5]]);
        let err = curve.value_to_grid(midpoint.view()).unwrap_err();
        assert!(matches!(err, SetError::Unimplemented(_)));
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        let samples = Array2::<f64>::zeros((2, 6));
        let err = GriddedSet::new(SetFrame::generic(2), samples.clone(), vec![3, 0]).unwrap_err();
        assert!(matches!(err, SetError::InvalidGrid(_)));
        let err = GriddedSet::new(SetFrame::generic(2), samples.clone(), vec![3, 3]).unwrap_err();
        assert!(matches!(err, SetError::DimensionMismatch(_)));
        let err = GriddedSet::new(SetFrame::generic(2), samples, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, SetError::InvalidGrid(_)));
    }

    #[test]
    fn factory_picks_one_dimensional_set() {
        let set: AnySet<f64> =
            GriddedSet::create(SetFrame::generic(1), array![[0.0, 1.0, 3.0]], vec![3]).unwrap();
        assert!(matches!(set, AnySet::Gridded1D(_)));
        let set: AnySet<f64> =
            GriddedSet::create(SetFrame::generic(2), Array2::zeros((2, 4)), vec![2, 2]).unwrap();
        assert!(matches!(set, AnySet::Gridded(_)));
    }
}
