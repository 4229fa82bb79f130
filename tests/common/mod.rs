#![allow(dead_code)]

use gridset::{set::gridded::GriddedSet, AnySet, Interpolant, SampledSet, SetFrame};
use ndarray::{Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const SEED: u64 = 0x5eed;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

/// Returns strictly increasing values with random spacing in `[0.5, 1.5)`.
pub fn random_monotonic_values(rng: &mut StdRng, length: usize) -> Vec<f64> {
    let mut value = rng.gen_range(-10.0..10.0);
    (0..length)
        .map(|_| {
            value += rng.gen_range(0.5..1.5);
            value
        })
        .collect()
}

/// Returns random grid coordinates strictly inside a grid with the given lengths.
pub fn random_grid(rng: &mut StdRng, lengths: &[usize], count: usize) -> Array2<f64> {
    Array2::from_shape_fn((lengths.len(), count), |(axis, _)| {
        rng.gen_range(0.0..(lengths[axis] - 1) as f64)
    })
}

/// Creates a 2D gridded set on a smoothly sheared and stretched grid.
pub fn warped_grid(nx: usize, ny: usize) -> AnySet<f64> {
    let samples = Array2::from_shape_fn((2, nx * ny), |(dim, index)| {
        let (i, j) = ((index % nx) as f64, (index / nx) as f64);
        if dim == 0 {
            i + 0.2 * j + 0.01 * i * i
        } else {
            0.8 * j + 0.1 * i + 0.02 * j * j
        }
    });
    GriddedSet::create(SetFrame::generic(2), samples, vec![nx, ny]).unwrap()
}

/// Evaluates the weighted sum of the set samples for each interpolant.
pub fn interpolate(set: &dyn SampledSet<f64>, interps: &[Option<Interpolant<f64>>]) -> Array2<f64> {
    let samples = set.samples();
    let mut values = Array2::from_elem((set.domain_dimension(), interps.len()), f64::NAN);
    for (mut column, interp) in values.axis_iter_mut(Axis(1)).zip(interps) {
        if let Some(interp) = interp {
            for (dim, value) in column.iter_mut().enumerate() {
                *value = interp
                    .indices
                    .iter()
                    .zip(&interp.weights)
                    .map(|(&idx, &weight)| weight * samples[[dim, idx]])
                    .sum();
            }
        }
    }
    values
}

pub fn assert_arrays_close(actual: ArrayView2<f64>, expected: ArrayView2<f64>, epsilon: f64) {
    assert_eq!(actual.shape(), expected.shape());
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (a - e).abs() <= epsilon,
            "{} differs from {} by more than {}",
            a,
            e,
            epsilon
        );
    }
}
