//! Sets of unordered samples, located through sorting or triangulation.

use super::{
    delaunay::{DelaunatorTriangulator, Delaunay, Triangulator},
    gather_samples,
    gridded_1d::Gridded1DSet,
    sample_extents, Interpolant, SampledSet, SetFrame,
};
use crate::{
    ensure,
    error::Result,
    num::{from_f64, to_f64, BFloat, OrderableIndexValuePair},
};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::{borrow::Cow, sync::Arc};

/// One-dimensional set of unordered samples.
///
/// Queries go through a gridded set of the sorted samples and a permutation
/// back to the original sample order.
#[derive(Clone, Debug)]
pub struct Irregular1DSet<F: BFloat> {
    frame: SetFrame,
    samples: Array2<F>,
    sorted: Gridded1DSet<F>,
    old_to_new: Vec<usize>,
    new_to_old: Vec<usize>,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> Irregular1DSet<F> {
    /// Creates a new one-dimensional irregular set.
    ///
    /// Samples must be finite and distinct.
    pub fn new(frame: SetFrame, samples: Array2<F>) -> Result<Self> {
        ensure!(
            frame.dimension() == 1,
            DimensionMismatch,
            "domain dimension must be 1, not {}",
            frame.dimension()
        );
        let (low, hi) = sample_extents(&frame, &samples)?;
        let mut pairs: Vec<_> = samples
            .row(0)
            .iter()
            .enumerate()
            .map(|(idx, &value)| OrderableIndexValuePair(idx, value))
            .collect();
        pairs.sort();
        let new_to_old: Vec<usize> = pairs.iter().map(|pair| pair.0).collect();
        let mut old_to_new = vec![0; new_to_old.len()];
        for (new, &old) in new_to_old.iter().enumerate() {
            old_to_new[old] = new;
        }
        let sorted_values: Vec<F> = pairs.iter().map(|pair| pair.1).collect();
        let sorted = Gridded1DSet::new(
            frame.clone(),
            Array1::from(sorted_values).insert_axis(Axis(0)),
        )?;
        Ok(Self {
            frame,
            samples,
            sorted,
            old_to_new,
            new_to_old,
            low,
            hi,
        })
    }

    /// Returns, for each original sample index, its position in sorted order.
    pub fn old_to_new(&self) -> &[usize] {
        &self.old_to_new
    }

    /// Returns, for each position in sorted order, the original sample index.
    pub fn new_to_old(&self) -> &[usize] {
        &self.new_to_old
    }
}

impl<F: BFloat> SampledSet<F> for Irregular1DSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        1
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
        Ok(self
            .sorted
            .value_to_index(values)?
            .into_iter()
            .map(|idx| idx.map(|new| self.new_to_old[new]))
            .collect())
    }

    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        Ok(self
            .sorted
            .value_to_interp(values)?
            .into_iter()
            .map(|interp| {
                interp.map(|mut interp| {
                    interp
                        .indices
                        .iter_mut()
                        .for_each(|idx| *idx = self.new_to_old[*idx]);
                    interp
                })
            })
            .collect())
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        let length = self.len();
        Ok((0..length)
            .map(|old| {
                let new = self.old_to_new[old];
                let mut neighbors = Vec::with_capacity(2);
                if new > 0 {
                    neighbors.push(self.new_to_old[new - 1]);
                }
                if new + 1 < length {
                    neighbors.push(self.new_to_old[new + 1]);
                }
                neighbors
            })
            .collect())
    }
}

impl<F: BFloat> PartialEq for Irregular1DSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.samples == other.samples
    }
}

/// Two-dimensional set of unordered samples with a triangulation.
#[derive(Clone, Debug)]
pub struct Irregular2DSet<F: BFloat> {
    frame: SetFrame,
    samples: Array2<F>,
    delaunay: Arc<Delaunay>,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> Irregular2DSet<F> {
    /// Creates a new set, triangulating the samples with `delaunator`.
    pub fn new(frame: SetFrame, samples: Array2<F>) -> Result<Self> {
        Self::with_triangulator(frame, samples, &DelaunatorTriangulator)
    }

    /// Creates a new set, triangulating the samples with the given triangulator.
    pub fn with_triangulator(
        frame: SetFrame,
        samples: Array2<F>,
        triangulator: &dyn Triangulator,
    ) -> Result<Self> {
        let (low, hi) = Self::check_samples(&frame, &samples)?;
        let points: Vec<[f64; 2]> = samples
            .axis_iter(Axis(1))
            .map(|point| [to_f64(point[0]), to_f64(point[1])])
            .collect();
        let delaunay = Arc::new(Delaunay::triangulate(&points, triangulator)?);
        Ok(Self {
            frame,
            samples,
            delaunay,
            low,
            hi,
        })
    }

    /// Creates a new set using an existing triangulation of the samples.
    ///
    /// # Parameters
    ///
    /// - `frame`: Two-dimensional domain type, coordinate system and units.
    /// - `samples`: Sample values with shape `(2, number of samples)`.
    /// - `delaunay`: Triangulation covering exactly as many points as there are samples.
    pub fn with_delaunay(
        frame: SetFrame,
        samples: Array2<F>,
        delaunay: Arc<Delaunay>,
    ) -> Result<Self> {
        let (low, hi) = Self::check_samples(&frame, &samples)?;
        ensure!(
            delaunay.num_points() == samples.ncols(),
            DimensionMismatch,
            "triangulation covers {} points, set has {} samples",
            delaunay.num_points(),
            samples.ncols()
        );
        ensure!(
            delaunay.num_triangles() > 0,
            InvalidGrid,
            "triangulation has no triangles"
        );
        Ok(Self {
            frame,
            samples,
            delaunay,
            low,
            hi,
        })
    }

    /// Creates a new set with the same triangulation as another set of the
    /// same length.
    pub fn sharing_triangulation(
        frame: SetFrame,
        samples: Array2<F>,
        other: &Irregular2DSet<F>,
    ) -> Result<Self> {
        Self::with_delaunay(frame, samples, Arc::clone(&other.delaunay))
    }

    fn check_samples(frame: &SetFrame, samples: &Array2<F>) -> Result<(Vec<F>, Vec<F>)> {
        ensure!(
            frame.dimension() == 2,
            DimensionMismatch,
            "domain dimension must be 2, not {}",
            frame.dimension()
        );
        let extents = sample_extents(frame, samples)?;
        ensure!(
            samples.ncols() >= 3,
            InvalidGrid,
            "set needs at least 3 samples, got {}",
            samples.ncols()
        );
        Ok(extents)
    }

    pub fn delaunay(&self) -> &Delaunay {
        &self.delaunay
    }

    fn point(&self, idx: usize) -> (f64, f64) {
        (
            to_f64(self.samples[[0, idx]]),
            to_f64(self.samples[[1, idx]]),
        )
    }

    /// Locates the triangle containing each value by walking across
    /// triangle edges.
    ///
    /// The walk starts from the triangle found for the previous value. It
    /// stops when the value is inside all three edges of a triangle, when it
    /// would cross an edge of the convex hull, or after visiting as many
    /// triangles as there are in the triangulation.
    pub fn value_to_tri(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        self.check_values(&values)?;
        let tri = self.delaunay.triangles();
        let walk = self.delaunay.walk();
        let num_triangles = tri.len();
        let mut current = 0;
        let mut exhausted = 0;
        let located = values
            .axis_iter(Axis(1))
            .map(|value| {
                let (px, py) = (to_f64(value[0]), to_f64(value[1]));
                if px.is_nan() || py.is_nan() {
                    return None;
                }
                let mut flip = false;
                for _ in 0..=num_triangles {
                    let [a, b, c] = tri[current];
                    let vertices = [self.point(a), self.point(b), self.point(c)];
                    let mut outside = [false; 3];
                    for edge in 0..3 {
                        let (ax, ay) = vertices[edge];
                        let (bx, by) = vertices[(edge + 1) % 3];
                        let (cx, cy) = vertices[(edge + 2) % 3];
                        let point_side = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
                        let vertex_side = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
                        outside[edge] = point_side != 0.0 && (point_side > 0.0) != (vertex_side > 0.0);
                    }
                    let crossings: Vec<usize> = (0..3).filter(|&edge| outside[edge]).collect();
                    let edge = match crossings.len() {
                        0 => return Some(current),
                        1 => crossings[0],
                        _ => {
                            flip = !flip;
                            if flip {
                                crossings[0]
                            } else {
                                crossings[1]
                            }
                        }
                    };
                    match walk[current][edge] {
                        Some(next) => current = next,
                        None => return None,
                    }
                }
                exhausted += 1;
                current = 0;
                None
            })
            .collect();
        if exhausted > 0 {
            log::warn!(
                "Triangle walk exhausted its step bound for {} of {} values",
                exhausted,
                values.ncols()
            );
        }
        Ok(located)
    }

    /// Computes the barycentric weights of a point inside a triangle.
    fn barycentric(&self, triangle: [usize; 3], x: f64, y: f64) -> [f64; 3] {
        let (x0, y0) = self.point(triangle[0]);
        let (x1, y1) = self.point(triangle[1]);
        let (x2, y2) = self.point(triangle[2]);
        let (c0x, c0y) = (y2 - y1, x1 - x2);
        let (c1x, c1y) = (y2 - y0, x0 - x2);
        let (c2x, c2y) = (y1 - y0, x0 - x1);
        [
            ((x - x1) * c0x + (y - y1) * c0y) / ((x0 - x1) * c0x + (y0 - y1) * c0y),
            ((x - x0) * c1x + (y - y0) * c1y) / ((x1 - x0) * c1x + (y1 - y0) * c1y),
            ((x - x0) * c2x + (y - y0) * c2y) / ((x2 - x0) * c2x + (y2 - y0) * c2y),
        ]
    }
}

impl<F: BFloat> SampledSet<F> for Irregular2DSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        2
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

    /// Picks the vertex of the containing triangle closest to each value.
    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        let triangles = self.value_to_tri(values)?;
        Ok(triangles
            .into_iter()
            .zip(values.axis_iter(Axis(1)))
            .map(|(triangle, value)| {
                let triangle = self.delaunay.triangles()[triangle?];
                let (x, y) = (to_f64(value[0]), to_f64(value[1]));
                let mut closest = triangle[0];
                let mut closest_distance = f64::INFINITY;
                for &vertex in &triangle {
                    let (vx, vy) = self.point(vertex);
                    let distance = (x - vx) * (x - vx) + (y - vy) * (y - vy);
                    if distance < closest_distance {
                        closest = vertex;
                        closest_distance = distance;
                    }
                }
                Some(closest)
            })
            .collect())
    }

    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        let triangles = self.value_to_tri(values)?;
        Ok(triangles
            .into_iter()
            .zip(values.axis_iter(Axis(1)))
            .map(|(triangle, value)| {
                let triangle = self.delaunay.triangles()[triangle?];
                let weights = self.barycentric(triangle, to_f64(value[0]), to_f64(value[1]));
                Some(Interpolant {
                    indices: triangle.to_vec(),
                    weights: weights.iter().map(|&w| from_f64(w)).collect(),
                })
            })
            .collect())
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        Ok(self.delaunay.neighbors())
    }
}

impl<F: BFloat> PartialEq for Irregular2DSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && self.samples == other.samples
            && (Arc::ptr_eq(&self.delaunay, &other.delaunay) || self.delaunay == other.delaunay)
    }
}
