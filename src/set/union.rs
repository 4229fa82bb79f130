//! Unions of sampled sets with matching dimensions.

use super::{product, AnySet, Interpolant, SampledSet, SetFrame};
use crate::{
    ensure,
    error::Result,
    num::{to_f64, BFloat},
};
use ndarray::{Array2, ArrayView2, Axis};
use std::{borrow::Cow, sync::Arc};

/// Set whose samples are the samples of its constituent sets, one
/// constituent after the other.
#[derive(Clone, Debug)]
pub struct UnionSet<F: BFloat> {
    sets: Vec<AnySet<F>>,
    offsets: Vec<usize>,
    length: usize,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> UnionSet<F> {
    /// Creates a new union of at least two sets.
    ///
    /// All sets must have the same domain and manifold dimension. The union
    /// lives in the domain of the first set.
    pub fn new(sets: Vec<AnySet<F>>) -> Result<Self> {
        ensure!(
            sets.len() >= 2,
            DimensionMismatch,
            "union needs at least 2 sets, got {}",
            sets.len()
        );
        let domain_dimension = sets[0].domain_dimension();
        let manifold_dimension = sets[0].manifold_dimension();
        for (i, set) in sets.iter().enumerate().skip(1) {
            ensure!(
                set.domain_dimension() == domain_dimension,
                DimensionMismatch,
                "set #{} domain dimension is {}, not {}",
                i,
                set.domain_dimension(),
                domain_dimension
            );
            ensure!(
                set.manifold_dimension() == manifold_dimension,
                DimensionMismatch,
                "set #{} manifold dimension is {}, not {}",
                i,
                set.manifold_dimension(),
                manifold_dimension
            );
        }
        let mut offsets = Vec::with_capacity(sets.len());
        let mut length = 0;
        for set in &sets {
            offsets.push(length);
            length += set.len();
        }
        let mut low = sets[0].low().to_vec();
        let mut hi = sets[0].hi().to_vec();
        for set in &sets[1..] {
            for (l, &set_low) in low.iter_mut().zip(set.low()) {
                *l = l.min(set_low);
            }
            for (h, &set_hi) in hi.iter_mut().zip(set.hi()) {
                *h = h.max(set_hi);
            }
        }
        Ok(Self {
            sets,
            offsets,
            length,
            low,
            hi,
        })
    }

    pub fn sets(&self) -> &[AnySet<F>] {
        &self.sets
    }

    /// Returns this union in normal form, a union of products of simple sets.
    pub fn product(&self) -> Result<AnySet<F>> {
        product::normalize_union(&self.sets)
    }

    /// Returns the normal form of the product of this union with `set`.
    pub fn product_with(&self, set: &AnySet<F>) -> Result<AnySet<F>> {
        product::normalize(&[AnySet::Union(Arc::new(self.clone())), set.clone()])
    }

    /// Returns the normal form of the product of `set` with this union.
    pub fn inverse_product(&self, set: &AnySet<F>) -> Result<AnySet<F>> {
        product::normalize(&[set.clone(), AnySet::Union(Arc::new(self.clone()))])
    }

    /// Finds the constituent holding the given linear index, together with
    /// the index within that constituent.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.length {
            return None;
        }
        let set = self.offsets.partition_point(|&offset| offset <= index) - 1;
        Some((set, index - self.offsets[set]))
    }

    /// Finds, for each value, the constituent whose closest sample is nearest
    /// to the value, along with the index of that sample in the constituent.
    fn closest(&self, values: ArrayView2<F>) -> Result<Vec<Option<(usize, usize)>>> {
        self.check_values(&values)?;
        let mut closest: Vec<Option<(usize, usize, f64)>> = vec![None; values.ncols()];
        for (i, set) in self.sets.iter().enumerate() {
            let sub_indices = set.value_to_index(values)?;
            let lookup: Vec<usize> = sub_indices
                .iter()
                .map(|sub| sub.unwrap_or(usize::MAX))
                .collect();
            let sub_values = set.index_to_value(&lookup)?;
            for (((best, sub_index), sub_value), value) in closest
                .iter_mut()
                .zip(&sub_indices)
                .zip(sub_values.axis_iter(Axis(1)))
                .zip(values.axis_iter(Axis(1)))
            {
                let Some(sub_index) = *sub_index else {
                    continue;
                };
                let distance: f64 = sub_value
                    .iter()
                    .zip(value.iter())
                    .map(|(&s, &v)| {
                        let d = to_f64(s) - to_f64(v);
                        d * d
                    })
                    .sum();
                if best.map_or(true, |(_, _, best_distance)| distance < best_distance) {
                    *best = Some((i, sub_index, distance));
                }
            }
        }
        Ok(closest
            .into_iter()
            .map(|best| best.map(|(set, sub_index, _)| (set, sub_index)))
            .collect())
    }
}

impl<F: BFloat> SampledSet<F> for UnionSet<F> {
    fn frame(&self) -> &SetFrame {
        self.sets[0].frame()
    }

    fn manifold_dimension(&self) -> usize {
        self.sets[0].manifold_dimension()
    }

    fn len(&self) -> usize {
        self.length
    }

    fn low(&self) -> &[F] {
        &self.low
    }

    fn hi(&self) -> &[F] {
        &self.hi
    }

    fn samples(&self) -> Cow<'_, Array2<F>> {
        let mut samples = Array2::zeros((self.domain_dimension(), self.length));
        for (set, &offset) in self.sets.iter().zip(&self.offsets) {
            let set_samples = set.samples();
            samples
                .slice_mut(ndarray::s![.., offset..offset + set.len()])
                .assign(&*set_samples);
        }
        Cow::Owned(samples)
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        let located: Vec<_> = indices.iter().map(|&idx| self.locate(idx)).collect();
        let mut values = Array2::from_elem((self.domain_dimension(), indices.len()), F::nan());
        for (i, set) in self.sets.iter().enumerate() {
            let (positions, sub_indices): (Vec<usize>, Vec<usize>) = located
                .iter()
                .enumerate()
                .filter_map(|(position, location)| match location {
                    Some((owner, sub_index)) if *owner == i => Some((position, *sub_index)),
                    _ => None,
                })
                .unzip();
            if positions.is_empty() {
                continue;
            }
            let sub_values = set.index_to_value(&sub_indices)?;
            for (position, sub_value) in positions.into_iter().zip(sub_values.axis_iter(Axis(1))) {
                values.column_mut(position).assign(&sub_value);
            }
        }
        Ok(values)
    }

    /// Picks the closest sample over all constituent sets.
    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        Ok(self
            .closest(values)?
            .into_iter()
            .map(|best| best.map(|(set, sub_index)| self.offsets[set] + sub_index))
            .collect())
    }

    /// Interpolates within the constituent set holding the closest sample.
    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        let closest = self.closest(values)?;
        let mut interps = vec![None; values.ncols()];
        for (i, set) in self.sets.iter().enumerate() {
            if !closest.iter().any(|best| matches!(best, Some((chosen, _)) if *chosen == i)) {
                continue;
            }
            let sub_interps = set.value_to_interp(values)?;
            for ((interp, best), sub_interp) in interps.iter_mut().zip(&closest).zip(sub_interps) {
                if matches!(best, Some((chosen, _)) if *chosen == i) {
                    *interp = sub_interp.map(|sub_interp| sub_interp.offset(self.offsets[i]));
                }
            }
        }
        Ok(interps)
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        let mut neighbors = Vec::with_capacity(self.length);
        for (set, &offset) in self.sets.iter().zip(&self.offsets) {
            neighbors.extend(set.neighbors()?.into_iter().map(|set_neighbors| {
                set_neighbors
                    .into_iter()
                    .map(|neighbor| neighbor + offset)
                    .collect::<Vec<_>>()
            }));
        }
        Ok(neighbors)
    }
}

impl<F: BFloat> PartialEq for UnionSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.sets == other.sets
    }
}
