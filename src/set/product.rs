//! Cartesian products of sampled sets, and the product normal form.

use super::{union::UnionSet, AnySet, Interpolant, SampledSet, SetFrame};
use crate::{ensure, error::Result, num::BFloat};
use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;
use std::{borrow::Cow, sync::Arc};

/// Set whose samples are every combination of the samples of its
/// constituent sets.
///
/// The linear index is a mixed-radix number with the first constituent
/// varying fastest.
#[derive(Clone, Debug)]
pub struct ProductSet<F: BFloat> {
    frame: SetFrame,
    sets: Vec<AnySet<F>>,
    strides: Vec<usize>,
    manifold_dimension: usize,
    length: usize,
    low: Vec<F>,
    hi: Vec<F>,
}

impl<F: BFloat> ProductSet<F> {
    /// Creates a new product of at least two sets.
    ///
    /// The domain of the product concatenates the types and units of the
    /// constituent domains, without any coordinate system.
    pub fn new(sets: Vec<AnySet<F>>) -> Result<Self> {
        ensure!(
            sets.len() >= 2,
            DimensionMismatch,
            "product needs at least 2 sets, got {}",
            sets.len()
        );
        let frame = SetFrame::concat(sets.iter().map(|set| set.frame()));
        let manifold_dimension = sets.iter().map(|set| set.manifold_dimension()).sum();
        let mut strides = Vec::with_capacity(sets.len());
        let mut length = 1;
        for set in &sets {
            strides.push(length);
            length *= set.len();
        }
        let low = sets.iter().flat_map(|set| set.low().to_vec()).collect();
        let hi = sets.iter().flat_map(|set| set.hi().to_vec()).collect();
        Ok(Self {
            frame,
            sets,
            strides,
            manifold_dimension,
            length,
            low,
            hi,
        })
    }

    pub fn sets(&self) -> &[AnySet<F>] {
        &self.sets
    }

    /// Returns this product in normal form.
    pub fn product(&self) -> Result<AnySet<F>> {
        normalize(&self.sets)
    }

    /// Returns the normal form of this product with `set` appended as the
    /// last factor.
    pub fn product_with(&self, set: &AnySet<F>) -> Result<AnySet<F>> {
        let mut factors = self.sets.clone();
        factors.push(set.clone());
        normalize(&factors)
    }

    /// Returns the normal form of this product with `set` prepended as the
    /// first factor.
    pub fn inverse_product(&self, set: &AnySet<F>) -> Result<AnySet<F>> {
        let mut factors = vec![set.clone()];
        factors.extend(self.sets.iter().cloned());
        normalize(&factors)
    }

    /// Splits a linear index into one index per constituent set.
    ///
    /// Indices outside the product give the length of each constituent.
    fn split_index(&self, index: usize) -> Vec<usize> {
        if index >= self.length {
            return self.sets.iter().map(|set| set.len()).collect();
        }
        let mut remainder = index;
        self.sets
            .iter()
            .map(|set| {
                let sub_index = remainder % set.len();
                remainder /= set.len();
                sub_index
            })
            .collect()
    }

    /// Returns the range of domain rows covered by each constituent set.
    fn row_ranges(&self) -> Vec<(usize, usize)> {
        let mut start = 0;
        self.sets
            .iter()
            .map(|set| {
                let end = start + set.domain_dimension();
                let range = (start, end);
                start = end;
                range
            })
            .collect()
    }
}

impl<F: BFloat> SampledSet<F> for ProductSet<F> {
    fn frame(&self) -> &SetFrame {
        &self.frame
    }

    fn manifold_dimension(&self) -> usize {
        self.manifold_dimension
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
        let constituent_samples: Vec<_> = self.sets.iter().map(|set| set.samples()).collect();
        let ranges = self.row_ranges();
        let mut samples = Array2::zeros((self.domain_dimension(), self.length));
        for index in 0..self.length {
            for ((sub_index, (start, end)), set_samples) in self
                .split_index(index)
                .into_iter()
                .zip(&ranges)
                .zip(&constituent_samples)
            {
                samples
                    .slice_mut(s![*start..*end, index])
                    .assign(&set_samples.column(sub_index));
            }
        }
        Cow::Owned(samples)
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        let split: Vec<_> = indices.iter().map(|&idx| self.split_index(idx)).collect();
        let mut values = Array2::from_elem((self.domain_dimension(), indices.len()), F::nan());
        for (i, (set, (start, end))) in self.sets.iter().zip(self.row_ranges()).enumerate() {
            let sub_indices: Vec<usize> = split.iter().map(|sub| sub[i]).collect();
            values
                .slice_mut(s![start..end, ..])
                .assign(&set.index_to_value(&sub_indices)?);
        }
        Ok(values)
    }

    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        self.check_values(&values)?;
        let mut indices = vec![Some(0); values.ncols()];
        for ((set, (start, end)), &stride) in
            self.sets.iter().zip(self.row_ranges()).zip(&self.strides)
        {
            let sub_indices = set.value_to_index(values.slice(s![start..end, ..]))?;
            for (index, sub_index) in indices.iter_mut().zip(sub_indices) {
                *index = index.and_then(|idx| sub_index.map(|sub| idx + sub * stride));
            }
        }
        Ok(indices)
    }

    /// Combines the interpolants of the constituent sets by taking every
    /// combination of their indices, with the product of their weights.
    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        self.check_values(&values)?;
        let mut interps = vec![Some(Interpolant::single(0)); values.ncols()];
        for ((set, (start, end)), &stride) in
            self.sets.iter().zip(self.row_ranges()).zip(&self.strides)
        {
            let sub_interps = set.value_to_interp(values.slice(s![start..end, ..]))?;
            for (interp, sub_interp) in interps.iter_mut().zip(sub_interps) {
                *interp = match (interp.take(), sub_interp) {
                    (Some(interp), Some(sub_interp)) => {
                        let count = interp.indices.len() * sub_interp.indices.len();
                        let mut indices = Vec::with_capacity(count);
                        let mut weights = Vec::with_capacity(count);
                        for (&idx, &weight) in interp.indices.iter().zip(&interp.weights) {
                            for (&sub, &sub_weight) in
                                sub_interp.indices.iter().zip(&sub_interp.weights)
                            {
                                indices.push(idx + sub * stride);
                                weights.push(weight * sub_weight);
                            }
                        }
                        Some(Interpolant { indices, weights })
                    }
                    _ => None,
                };
            }
        }
        Ok(interps)
    }

    /// Neighbors differ from a sample in the index of exactly one
    /// constituent, by a neighbor relation of that constituent.
    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        let constituent_neighbors = self
            .sets
            .iter()
            .map(|set| set.neighbors())
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.length)
            .into_par_iter()
            .map(|index| {
                let split = self.split_index(index);
                let mut neighbors = Vec::new();
                for ((&sub_index, set_neighbors), &stride) in
                    split.iter().zip(&constituent_neighbors).zip(&self.strides)
                {
                    let base = index - sub_index * stride;
                    neighbors.extend(
                        set_neighbors[sub_index]
                            .iter()
                            .map(|&neighbor| base + neighbor * stride),
                    );
                }
                neighbors
            })
            .collect())
    }
}

impl<F: BFloat> PartialEq for ProductSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.sets == other.sets
    }
}

/// Expands a set into a union of products of simple sets.
///
/// Each term lists the simple factors of one product.
fn terms<F: BFloat>(set: &AnySet<F>) -> Vec<Vec<AnySet<F>>> {
    match set {
        AnySet::Product(product) => product_terms(product.sets()),
        AnySet::Union(union) => union.sets().iter().flat_map(terms).collect(),
        _ => vec![vec![set.clone()]],
    }
}

fn product_terms<F: BFloat>(factors: &[AnySet<F>]) -> Vec<Vec<AnySet<F>>> {
    factors.iter().fold(vec![Vec::new()], |combined, factor| {
        let factor_terms = terms(factor);
        combined
            .iter()
            .flat_map(|term| {
                factor_terms.iter().map(move |factor_term| {
                    let mut term = term.clone();
                    term.extend(factor_term.iter().cloned());
                    term
                })
            })
            .collect()
    })
}

fn build<F: BFloat>(terms: Vec<Vec<AnySet<F>>>) -> Result<AnySet<F>> {
    let num_terms = terms.len();
    let mut sets = terms
        .into_iter()
        .map(|mut term| {
            if term.len() == 1 {
                Ok(term.remove(0))
            } else {
                Ok(AnySet::Product(Arc::new(ProductSet::new(term)?)))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    let normalized = if sets.len() == 1 {
        sets.remove(0)
    } else {
        AnySet::Union(Arc::new(UnionSet::new(sets)?))
    };
    log::debug!(
        "Normalized set into {} product term{}",
        num_terms,
        if num_terms == 1 { "" } else { "s" }
    );
    Ok(normalized)
}

/// Computes the product of the given factors in normal form.
///
/// Nested products are flattened into a single product of simple sets, and
/// products of unions are distributed into unions of products.
pub(crate) fn normalize<F: BFloat>(factors: &[AnySet<F>]) -> Result<AnySet<F>> {
    build(product_terms(factors))
}

/// Computes the union of the given sets in normal form.
pub(crate) fn normalize_union<F: BFloat>(sets: &[AnySet<F>]) -> Result<AnySet<F>> {
    build(sets.iter().flat_map(terms).collect())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        error::SetError,
        set::{gridded_1d::Gridded1DSet, linear::Linear1DSet},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    fn line(values: Vec<f64>) -> AnySet<f64> {
        Gridded1DSet::from_values(SetFrame::generic(1), values)
            .unwrap()
            .into()
    }

    fn linear(first: f64, last: f64, length: usize) -> AnySet<f64> {
        Linear1DSet::new(SetFrame::generic(1), first, last, length)
            .unwrap()
            .into()
    }

    #[test]
    fn single_set_is_rejected() {
        let err = ProductSet::new(vec![line(vec![0.0, 1.0])]).unwrap_err();
        assert!(matches!(err, SetError::DimensionMismatch(_)));
    }

    #[test]
    fn index_decomposes_as_mixed_radix() {
        let a = line(vec![0.0, 1.0, 2.0, 3.0]);
        let b = line(vec![10.0, 20.0]);
        let product = ProductSet::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(product.len(), 8);
        assert_eq!(product.manifold_dimension(), 2);
        assert_eq!(product.domain_dimension(), 2);
        let values = product.index_to_value(&[3, 6, 8]).unwrap();
        assert_eq!(values.column(0), array![3.0, 10.0]);
        assert_eq!(values.column(1), array![2.0, 20.0]);
        assert!(values[[0, 2]].is_nan() && values[[1, 2]].is_nan());
        assert_eq!(product.samples().column(6), array![2.0, 20.0]);
        assert_eq!(product.low(), &[0.0, 10.0]);
        assert_eq!(product.hi(), &[3.0, 20.0]);
    }

    #[test]
    fn value_index_combines_constituents() {
        let product = ProductSet::new(vec![linear(0.0, 3.0, 4), linear(0.0, 1.0, 2)]).unwrap();
        let indices = product
            .value_to_index(array![[2.1, 0.2, 9.0], [0.9, 0.1, 0.0]].view())
            .unwrap();
        assert_eq!(indices, vec![Some(6), Some(0), None]);
    }

    #[test]
    fn interpolants_are_cross_products() {
        let product = ProductSet::new(vec![linear(0.0, 3.0, 4), linear(0.0, 1.0, 2)]).unwrap();
        let interps = product.value_to_interp(array![[1.25], [0.5]].view()).unwrap();
        let interp = interps[0].as_ref().unwrap();
        assert_eq!(interp.indices.len(), 4);
        assert_abs_diff_eq!(interp.total_weight(), 1.0, epsilon = 1e-12);
        let samples = product.samples();
        for row in 0..2 {
            let value: f64 = interp
                .indices
                .iter()
                .zip(&interp.weights)
                .map(|(&idx, &w)| w * samples[[row, idx]])
                .sum();
            assert_abs_diff_eq!(value, [1.25, 0.5][row], epsilon = 1e-12);
        }
    }

    #[test]
    fn neighbors_step_along_one_constituent() {
        let product = ProductSet::new(vec![linear(0.0, 2.0, 3), linear(0.0, 1.0, 2)]).unwrap();
        let mut neighbors = product.neighbors().unwrap();
        neighbors.iter_mut().for_each(|list| list.sort_unstable());
        assert_eq!(neighbors[0], vec![1, 3]);
        assert_eq!(neighbors[4], vec![1, 3, 5]);
    }

    #[test]
    fn nested_products_are_flattened() {
        let a = line(vec![0.0, 1.0]);
        let b = line(vec![0.0, 1.0, 2.0]);
        let c = line(vec![5.0, 6.0]);
        let inner: AnySet<f64> = ProductSet::new(vec![a.clone(), b.clone()]).unwrap().into();
        let outer = inner.product(&c).unwrap();
        match &outer {
            AnySet::Product(product) => {
                assert_eq!(product.sets(), &[a.clone(), b.clone(), c.clone()]);
            }
            other => panic!("expected product, got {:?}", other),
        }
        let reversed = c.product(&inner).unwrap();
        match &reversed {
            AnySet::Product(product) => assert_eq!(product.sets(), &[c, a, b]),
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[test]
    fn appended_and_prepended_factors_keep_order() {
        let a = line(vec![0.0, 1.0]);
        let b = line(vec![0.0, 1.0, 2.0]);
        let c = linear(5.0, 6.0, 2);
        let product = ProductSet::new(vec![a.clone(), b.clone()]).unwrap();
        match product.product_with(&c).unwrap() {
            AnySet::Product(appended) => {
                assert_eq!(appended.sets(), &[a.clone(), b.clone(), c.clone()])
            }
            other => panic!("expected product, got {:?}", other),
        }
        match product.inverse_product(&c).unwrap() {
            AnySet::Product(prepended) => assert_eq!(prepended.sets(), &[c, a, b]),
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[test]
    fn products_distribute_over_unions() {
        let a = line(vec![0.0, 1.0]);
        let b = line(vec![2.0, 3.0, 4.0]);
        let c = line(vec![5.0, 6.0]);
        let union: AnySet<f64> = UnionSet::new(vec![a.clone(), b.clone()]).unwrap().into();
        let product = ProductSet::new(vec![union, c.clone()]).unwrap();
        let normalized = product.product().unwrap();
        match &normalized {
            AnySet::Union(union) => {
                assert_eq!(union.sets().len(), 2);
                assert_eq!(
                    union.sets()[0],
                    AnySet::from(ProductSet::new(vec![a, c.clone()]).unwrap())
                );
                assert_eq!(
                    union.sets()[1],
                    AnySet::from(ProductSet::new(vec![b, c]).unwrap())
                );
            }
            other => panic!("expected union, got {:?}", other),
        }
        assert_eq!(normalized.len(), product.len());
    }
}
