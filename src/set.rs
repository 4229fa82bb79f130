//! Finite sets of sample points embedded in a domain space.

pub mod delaunay;
pub mod gridded;
pub mod gridded_1d;
pub mod intern;
pub mod irregular;
pub mod linear;
pub mod product;
pub mod singleton;
pub mod union;

use crate::{
    coord_sys::{same_coordinate_system, CoordinateSystem},
    ensure,
    error::Result,
    num::BFloat,
    types::RealTupleType,
    units::Unit,
};
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::{borrow::Cow, fmt, sync::Arc};

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(feature = "for-testing")]
use approx::{AbsDiffEq, RelativeEq};

use gridded::GriddedSet;
use gridded_1d::Gridded1DSet;
use irregular::{Irregular1DSet, Irregular2DSet};
use linear::{Linear1DSet, LinearNDSet};
use product::ProductSet;
use singleton::SingletonSet;
use union::UnionSet;

/// Type, coordinate system and units of the domain a set lives in.
#[derive(Clone, Debug)]
pub struct SetFrame {
    tuple_type: RealTupleType,
    coordinate_system: Option<Arc<dyn CoordinateSystem>>,
    units: Vec<Option<Unit>>,
}

impl SetFrame {
    /// Creates a frame using the default coordinate system and units of the
    /// given tuple type.
    pub fn new(tuple_type: RealTupleType) -> Self {
        Self {
            coordinate_system: tuple_type.coordinate_system().cloned(),
            units: tuple_type.default_units(),
            tuple_type,
        }
    }

    /// Creates a frame for an anonymous tuple type of the given dimension.
    pub fn generic(dimension: usize) -> Self {
        Self::new(RealTupleType::generic(dimension))
    }

    /// Replaces the coordinate system of the frame.
    ///
    /// The coordinate system must have the frame's dimension, and if the tuple
    /// type has a default coordinate system the references must match.
    pub fn with_coordinate_system(
        mut self,
        coordinate_system: Option<Arc<dyn CoordinateSystem>>,
    ) -> Result<Self> {
        if let Some(coordinate_system) = &coordinate_system {
            ensure!(
                coordinate_system.dimension() == self.dimension(),
                DimensionMismatch,
                "coordinate system dimension {} does not match set dimension {}",
                coordinate_system.dimension(),
                self.dimension()
            );
            if let Some(default) = self.tuple_type.coordinate_system() {
                ensure!(
                    default.reference() == coordinate_system.reference(),
                    Inconsistent,
                    "coordinate system reference {:?} differs from default reference {:?}",
                    coordinate_system.reference(),
                    default.reference()
                );
            }
        }
        self.coordinate_system = coordinate_system;
        Ok(self)
    }

    /// Replaces the units of the frame.
    ///
    /// Every unit must be convertible to the default unit of its component.
    pub fn with_units(mut self, units: Vec<Option<Unit>>) -> Result<Self> {
        ensure!(
            units.len() == self.dimension(),
            DimensionMismatch,
            "{} units given for set dimension {}",
            units.len(),
            self.dimension()
        );
        for (unit, component) in units.iter().zip(self.tuple_type.components()) {
            ensure!(
                Unit::can_convert(unit.as_ref(), component.default_unit()),
                IncompatibleUnits,
                "unit of {} is not convertible to its default unit",
                component.name()
            );
        }
        self.units = units;
        Ok(self)
    }

    /// Concatenates the types and units of the given frames, without
    /// coordinate systems.
    pub fn concat<'a, I>(frames: I) -> Self
    where
        I: IntoIterator<Item = &'a SetFrame>,
    {
        let frames: Vec<_> = frames.into_iter().collect();
        Self {
            tuple_type: RealTupleType::concat(frames.iter().map(|frame| &frame.tuple_type)),
            coordinate_system: None,
            units: frames
                .iter()
                .flat_map(|frame| frame.units.iter().cloned())
                .collect(),
        }
    }

    /// Returns the same frame without any coordinate system.
    pub fn without_coordinate_system(&self) -> Self {
        Self {
            tuple_type: self.tuple_type.without_coordinate_system(),
            coordinate_system: None,
            units: self.units.clone(),
        }
    }

    /// Returns a one-dimensional frame for the given component.
    pub fn component(&self, idx: usize) -> Self {
        Self {
            tuple_type: RealTupleType::new(vec![self.tuple_type.components()[idx].clone()]),
            coordinate_system: None,
            units: vec![self.units[idx].clone()],
        }
    }

    pub fn tuple_type(&self) -> &RealTupleType {
        &self.tuple_type
    }

    pub fn coordinate_system(&self) -> Option<&Arc<dyn CoordinateSystem>> {
        self.coordinate_system.as_ref()
    }

    pub fn units(&self) -> &[Option<Unit>] {
        &self.units
    }

    pub fn dimension(&self) -> usize {
        self.tuple_type.dimension()
    }
}

impl PartialEq for SetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.tuple_type == other.tuple_type
            && self.units == other.units
            && same_coordinate_system(
                self.coordinate_system.as_ref(),
                other.coordinate_system.as_ref(),
            )
    }
}

/// Sample indices and weights for interpolating at a single point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Interpolant<F: BFloat> {
    pub indices: Vec<usize>,
    pub weights: Vec<F>,
}

impl<F: BFloat> Interpolant<F> {
    /// Creates an interpolant that picks a single sample.
    pub fn single(index: usize) -> Self {
        Self {
            indices: vec![index],
            weights: vec![F::one()],
        }
    }

    /// Returns the sum of the weights.
    pub fn total_weight(&self) -> F {
        self.weights.iter().fold(F::zero(), |sum, &weight| sum + weight)
    }

    /// Shifts every index by the given offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.indices.iter_mut().for_each(|idx| *idx += offset);
        self
    }
}

#[cfg(feature = "for-testing")]
impl<F: BFloat + AbsDiffEq<Epsilon = F>> AbsDiffEq for Interpolant<F> {
    type Epsilon = F;

    fn default_epsilon() -> F {
        F::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: F) -> bool {
        self.indices == other.indices
            && self.weights.len() == other.weights.len()
            && self
                .weights
                .iter()
                .zip(other.weights.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

#[cfg(feature = "for-testing")]
impl<F: BFloat + RelativeEq<Epsilon = F>> RelativeEq for Interpolant<F> {
    fn default_max_relative() -> F {
        F::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: F, max_relative: F) -> bool {
        self.indices == other.indices
            && self.weights.len() == other.weights.len()
            && self
                .weights
                .iter()
                .zip(other.weights.iter())
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

/// A finite collection of points embedded in a domain space.
///
/// Values are component-major arrays with shape `(domain dimension, number
/// of points)`. Points outside the set give NaN values, `None` indices and
/// `None` interpolants rather than errors.
pub trait SampledSet<F: BFloat>: fmt::Debug + Send + Sync {
    /// Returns the type, coordinate system and units of the domain.
    fn frame(&self) -> &SetFrame;

    /// Returns the number of independent grid axes of the set.
    fn manifold_dimension(&self) -> usize;

    /// Returns the total number of samples.
    fn len(&self) -> usize;

    /// Returns the lower extent of the samples along each domain component.
    fn low(&self) -> &[F];

    /// Returns the upper extent of the samples along each domain component.
    fn hi(&self) -> &[F];

    /// Returns all samples, in index order.
    fn samples(&self) -> Cow<'_, Array2<F>>;

    /// Computes the sample values at the given linear indices.
    ///
    /// Indices outside the set give NaN columns.
    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>>;

    /// Finds the index of the sample closest to each value.
    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>>;

    /// Computes sample indices and interpolation weights for each value.
    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>>;

    /// Returns, for each sample, the indices of its neighboring samples.
    fn neighbors(&self) -> Result<Vec<Vec<usize>>>;

    fn domain_dimension(&self) -> usize {
        self.frame().dimension()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifies that the given values have one row per domain component.
    fn check_values(&self, values: &ArrayView2<F>) -> Result<()> {
        ensure!(
            values.nrows() == self.domain_dimension(),
            DimensionMismatch,
            "values have {} components, set has domain dimension {}",
            values.nrows(),
            self.domain_dimension()
        );
        Ok(())
    }
}

/// A sampled set whose samples lie on a logical grid with one length per
/// manifold axis.
///
/// Grid coordinates are continuous indices, valid in `[-0.5, length - 0.5]`
/// along each axis, with the first axis varying fastest in the linear index.
pub trait GriddedGeometry<F: BFloat>: SampledSet<F> {
    /// Returns the number of samples along each manifold axis.
    fn lengths(&self) -> &[usize];

    /// Computes the values at the given grid coordinates.
    fn grid_to_value(&self, grid: ArrayView2<F>) -> Result<Array2<F>>;

    /// Computes the grid coordinates of the given values.
    fn value_to_grid(&self, values: ArrayView2<F>) -> Result<Array2<F>>;

    /// Returns the linear indices in zig-zag order.
    fn wedge(&self) -> Vec<usize> {
        gridded::wedge(self.lengths())
    }

    /// Verifies that the given grid coordinates have one row per manifold axis.
    fn check_grid(&self, grid: &ArrayView2<F>) -> Result<()> {
        ensure!(
            grid.nrows() == self.lengths().len(),
            DimensionMismatch,
            "grid coordinates have {} components, set has manifold dimension {}",
            grid.nrows(),
            self.lengths().len()
        );
        Ok(())
    }
}

/// Any kind of sampled set, shared by reference counting.
#[derive(Clone, Debug)]
pub enum AnySet<F: BFloat> {
    Gridded1D(Arc<Gridded1DSet<F>>),
    Gridded(Arc<GriddedSet<F>>),
    Linear1D(Arc<Linear1DSet<F>>),
    LinearND(Arc<LinearNDSet<F>>),
    Irregular1D(Arc<Irregular1DSet<F>>),
    Irregular2D(Arc<Irregular2DSet<F>>),
    Singleton(Arc<SingletonSet<F>>),
    Product(Arc<ProductSet<F>>),
    Union(Arc<UnionSet<F>>),
}

impl<F: BFloat> AnySet<F> {
    /// Returns the set as a general sampled set.
    pub fn as_sampled(&self) -> &dyn SampledSet<F> {
        match self {
            Self::Gridded1D(set) => set.as_ref(),
            Self::Gridded(set) => set.as_ref(),
            Self::Linear1D(set) => set.as_ref(),
            Self::LinearND(set) => set.as_ref(),
            Self::Irregular1D(set) => set.as_ref(),
            Self::Irregular2D(set) => set.as_ref(),
            Self::Singleton(set) => set.as_ref(),
            Self::Product(set) => set.as_ref(),
            Self::Union(set) => set.as_ref(),
        }
    }

    /// Returns the set as a gridded set, if it is one.
    pub fn as_gridded(&self) -> Option<&dyn GriddedGeometry<F>> {
        match self {
            Self::Gridded1D(set) => Some(set.as_ref()),
            Self::Gridded(set) => Some(set.as_ref()),
            Self::Linear1D(set) => Some(set.as_ref()),
            Self::LinearND(set) => Some(set.as_ref()),
            _ => None,
        }
    }

    /// Returns the product of the two sets in normal form.
    ///
    /// Nested products are flattened and unions are distributed so that
    /// they end up outermost.
    pub fn product(&self, other: &AnySet<F>) -> Result<AnySet<F>> {
        product::normalize(&[self.clone(), other.clone()])
    }

    /// Returns the set rewritten in normal form.
    pub fn normalized(&self) -> Result<AnySet<F>> {
        match self {
            Self::Product(set) => set.product(),
            Self::Union(set) => set.product(),
            _ => Ok(self.clone()),
        }
    }
}

impl<F: BFloat> SampledSet<F> for AnySet<F> {
    fn frame(&self) -> &SetFrame {
        self.as_sampled().frame()
    }

    fn manifold_dimension(&self) -> usize {
        self.as_sampled().manifold_dimension()
    }

    fn len(&self) -> usize {
        self.as_sampled().len()
    }

    fn low(&self) -> &[F] {
        self.as_sampled().low()
    }

    fn hi(&self) -> &[F] {
        self.as_sampled().hi()
    }

    fn samples(&self) -> Cow<'_, Array2<F>> {
        self.as_sampled().samples()
    }

    fn index_to_value(&self, indices: &[usize]) -> Result<Array2<F>> {
        self.as_sampled().index_to_value(indices)
    }

    fn value_to_index(&self, values: ArrayView2<F>) -> Result<Vec<Option<usize>>> {
        self.as_sampled().value_to_index(values)
    }

    fn value_to_interp(&self, values: ArrayView2<F>) -> Result<Vec<Option<Interpolant<F>>>> {
        self.as_sampled().value_to_interp(values)
    }

    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        self.as_sampled().neighbors()
    }
}

impl<F: BFloat> PartialEq for AnySet<F> {
    fn eq(&self, other: &Self) -> bool {
        macro_rules! same {
            ($a:expr, $b:expr) => {
                Arc::ptr_eq($a, $b) || $a.as_ref() == $b.as_ref()
            };
        }
        match (self, other) {
            (Self::Gridded1D(a), Self::Gridded1D(b)) => same!(a, b),
            (Self::Gridded(a), Self::Gridded(b)) => same!(a, b),
            (Self::Linear1D(a), Self::Linear1D(b)) => same!(a, b),
            (Self::LinearND(a), Self::LinearND(b)) => same!(a, b),
            (Self::Irregular1D(a), Self::Irregular1D(b)) => same!(a, b),
            (Self::Irregular2D(a), Self::Irregular2D(b)) => same!(a, b),
            (Self::Singleton(a), Self::Singleton(b)) => same!(a, b),
            (Self::Product(a), Self::Product(b)) => same!(a, b),
            (Self::Union(a), Self::Union(b)) => same!(a, b),
            _ => false,
        }
    }
}

macro_rules! impl_from_set {
    ($set:ident, $variant:ident) => {
        impl<F: BFloat> From<$set<F>> for AnySet<F> {
            fn from(set: $set<F>) -> Self {
                Self::$variant(Arc::new(set))
            }
        }

        impl<F: BFloat> From<Arc<$set<F>>> for AnySet<F> {
            fn from(set: Arc<$set<F>>) -> Self {
                Self::$variant(set)
            }
        }
    };
}

impl_from_set!(Gridded1DSet, Gridded1D);
impl_from_set!(GriddedSet, Gridded);
impl_from_set!(Linear1DSet, Linear1D);
impl_from_set!(LinearNDSet, LinearND);
impl_from_set!(Irregular1DSet, Irregular1D);
impl_from_set!(Irregular2DSet, Irregular2D);
impl_from_set!(SingletonSet, Singleton);
impl_from_set!(ProductSet, Product);
impl_from_set!(UnionSet, Union);

/// Validates stored samples against a frame and computes their extents.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the lower and upper extents along each component.
/// - `Err`: `DimensionMismatch` if the sample rows do not match the frame,
/// or `InvalidGrid` if there are no samples or any sample is NaN or infinite.
pub(crate) fn sample_extents<F: BFloat>(
    frame: &SetFrame,
    samples: &Array2<F>,
) -> Result<(Vec<F>, Vec<F>)> {
    ensure!(
        samples.nrows() == frame.dimension(),
        DimensionMismatch,
        "samples have {} components, domain dimension is {}",
        samples.nrows(),
        frame.dimension()
    );
    ensure!(samples.ncols() > 0, InvalidGrid, "set must have at least one sample");
    let extents = (0..samples.nrows())
        .into_par_iter()
        .map(|dim| {
            let row = samples.row(dim);
            let mut low = F::infinity();
            let mut hi = F::neg_infinity();
            for (idx, &value) in row.iter().enumerate() {
                ensure!(
                    value.is_finite(),
                    InvalidGrid,
                    "sample {} of component {} is not finite",
                    idx,
                    dim
                );
                low = low.min(value);
                hi = hi.max(value);
            }
            Ok((low, hi))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(extents.into_iter().unzip())
}

/// Picks the stored samples at the given indices, with NaN for indices
/// outside the set.
pub(crate) fn gather_samples<F: BFloat>(samples: &Array2<F>, indices: &[usize]) -> Array2<F> {
    let mut values = Array2::from_elem((samples.nrows(), indices.len()), F::nan());
    for (mut column, &idx) in values.axis_iter_mut(Axis(1)).zip(indices) {
        if idx < samples.ncols() {
            column.assign(&samples.column(idx));
        }
    }
    values
}
