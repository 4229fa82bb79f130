//! Coordinate system whose values are grid coordinates of a gridded set.

use super::{CoordinateSystem, CoordinateSystemBase};
use crate::{
    ensure,
    error::{Result, SetError},
    set::{AnySet, GriddedGeometry, SampledSet},
    units::fun,
};
use ndarray::Array2;
use std::any::Any;

/// Coordinate system mapping grid coordinates of a gridded set to the
/// values of the set, which live in the reference space.
#[derive(Clone, Debug)]
pub struct GridCoordinateSystem {
    base: CoordinateSystemBase,
    set: AnySet<fun>,
}

impl GridCoordinateSystem {
    /// Creates a grid coordinate system for the given gridded set.
    ///
    /// The set must have equal manifold and domain dimensions. The
    /// reference is the domain type of the set, without coordinate system.
    pub fn new(set: AnySet<fun>) -> Result<Self> {
        ensure!(
            set.as_gridded().is_some(),
            InvalidGrid,
            "grid coordinate system needs a gridded set"
        );
        ensure!(
            set.manifold_dimension() == set.domain_dimension(),
            DimensionMismatch,
            "set manifold dimension {} differs from domain dimension {}",
            set.manifold_dimension(),
            set.domain_dimension()
        );
        let reference = set.frame().tuple_type().without_coordinate_system();
        let base = CoordinateSystemBase::new(reference, Vec::new())?;
        Ok(Self { base, set })
    }

    pub fn set(&self) -> &AnySet<fun> {
        &self.set
    }

    fn gridded(&self) -> Result<&dyn GriddedGeometry<fun>> {
        self.set
            .as_gridded()
            .ok_or_else(|| SetError::InvalidGrid("set is not gridded".to_string()))
    }
}

impl CoordinateSystem for GridCoordinateSystem {
    fn base(&self) -> &CoordinateSystemBase {
        &self.base
    }

    fn to_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        self.gridded()?.grid_to_value(values.view())
    }

    fn from_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        self.gridded()?.value_to_grid(values.view())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn CoordinateSystem) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .map_or(false, |other| other.set == self.set)
    }
}
