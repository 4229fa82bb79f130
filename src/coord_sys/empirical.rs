//! Coordinate system defined by two gridded sets sharing one grid.

use super::{grid::GridCoordinateSystem, CoordinateSystem, CoordinateSystemBase};
use crate::{
    constants::SAMPLE_MATCH_TOLERANCE,
    ensure,
    error::Result,
    set::{
        gridded::{split_index, GriddedSet},
        AnySet, SampledSet, SetFrame,
    },
    types::RealTupleType,
    units::fun,
};
use ndarray::{Array2, Axis};
use std::any::Any;

/// Coordinate system relating the samples of a world set to the samples of
/// a reference set at the same grid positions.
///
/// Values are mapped to grid coordinates of the world set, and from there
/// to values of the reference set, interpolating inside grid cells.
#[derive(Clone, Debug)]
pub struct EmpiricalCoordinateSystem {
    base: CoordinateSystemBase,
    world: GridCoordinateSystem,
    reference: GridCoordinateSystem,
}

impl EmpiricalCoordinateSystem {
    /// Creates an empirical coordinate system from a world set and a
    /// reference set.
    ///
    /// # Parameters
    ///
    /// - `world`: Gridded set of values in this coordinate system.
    /// - `reference`: Gridded set of the corresponding reference values, with the same grid lengths.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new `EmpiricalCoordinateSystem`.
    /// - `Err`: `InvalidGrid` if either set is not gridded, or `DimensionMismatch`
    /// if the grids differ or a set has unequal manifold and domain dimensions.
    pub fn new(world: AnySet<fun>, reference: AnySet<fun>) -> Result<Self> {
        let world = without_coordinate_system(world)?;
        let reference = without_coordinate_system(reference)?;
        let world = GridCoordinateSystem::new(world)?;
        let reference = GridCoordinateSystem::new(reference)?;
        let world_lengths = lengths(world.set());
        let reference_lengths = lengths(reference.set());
        ensure!(
            world_lengths == reference_lengths,
            DimensionMismatch,
            "world grid lengths {:?} differ from reference grid lengths {:?}",
            world_lengths,
            reference_lengths
        );
        let base = CoordinateSystemBase::new(
            reference.reference().clone(),
            world.set().frame().units().to_vec(),
        )?;
        Ok(Self {
            base,
            world,
            reference,
        })
    }

    /// Creates an empirical coordinate system from a sampled function, with
    /// the domain set as world and the range values as reference.
    ///
    /// The range samples are gridded with the grid lengths of the domain set.
    pub fn from_field(
        domain: AnySet<fun>,
        range_type: RealTupleType,
        range_samples: Array2<fun>,
    ) -> Result<Self> {
        let range = range_set(&domain, range_type, range_samples)?;
        Self::new(domain, range)
    }

    /// Creates an empirical coordinate system from a sampled function, with
    /// the range values as world and the domain set as reference.
    pub fn inverse_from_field(
        domain: AnySet<fun>,
        range_type: RealTupleType,
        range_samples: Array2<fun>,
    ) -> Result<Self> {
        let range = range_set(&domain, range_type, range_samples)?;
        Self::new(range, domain)
    }

    pub fn world_set(&self) -> &AnySet<fun> {
        self.world.set()
    }

    pub fn reference_set(&self) -> &AnySet<fun> {
        self.reference.set()
    }

    /// Returns the grid coordinates of the values if they are exactly the
    /// samples of the world set, in order.
    fn matching_grid(&self, values: &Array2<fun>) -> Option<Array2<fun>> {
        let world = self.world.set();
        if values.ncols() != world.len() {
            return None;
        }
        let samples = world.samples();
        let matches = values
            .iter()
            .zip(samples.iter())
            .all(|(&value, &sample)| {
                (value - sample).abs() <= SAMPLE_MATCH_TOLERANCE * value.abs().max(sample.abs())
            });
        if !matches {
            return None;
        }
        let lengths = lengths(world);
        let mut grid = Array2::zeros((lengths.len(), values.ncols()));
        for (index, mut column) in grid.axis_iter_mut(Axis(1)).enumerate() {
            for (coordinate, position) in column.iter_mut().zip(split_index(&lengths, index)) {
                *coordinate = position as fun;
            }
        }
        Some(grid)
    }
}

impl CoordinateSystem for EmpiricalCoordinateSystem {
    fn base(&self) -> &CoordinateSystemBase {
        &self.base
    }

    fn to_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        let grid = match self.matching_grid(&values) {
            Some(grid) => grid,
            None => self.world.from_reference(values)?,
        };
        self.reference.to_reference(grid)
    }

    fn from_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        let grid = self.reference.from_reference(values)?;
        self.world.to_reference(grid)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn CoordinateSystem) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .map_or(false, |other| {
                other.world.equals(&self.world) && other.reference.equals(&self.reference)
            })
    }
}

fn lengths(set: &AnySet<fun>) -> Vec<usize> {
    set.as_gridded()
        .map(|gridded| gridded.lengths().to_vec())
        .unwrap_or_default()
}

fn without_coordinate_system(set: AnySet<fun>) -> Result<AnySet<fun>> {
    if set.frame().coordinate_system().is_none() {
        return Ok(set);
    }
    let frame = set.frame().without_coordinate_system();
    GriddedSet::create(frame, set.samples().into_owned(), lengths(&set))
}

fn range_set(
    domain: &AnySet<fun>,
    range_type: RealTupleType,
    range_samples: Array2<fun>,
) -> Result<AnySet<fun>> {
    ensure!(
        domain.as_gridded().is_some(),
        InvalidGrid,
        "domain set of the field must be gridded"
    );
    ensure!(
        range_samples.ncols() == domain.len(),
        DimensionMismatch,
        "{} range samples given for domain of {} samples",
        range_samples.ncols(),
        domain.len()
    );
    let frame = SetFrame::new(range_type.without_coordinate_system());
    GriddedSet::create(frame, range_samples, lengths(domain))
}
