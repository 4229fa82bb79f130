//! Coordinate systems relating a tuple space to a reference tuple space.

pub mod cartesian_product;
pub mod empirical;
pub mod grid;
pub mod polar;

use crate::{
    ensure,
    error::Result,
    estimate::ErrorEstimate,
    fail,
    num::convert_values,
    types::RealTupleType,
    units::{fun, Unit},
};
use ndarray::{Array2, Axis};
use std::{any::Any, fmt, sync::Arc};

/// Reference and unit information shared by every coordinate system.
#[derive(Clone, Debug)]
pub struct CoordinateSystemBase {
    reference: RealTupleType,
    units: Vec<Option<Unit>>,
}

impl CoordinateSystemBase {
    /// Creates the shared state of a coordinate system.
    ///
    /// # Parameters
    ///
    /// - `reference`: Tuple type of the reference space. It may not have a coordinate system of its own.
    /// - `units`: Units of values in this coordinate system, one per reference component (empty for none).
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new `CoordinateSystemBase`.
    /// - `Err`: `Inconsistent` if the reference has a coordinate system, or
    /// `DimensionMismatch` if the unit count differs from the reference dimension.
    pub fn new(reference: RealTupleType, units: Vec<Option<Unit>>) -> Result<Self> {
        ensure!(
            reference.coordinate_system().is_none(),
            Inconsistent,
            "reference {:?} may not have a coordinate system",
            reference
        );
        let units = if units.is_empty() {
            vec![None; reference.dimension()]
        } else {
            units
        };
        ensure!(
            units.len() == reference.dimension(),
            DimensionMismatch,
            "{} units given for reference of dimension {}",
            units.len(),
            reference.dimension()
        );
        Ok(Self { reference, units })
    }

    pub fn reference(&self) -> &RealTupleType {
        &self.reference
    }

    pub fn units(&self) -> &[Option<Unit>] {
        &self.units
    }

    pub fn dimension(&self) -> usize {
        self.reference.dimension()
    }

    /// Verifies that the given component-major values have one row per dimension.
    pub fn check_values<F>(&self, values: &Array2<F>) -> Result<()> {
        ensure!(
            values.nrows() == self.dimension(),
            DimensionMismatch,
            "values have {} components, coordinate system has dimension {}",
            values.nrows(),
            self.dimension()
        );
        Ok(())
    }
}

/// Bidirectional transform between a tuple space and a reference space.
///
/// Values are component-major arrays with shape `(dimension, number of points)`.
/// The input array is consumed and may be reused for the result.
pub trait CoordinateSystem: fmt::Debug + Send + Sync + Any {
    /// Returns the shared reference and unit information.
    fn base(&self) -> &CoordinateSystemBase;

    /// Converts values in this coordinate system to the reference space.
    fn to_reference(&self, values: Array2<fun>) -> Result<Array2<fun>>;

    /// Converts values in the reference space to this coordinate system.
    fn from_reference(&self, values: Array2<fun>) -> Result<Array2<fun>>;

    /// Returns the coordinate system as `Any`, for definition comparisons.
    fn as_any(&self) -> &dyn Any;

    /// Whether the other coordinate system has the same definition.
    fn equals(&self, other: &dyn CoordinateSystem) -> bool;

    fn reference(&self) -> &RealTupleType {
        self.base().reference()
    }

    fn dimension(&self) -> usize {
        self.base().dimension()
    }

    fn coordinate_system_units(&self) -> &[Option<Unit>] {
        self.base().units()
    }

    /// Single precision version of `to_reference`, going through double precision.
    fn to_reference_f32(&self, values: Array2<f32>) -> Result<Array2<f32>> {
        let converted = self.to_reference(convert_values(values.view()))?;
        Ok(convert_values(converted.view()))
    }

    /// Single precision version of `from_reference`, going through double precision.
    fn from_reference_f32(&self, values: Array2<f32>) -> Result<Array2<f32>> {
        let converted = self.from_reference(convert_values(values.view()))?;
        Ok(convert_values(converted.view()))
    }

    /// Converts values given in `units` to the reference space.
    ///
    /// # Returns
    ///
    /// The reference values together with their units, which are the
    /// default units of the reference.
    fn to_reference_with_units(
        &self,
        mut values: Array2<fun>,
        units: &[Option<Unit>],
    ) -> Result<(Array2<fun>, Vec<Option<Unit>>)> {
        let units = expand_units(units, values.nrows());
        Unit::convert_tuple(&mut values, &units, self.coordinate_system_units())?;
        let values = self.to_reference(values)?;
        Ok((values, self.reference().default_units()))
    }

    /// Converts reference values given in `units` to this coordinate system.
    ///
    /// # Returns
    ///
    /// The converted values together with their units, which are the
    /// units of this coordinate system.
    fn from_reference_with_units(
        &self,
        mut values: Array2<fun>,
        units: &[Option<Unit>],
    ) -> Result<(Array2<fun>, Vec<Option<Unit>>)> {
        let units = expand_units(units, values.nrows());
        Unit::convert_tuple(&mut values, &units, &self.reference().default_units())?;
        let values = self.from_reference(values)?;
        Ok((values, self.coordinate_system_units().to_vec()))
    }
}

impl PartialEq for dyn CoordinateSystem {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Whether two optional coordinate systems have the same definition.
pub fn same_coordinate_system(
    coord_a: Option<&Arc<dyn CoordinateSystem>>,
    coord_b: Option<&Arc<dyn CoordinateSystem>>,
) -> bool {
    match (coord_a, coord_b) {
        (None, None) => true,
        (Some(coord_a), Some(coord_b)) => {
            Arc::ptr_eq(coord_a, coord_b) || coord_a.equals(coord_b.as_ref())
        }
        _ => false,
    }
}

fn expand_units(units: &[Option<Unit>], dimension: usize) -> Vec<Option<Unit>> {
    if units.is_empty() {
        vec![None; dimension]
    } else {
        units.to_vec()
    }
}

/// Description of one side of a coordinate transformation.
#[derive(Clone, Debug)]
pub struct CoordinateFrame<'a> {
    tuple_type: &'a RealTupleType,
    coordinate_system: Option<&'a Arc<dyn CoordinateSystem>>,
    units: Vec<Option<Unit>>,
    errors: Vec<Option<ErrorEstimate>>,
}

impl<'a> CoordinateFrame<'a> {
    /// Creates a frame for values of the given tuple type, without explicit
    /// coordinate system, units or error estimates.
    pub fn new(tuple_type: &'a RealTupleType) -> Self {
        Self {
            tuple_type,
            coordinate_system: None,
            units: vec![None; tuple_type.dimension()],
            errors: Vec::new(),
        }
    }

    pub fn with_coordinate_system(
        mut self,
        coordinate_system: Option<&'a Arc<dyn CoordinateSystem>>,
    ) -> Self {
        self.coordinate_system = coordinate_system;
        self
    }

    pub fn with_units(mut self, units: &[Option<Unit>]) -> Self {
        self.units = expand_units(units, self.tuple_type.dimension());
        self
    }

    pub fn with_errors(mut self, errors: &[Option<ErrorEstimate>]) -> Self {
        self.errors = errors.to_vec();
        self
    }

    pub fn tuple_type(&self) -> &RealTupleType {
        self.tuple_type
    }

    pub fn coordinate_system(&self) -> Option<&'a Arc<dyn CoordinateSystem>> {
        self.coordinate_system
    }

    pub fn units(&self) -> &[Option<Unit>] {
        &self.units
    }

    pub fn errors(&self) -> &[Option<ErrorEstimate>] {
        &self.errors
    }

    fn check(&self, values: &Array2<fun>) -> Result<()> {
        let dimension = self.tuple_type.dimension();
        ensure!(
            values.nrows() == dimension,
            DimensionMismatch,
            "values have {} components, tuple type {:?} has dimension {}",
            values.nrows(),
            self.tuple_type,
            dimension
        );
        ensure!(
            self.units.len() == dimension,
            DimensionMismatch,
            "{} units given for tuple type of dimension {}",
            self.units.len(),
            dimension
        );
        ensure!(
            self.errors.is_empty() || self.errors.len() == dimension,
            DimensionMismatch,
            "{} error estimates given for tuple type of dimension {}",
            self.errors.len(),
            dimension
        );
        Ok(())
    }
}

/// Values resulting from a coordinate transformation.
#[derive(Clone, Debug)]
pub struct Transformed {
    /// Transformed component-major values.
    pub values: Array2<fun>,
    /// Units of the transformed values.
    pub units: Vec<Option<Unit>>,
    /// Propagated error estimates, empty when none were given.
    pub errors: Vec<Option<ErrorEstimate>>,
}

/// Values and perturbed error values carried through a transformation.
struct Transformation {
    values: Array2<fun>,
    units: Vec<Option<Unit>>,
    error_values: Option<Array2<fun>>,
    error_units: Vec<Option<Unit>>,
}

impl Transformation {
    fn to_reference(self, coordinate_system: &dyn CoordinateSystem) -> Result<Self> {
        let error_values = match self.error_values {
            Some(error_values) => Some(
                coordinate_system
                    .to_reference_with_units(error_values, &self.error_units)?
                    .0,
            ),
            None => None,
        };
        let (values, units) = coordinate_system.to_reference_with_units(self.values, &self.units)?;
        Ok(Self {
            values,
            error_units: units.clone(),
            units,
            error_values,
        })
    }

    fn from_reference(self, coordinate_system: &dyn CoordinateSystem) -> Result<Self> {
        let error_values = match self.error_values {
            Some(error_values) => Some(
                coordinate_system
                    .from_reference_with_units(error_values, &self.error_units)?
                    .0,
            ),
            None => None,
        };
        let (values, units) =
            coordinate_system.from_reference_with_units(self.values, &self.units)?;
        Ok(Self {
            values,
            error_units: units.clone(),
            units,
            error_values,
        })
    }
}

/// Transforms values from the `source` frame to the `target` frame's tuple
/// type and coordinate system, leaving the values in whatever units the
/// transformation produces.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the transformed values along with their free units and
/// propagated error estimates.
/// - `Err`: `Inconsistent` if the coordinate systems of the two frames
/// cannot be reconciled, or `DimensionMismatch` if the values do not fit the frames.
pub fn transform_coordinates_free_units(
    target: &CoordinateFrame,
    source: &CoordinateFrame,
    values: Array2<fun>,
) -> Result<Transformed> {
    source.check(&values)?;
    ensure!(
        target.tuple_type().dimension() == source.tuple_type().dimension(),
        DimensionMismatch,
        "cannot transform {:?} values to {:?}",
        source.tuple_type(),
        target.tuple_type()
    );
    let all_errors =
        !source.errors().is_empty() && source.errors().iter().all(Option::is_some);
    let mut transformation = Transformation {
        values,
        units: source.units().to_vec(),
        error_values: if all_errors {
            Some(ErrorEstimate::init_error_values(source.errors()))
        } else {
            None
        },
        error_units: source.units().to_vec(),
    };
    let mut any_transform = false;

    if target.tuple_type() == source.tuple_type() {
        match (source.coordinate_system(), target.coordinate_system()) {
            (None, None) => {}
            (Some(coord_in), Some(coord_out)) => {
                if !same_coordinate_system(Some(coord_in), Some(coord_out)) {
                    transformation = transformation
                        .to_reference(coord_in.as_ref())?
                        .from_reference(coord_out.as_ref())?;
                    any_transform = true;
                }
            }
            _ => fail!(
                Inconsistent,
                "only one of two frames of type {:?} has a coordinate system",
                source.tuple_type()
            ),
        }
    } else {
        let coord_out = resolve_coordinate_system(target, "out")?;
        let coord_in = resolve_coordinate_system(source, "in")?;
        let ref_out = coord_out.map_or(target.tuple_type(), |coord| coord.reference());
        let ref_in = coord_in.map_or(source.tuple_type(), |coord| coord.reference());
        ensure!(
            ref_out == ref_in,
            Inconsistent,
            "references {:?} and {:?} do not match",
            ref_in,
            ref_out
        );
        if let Some(coord_in) = coord_in {
            if source.tuple_type() != ref_in {
                transformation = transformation.to_reference(coord_in.as_ref())?;
                any_transform = true;
            }
        }
        if let Some(coord_out) = coord_out {
            if target.tuple_type() != ref_out {
                transformation = transformation.from_reference(coord_out.as_ref())?;
                any_transform = true;
            }
        }
    }

    let errors = match &transformation.error_values {
        Some(error_values) if any_transform => transformation
            .values
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, row)| {
                let error = (error_values[[i, 2 * i + 1]] - error_values[[i, 2 * i]]).abs();
                Some(ErrorEstimate::from_values(
                    &row.to_vec(),
                    error,
                    transformation.units[i].clone(),
                ))
            })
            .collect(),
        _ => source.errors().to_vec(),
    };

    Ok(Transformed {
        values: transformation.values,
        units: transformation.units,
        errors,
    })
}

/// Transforms values from the `source` frame to the `target` frame,
/// including conversion to the target frame's units.
///
/// Components whose target unit is missing are left in the free units of
/// the transformation.
pub fn transform_coordinates(
    target: &CoordinateFrame,
    source: &CoordinateFrame,
    values: Array2<fun>,
) -> Result<Transformed> {
    let free = transform_coordinates_free_units(target, source, values)?;
    let mut values = free.values;
    let mut units = Vec::with_capacity(values.nrows());
    let mut errors = Vec::with_capacity(free.errors.len());
    for (i, mut row) in values.axis_iter_mut(Axis(0)).enumerate() {
        let unit_out = target.units()[i].as_ref();
        let unit_in = free.units[i].as_ref();
        let error_in = free.errors.get(i).and_then(Option::as_ref);
        let (converted, error_out) =
            Unit::transform_units(unit_out, unit_in, error_in, &row.to_vec())?;
        row.iter_mut()
            .zip(converted)
            .for_each(|(value, converted)| *value = converted);
        units.push(match (unit_out, unit_in) {
            (Some(unit_out), Some(_)) => Some(unit_out.clone()),
            _ => free.units[i].clone(),
        });
        if !free.errors.is_empty() {
            errors.push(error_out);
        }
    }
    Ok(Transformed {
        values,
        units,
        errors,
    })
}

fn resolve_coordinate_system<'a>(
    frame: &CoordinateFrame<'a>,
    side: &str,
) -> Result<Option<&'a Arc<dyn CoordinateSystem>>> {
    let coordinate_system = frame
        .coordinate_system()
        .or_else(|| frame.tuple_type.coordinate_system());
    if let Some(coordinate_system) = coordinate_system {
        let reference_matches = frame
            .tuple_type
            .coordinate_system()
            .map_or(false, |default| default.reference() == coordinate_system.reference());
        ensure!(
            reference_matches,
            Inconsistent,
            "{} reference {:?} does not match the default coordinate system of {:?}",
            side,
            coordinate_system.reference(),
            frame.tuple_type
        );
    }
    Ok(coordinate_system)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        coord_sys::polar::PolarCoordinateSystem,
        error::SetError,
        types::RealType,
        units::si,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    fn cartesian() -> RealTupleType {
        RealTupleType::new(vec![
            RealType::new("x", Some(si::METER.clone())),
            RealType::new("y", Some(si::METER.clone())),
        ])
    }

    fn polar_type() -> RealTupleType {
        RealTupleType::with_coordinate_system(
            vec![
                RealType::new("longitude", Some(si::DEGREE.clone())),
                RealType::new("radius", Some(si::METER.clone())),
            ],
            Arc::new(PolarCoordinateSystem::new(cartesian()).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn reference_with_coordinate_system_is_rejected() {
        let err = CoordinateSystemBase::new(polar_type(), Vec::new()).unwrap_err();
        assert!(matches!(err, SetError::Inconsistent(_)));
        let err = CoordinateSystemBase::new(cartesian(), vec![None]).unwrap_err();
        assert!(matches!(err, SetError::DimensionMismatch(_)));
    }

    #[test]
    fn polar_values_transform_to_cartesian_reference() {
        let polar = polar_type();
        let reference = cartesian();
        let transformed = transform_coordinates(
            &CoordinateFrame::new(&reference),
            &CoordinateFrame::new(&polar),
            array![[0.0, 90.0], [2.0, 3.0]],
        )
        .unwrap();
        assert_abs_diff_eq!(transformed.values[[0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(transformed.values[[1, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(transformed.values[[0, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(transformed.values[[1, 1]], 3.0, epsilon = 1e-12);
        assert_eq!(transformed.units, reference.default_units());
    }

    #[test]
    fn target_units_are_applied_after_transform() {
        let polar = polar_type();
        let reference = cartesian();
        let kilometers = vec![Some(si::KILOMETER.clone()), Some(si::KILOMETER.clone())];
        let transformed = transform_coordinates(
            &CoordinateFrame::new(&reference).with_units(&kilometers),
            &CoordinateFrame::new(&polar),
            array![[0.0], [1500.0]],
        )
        .unwrap();
        assert_abs_diff_eq!(transformed.values[[0, 0]], 1.5, epsilon = 1e-12);
        assert_eq!(transformed.units, kilometers);
    }

    #[test]
    fn one_sided_coordinate_system_is_inconsistent() {
        let reference = cartesian();
        let polar = Arc::new(PolarCoordinateSystem::new(cartesian()).unwrap())
            as Arc<dyn CoordinateSystem>;
        let polar_type = polar_type();
        let err = transform_coordinates(
            &CoordinateFrame::new(&polar_type).with_coordinate_system(Some(&polar)),
            &CoordinateFrame::new(&polar_type),
            array![[0.0], [1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, SetError::Inconsistent(_)));

        let unrelated = RealTupleType::generic(2);
        let err = transform_coordinates(
            &CoordinateFrame::new(&unrelated),
            &CoordinateFrame::new(&reference),
            array![[0.0], [1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, SetError::Inconsistent(_)));
    }

    #[test]
    fn errors_propagate_through_transform() {
        let polar = polar_type();
        let reference = cartesian();
        let errors = vec![
            Some(ErrorEstimate::new(2.0, 90.0, 1, Some(si::DEGREE.clone()))),
            Some(ErrorEstimate::new(0.2, 2.0, 1, Some(si::METER.clone()))),
        ];
        let transformed = transform_coordinates(
            &CoordinateFrame::new(&reference),
            &CoordinateFrame::new(&polar).with_errors(&errors),
            array![[90.0], [2.0]],
        )
        .unwrap();
        assert_eq!(transformed.errors.len(), 2);
        let x_error = transformed.errors[0].as_ref().unwrap();
        let expected = 4.0 * (1.0f64).to_radians().sin();
        assert_abs_diff_eq!(x_error.error(), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(x_error.mean(), 0.0, epsilon = 1e-9);
        let y_error = transformed.errors[1].as_ref().unwrap();
        assert_abs_diff_eq!(y_error.error(), 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(y_error.mean(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn partial_errors_pass_through_unchanged() {
        let polar = polar_type();
        let reference = cartesian();
        let errors = vec![
            Some(ErrorEstimate::new(2.0, 90.0, 1, Some(si::DEGREE.clone()))),
            None,
        ];
        let transformed = transform_coordinates_free_units(
            &CoordinateFrame::new(&reference),
            &CoordinateFrame::new(&polar).with_errors(&errors),
            array![[90.0], [2.0]],
        )
        .unwrap();
        assert_abs_diff_eq!(transformed.values[[0, 0]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transformed.values[[1, 0]], 2.0, epsilon = 1e-9);
        assert_eq!(transformed.errors, errors);
    }
}
