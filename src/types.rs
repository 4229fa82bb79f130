//! Named component types for set domains and coordinate system references.

use crate::{coord_sys::CoordinateSystem, ensure, error::Result, units::Unit};
use std::{fmt, sync::Arc};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// A named real-valued quantity with an optional default unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct RealType {
    name: String,
    default_unit: Option<Unit>,
}

impl RealType {
    pub fn new(name: &str, default_unit: Option<Unit>) -> Self {
        Self {
            name: name.to_string(),
            default_unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_unit(&self) -> Option<&Unit> {
        self.default_unit.as_ref()
    }
}

/// An ordered tuple of real types, optionally carrying the coordinate
/// system that relates it to a reference tuple.
#[derive(Clone)]
pub struct RealTupleType {
    components: Vec<RealType>,
    coordinate_system: Option<Arc<dyn CoordinateSystem>>,
}

impl RealTupleType {
    /// Creates a tuple type without a default coordinate system.
    pub fn new(components: Vec<RealType>) -> Self {
        Self {
            components,
            coordinate_system: None,
        }
    }

    /// Creates a tuple type whose values relate to the reference of the
    /// given coordinate system.
    ///
    /// The coordinate system dimension must equal the tuple dimension, and
    /// its units must be convertible to the default units of the tuple.
    pub fn with_coordinate_system(
        components: Vec<RealType>,
        coordinate_system: Arc<dyn CoordinateSystem>,
    ) -> Result<Self> {
        ensure!(
            coordinate_system.dimension() == components.len(),
            DimensionMismatch,
            "coordinate system dimension {} does not match tuple dimension {}",
            coordinate_system.dimension(),
            components.len()
        );
        for (component, unit) in components
            .iter()
            .zip(coordinate_system.coordinate_system_units())
        {
            ensure!(
                Unit::can_convert(unit.as_ref(), component.default_unit()),
                IncompatibleUnits,
                "coordinate system unit {} is not convertible to default unit of {}",
                unit.as_ref()
                    .map_or_else(|| "none".to_string(), |unit| unit.to_string()),
                component.name()
            );
        }
        Ok(Self {
            components,
            coordinate_system: Some(coordinate_system),
        })
    }

    /// Creates an anonymous tuple type of the given dimension.
    pub fn generic(dimension: usize) -> Self {
        Self::new(
            (0..dimension)
                .map(|idx| RealType::new(&format!("Generic_{}", idx), None))
                .collect(),
        )
    }

    /// Concatenates the components of the given tuple types, dropping any
    /// coordinate systems.
    pub fn concat<'a, I>(tuple_types: I) -> Self
    where
        I: IntoIterator<Item = &'a RealTupleType>,
    {
        Self::new(
            tuple_types
                .into_iter()
                .flat_map(|tuple_type| tuple_type.components.iter().cloned())
                .collect(),
        )
    }

    pub fn dimension(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[RealType] {
        &self.components
    }

    pub fn coordinate_system(&self) -> Option<&Arc<dyn CoordinateSystem>> {
        self.coordinate_system.as_ref()
    }

    pub fn default_units(&self) -> Vec<Option<Unit>> {
        self.components
            .iter()
            .map(|component| component.default_unit.clone())
            .collect()
    }

    /// Returns the same tuple type without its coordinate system.
    pub fn without_coordinate_system(&self) -> Self {
        Self::new(self.components.clone())
    }
}

impl PartialEq for RealTupleType {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl fmt::Debug for RealTupleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<_> = self.components.iter().map(RealType::name).collect();
        write!(f, "RealTupleType({})", names.join(", "))?;
        if self.coordinate_system.is_some() {
            write!(f, " with coordinate system")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{coord_sys::polar::PolarCoordinateSystem, error::SetError, units::si};

    fn cartesian() -> RealTupleType {
        RealTupleType::new(vec![
            RealType::new("x", Some(si::METER.clone())),
            RealType::new("y", Some(si::METER.clone())),
        ])
    }

    #[test]
    fn tuple_type_equality_ignores_coordinate_system() {
        let polar = Arc::new(PolarCoordinateSystem::new(cartesian()).unwrap());
        let with_cs = RealTupleType::with_coordinate_system(
            vec![
                RealType::new("longitude", Some(si::DEGREE.clone())),
                RealType::new("radius", Some(si::METER.clone())),
            ],
            polar,
        )
        .unwrap();
        assert_eq!(with_cs.without_coordinate_system(), with_cs);
        assert!(with_cs.coordinate_system().is_some());
        assert_ne!(with_cs, cartesian());
    }

    #[test]
    fn coordinate_system_units_must_fit_components() {
        let polar = Arc::new(PolarCoordinateSystem::new(cartesian()).unwrap());
        let err = RealTupleType::with_coordinate_system(
            vec![
                RealType::new("time", Some(si::SECOND.clone())),
                RealType::new("radius", Some(si::METER.clone())),
            ],
            polar.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, SetError::IncompatibleUnits(_)));

        let err = RealTupleType::with_coordinate_system(
            vec![RealType::new("longitude", None)],
            polar,
        )
        .unwrap_err();
        assert!(matches!(err, SetError::DimensionMismatch(_)));
    }

    #[test]
    fn concatenated_types_keep_component_order() {
        let concatenated = RealTupleType::concat([&cartesian(), &RealTupleType::generic(1)]);
        let names: Vec<_> = concatenated.components().iter().map(RealType::name).collect();
        assert_eq!(names, vec!["x", "y", "Generic_0"]);
    }
}
