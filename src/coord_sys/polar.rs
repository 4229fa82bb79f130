//! Polar coordinates (longitude in degrees, radius) over a 2D Cartesian reference.

use super::{CoordinateSystem, CoordinateSystemBase};
use crate::{
    constants::DEGREES_PER_RADIAN,
    ensure,
    error::Result,
    types::RealTupleType,
    units::{fun, si},
};
use ndarray::{Array2, Zip};
use std::any::Any;

/// Coordinate system for (longitude, radius) values whose reference is a
/// 2D Cartesian (x, y) tuple.
#[derive(Clone, Debug)]
pub struct PolarCoordinateSystem {
    base: CoordinateSystemBase,
}

impl PolarCoordinateSystem {
    /// Creates a polar coordinate system over the given 2D reference.
    pub fn new(reference: RealTupleType) -> Result<Self> {
        ensure!(
            reference.dimension() == 2,
            DimensionMismatch,
            "polar reference must have dimension 2, not {}",
            reference.dimension()
        );
        let base = CoordinateSystemBase::new(reference, vec![Some(si::DEGREE.clone()), None])?;
        Ok(Self { base })
    }
}

impl CoordinateSystem for PolarCoordinateSystem {
    fn base(&self) -> &CoordinateSystemBase {
        &self.base
    }

    fn to_reference(&self, mut values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        let (mut longitudes, mut radii) = values.multi_slice_mut((
            ndarray::s![0, ..],
            ndarray::s![1, ..],
        ));
        Zip::from(&mut longitudes)
            .and(&mut radii)
            .for_each(|longitude, radius| {
                let (sin, cos) = (*longitude / DEGREES_PER_RADIAN).sin_cos();
                let r = *radius;
                *longitude = r * cos;
                *radius = r * sin;
            });
        Ok(values)
    }

    /// Longitudes computed as negative are shifted by 180 degrees only,
    /// so the result is not a full normalization into [0, 360).
    fn from_reference(&self, mut values: Array2<fun>) -> Result<Array2<fun>> {
        self.base.check_values(&values)?;
        let (mut xs, mut ys) = values.multi_slice_mut((ndarray::s![0, ..], ndarray::s![1, ..]));
        Zip::from(&mut xs).and(&mut ys).for_each(|x, y| {
            let radius = x.hypot(*y);
            let mut longitude = y.atan2(*x) * DEGREES_PER_RADIAN;
            if longitude < 0.0 {
                longitude += 180.0;
            }
            *x = longitude;
            *y = radius;
        });
        Ok(values)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn CoordinateSystem) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .map_or(false, |other| other.reference() == self.reference())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::types::RealType;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    fn polar() -> PolarCoordinateSystem {
        PolarCoordinateSystem::new(RealTupleType::new(vec![
            RealType::new("x", None),
            RealType::new("y", None),
        ]))
        .unwrap()
    }

    #[test]
    fn polar_round_trip_works_in_upper_half_plane() {
        let cs = polar();
        let values = array![[0.0, 30.0, 90.0, 179.0], [1.0, 2.0, 0.5, 4.0]];
        let reference = cs.to_reference(values.clone()).unwrap();
        assert_abs_diff_eq!(reference[[0, 2]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(reference[[1, 2]], 0.5, epsilon = 1e-12);
        let back = cs.from_reference(reference).unwrap();
        for (original, recovered) in values.iter().zip(back.iter()) {
            assert_abs_diff_eq!(*original, *recovered, epsilon = 1e-9);
        }
    }

    #[test]
    fn negative_longitudes_are_shifted_by_half_turn() {
        // (-1, -1) lies at -135 degrees, which comes back as 45 degrees.
        let cs = polar();
        let back = cs.from_reference(array![[-1.0, 1.0], [-1.0, -1.0]]).unwrap();
        assert_abs_diff_eq!(back[[0, 0]], 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back[[0, 1]], 135.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back[[1, 0]], fun::sqrt(2.0), epsilon = 1e-12);
    }

    #[test]
    fn single_precision_goes_through_double() {
        let cs = polar();
        let reference = cs.to_reference_f32(array![[90.0f32], [2.0]]).unwrap();
        assert_abs_diff_eq!(reference[[0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(reference[[1, 0]], 2.0, epsilon = 1e-6);
        let back = cs.from_reference_f32(reference).unwrap();
        assert_abs_diff_eq!(back[[0, 0]], 90.0, epsilon = 1e-4);
    }

    #[test]
    fn wrong_component_count_is_rejected() {
        let cs = polar();
        assert!(cs.to_reference(Array2::zeros((3, 2))).is_err());
        assert!(PolarCoordinateSystem::new(RealTupleType::generic(3)).is_err());
        assert!(cs.equals(&polar()));
    }
}
