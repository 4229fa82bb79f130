//! Coordinate system built from independent coordinate systems on
//! consecutive groups of components.

use super::{CoordinateSystem, CoordinateSystemBase};
use crate::{ensure, error::Result, types::RealTupleType, units::fun};
use ndarray::{s, Array2};
use std::{any::Any, sync::Arc};

/// Product of coordinate systems, each acting on its own consecutive
/// components of the values.
#[derive(Clone, Debug)]
pub struct CartesianProductCoordinateSystem {
    base: CoordinateSystemBase,
    systems: Vec<Arc<dyn CoordinateSystem>>,
}

impl CartesianProductCoordinateSystem {
    /// Creates the product of the given coordinate systems.
    ///
    /// The reference and units concatenate those of the components.
    pub fn new(systems: Vec<Arc<dyn CoordinateSystem>>) -> Result<Self> {
        ensure!(
            !systems.is_empty(),
            DimensionMismatch,
            "product needs at least one coordinate system"
        );
        let reference = RealTupleType::concat(systems.iter().map(|cs| cs.reference()));
        let units = systems
            .iter()
            .flat_map(|cs| cs.coordinate_system_units().to_vec())
            .collect();
        let base = CoordinateSystemBase::new(reference, units)?;
        Ok(Self { base, systems })
    }

    pub fn systems(&self) -> &[Arc<dyn CoordinateSystem>] {
        &self.systems
    }

    /// Applies the given transform of each component system to its rows.
    fn apply<T>(&self, values: Array2<fun>, transform: T) -> Result<Array2<fun>>
    where
        T: Fn(&dyn CoordinateSystem, Array2<fun>) -> Result<Array2<fun>>,
    {
        self.base.check_values(&values)?;
        let mut result = Array2::zeros(values.raw_dim());
        let mut start = 0;
        for cs in &self.systems {
            let end = start + cs.dimension();
            let transformed = transform(cs.as_ref(), values.slice(s![start..end, ..]).to_owned())?;
            result.slice_mut(s![start..end, ..]).assign(&transformed);
            start = end;
        }
        Ok(result)
    }
}

impl CoordinateSystem for CartesianProductCoordinateSystem {
    fn base(&self) -> &CoordinateSystemBase {
        &self.base
    }

    fn to_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.apply(values, |cs, values| cs.to_reference(values))
    }

    fn from_reference(&self, values: Array2<fun>) -> Result<Array2<fun>> {
        self.apply(values, |cs, values| cs.from_reference(values))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn CoordinateSystem) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .map_or(false, |other| {
                other.systems.len() == self.systems.len()
                    && other
                        .systems
                        .iter()
                        .zip(&self.systems)
                        .all(|(a, b)| a.equals(b.as_ref()))
            })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        coord_sys::polar::PolarCoordinateSystem,
        types::RealType,
        units::si,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    fn polar() -> Arc<dyn CoordinateSystem> {
        Arc::new(
            PolarCoordinateSystem::new(RealTupleType::new(vec![
                RealType::new("x", None),
                RealType::new("y", None),
            ]))
            .unwrap(),
        )
    }

    #[test]
    fn components_transform_independently() {
        let cs = CartesianProductCoordinateSystem::new(vec![polar(), polar()]).unwrap();
        assert_eq!(cs.dimension(), 4);
        assert_eq!(
            cs.coordinate_system_units(),
            &[Some(si::DEGREE.clone()), None, Some(si::DEGREE.clone()), None]
        );
        let reference = cs
            .to_reference(array![[90.0, 0.0], [2.0, 1.0], [0.0, 180.0], [3.0, 1.0]])
            .unwrap();
        assert_abs_diff_eq!(reference[[0, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(reference[[1, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(reference[[2, 0]], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(reference[[2, 1]], -1.0, epsilon = 1e-12);
        let back = cs.from_reference(reference).unwrap();
        assert_abs_diff_eq!(back[[0, 0]], 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back[[3, 0]], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn products_compare_by_components() {
        let a = CartesianProductCoordinateSystem::new(vec![polar(), polar()]).unwrap();
        let b = CartesianProductCoordinateSystem::new(vec![polar(), polar()]).unwrap();
        let c = CartesianProductCoordinateSystem::new(vec![polar()]).unwrap();
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert!(CartesianProductCoordinateSystem::new(Vec::new()).is_err());
    }
}
