mod common;

use approx::assert_abs_diff_eq;
use gridset::{
    coord_sys::{
        polar::PolarCoordinateSystem, transform_coordinates, CoordinateFrame, CoordinateSystem,
    },
    set::{
        gridded_1d::Gridded1DSet,
        irregular::{Irregular1DSet, Irregular2DSet},
        linear::LinearNDSet,
        product::ProductSet,
        union::UnionSet,
    },
    types::{RealTupleType, RealType},
    units::si,
    AnySet, GriddedGeometry, SampledSet, SetFrame,
};
use ndarray::prelude::*;
use rand::Rng;
use std::sync::Arc;

#[test]
fn gridded_1d_grid_round_trips() {
    let mut rng = common::rng();
    let values = common::random_monotonic_values(&mut rng, 50);
    let set = Gridded1DSet::from_values(SetFrame::generic(1), values).unwrap();
    let grid = common::random_grid(&mut rng, &[50], 500);
    let recovered = set
        .value_to_grid(set.grid_to_value(grid.view()).unwrap().view())
        .unwrap();
    common::assert_arrays_close(recovered.view(), grid.view(), 1e-9);
}

#[test]
fn linear_nd_grid_round_trips() {
    let mut rng = common::rng();
    let lengths = [7, 5, 3];
    let set = LinearNDSet::new(
        SetFrame::generic(3),
        &[-1.0, 10.0, 0.0],
        &[2.0, 0.0, 0.5],
        &lengths,
    )
    .unwrap();
    let grid = common::random_grid(&mut rng, &lengths, 200);
    let recovered = set
        .value_to_grid(set.grid_to_value(grid.view()).unwrap().view())
        .unwrap();
    common::assert_arrays_close(recovered.view(), grid.view(), 1e-9);
}

#[test]
fn warped_2d_grid_round_trips() {
    let mut rng = common::rng();
    let set = common::warped_grid(12, 9);
    let gridded = set.as_gridded().unwrap();
    let grid = common::random_grid(&mut rng, &[12, 9], 300);
    let values = gridded.grid_to_value(grid.view()).unwrap();
    let recovered = gridded.value_to_grid(values.view()).unwrap();
    common::assert_arrays_close(recovered.view(), grid.view(), 1e-6);
}

#[test]
fn interpolation_weights_sum_to_one() {
    let mut rng = common::rng();
    let set = common::warped_grid(6, 6);
    let values = set
        .as_gridded()
        .unwrap()
        .grid_to_value(common::random_grid(&mut rng, &[6, 6], 200).view())
        .unwrap();
    let interps = set.value_to_interp(values.view()).unwrap();
    for interp in &interps {
        let interp = interp.as_ref().unwrap();
        assert!((interp.total_weight() - 1.0).abs() <= 1e-5);
    }
    let interpolated = common::interpolate(set.as_sampled(), &interps);
    common::assert_arrays_close(interpolated.view(), values.view(), 1e-6);
}

#[test]
fn product_index_decomposes_into_constituents() {
    let a: AnySet<f64> = Gridded1DSet::from_values(SetFrame::generic(1), vec![1.0, 2.0, 4.0, 8.0])
        .unwrap()
        .into();
    let b: AnySet<f64> = Gridded1DSet::from_values(SetFrame::generic(1), vec![-1.0, 1.0])
        .unwrap()
        .into();
    let product = ProductSet::new(vec![a.clone(), b.clone()]).unwrap();
    assert_eq!(product.len(), 8);
    let value = product.index_to_value(&[3]).unwrap();
    assert_eq!(value[[0, 0]], a.index_to_value(&[3]).unwrap()[[0, 0]]);
    assert_eq!(value[[1, 0]], b.index_to_value(&[0]).unwrap()[[0, 0]]);
    assert_eq!(product.value_to_index(value.view()).unwrap(), vec![Some(3)]);
}

#[test]
fn union_index_classifies_into_constituents() {
    let first: AnySet<f64> =
        Gridded1DSet::from_values(SetFrame::generic(1), (0..8).map(|i| i as f64).collect())
            .unwrap()
            .into();
    let second: AnySet<f64> = Irregular1DSet::new(
        SetFrame::generic(1),
        array![[30.0, 20.0, 25.0, 10.0, 15.0, 12.5]],
    )
    .unwrap()
    .into();
    let union = UnionSet::new(vec![first, second.clone()]).unwrap();
    assert_eq!(union.len(), 14);
    assert_eq!(
        union.index_to_value(&[9]).unwrap(),
        second.index_to_value(&[1]).unwrap()
    );
    assert_eq!(
        union.value_to_index(array![[19.0]].view()).unwrap(),
        vec![Some(9)]
    );
}

#[test]
fn triangle_walk_terminates_on_random_points() {
    let mut rng = common::rng();
    let samples = Array2::from_shape_fn((2, 200), |_| rng.gen_range(0.0..1.0));
    let set = Irregular2DSet::new(SetFrame::generic(2), samples).unwrap();
    let queries = Array2::from_shape_fn((2, 1000), |_| rng.gen_range(-0.2..1.2));
    let triangles = set.value_to_tri(queries.view()).unwrap();
    assert_eq!(triangles.len(), 1000);
    let interps = set.value_to_interp(queries.view()).unwrap();
    let interpolated = common::interpolate(&set, &interps);
    for ((interp, query), value) in interps
        .iter()
        .zip(queries.axis_iter(Axis(1)))
        .zip(interpolated.axis_iter(Axis(1)))
    {
        let well_inside = query.iter().all(|&q| (0.2..=0.8).contains(&q));
        match interp {
            Some(interp) => {
                assert_abs_diff_eq!(interp.total_weight(), 1.0, epsilon = 1e-9);
                assert!(interp.weights.iter().all(|&w| w >= -1e-9 && w <= 1.0 + 1e-9));
                assert_abs_diff_eq!(value[0], query[0], epsilon = 1e-9);
                assert_abs_diff_eq!(value[1], query[1], epsilon = 1e-9);
            }
            None => assert!(!well_inside, "point {} was not located", query),
        }
    }
}

#[test]
fn polar_round_trip_is_idempotent() {
    let mut rng = common::rng();
    let cs = PolarCoordinateSystem::new(RealTupleType::generic(2)).unwrap();
    let values = Array2::from_shape_fn((2, 100), |(dim, _)| {
        if dim == 0 {
            rng.gen_range(0.0..179.0)
        } else {
            rng.gen_range(0.1..10.0)
        }
    });
    let once = cs.from_reference(cs.to_reference(values.clone()).unwrap()).unwrap();
    let twice = cs.from_reference(cs.to_reference(once.clone()).unwrap()).unwrap();
    common::assert_arrays_close(once.view(), values.view(), 1e-9);
    common::assert_arrays_close(twice.view(), once.view(), 1e-9);
}

#[test]
fn polar_values_transform_to_cartesian_kilometers() {
    let cartesian = RealTupleType::new(vec![
        RealType::new("x", Some(si::METER.clone())),
        RealType::new("y", Some(si::METER.clone())),
    ]);
    let polar: Arc<dyn CoordinateSystem> =
        Arc::new(PolarCoordinateSystem::new(cartesian.clone()).unwrap());
    let polar_type = RealTupleType::with_coordinate_system(
        vec![
            RealType::new("longitude", Some(si::DEGREE.clone())),
            RealType::new("radius", Some(si::METER.clone())),
        ],
        polar,
    )
    .unwrap();
    let kilometers = [Some(si::KILOMETER.clone()), Some(si::KILOMETER.clone())];
    let target = CoordinateFrame::new(&cartesian).with_units(&kilometers);
    let source = CoordinateFrame::new(&polar_type);
    let transformed =
        transform_coordinates(&target, &source, array![[90.0, 0.0], [2000.0, 500.0]]).unwrap();
    assert_abs_diff_eq!(transformed.values[[0, 0]], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(transformed.values[[1, 0]], 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(transformed.values[[0, 1]], 0.5, epsilon = 1e-9);
    assert_eq!(transformed.units, kilometers.to_vec());
}

#[test]
fn single_precision_sets_agree_with_double_precision() {
    let values = vec![0.0, 0.5, 1.5, 3.0, 5.0];
    let single = Gridded1DSet::from_values(
        SetFrame::generic(1),
        values.iter().map(|&v| v as f32).collect(),
    )
    .unwrap();
    let double = Gridded1DSet::from_values(SetFrame::generic(1), values).unwrap();
    let grid_single = single.value_to_grid(array![[0.25f32, 2.0, 4.75]].view()).unwrap();
    let grid_double = double.value_to_grid(array![[0.25, 2.0, 4.75]].view()).unwrap();
    for (s, d) in grid_single.iter().zip(grid_double.iter()) {
        assert_abs_diff_eq!(*s as f64, *d, epsilon = 1e-5);
    }
}
