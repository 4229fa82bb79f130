//! The `gridset` crate provides sampled sets and coordinate systems for
//! resampling gridded and scattered data.

pub mod constants;
pub mod coord_sys;
pub mod error;
pub mod estimate;
pub mod num;
pub mod set;
pub mod types;
pub mod units;

pub use error::{Result, SetError};
pub use set::{AnySet, GriddedGeometry, Interpolant, SampledSet, SetFrame};
