//! Numerical constants and tolerances.

/// Floating-point precision to use for constants.
#[allow(non_camel_case_types)]
pub type fcn = f64;

// Mathematical constants

pub const PI: fcn = std::f64::consts::PI;
pub const DEGREES_PER_RADIAN: fcn = 180.0 / PI;

// Grid conventions

/// Distance beyond the outermost grid points that is still inside a grid.
pub const GRID_EDGE: fcn = 0.5;

// Search tolerances

/// Maximum number of Newton iterations when inverting a multidimensional grid cell.
pub const MAX_NEWTON_ITERATIONS: usize = 50;
/// Convergence threshold for Newton iterations, in grid coordinates.
pub const NEWTON_TOLERANCE: fcn = 1e-9;
/// Maximum number of cells visited when walking between grid cells.
pub const MAX_CELL_WALK_STEPS: usize = 100;
/// Slack on the local cell coordinates within which a value counts as inside a cell.
pub const CELL_EDGE_TOLERANCE: fcn = 1e-6;
/// Relative tolerance when matching query values against stored samples.
pub const SAMPLE_MATCH_TOLERANCE: fcn = 1e-12;
