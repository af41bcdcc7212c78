// Purpose: To store control-chart constants that are used in the program
pub const GUIDE_SET_BAND_WIDTH: i32 = 3; // mean +/- 3 standard deviations
pub const MOVING_RANGE_UPPER_LIMIT_WEIGHT: f64 = 3.268; // D4 constant, subgroups of two
pub const CUSUM_WEIGHT_FACTOR: f64 = 0.5; // allowable slack k, in standard deviations
pub const CUSUM_CONTROL_LIMIT: f64 = 5.0; // decision interval h, in standard deviations

// Axis finalization
pub const DEGENERATE_RANGE_EPSILON: f64 = 1e-4;
pub const DEFAULT_AXIS_MIN: f64 = 0.0;
pub const DEFAULT_AXIS_MAX: f64 = 1.0;
