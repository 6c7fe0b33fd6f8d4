//! Tolerance constants for control-rate tests.

/// Floating point rounding errors for values that should be exact.
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Accumulated error after many control ticks (phase sums, envelope clocks).
pub const TICK_EPSILON: f64 = 1e-6;
