//! Tolerance constants for decoder testing.
//!
//! Different comparisons require different precision levels.

/// Floating point rounding errors.
/// Use when the same computation runs twice on the same backend.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Per-logit tolerance when the arithmetic order may differ
/// (permuted gate layouts, CPU vs GPU).
pub const LOGIT_EPSILON: f32 = 1e-4;

/// Committed bound on the cumulative absolute logit error of the golden trace.
pub const PARITY_TOLERANCE: f32 = genie::PARITY_TOLERANCE;
