//! Numeric guards for scalars read from collaborator-owned state.
//!
//! Corrupt numbers (NaN, infinities, values outside their documented
//! range) are replaced at the point of use by a safe default and logged.
//! They are never propagated and never turned into errors.

use tracing::warn;

/// Return `value` if finite, otherwise log and return `fallback`.
pub fn finite_or(value: f64, fallback: f64, field: &'static str) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(field, value, fallback, "Non-finite scalar replaced");
        fallback
    }
}

/// Clamp a scalar to `0.0..=1.0`, replacing non-finite values with `fallback`.
pub fn unit_interval(value: f64, fallback: f64, field: &'static str) -> f64 {
    let v = finite_or(value, fallback, field);
    if (0.0..=1.0).contains(&v) {
        v
    } else {
        warn!(field, value = v, "Scalar outside 0..=1 clamped");
        v.clamp(0.0, 1.0)
    }
}

/// Clamp a scalar to `0.0..`, replacing non-finite values with `fallback`.
pub fn non_negative(value: f64, fallback: f64, field: &'static str) -> f64 {
    let v = finite_or(value, fallback, field);
    if v < 0.0 {
        warn!(field, value = v, "Negative scalar clamped to zero");
        0.0
    } else {
        v
    }
}
