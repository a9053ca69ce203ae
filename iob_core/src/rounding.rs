//! Shared two-decimal rounding used by every formula in the engine.

/// Round to 2 decimal places: `round(value * 100) / 100`.
///
/// Halves round away from zero. All engine outputs are non-negative, so
/// this matches round-half-up.
pub fn round_to_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
