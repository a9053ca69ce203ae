//! Insulin activity decay model.
//!
//! Every IOB figure in the crate goes through [`calculate_decay_factor`].

use crate::validation::ensure_finite;
use crate::{Error, Result};

/// Rate numerator of the decay curve: activity falls as `exp(-(4/d) * t)`.
const DECAY_RATE_NUMERATOR: f64 = 4.0;

/// Fraction (0..=1) of a dose still active after `hours_elapsed` hours,
/// for an insulin with a total action time of `duration` hours.
///
/// Exactly 1 at injection, exactly 0 once `hours_elapsed >= duration`,
/// exponential decay in between.
pub fn calculate_decay_factor(hours_elapsed: f64, duration: f64) -> Result<f64> {
    if hours_elapsed.is_nan() || hours_elapsed < 0.0 {
        return Err(Error::invalid("Hours elapsed cannot be negative"));
    }
    if duration.is_nan() || duration <= 0.0 {
        return Err(Error::invalid("Duration must be positive"));
    }
    ensure_finite(hours_elapsed, "Hours elapsed")?;
    ensure_finite(duration, "Duration")?;

    if hours_elapsed == 0.0 {
        return Ok(1.0);
    }
    if hours_elapsed >= duration {
        return Ok(0.0);
    }

    let k = DECAY_RATE_NUMERATOR / duration;
    Ok((-k * hours_elapsed).exp().clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_activity_at_injection() {
        assert_eq!(calculate_decay_factor(0.0, 4.0).unwrap(), 1.0);
        assert_eq!(calculate_decay_factor(0.0, 24.0).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_at_and_after_duration() {
        assert_eq!(calculate_decay_factor(4.0, 4.0).unwrap(), 0.0);
        assert_eq!(calculate_decay_factor(4.01, 4.0).unwrap(), 0.0);
        assert_eq!(calculate_decay_factor(100.0, 4.0).unwrap(), 0.0);
    }

    #[test]
    fn test_midpoint_is_partial() {
        let factor = calculate_decay_factor(2.0, 4.0).unwrap();
        assert!(factor > 0.0 && factor < 1.0);
        // exp(-2)
        assert!((factor - 0.135_335_283).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_negative_hours() {
        let err = calculate_decay_factor(-1.0, 4.0).unwrap_err();
        assert_eq!(err.to_string(), "Hours elapsed cannot be negative");
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let err = calculate_decay_factor(1.0, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "Duration must be positive");

        let err = calculate_decay_factor(1.0, -3.0).unwrap_err();
        assert_eq!(err.to_string(), "Duration must be positive");
    }

    #[test]
    fn test_rejects_nan() {
        assert!(calculate_decay_factor(f64::NAN, 4.0).is_err());
        assert!(calculate_decay_factor(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_infinity() {
        let err = calculate_decay_factor(f64::INFINITY, 4.0).unwrap_err();
        assert_eq!(err.to_string(), "Hours elapsed must be a finite number");

        let err = calculate_decay_factor(1.0, f64::INFINITY).unwrap_err();
        assert_eq!(err.to_string(), "Duration must be a finite number");
    }

    #[test]
    fn test_output_in_unit_range_and_non_increasing() {
        for duration in [0.5, 1.0, 3.0, 4.0, 6.0, 16.0, 24.0] {
            let mut previous = 1.0;
            for step in 0..=200 {
                let hours = step as f64 * 0.15;
                let factor = calculate_decay_factor(hours, duration).unwrap();
                assert!((0.0..=1.0).contains(&factor));
                assert!(factor <= previous, "decay increased at {}h/{}h", hours, duration);
                previous = factor;
            }
        }
    }
}
