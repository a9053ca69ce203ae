//! Dose arithmetic: carbohydrate coverage, correction, and IOB-adjusted total.
//!
//! Each formula validates its own inputs and can be called on its own.

use crate::rounding::round_to_2;
use crate::validation::ensure_finite;
use crate::{Error, Result};

/// Units needed to cover `carbs` grams at an insulin-to-carb ratio of
/// `insulin_to_carb` grams per unit
pub fn calculate_carb_coverage(carbs: f64, insulin_to_carb: f64) -> Result<f64> {
    if carbs.is_nan() || carbs < 0.0 {
        return Err(Error::invalid("Carbs cannot be negative"));
    }
    if insulin_to_carb.is_nan() || insulin_to_carb <= 0.0 {
        return Err(Error::invalid("Insulin-to-carb ratio must be positive"));
    }
    ensure_finite(carbs, "Carbs")?;
    ensure_finite(insulin_to_carb, "Insulin-to-carb ratio")?;

    Ok(round_to_2(carbs / insulin_to_carb))
}

/// Units needed to bring `current_glucose` down to `target_glucose`
///
/// Never negative: at or below target the correction is 0.
pub fn calculate_correction_dose(
    current_glucose: f64,
    target_glucose: f64,
    correction_factor: f64,
) -> Result<f64> {
    if current_glucose.is_nan()
        || target_glucose.is_nan()
        || current_glucose < 0.0
        || target_glucose < 0.0
    {
        return Err(Error::invalid("Glucose values cannot be negative"));
    }
    if correction_factor.is_nan() || correction_factor <= 0.0 {
        return Err(Error::invalid("Correction factor must be positive"));
    }
    ensure_finite(current_glucose, "Current glucose")?;
    ensure_finite(target_glucose, "Target glucose")?;
    ensure_finite(correction_factor, "Correction factor")?;

    let excess = (current_glucose - target_glucose).max(0.0);
    Ok(round_to_2(excess / correction_factor))
}

/// Recommended units after subtracting insulin already on board
///
/// IOB can cancel the recommendation out but never push it below 0.
pub fn calculate_total_dose(carb_coverage: f64, correction_dose: f64, current_iob: f64) -> Result<f64> {
    let inputs = [carb_coverage, correction_dose, current_iob];
    if inputs.iter().any(|v| v.is_nan() || *v < 0.0) {
        return Err(Error::invalid("All dose values must be non-negative"));
    }
    if inputs.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid("All dose values must be finite numbers"));
    }

    Ok(round_to_2((carb_coverage + correction_dose - current_iob).max(0.0)))
}
