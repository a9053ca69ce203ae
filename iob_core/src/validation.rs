//! Clinical range checks for calculator inputs.
//!
//! Bounds are inclusive. Only the fields present are checked, so a
//! partially filled form can be validated as it is completed.

use crate::{Error, Result};
use std::ops::RangeInclusive;

/// Grams
pub const CARBS_RANGE: RangeInclusive<f64> = 0.0..=500.0;
/// mg/dL
pub const CURRENT_GLUCOSE_RANGE: RangeInclusive<f64> = 20.0..=600.0;
/// mg/dL
pub const TARGET_GLUCOSE_RANGE: RangeInclusive<f64> = 70.0..=180.0;
/// Grams per unit
pub const INSULIN_TO_CARB_RANGE: RangeInclusive<f64> = 1.0..=50.0;
/// mg/dL per unit
pub const CORRECTION_FACTOR_RANGE: RangeInclusive<f64> = 10.0..=200.0;

/// Calculator inputs, any subset of which may be filled in
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalculationInputs {
    pub carbs: Option<f64>,
    pub current_glucose: Option<f64>,
    pub target_glucose: Option<f64>,
    pub insulin_to_carb: Option<f64>,
    pub correction_factor: Option<f64>,
}

/// Check every present field against its clinical range
///
/// Fails on the first out-of-range field, in declaration order.
pub fn validate_calculation_inputs(inputs: &CalculationInputs) -> Result<()> {
    check(
        inputs.carbs,
        &CARBS_RANGE,
        "Carbs must be between 0 and 500 grams",
    )?;
    check(
        inputs.current_glucose,
        &CURRENT_GLUCOSE_RANGE,
        "Current glucose must be between 20 and 600 mg/dL",
    )?;
    check(
        inputs.target_glucose,
        &TARGET_GLUCOSE_RANGE,
        "Target glucose must be between 70 and 180 mg/dL",
    )?;
    check(
        inputs.insulin_to_carb,
        &INSULIN_TO_CARB_RANGE,
        "Insulin-to-carb ratio must be between 1 and 50",
    )?;
    check(
        inputs.correction_factor,
        &CORRECTION_FACTOR_RANGE,
        "Correction factor must be between 10 and 200",
    )?;
    Ok(())
}

/// Reject infinities and NaN with a message naming `field`
pub(crate) fn ensure_finite(value: f64, field: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("{} must be a finite number", field)))
    }
}

fn check(value: Option<f64>, range: &RangeInclusive<f64>, message: &str) -> Result<()> {
    match value {
        // NaN is never contained
        Some(v) if !range.contains(&v) => {
            tracing::debug!("Rejected calculator input {}: {}", v, message);
            Err(Error::invalid(message))
        }
        _ => Ok(()),
    }
}
