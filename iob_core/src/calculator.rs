//! Dose recommendation.
//!
//! Runs the whole calculation for one request:
//! - Resolve the effective glucose (manual override wins over the live reading)
//! - Validate inputs and settings against clinical ranges
//! - Evaluate insulin on board
//! - Carb coverage + correction - IOB
//! - Classify the risk of the result

use crate::dose::{calculate_carb_coverage, calculate_correction_dose, calculate_total_dose};
use crate::iob::calculate_iob;
use crate::risk::{assess_risk, RiskAssessment, RiskThresholds};
use crate::validation::{validate_calculation_inputs, CalculationInputs};
use crate::{CalculatorSettings, InsulinDose, IobResult, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the user is about to eat and their glucose
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DoseRequest {
    /// Grams of carbohydrate
    pub carbs: f64,
    /// Live sensor reading, mg/dL
    pub current_glucose: Option<f64>,
    /// Fingerstick or other manual entry, mg/dL
    pub manual_glucose: Option<f64>,
}

impl DoseRequest {
    /// Manual entry if given, otherwise the live reading
    pub fn effective_glucose(&self) -> Option<f64> {
        self.manual_glucose.or(self.current_glucose)
    }
}

/// A computed dose recommendation
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DoseRecommendation {
    pub carb_coverage: f64,
    pub correction_dose: f64,
    pub insulin_on_board: f64,
    /// Carb coverage + correction - IOB, floored at 0
    pub total_dose: f64,
    pub effective_glucose: Option<f64>,
    pub risk: RiskAssessment,
    pub iob: IobResult,
}

/// Recommend a dose for `request` given the dose history at `now`
///
/// Without a glucose reading the correction term is 0 and the risk is
/// reported as low.
pub fn recommend_dose(
    request: &DoseRequest,
    history: &[InsulinDose],
    settings: &CalculatorSettings,
    thresholds: &RiskThresholds,
    now: DateTime<Utc>,
) -> Result<DoseRecommendation> {
    let effective_glucose = request.effective_glucose();

    validate_calculation_inputs(&CalculationInputs {
        carbs: Some(request.carbs),
        current_glucose: effective_glucose,
        target_glucose: Some(settings.target_glucose),
        insulin_to_carb: Some(settings.insulin_to_carb),
        correction_factor: Some(settings.correction_factor),
    })?;

    let iob = calculate_iob(history, now)?;
    let carb_coverage = calculate_carb_coverage(request.carbs, settings.insulin_to_carb)?;
    let correction_dose = match effective_glucose {
        Some(glucose) => {
            calculate_correction_dose(glucose, settings.target_glucose, settings.correction_factor)?
        }
        None => 0.0,
    };
    let total_dose = calculate_total_dose(carb_coverage, correction_dose, iob.total_iob)?;
    let risk = assess_risk(effective_glucose, iob.total_iob, total_dose, thresholds);

    tracing::info!(
        "Recommended {:.2}u (carbs {:.2}u + correction {:.2}u - IOB {:.2}u), risk {}",
        total_dose,
        carb_coverage,
        correction_dose,
        iob.total_iob,
        risk.level
    );

    Ok(DoseRecommendation {
        carb_coverage,
        correction_dose,
        insulin_on_board: iob.total_iob,
        total_dose,
        effective_glucose,
        risk,
        iob,
    })
}
