//! Dose risk classification.
//!
//! Combines the effective glucose reading, insulin on board and the
//! proposed dose into an advisory risk level. The result is a warning to
//! show the user; it never blocks a dose.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory risk level for a proposed dose
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(name)
    }
}

/// Risk level plus guidance text for the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub message: String,
}

/// Thresholds for the classifier
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RiskThresholds {
    /// Glucose (mg/dL) below which any dose is high risk
    #[serde(default = "default_hypo_glucose")]
    pub hypo_glucose: f64,

    /// Glucose (mg/dL) below which a larger dose is medium risk
    #[serde(default = "default_low_glucose")]
    pub low_glucose: f64,

    /// Dose (units) above which a low reading becomes medium risk
    #[serde(default = "default_low_glucose_max_dose")]
    pub low_glucose_max_dose: f64,

    /// Insulin on board (units) above which stacking is medium risk
    #[serde(default = "default_max_insulin_on_board")]
    pub max_insulin_on_board: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            hypo_glucose: default_hypo_glucose(),
            low_glucose: default_low_glucose(),
            low_glucose_max_dose: default_low_glucose_max_dose(),
            max_insulin_on_board: default_max_insulin_on_board(),
        }
    }
}

fn default_hypo_glucose() -> f64 {
    80.0
}

fn default_low_glucose() -> f64 {
    100.0
}

fn default_low_glucose_max_dose() -> f64 {
    2.0
}

fn default_max_insulin_on_board() -> f64 {
    3.0
}

/// Classify the risk of taking `adjusted_dose` units now
///
/// Rules, first match wins:
/// 1. No glucose reading → low (nothing to assess against)
/// 2. Glucose below `hypo_glucose` → high
/// 3. Glucose below `low_glucose` with a dose above `low_glucose_max_dose` → medium
/// 4. Insulin on board above `max_insulin_on_board` → medium
/// 5. Otherwise → low
pub fn assess_risk(
    effective_glucose: Option<f64>,
    insulin_on_board: f64,
    adjusted_dose: f64,
    thresholds: &RiskThresholds,
) -> RiskAssessment {
    let (level, message) = match effective_glucose {
        None => (
            RiskLevel::Low,
            "No glucose reading available; unable to assess dose risk.".to_string(),
        ),
        Some(glucose) if glucose < thresholds.hypo_glucose => (
            RiskLevel::High,
            "High risk of hypoglycemia. Consider reducing dose or having carbs first.".to_string(),
        ),
        Some(glucose)
            if glucose < thresholds.low_glucose && adjusted_dose > thresholds.low_glucose_max_dose =>
        {
            (
                RiskLevel::Medium,
                format!(
                    "Glucose is below {} mg/dL. Consider a smaller dose and monitor closely.",
                    thresholds.low_glucose
                ),
            )
        }
        Some(_) if insulin_on_board > thresholds.max_insulin_on_board => (
            RiskLevel::Medium,
            format!(
                "{:.2} units of insulin still on board. Watch for insulin stacking.",
                insulin_on_board
            ),
        ),
        Some(_) => (
            RiskLevel::Low,
            "Dose appears safe based on current parameters.".to_string(),
        ),
    };

    tracing::debug!(
        "Risk {} (glucose {:?}, IOB {:.2}u, dose {:.2}u)",
        level,
        effective_glucose,
        insulin_on_board,
        adjusted_dose
    );

    RiskAssessment { level, message }
}
