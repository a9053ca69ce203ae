//! Core domain types for the IOB engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Insulin types and the standard action-duration table
//! - Dose records
//! - IOB evaluation results
//! - Calculator settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::ensure_finite;
use crate::Error;

// ============================================================================
// Insulin Types
// ============================================================================

/// Class of insulin, by speed of action
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsulinType {
    Rapid,
    Short,
    Intermediate,
    Long,
}

/// Standard action duration in hours for each insulin type.
pub const STANDARD_INSULIN_DURATIONS: [(InsulinType, f64); 4] = [
    (InsulinType::Rapid, standard_duration(InsulinType::Rapid)),
    (InsulinType::Short, standard_duration(InsulinType::Short)),
    (InsulinType::Intermediate, standard_duration(InsulinType::Intermediate)),
    (InsulinType::Long, standard_duration(InsulinType::Long)),
];

/// Longest action duration (hours) accepted for a dose or a settings override
pub const MAX_ACTION_DURATION_HOURS: f64 = 48.0;

const fn standard_duration(insulin_type: InsulinType) -> f64 {
    match insulin_type {
        InsulinType::Rapid => 4.0,
        InsulinType::Short => 6.0,
        InsulinType::Intermediate => 16.0,
        InsulinType::Long => 24.0,
    }
}

/// Look up the standard action duration (hours) for an insulin type
pub fn get_insulin_duration(insulin_type: InsulinType) -> f64 {
    standard_duration(insulin_type)
}

impl fmt::Display for InsulinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InsulinType::Rapid => "rapid",
            InsulinType::Short => "short",
            InsulinType::Intermediate => "intermediate",
            InsulinType::Long => "long",
        };
        f.write_str(name)
    }
}

impl FromStr for InsulinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rapid" => Ok(InsulinType::Rapid),
            "short" => Ok(InsulinType::Short),
            "intermediate" => Ok(InsulinType::Intermediate),
            "long" => Ok(InsulinType::Long),
            other => Err(Error::InvalidArgument(format!(
                "Unknown insulin type: {} (expected rapid, short, intermediate or long)",
                other
            ))),
        }
    }
}

// ============================================================================
// Dose Records
// ============================================================================

/// A single administered insulin dose
///
/// Records are immutable inputs to the engine. `duration` is stored on the
/// record so a clinician override outlives later settings changes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InsulinDose {
    pub id: String,
    /// Units of insulin
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub insulin_type: InsulinType,
    /// Total action duration in hours
    pub duration: f64,
}

impl InsulinDose {
    /// Create a dose with a freshly generated id
    pub fn new(
        amount: f64,
        timestamp: DateTime<Utc>,
        insulin_type: InsulinType,
        duration: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            timestamp,
            insulin_type,
            duration,
        }
    }

    /// Check the record invariants: finite `amount >= 0` and
    /// `0 < duration <= MAX_ACTION_DURATION_HOURS`
    pub fn validate(&self) -> crate::Result<()> {
        if self.amount.is_nan() || self.amount < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Dose amount cannot be negative (dose {})",
                self.id
            )));
        }
        ensure_finite(self.amount, "Dose amount")?;
        if self.duration.is_nan() || self.duration <= 0.0 {
            return Err(Error::invalid("Duration must be positive"));
        }
        if self.duration > MAX_ACTION_DURATION_HOURS {
            return Err(Error::InvalidArgument(format!(
                "Duration must not exceed {} hours",
                MAX_ACTION_DURATION_HOURS
            )));
        }
        Ok(())
    }
}

// ============================================================================
// IOB Results
// ============================================================================

/// Per-dose breakdown of an IOB evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseDetail {
    pub id: String,
    pub amount: f64,
    pub remaining_amount: f64,
    /// 0-100
    pub percentage_remaining: f64,
    pub hours_elapsed: f64,
    pub hours_remaining: f64,
}

/// Insulin on board at a point in time
///
/// Computed fresh on each evaluation; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct IobResult {
    pub total_iob: f64,
    pub active_iob: f64,
    /// Sum of original amounts of fully absorbed doses
    pub expired_iob: f64,
    /// Same order as the input doses
    pub doses: Vec<DoseDetail>,
}

// ============================================================================
// Calculator Settings
// ============================================================================

/// Per-user dosing parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalculatorSettings {
    /// Grams of carbohydrate covered by one unit
    #[serde(default = "default_insulin_to_carb")]
    pub insulin_to_carb: f64,

    /// mg/dL drop per unit
    #[serde(default = "default_correction_factor")]
    pub correction_factor: f64,

    /// mg/dL
    #[serde(default = "default_target_glucose")]
    pub target_glucose: f64,

    /// Hours; overrides the standard table for rapid-acting insulin
    #[serde(default = "default_rapid_acting_duration")]
    pub rapid_acting_duration: f64,

    /// Hours; overrides the standard table for short-acting insulin
    #[serde(default = "default_short_acting_duration")]
    pub short_acting_duration: f64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            insulin_to_carb: default_insulin_to_carb(),
            correction_factor: default_correction_factor(),
            target_glucose: default_target_glucose(),
            rapid_acting_duration: default_rapid_acting_duration(),
            short_acting_duration: default_short_acting_duration(),
        }
    }
}

impl CalculatorSettings {
    /// Action duration for a dose of this type, honouring user overrides
    pub fn duration_for(&self, insulin_type: InsulinType) -> f64 {
        match insulin_type {
            InsulinType::Rapid => self.rapid_acting_duration,
            InsulinType::Short => self.short_acting_duration,
            other => get_insulin_duration(other),
        }
    }
}

fn default_insulin_to_carb() -> f64 {
    10.0
}

fn default_correction_factor() -> f64 {
    50.0
}

fn default_target_glucose() -> f64 {
    100.0
}

fn default_rapid_acting_duration() -> f64 {
    get_insulin_duration(InsulinType::Rapid)
}

fn default_short_acting_duration() -> f64 {
    get_insulin_duration(InsulinType::Short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_durations() {
        assert_eq!(get_insulin_duration(InsulinType::Rapid), 4.0);
        assert_eq!(get_insulin_duration(InsulinType::Short), 6.0);
        assert_eq!(get_insulin_duration(InsulinType::Intermediate), 16.0);
        assert_eq!(get_insulin_duration(InsulinType::Long), 24.0);

        for (insulin_type, hours) in STANDARD_INSULIN_DURATIONS {
            assert_eq!(get_insulin_duration(insulin_type), hours);
        }
    }

    #[test]
    fn test_parse_insulin_type() {
        assert_eq!("rapid".parse::<InsulinType>().unwrap(), InsulinType::Rapid);
        assert_eq!("SHORT".parse::<InsulinType>().unwrap(), InsulinType::Short);
        assert_eq!(
            " intermediate ".parse::<InsulinType>().unwrap(),
            InsulinType::Intermediate
        );
        assert_eq!("long".parse::<InsulinType>().unwrap(), InsulinType::Long);
        assert!("ultra".parse::<InsulinType>().is_err());
    }

    #[test]
    fn test_settings_duration_overrides() {
        let settings = CalculatorSettings {
            rapid_acting_duration: 3.5,
            short_acting_duration: 5.0,
            ..CalculatorSettings::default()
        };

        assert_eq!(settings.duration_for(InsulinType::Rapid), 3.5);
        assert_eq!(settings.duration_for(InsulinType::Short), 5.0);
        // No overrides for slower insulins
        assert_eq!(settings.duration_for(InsulinType::Intermediate), 16.0);
        assert_eq!(settings.duration_for(InsulinType::Long), 24.0);
    }

    #[test]
    fn test_dose_serializes_snake_case_type() {
        let dose = InsulinDose::new(2.5, Utc::now(), InsulinType::Rapid, 4.0);
        let json = serde_json::to_string(&dose).unwrap();
        assert!(json.contains("\"insulin_type\":\"rapid\""));
        assert!(!dose.id.is_empty());
    }

    #[test]
    fn test_dose_validate() {
        let now = Utc::now();
        assert!(InsulinDose::new(0.0, now, InsulinType::Long, 24.0).validate().is_ok());

        let err = InsulinDose::new(-1.0, now, InsulinType::Rapid, 4.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().starts_with("Dose amount cannot be negative"));

        let err = InsulinDose::new(1.0, now, InsulinType::Rapid, 0.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Duration must be positive");
    }

    #[test]
    fn test_dose_validate_rejects_unbounded_values() {
        let now = Utc::now();

        let err = InsulinDose::new(f64::INFINITY, now, InsulinType::Rapid, 4.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Dose amount must be a finite number");

        let err = InsulinDose::new(2.0, now, InsulinType::Long, f64::INFINITY)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Duration must not exceed 48 hours");

        assert!(InsulinDose::new(10.0, now, InsulinType::Long, 36.0)
            .validate()
            .is_ok());
    }
}
