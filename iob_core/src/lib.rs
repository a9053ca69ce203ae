#![forbid(unsafe_code)]

//! Insulin-on-board and dosing-safety engine.
//!
//! This crate provides:
//! - Domain types (doses, insulin types, IOB results, calculator settings)
//! - Insulin decay model and IOB aggregation
//! - Carb coverage, correction and IOB-adjusted dose arithmetic
//! - Clinical input validation and dose risk classification
//! - Dose history storage (JSONL) and configuration

pub mod types;
pub mod error;
pub mod rounding;
pub mod decay;
pub mod iob;
pub mod dose;
pub mod validation;
pub mod risk;
pub mod calculator;
pub mod config;
pub mod logging;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use decay::calculate_decay_factor;
pub use iob::calculate_iob;
pub use dose::{calculate_carb_coverage, calculate_correction_dose, calculate_total_dose};
pub use validation::{validate_calculation_inputs, CalculationInputs};
pub use risk::{assess_risk, RiskAssessment, RiskLevel, RiskThresholds};
pub use calculator::{recommend_dose, DoseRecommendation, DoseRequest};
pub use history::{load_active_doses, lookback_window, DoseSink, DoseSource, JsonlDoseLog};
