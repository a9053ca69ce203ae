//! Insulin-on-board aggregation.
//!
//! Applies the decay model to a dose history and reports total, active and
//! expired insulin plus a per-dose breakdown.

use crate::decay::calculate_decay_factor;
use crate::rounding::round_to_2;
use crate::{DoseDetail, InsulinDose, IobResult, Result};
use chrono::{DateTime, Utc};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Evaluate insulin on board for `doses` at `current_time`
///
/// - Doses timestamped after `current_time` are treated as just injected.
/// - A dose whose remaining amount is 0 (including exactly at the end of
///   its duration) is expired: it adds its original amount to
///   `expired_iob` and nothing to `total_iob`.
/// - All figures are rounded to 2 decimals; totals are summed before
///   rounding.
/// - The breakdown keeps the input order.
pub fn calculate_iob(doses: &[InsulinDose], current_time: DateTime<Utc>) -> Result<IobResult> {
    for dose in doses {
        dose.validate()?;
    }

    let mut active = 0.0;
    let mut expired = 0.0;
    let mut details = Vec::with_capacity(doses.len());

    for dose in doses {
        let hours_elapsed = hours_between(dose.timestamp, current_time);
        let decay = calculate_decay_factor(hours_elapsed, dose.duration)?;
        let remaining = dose.amount * decay;

        if remaining > 0.0 {
            active += remaining;
        } else {
            expired += dose.amount;
        }

        details.push(DoseDetail {
            id: dose.id.clone(),
            amount: dose.amount,
            remaining_amount: round_to_2(remaining),
            percentage_remaining: round_to_2(decay * 100.0),
            hours_elapsed: round_to_2(hours_elapsed),
            hours_remaining: round_to_2((dose.duration - hours_elapsed).max(0.0)),
        });
    }

    let active_iob = round_to_2(active);

    tracing::debug!(
        "Evaluated IOB over {} doses: active {:.2}u, expired {:.2}u",
        doses.len(),
        active_iob,
        expired
    );

    Ok(IobResult {
        total_iob: active_iob,
        active_iob,
        expired_iob: round_to_2(expired),
        doses: details,
    })
}

/// Hours from `from` to `to`, clamped at 0
fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds() as f64;
    (millis / MILLIS_PER_HOUR).max(0.0)
}
