//! Deterministic lead scoring.
//!
//! `score = employee_count / 100 + 3 * intent_weight`, rounded to two
//! decimals, then mapped to a tier via [`Tier::from_score`].

use crate::domain::{IntentSignal, PipelineError, Result, ScoreResult, Tier};

/// Employees per score point.
pub const EMPLOYEES_PER_POINT: f64 = 100.0;

/// Score points per unit of intent weight.
pub const INTENT_MULTIPLIER: f64 = 3.0;

/// Score a lead. Pure: identical inputs always give identical output.
///
/// # Errors
///
/// `PipelineError::InvalidInput` if `employee_count` is negative.
pub fn score_lead(employee_count: i64, intent: IntentSignal) -> Result<ScoreResult> {
    if employee_count < 0 {
        return Err(PipelineError::invalid(
            "employee_count",
            format!("must be non-negative, got {employee_count}"),
        ));
    }

    let raw = employee_count as f64 / EMPLOYEES_PER_POINT
        + INTENT_MULTIPLIER * f64::from(intent.weight());
    let score = (raw * 100.0).round() / 100.0;

    Ok(ScoreResult {
        score,
        tier: Tier::from_score(score),
    })
}
