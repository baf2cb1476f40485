//! Partial derivatives of the final balance around the base inputs.
//!
//! Cash events are left out: the figures describe the plain recurrence.

use crate::error::Result;
use crate::model::{GrowthInputs, RateConvention, SensitivityResult};
use crate::projection::{final_balance, growth_factor};

/// Step used for the contribution derivative, in currency units.
const CONTRIBUTION_STEP: f64 = 1.0;
/// Step used for the rate derivative: one percentage point each way.
const RATE_STEP: f64 = 0.01;

/// Balance at a perturbed point, `None` where the recurrence breaks down.
fn nearby(inputs: GrowthInputs, years: u32, convention: RateConvention) -> Option<f64> {
    final_balance(inputs, years, convention).ok()
}

/// Central difference, one-sided when only one neighbour exists.
fn difference(center: f64, up: Option<f64>, down: Option<f64>, step: f64) -> f64 {
    match (up, down) {
        (Some(up), Some(down)) => (up - down) / (2.0 * step),
        (Some(up), None) => (up - center) / step,
        (None, Some(down)) => (center - down) / step,
        (None, None) => 0.0,
    }
}

/// Sensitivities around `inputs`.
///
/// Only the base projection can fail the analysis. A neighbour that cannot be
/// evaluated (a rate step reaching -100% a year, or an overflowing extra
/// year) turns its derivative into a one-sided difference.
pub fn analyze(
    inputs: GrowthInputs,
    years: u32,
    convention: RateConvention,
) -> Result<SensitivityResult> {
    let balance = final_balance(inputs, years, convention)?;

    let d_time = match nearby(inputs, years + 1, convention) {
        Some(next) => next - balance,
        None => balance - final_balance(inputs, years.saturating_sub(1), convention)?,
    };

    let more = nearby(
        inputs.with_contribution(inputs.contribution + CONTRIBUTION_STEP),
        years,
        convention,
    );
    let less = nearby(
        inputs.with_contribution(inputs.contribution - CONTRIBUTION_STEP),
        years,
        convention,
    );
    let d_contribution = difference(balance, more, less, CONTRIBUTION_STEP);

    let months = (years * 12) as i32;
    let d_capital = growth_factor(inputs.rate, convention).powi(months);

    let up = nearby(inputs.with_rate(inputs.rate + RATE_STEP), years, convention);
    let down = if inputs.rate - RATE_STEP > -1.0 {
        nearby(inputs.with_rate(inputs.rate - RATE_STEP), years, convention)
    } else {
        None
    };
    let d_rate = difference(balance, up, down, RATE_STEP);

    tracing::debug!(d_time, d_contribution, d_capital, d_rate, "sensitivity computed");

    Ok(SensitivityResult {
        d_time,
        d_contribution,
        d_capital,
        d_rate,
    })
}
