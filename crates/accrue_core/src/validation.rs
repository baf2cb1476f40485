//! Input validation and path selection.
//!
//! Rules run in a fixed order and the first failure is returned. Within each
//! rule the parameters are checked as capital, contribution, rate.

use crate::error::ValidationError;
use crate::model::{
    MAX_TRIALS, MAX_YEARS, MIN_TRIALS, MonteCarloConfig, SimulationParameters, SimulationPath,
};

fn check_ranges(params: &SimulationParameters) -> Result<(), ValidationError> {
    if let Some((parameter, _)) = params.parameters().find(|(_, p)| p.is_partial()) {
        return Err(ValidationError::PartialRangeFill { parameter });
    }

    for (parameter, p) in params.parameters() {
        if let Some((min, max)) = p.bounds()
            && min > max
        {
            return Err(ValidationError::InvertedRange {
                parameter,
                min,
                max,
            });
        }
    }

    for (parameter, p) in params.parameters() {
        if let Some((min, max)) = p.bounds()
            && !(min..=max).contains(&p.base)
        {
            return Err(ValidationError::OutOfRangeDeterministic {
                parameter,
                min,
                base: p.base,
                max,
            });
        }
    }

    Ok(())
}

fn check_finite(params: &SimulationParameters) -> Result<(), ValidationError> {
    let fields = [
        ("capital", &params.capital),
        ("contribution", &params.contribution),
        ("rate", &params.rate),
    ];
    for (field, p) in fields {
        if p.values().any(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteInput { field });
        }
    }
    if params.goal.is_some_and(|g| !g.is_finite()) {
        return Err(ValidationError::NonFiniteInput { field: "goal" });
    }
    if params
        .events
        .iter()
        .any(|e| !e.deposit.is_finite() || !e.withdrawal.is_finite())
    {
        return Err(ValidationError::NonFiniteInput {
            field: "event amount",
        });
    }
    Ok(())
}

fn check_monte_carlo(config: &MonteCarloConfig) -> Result<(), ValidationError> {
    if !(MIN_TRIALS..=MAX_TRIALS).contains(&config.trials) {
        return Err(ValidationError::InvalidTrialCount {
            trials: config.trials,
            min: MIN_TRIALS,
            max: MAX_TRIALS,
        });
    }
    if !config.band.is_valid() {
        let value = if (0.0..=1.0).contains(&config.band.lower) {
            config.band.upper
        } else {
            config.band.lower
        };
        return Err(ValidationError::InvalidPercentile { value });
    }
    if let Some(&value) = config
        .scenario_percentiles
        .iter()
        .find(|p| !(0.0..=1.0).contains(*p))
    {
        return Err(ValidationError::InvalidPercentile { value });
    }
    if !config.risk_free_rate.is_finite() {
        return Err(ValidationError::NonFiniteInput {
            field: "risk-free rate",
        });
    }
    Ok(())
}

/// Validate a run and choose its path.
///
/// Monte Carlo settings are only checked when some parameter is ranged.
pub fn validate(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
) -> Result<SimulationPath, ValidationError> {
    check_ranges(params)?;

    if params.years == 0 || params.years > MAX_YEARS {
        return Err(ValidationError::InvalidHorizon {
            years: params.years,
        });
    }

    check_finite(params)?;

    if !params.has_any_range() {
        return Ok(SimulationPath::DeterministicOnly);
    }

    check_monte_carlo(config)?;
    Ok(SimulationPath::MonteCarlo)
}
