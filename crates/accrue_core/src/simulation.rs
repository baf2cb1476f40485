//! Run orchestration: validate, project, optionally sample, assemble.

use std::time::Instant;

use crate::control::{NoopObserver, RunObserver, SimulationPhase};
use crate::error::{Result, SimulationError};
use crate::model::{
    CashSchedule, MonteCarloConfig, SimulationParameters, SimulationPath, SimulationResult,
    Summary, YearlyRow,
};
use crate::monte_carlo::{self, MonteCarloOutcome};
use crate::projection::{Projection, project};
use crate::validation::validate;
use crate::{risk, scenario, sensitivity};

/// Run a simulation, reporting phases and progress to `observer`.
///
/// The observer always ends in a terminal phase: `Completed`, `Cancelled`
/// for [`SimulationError::Cancelled`], `Failed` for anything else. A cancelled
/// run returns no partial data.
pub fn run(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    observer: &dyn RunObserver,
) -> Result<SimulationResult> {
    let started = Instant::now();
    observer.on_phase(SimulationPhase::Validating);

    let result = execute(params, config, observer);

    match &result {
        Ok(r) => {
            tracing::debug!(
                path = ?r.path,
                trials = r.trials,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "simulation completed"
            );
            observer.on_phase(SimulationPhase::Completed);
        }
        Err(SimulationError::Cancelled) => observer.on_phase(SimulationPhase::Cancelled),
        Err(e) => {
            tracing::debug!(error = %e, "simulation failed");
            observer.on_phase(SimulationPhase::Failed);
        }
    }
    result
}

/// [`run`] without progress reporting or cancellation.
pub fn simulate(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
) -> Result<SimulationResult> {
    run(params, config, &NoopObserver)
}

fn execute(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    observer: &dyn RunObserver,
) -> Result<SimulationResult> {
    let path = validate(params, config)?;
    let schedule = CashSchedule::build(&params.events, params.start_date, params.total_months())?;

    let inputs = params.base_inputs();
    let projection = project(inputs, params.years, config.convention, &schedule)?;
    let sensitivity = sensitivity::analyze(inputs, params.years, config.convention)?;
    let summary = summarize(params, &projection, &schedule);
    let goal_attained = params.goal.map(|goal| projection.final_balance() >= goal);

    match path {
        SimulationPath::DeterministicOnly => {
            observer.on_phase(SimulationPhase::DeterministicOnly);
            let rows = projection
                .yearly()
                .map(|(year, balance)| {
                    YearlyRow::deterministic(
                        year,
                        projection.invested_at_year(year, &schedule),
                        balance,
                    )
                })
                .collect();

            Ok(SimulationResult {
                path,
                rows,
                scenarios: Vec::new(),
                sensitivity,
                summary,
                goal_attained,
                trials: 0,
                seed: None,
                risk: None,
            })
        }
        SimulationPath::MonteCarlo => {
            observer.on_phase(SimulationPhase::MonteCarlo);
            let outcome = monte_carlo::run(params, config, &schedule, observer)?;
            let rows = monte_carlo_rows(&outcome, config, &projection, &schedule);
            let scenarios = scenario::locate(
                outcome.final_balances(),
                &outcome.samples,
                &config.scenario_targets(),
            );
            let risk = risk::compute(
                outcome.final_balances(),
                &outcome.insolvent,
                params.capital.base,
                params.goal,
                config.risk_free_rate,
            );

            Ok(SimulationResult {
                path,
                rows,
                scenarios,
                sensitivity,
                summary,
                goal_attained,
                trials: outcome.trials(),
                seed: Some(outcome.seed),
                risk: Some(risk),
            })
        }
    }
}

fn monte_carlo_rows(
    outcome: &MonteCarloOutcome,
    config: &MonteCarloConfig,
    projection: &Projection,
    schedule: &CashSchedule,
) -> Vec<YearlyRow> {
    outcome
        .aggregate(config.band)
        .into_iter()
        .zip(projection.yearly())
        .map(|(stats, (year, balance))| YearlyRow {
            year,
            total_invested: projection.invested_at_year(year, schedule),
            deterministic: balance,
            mean: stats.mean,
            median: stats.median,
            mode: stats.mode,
            min: stats.min,
            lower: stats.lower,
            upper: stats.upper,
            max: stats.max,
            std_dev: stats.std_dev,
        })
        .collect()
}

fn summarize(
    params: &SimulationParameters,
    projection: &Projection,
    schedule: &CashSchedule,
) -> Summary {
    let final_balance = projection.final_balance();
    let total_invested = projection.invested_at_year(params.years, schedule);
    let total_interest = final_balance - total_invested;
    let total_return = if total_invested.abs() > f64::EPSILON {
        total_interest / total_invested
    } else {
        0.0
    };

    Summary {
        total_invested,
        total_interest,
        final_balance,
        total_return,
        goal_progress: params
            .goal
            .map(|goal| if goal > 0.0 { final_balance / goal } else { 1.0 }),
        years_to_goal: params
            .goal
            .and_then(|goal| projection.years_to_reach(goal)),
    }
}
