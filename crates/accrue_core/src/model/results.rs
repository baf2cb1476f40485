//! Simulation output snapshots
//!
//! Everything here is produced once by a run and never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::config::ScenarioTarget;

/// Which branch the orchestrator took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationPath {
    DeterministicOnly,
    MonteCarlo,
}

/// One row of the yearly table. Statistics are taken across all trials; on
/// the deterministic path every statistic equals `deterministic`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: u32,
    /// Capital plus contributions (and net event flows) to date.
    pub total_invested: f64,
    pub deterministic: f64,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub lower: f64,
    pub upper: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl YearlyRow {
    /// Row for a run without uncertainty.
    #[must_use]
    pub fn deterministic(year: u32, total_invested: f64, balance: f64) -> Self {
        Self {
            year,
            total_invested,
            deterministic: balance,
            mean: balance,
            median: balance,
            mode: balance,
            min: balance,
            lower: balance,
            upper: balance,
            max: balance,
            std_dev: 0.0,
        }
    }

    /// Interest earned on the deterministic path.
    #[must_use]
    pub fn interest(&self) -> f64 {
        self.deterministic - self.total_invested
    }
}

/// The exact inputs of the trial closest to a requested target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub target: ScenarioTarget,
    pub trial: usize,
    pub capital: f64,
    pub contribution: f64,
    pub rate: f64,
    pub final_balance: f64,
}

/// Partial derivatives of the final balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    /// Balance gained by one more year.
    pub d_time: f64,
    /// Final value of one extra currency unit contributed every month.
    pub d_contribution: f64,
    /// Growth multiple of the initial capital.
    pub d_capital: f64,
    /// Balance change per unit of annual rate (central difference, ±1 pp).
    pub d_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_invested: f64,
    pub total_interest: f64,
    pub final_balance: f64,
    /// `total_interest / total_invested`, zero when nothing was invested.
    pub total_return: f64,
    /// `final_balance / goal`.
    pub goal_progress: Option<f64>,
    /// Years until the deterministic balance first reaches the goal.
    pub years_to_goal: Option<f64>,
}

/// Distribution-level risk figures of the final balances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Share of trials ending at or above the goal.
    pub success_probability: Option<f64>,
    /// Share of trials ending at or below the base capital.
    pub ruin_probability: f64,
    /// Share of trials where a withdrawal exceeded the balance.
    pub insolvency_probability: f64,
    /// Base capital minus the 5th percentile, floored at zero.
    pub value_at_risk_95: f64,
    /// Base capital minus the mean of the worst 5%, floored at zero.
    pub conditional_value_at_risk_95: f64,
    /// `std_dev / mean` of the final balances.
    pub coefficient_of_variation: f64,
    /// Standard deviation of the final balances.
    pub volatility: f64,
    /// VaR95 over the mean gain on base capital; zero without a gain.
    pub risk_return_ratio: f64,
    /// Mean excess over one year of risk-free growth on base capital,
    /// per unit of volatility.
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub path: SimulationPath,
    pub rows: Vec<YearlyRow>,
    pub scenarios: Vec<Scenario>,
    pub sensitivity: SensitivityResult,
    pub summary: Summary,
    /// `None` when no goal was set.
    pub goal_attained: Option<bool>,
    /// Zero on the deterministic path.
    pub trials: usize,
    /// Seed actually used by the sampler.
    pub seed: Option<u64>,
    pub risk: Option<RiskMetrics>,
}

impl SimulationResult {
    #[must_use]
    pub fn final_row(&self) -> Option<&YearlyRow> {
        self.rows.last()
    }

    #[must_use]
    pub fn has_monte_carlo(&self) -> bool {
        self.path == SimulationPath::MonteCarlo
    }

    #[must_use]
    pub fn scenario(&self, label: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.label == label)
    }
}
