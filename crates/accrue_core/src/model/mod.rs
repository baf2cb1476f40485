mod config;
mod events;
mod parameters;
mod results;

pub use config::{
    ConfidenceBand, MAX_TRIALS, MIN_TRIALS, MonteCarloConfig, RateConvention,
    SamplingDistribution, ScenarioTarget, percentile_label,
};
pub use events::{CashEvent, CashSchedule, EventTiming, MAX_DESCRIPTION_LEN, MonthFlows};
pub use parameters::{GrowthInputs, MAX_YEARS, ParameterKind, RangedParameter, SimulationParameters};
pub use results::{
    RiskMetrics, Scenario, SensitivityResult, SimulationPath, SimulationResult, Summary,
    YearlyRow,
};
