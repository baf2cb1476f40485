//! Monte Carlo run configuration

use serde::{Deserialize, Serialize};

/// Smallest accepted trial count.
pub const MIN_TRIALS: usize = 100;
/// Largest accepted trial count.
pub const MAX_TRIALS: usize = 50_000;

fn default_trials() -> usize {
    5_000
}

fn default_batch_size() -> usize {
    1_000
}

fn default_scenario_percentiles() -> Vec<f64> {
    vec![0.05, 0.25, 0.50, 0.75, 0.95]
}

fn default_true() -> bool {
    true
}

fn default_risk_free_rate() -> f64 {
    0.10
}

/// How an annual rate becomes a monthly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateConvention {
    /// `(1 + r)^(1/12) - 1`: twelve months compound to exactly `r`.
    #[default]
    Effective,
    /// `r / 12`: the annual rate is nominal, compounded monthly.
    Nominal,
}

impl RateConvention {
    #[inline]
    #[must_use]
    pub fn monthly_rate(self, annual_rate: f64) -> f64 {
        match self {
            RateConvention::Effective => (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0,
            RateConvention::Nominal => annual_rate / 12.0,
        }
    }
}

/// Distribution used to draw a ranged parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingDistribution {
    /// `Normal((min+max)/2, (max-min)/6)` clipped to `[min, max]`.
    #[default]
    Normal,
    Uniform,
    /// Peak at `base`.
    Triangular,
}

/// The two percentiles bounding the confidence tunnel, as fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceBand {
    pub const P5_P95: ConfidenceBand = ConfidenceBand {
        lower: 0.05,
        upper: 0.95,
    };
    pub const P5_P90: ConfidenceBand = ConfidenceBand {
        lower: 0.05,
        upper: 0.90,
    };
    pub const P10_P90: ConfidenceBand = ConfidenceBand {
        lower: 0.10,
        upper: 0.90,
    };

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.lower)
            && (0.0..=1.0).contains(&self.upper)
            && self.lower < self.upper
    }
}

impl Default for ConfidenceBand {
    fn default() -> Self {
        Self::P5_P95
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default)]
    pub band: ConfidenceBand,
    /// Percentiles (fractions) for which a concrete scenario is reported.
    #[serde(default = "default_scenario_percentiles")]
    pub scenario_percentiles: Vec<f64>,
    /// Trials simulated between progress reports / cancellation checks.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fixed seed for reproducible runs; `None` draws a fresh one.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub distribution: SamplingDistribution,
    #[serde(default)]
    pub convention: RateConvention,
    /// Spread each batch over the rayon pool when the `parallel` feature is on.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Also report the trials closest to the mean and the mode.
    #[serde(default = "default_true")]
    pub central_scenarios: bool,
    /// Annual risk-free rate used by the Sharpe ratio.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            band: ConfidenceBand::default(),
            scenario_percentiles: default_scenario_percentiles(),
            batch_size: default_batch_size(),
            seed: None,
            distribution: SamplingDistribution::default(),
            convention: RateConvention::default(),
            parallel: true,
            central_scenarios: true,
            risk_free_rate: default_risk_free_rate(),
        }
    }
}

impl MonteCarloConfig {
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_band(mut self, band: ConfidenceBand) -> Self {
        self.band = band;
        self
    }

    #[must_use]
    pub fn with_convention(mut self, convention: RateConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Scenario targets in report order: the percentiles, then mean and mode.
    #[must_use]
    pub fn scenario_targets(&self) -> Vec<ScenarioTarget> {
        let mut targets: Vec<ScenarioTarget> = self
            .scenario_percentiles
            .iter()
            .map(|&p| ScenarioTarget::Percentile(p))
            .collect();
        if self.central_scenarios {
            targets.extend([ScenarioTarget::Mean, ScenarioTarget::Mode]);
        }
        targets
    }

    /// Batch size actually used: never zero, never larger than the run.
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, self.trials.max(1))
    }
}

/// Display label for a percentile fraction: `0.05` → `"P5"`, `0.025` → `"P2.5"`.
#[must_use]
pub fn percentile_label(p: f64) -> String {
    let pct = p * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("P{}", pct.round() as i64)
    } else {
        format!("P{}", (pct * 10.0).round() / 10.0)
    }
}

/// What a reported scenario is anchored to in the final-balance distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTarget {
    Percentile(f64),
    Mean,
    Mode,
}

impl ScenarioTarget {
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Percentile(p) => percentile_label(p),
            Self::Mean => "Mean".to_string(),
            Self::Mode => "Mode".to_string(),
        }
    }
}
