//! Simulation inputs: ranged parameters and the parameter set.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::events::CashEvent;

/// Longest supported horizon, in years.
pub const MAX_YEARS: u32 = 100;

/// Which of the three sampled inputs a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Capital,
    Contribution,
    Rate,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 3] = [
        ParameterKind::Capital,
        ParameterKind::Contribution,
        ParameterKind::Rate,
    ];
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Capital => "initial capital",
            ParameterKind::Contribution => "monthly contribution",
            ParameterKind::Rate => "annual rate",
        };
        f.write_str(name)
    }
}

/// A value that is either fixed at `base` or uncertain within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    pub base: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangedParameter {
    #[must_use]
    pub fn fixed(base: f64) -> Self {
        Self {
            min: None,
            base,
            max: None,
        }
    }

    #[must_use]
    pub fn ranged(min: f64, base: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            base,
            max: Some(max),
        }
    }

    /// Both bounds present.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Exactly one bound present.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.min.is_some() != self.max.is_some()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// A range that actually spreads, i.e. `min < max`.
    #[must_use]
    pub fn spread(&self) -> Option<(f64, f64)> {
        self.bounds().filter(|(min, max)| min < max)
    }

    /// Midpoint of the range, or `base` when fixed.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.bounds()
            .map_or(self.base, |(min, max)| (min + max) / 2.0)
    }

    /// Standard deviation used for normal sampling: a third of the half-width,
    /// so the range covers roughly 99.7% of the mass.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.bounds().map_or(0.0, |(min, max)| (max - min) / 6.0)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = f64> {
        [self.min, Some(self.base), self.max].into_iter().flatten()
    }
}

impl From<f64> for RangedParameter {
    fn from(base: f64) -> Self {
        Self::fixed(base)
    }
}

/// Everything describing one investment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Initial capital.
    pub capital: RangedParameter,
    /// Contribution made at the end of every month.
    pub contribution: RangedParameter,
    /// Annual rate as a fraction (`0.10` is 10%).
    pub rate: RangedParameter,
    pub years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    /// Calendar date of month 0. Required only for date-based cash events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<jiff::civil::Date>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CashEvent>,
}

impl SimulationParameters {
    #[must_use]
    pub fn new(
        capital: impl Into<RangedParameter>,
        contribution: impl Into<RangedParameter>,
        rate: impl Into<RangedParameter>,
        years: u32,
    ) -> Self {
        Self {
            capital: capital.into(),
            contribution: contribution.into(),
            rate: rate.into(),
            years,
            goal: None,
            start_date: None,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = Some(goal);
        self
    }

    #[must_use]
    pub fn with_start_date(mut self, date: jiff::civil::Date) -> Self {
        self.start_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: CashEvent) -> Self {
        self.events.push(event);
        self
    }

    #[must_use]
    pub fn parameter(&self, kind: ParameterKind) -> &RangedParameter {
        match kind {
            ParameterKind::Capital => &self.capital,
            ParameterKind::Contribution => &self.contribution,
            ParameterKind::Rate => &self.rate,
        }
    }

    /// Parameters in validation order, tagged with their kind.
    pub fn parameters(&self) -> impl Iterator<Item = (ParameterKind, &RangedParameter)> {
        ParameterKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.parameter(kind)))
    }

    #[must_use]
    pub fn has_any_range(&self) -> bool {
        self.parameters().any(|(_, p)| p.is_ranged())
    }

    #[must_use]
    pub fn total_months(&self) -> u32 {
        self.years * 12
    }

    /// The fixed-point inputs used by the deterministic projection.
    #[must_use]
    pub fn base_inputs(&self) -> GrowthInputs {
        GrowthInputs {
            capital: self.capital.base,
            contribution: self.contribution.base,
            rate: self.rate.base,
        }
    }
}

/// One concrete set of inputs to the compound-growth recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthInputs {
    pub capital: f64,
    pub contribution: f64,
    pub rate: f64,
}

impl GrowthInputs {
    #[must_use]
    pub fn new(capital: f64, contribution: f64, rate: f64) -> Self {
        Self {
            capital,
            contribution,
            rate,
        }
    }

    #[must_use]
    pub fn with_rate(self, rate: f64) -> Self {
        Self { rate, ..self }
    }

    #[must_use]
    pub fn with_contribution(self, contribution: f64) -> Self {
        Self {
            contribution,
            ..self
        }
    }
}
