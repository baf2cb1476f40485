//! YAML run files.
//!
//! A run file holds a plan, the Monte Carlo settings and output preferences.
//! Command-line flags are applied on top of it (see [`crate::cli`]).

use std::fs;
use std::path::{Path, PathBuf};

use accrue_core::model::{
    CashEvent, EventTiming, MonteCarloConfig, RangedParameter, SimulationParameters,
};
use color_eyre::eyre::{Context, bail};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::format::Locale;
use crate::io::atomic_write;

/// A cash event as written in YAML.
///
/// Uses explicit `month` / `date` fields instead of a tagged enum so the file
/// stays flat and readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub deposit: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub withdrawal: f64,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

impl EventEntry {
    pub fn to_event(&self) -> color_eyre::Result<CashEvent> {
        let at = match (self.month, self.date) {
            (Some(month), None) => EventTiming::Month(month),
            (None, Some(date)) => EventTiming::Date(date),
            (Some(_), Some(_)) => {
                bail!("event '{}' has both a month and a date", self.description)
            }
            (None, None) => bail!("event '{}' needs a month or a date", self.description),
        };
        Ok(CashEvent {
            at,
            description: String::new(),
            deposit: self.deposit,
            withdrawal: self.withdrawal,
        }
        .described(&self.description))
    }
}

/// The plan section of a run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub capital: RangedParameter,
    #[serde(default = "zero_parameter")]
    pub contribution: RangedParameter,
    pub rate: RangedParameter,
    pub years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventEntry>,
}

fn zero_parameter() -> RangedParameter {
    RangedParameter::fixed(0.0)
}

impl PlanFile {
    pub fn new(
        capital: RangedParameter,
        contribution: RangedParameter,
        rate: RangedParameter,
        years: u32,
    ) -> Self {
        Self {
            capital,
            contribution,
            rate,
            years,
            goal: None,
            start_date: None,
            events: Vec::new(),
        }
    }

    pub fn to_parameters(&self) -> color_eyre::Result<SimulationParameters> {
        let mut params =
            SimulationParameters::new(self.capital, self.contribution, self.rate, self.years);
        params.goal = self.goal;
        params.start_date = self.start_date;
        params.events = self
            .events
            .iter()
            .map(EventEntry::to_event)
            .collect::<color_eyre::Result<_>>()?;
        Ok(params)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub locale: Locale,
    /// Write the yearly table here as CSV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    /// Write the scenario table here as CSV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios_csv: Option<PathBuf>,
    /// Print the full result as JSON instead of the text report.
    pub json: bool,
}

/// Everything needed for one `accrue run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub parameters: PlanFile,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunFile {
    pub fn new(parameters: PlanFile) -> Self {
        Self {
            parameters,
            monte_carlo: MonteCarloConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("reading run file {}", path.display()))?;
        let file = Self::from_yaml(&content)
            .wrap_err_with(|| format!("parsing run file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded run file");
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> color_eyre::Result<()> {
        let yaml = self.to_yaml().wrap_err("serializing run file")?;
        atomic_write(path, &yaml).wrap_err_with(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Starting point written by `accrue init-config`.
    pub fn sample() -> Self {
        let mut plan = PlanFile::new(
            RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0),
            RangedParameter::fixed(1_000.0),
            RangedParameter::ranged(0.06, 0.10, 0.14),
            10,
        );
        plan.goal = Some(250_000.0);
        plan.start_date = Some(jiff::civil::date(2025, 1, 1));
        plan.events = vec![
            EventEntry {
                month: Some(24),
                description: "Bonus".to_string(),
                deposit: 5_000.0,
                ..Default::default()
            },
            EventEntry {
                date: Some(jiff::civil::date(2030, 6, 1)),
                description: "Car".to_string(),
                withdrawal: 20_000.0,
                ..Default::default()
            },
        ];
        Self::new(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accrue_core::model::{RateConvention, SamplingDistribution};
    use tempfile::tempdir;

    #[test]
    fn test_minimal_yaml() {
        let yaml = r#"
parameters:
  capital:
    base: 10000
  rate:
    min: 0.08
    base: 0.10
    max: 0.12
  years: 10
"#;
        let file = RunFile::from_yaml(yaml).unwrap();
        assert_eq!(file.parameters.capital, RangedParameter::fixed(10_000.0));
        assert_eq!(file.parameters.contribution, RangedParameter::fixed(0.0));
        assert_eq!(file.parameters.rate, RangedParameter::ranged(0.08, 0.10, 0.12));
        assert_eq!(file.monte_carlo, MonteCarloConfig::default());
        assert_eq!(file.output, OutputConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
parameters:
  capital: { base: 10000 }
  contribution: { base: 1000 }
  rate: { base: 0.10 }
  years: 10
  goal: 200000
  start_date: 2025-01-01
  events:
    - month: 12
      description: Bonus
      deposit: 5000
    - date: 2027-03-15
      withdrawal: 2000
monte_carlo:
  trials: 2000
  seed: 7
  distribution: triangular
  convention: nominal
output:
  locale: br
  json: true
"#;
        let file = RunFile::from_yaml(yaml).unwrap();
        assert_eq!(file.monte_carlo.trials, 2_000);
        assert_eq!(file.monte_carlo.seed, Some(7));
        assert_eq!(file.monte_carlo.distribution, SamplingDistribution::Triangular);
        assert_eq!(file.monte_carlo.convention, RateConvention::Nominal);
        assert_eq!(file.output.locale, Locale::Br);
        assert!(file.output.json);

        let params = file.parameters.to_parameters().unwrap();
        assert_eq!(params.goal, Some(200_000.0));
        assert_eq!(params.events.len(), 2);
        assert_eq!(params.events[0].at, EventTiming::Month(12));
        assert_eq!(params.events[0].description, "Bonus");
        assert_eq!(
            params.events[1].at,
            EventTiming::Date(jiff::civil::date(2027, 3, 15))
        );
    }

    #[test]
    fn test_event_needs_exactly_one_timing() {
        let entry = EventEntry {
            deposit: 1.0,
            ..Default::default()
        };
        assert!(entry.to_event().is_err());

        let entry = EventEntry {
            month: Some(1),
            date: Some(jiff::civil::date(2025, 1, 1)),
            ..Default::default()
        };
        assert!(entry.to_event().is_err());
    }

    #[test]
    fn test_sample_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.yaml");

        let sample = RunFile::sample();
        sample.save(&path).unwrap();
        let loaded = RunFile::load(&path).unwrap();

        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RunFile::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(format!("{err:?}").contains("here.yaml"));
    }
}
