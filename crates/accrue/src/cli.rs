//! Command-line arguments and how they layer over a run file.

use std::path::PathBuf;

use accrue_core::model::{ConfidenceBand, RangedParameter, RateConvention, SamplingDistribution};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;

use crate::config::{EventEntry, PlanFile, RunFile};
use crate::events_csv::read_events_csv;
use crate::format::Locale;

#[derive(Parser, Debug)]
#[command(name = "accrue")]
#[command(about = "Compound-growth projection with Monte Carlo uncertainty")]
pub struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project a plan, sampling any ranged parameter
    Run(RunArgs),
    /// Find the annual rate that reaches a target balance
    ImpliedRate(ImpliedRateArgs),
    /// Write a sample run file
    InitConfig(InitConfigArgs),
    /// Write a run file's cash events to CSV
    ExportEvents(ExportEventsArgs),
    /// Add cash events from CSV to a run file
    ImportEvents(ImportEventsArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionArg {
    Normal,
    Uniform,
    Triangular,
}

impl From<DistributionArg> for SamplingDistribution {
    fn from(arg: DistributionArg) -> Self {
        match arg {
            DistributionArg::Normal => SamplingDistribution::Normal,
            DistributionArg::Uniform => SamplingDistribution::Uniform,
            DistributionArg::Triangular => SamplingDistribution::Triangular,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// YAML run file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Initial capital: BASE or MIN:BASE:MAX
    #[arg(long, value_parser = parse_ranged)]
    pub capital: Option<RangedParameter>,

    /// Monthly contribution: BASE or MIN:BASE:MAX
    #[arg(long, value_parser = parse_ranged)]
    pub contribution: Option<RangedParameter>,

    /// Annual rate as a fraction (0.10 = 10%): BASE or MIN:BASE:MAX
    #[arg(long, value_parser = parse_ranged)]
    pub rate: Option<RangedParameter>,

    /// Horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Target balance
    #[arg(long)]
    pub goal: Option<f64>,

    /// One-off deposit: MONTH:AMOUNT (repeatable)
    #[arg(long = "deposit", value_parser = parse_month_amount)]
    pub deposits: Vec<(u32, f64)>,

    /// One-off withdrawal: MONTH:AMOUNT (repeatable)
    #[arg(long = "withdraw", value_parser = parse_month_amount)]
    pub withdrawals: Vec<(u32, f64)>,

    /// Add the cash events listed in this CSV file
    #[arg(long)]
    pub events_csv: Option<PathBuf>,

    /// Monte Carlo trials
    #[arg(long)]
    pub trials: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Confidence band as LO:HI fractions, e.g. 0.05:0.95
    #[arg(long, value_parser = parse_band)]
    pub band: Option<ConfidenceBand>,

    /// Sampling distribution for ranged parameters
    #[arg(long, value_enum)]
    pub distribution: Option<DistributionArg>,

    /// Treat the rate as nominal (r/12 per month) instead of effective
    #[arg(long)]
    pub nominal: bool,

    /// Run all trials on the calling thread
    #[arg(long)]
    pub serial: bool,

    /// Write the yearly table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the scenario table to this CSV file
    #[arg(long)]
    pub scenarios_csv: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Number formatting
    #[arg(long, value_enum)]
    pub locale: Option<Locale>,

    /// Cancel the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ImpliedRateArgs {
    /// Balance to reach
    #[arg(long)]
    pub target: f64,

    #[arg(long)]
    pub capital: f64,

    #[arg(long, default_value_t = 0.0)]
    pub contribution: f64,

    #[arg(long)]
    pub years: u32,

    /// Treat the rate as nominal (r/12 per month)
    #[arg(long)]
    pub nominal: bool,

    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the sample file
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ExportEventsArgs {
    /// YAML run file to read events from
    pub config: PathBuf,

    /// CSV file to write
    pub out: PathBuf,

    /// Number and date formatting; defaults to the run file's locale
    #[arg(long, value_enum)]
    pub locale: Option<Locale>,
}

#[derive(Args, Debug)]
pub struct ImportEventsArgs {
    /// YAML run file to update
    pub config: PathBuf,

    /// CSV file with the events
    pub csv: PathBuf,

    /// Number and date formatting; defaults to the run file's locale
    #[arg(long, value_enum)]
    pub locale: Option<Locale>,

    /// Drop the run file's existing events first
    #[arg(long)]
    pub replace: bool,
}

fn parse_number(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{text}' is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{text}' is not finite"))
    }
}

/// `BASE` or `MIN:BASE:MAX`.
pub fn parse_ranged(text: &str) -> Result<RangedParameter, String> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        [base] => Ok(RangedParameter::fixed(parse_number(base)?)),
        [min, base, max] => Ok(RangedParameter::ranged(
            parse_number(min)?,
            parse_number(base)?,
            parse_number(max)?,
        )),
        _ => Err(format!("expected BASE or MIN:BASE:MAX, got '{text}'")),
    }
}

/// `LO:HI` as fractions.
pub fn parse_band(text: &str) -> Result<ConfidenceBand, String> {
    let (lower, upper) = text
        .split_once(':')
        .ok_or_else(|| format!("expected LO:HI, got '{text}'"))?;
    Ok(ConfidenceBand {
        lower: parse_number(lower)?,
        upper: parse_number(upper)?,
    })
}

/// `MONTH:AMOUNT`.
pub fn parse_month_amount(text: &str) -> Result<(u32, f64), String> {
    let (month, amount) = text
        .split_once(':')
        .ok_or_else(|| format!("expected MONTH:AMOUNT, got '{text}'"))?;
    let month = month
        .trim()
        .parse()
        .map_err(|_| format!("'{month}' is not a month number"))?;
    Ok((month, parse_number(amount)?))
}

impl RunArgs {
    /// Load the run file (if any) and apply every flag on top of it.
    pub fn resolve(&self) -> color_eyre::Result<RunFile> {
        let mut file = match &self.config {
            Some(path) => RunFile::load(path)?,
            None => RunFile::new(self.plan_from_flags()?),
        };
        self.apply(&mut file);
        if let Some(path) = &self.events_csv {
            let events = read_events_csv(path, file.output.locale)?;
            file.parameters.events.extend(events);
        }
        Ok(file)
    }

    fn plan_from_flags(&self) -> color_eyre::Result<PlanFile> {
        let missing = |flag: &str| eyre!("--{flag} is required when no --config is given");
        Ok(PlanFile::new(
            self.capital.ok_or_else(|| missing("capital"))?,
            self.contribution.unwrap_or(RangedParameter::fixed(0.0)),
            self.rate.ok_or_else(|| missing("rate"))?,
            self.years.ok_or_else(|| missing("years"))?,
        ))
    }

    fn apply(&self, file: &mut RunFile) {
        let plan = &mut file.parameters;
        if let Some(capital) = self.capital {
            plan.capital = capital;
        }
        if let Some(contribution) = self.contribution {
            plan.contribution = contribution;
        }
        if let Some(rate) = self.rate {
            plan.rate = rate;
        }
        if let Some(years) = self.years {
            plan.years = years;
        }
        if let Some(goal) = self.goal {
            plan.goal = Some(goal);
        }
        plan.events
            .extend(self.deposits.iter().map(|&(month, deposit)| EventEntry {
                month: Some(month),
                deposit,
                ..Default::default()
            }));
        plan.events
            .extend(self.withdrawals.iter().map(|&(month, withdrawal)| EventEntry {
                month: Some(month),
                withdrawal,
                ..Default::default()
            }));

        let mc = &mut file.monte_carlo;
        if let Some(trials) = self.trials {
            mc.trials = trials;
        }
        if let Some(seed) = self.seed {
            mc.seed = Some(seed);
        }
        if let Some(band) = self.band {
            mc.band = band;
        }
        if let Some(distribution) = self.distribution {
            mc.distribution = distribution.into();
        }
        if self.nominal {
            mc.convention = RateConvention::Nominal;
        }
        if self.serial {
            mc.parallel = false;
        }

        let output = &mut file.output;
        if let Some(csv) = &self.csv {
            output.csv = Some(csv.clone());
        }
        if let Some(csv) = &self.scenarios_csv {
            output.scenarios_csv = Some(csv.clone());
        }
        if self.json {
            output.json = true;
        }
        if let Some(locale) = self.locale {
            output.locale = locale;
        }
    }
}
