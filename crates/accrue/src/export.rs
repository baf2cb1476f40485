//! CSV and JSON exports of a finished run.

use std::fmt::Write as _;
use std::path::Path;

use accrue_core::model::{ConfidenceBand, SimulationResult, percentile_label};
use color_eyre::eyre::Context;

use crate::format::{Locale, format_decimal};
use crate::io::atomic_write;

/// Yearly table as CSV text: one row per year, two decimals, locale separators.
///
/// A goal adds a `goal_pct` column with the deterministic balance as a share
/// of the goal.
pub fn yearly_csv(
    result: &SimulationResult,
    band: ConfidenceBand,
    goal: Option<f64>,
    locale: Locale,
) -> String {
    let delimiter = locale.csv_delimiter();
    let mut header = vec![
        "year".to_string(),
        "total_invested".to_string(),
        "interest".to_string(),
        "deterministic".to_string(),
        "mean".to_string(),
        "median".to_string(),
        "mode".to_string(),
        "min".to_string(),
        percentile_label(band.lower),
        percentile_label(band.upper),
        "max".to_string(),
        "std_dev".to_string(),
    ];
    let goal = goal.filter(|g| *g > 0.0);
    if goal.is_some() {
        header.push("goal_pct".to_string());
    }

    let mut out = header.join(&delimiter.to_string());
    out.push('\n');

    for row in &result.rows {
        let mut fields = vec![row.year.to_string()];
        fields.extend(
            [
                row.total_invested,
                row.interest(),
                row.deterministic,
                row.mean,
                row.median,
                row.mode,
                row.min,
                row.lower,
                row.upper,
                row.max,
                row.std_dev,
            ]
            .iter()
            .map(|v| format_decimal(*v, 2, locale)),
        );
        if let Some(goal) = goal {
            fields.push(format!(
                "{}%",
                format_decimal(row.deterministic / goal * 100.0, 1, locale)
            ));
        }
        let _ = writeln!(out, "{}", fields.join(&delimiter.to_string()));
    }
    out
}

pub fn write_csv(
    path: &Path,
    result: &SimulationResult,
    band: ConfidenceBand,
    goal: Option<f64>,
    locale: Locale,
) -> color_eyre::Result<()> {
    let csv = yearly_csv(result, band, goal, locale);
    atomic_write(path, &csv).wrap_err_with(|| format!("writing CSV to {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = result.rows.len(), "exported yearly table");
    Ok(())
}

/// Scenario table as CSV text: the exact inputs behind each reported point.
pub fn scenarios_csv(result: &SimulationResult, locale: Locale) -> String {
    let delimiter = locale.csv_delimiter().to_string();
    let mut out = [
        "scenario",
        "trial",
        "capital",
        "contribution",
        "rate_pct",
        "final_balance",
    ]
    .join(&delimiter);
    out.push('\n');

    for s in &result.scenarios {
        let fields = [
            s.label.clone(),
            s.trial.to_string(),
            format_decimal(s.capital, 2, locale),
            format_decimal(s.contribution, 2, locale),
            format_decimal(s.rate * 100.0, 2, locale),
            format_decimal(s.final_balance, 2, locale),
        ];
        let _ = writeln!(out, "{}", fields.join(&delimiter));
    }
    out
}

pub fn write_scenarios_csv(
    path: &Path,
    result: &SimulationResult,
    locale: Locale,
) -> color_eyre::Result<()> {
    let csv = scenarios_csv(result, locale);
    atomic_write(path, &csv)
        .wrap_err_with(|| format!("writing scenarios to {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        scenarios = result.scenarios.len(),
        "exported scenarios"
    );
    Ok(())
}

pub fn to_json(result: &SimulationResult) -> color_eyre::Result<String> {
    serde_json::to_string_pretty(result).wrap_err("serializing result to JSON")
}
