//! Plain-text report of a finished run.

use std::fmt::Write as _;

use accrue_core::model::{ConfidenceBand, SimulationResult, percentile_label};

use crate::format::{
    Locale, format_currency, format_currency_short, format_decimal, format_percentage,
};

fn summary_section(out: &mut String, result: &SimulationResult, locale: Locale) {
    let s = &result.summary;
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "  Final balance:   {}", format_currency(s.final_balance, locale));
    let _ = writeln!(out, "  Total invested:  {}", format_currency(s.total_invested, locale));
    let _ = writeln!(out, "  Total interest:  {}", format_currency(s.total_interest, locale));
    let _ = writeln!(out, "  Total return:    {}", format_percentage(s.total_return, locale));

    if let Some(progress) = s.goal_progress {
        let status = match result.goal_attained {
            Some(true) => "reached",
            _ => "not reached",
        };
        let _ = writeln!(
            out,
            "  Goal:            {} ({status})",
            format_percentage(progress, locale)
        );
    }
    if let Some(years) = s.years_to_goal {
        let _ = writeln!(
            out,
            "  Years to goal:   {}",
            format_decimal(years, 1, locale)
        );
    }
}

fn yearly_section(
    out: &mut String,
    result: &SimulationResult,
    band: ConfidenceBand,
    locale: Locale,
) {
    let _ = writeln!(out, "\nYearly projection");
    if result.has_monte_carlo() {
        let _ = writeln!(
            out,
            "  {:>4}  {:>14}  {:>14}  {:>14}  {:>14}  {:>14}",
            "Year",
            "Invested",
            "Deterministic",
            percentile_label(band.lower),
            "Median",
            percentile_label(band.upper),
        );
        for row in &result.rows {
            let _ = writeln!(
                out,
                "  {:>4}  {:>14}  {:>14}  {:>14}  {:>14}  {:>14}",
                row.year,
                format_currency_short(row.total_invested, locale),
                format_currency_short(row.deterministic, locale),
                format_currency_short(row.lower, locale),
                format_currency_short(row.median, locale),
                format_currency_short(row.upper, locale),
            );
        }
    } else {
        let _ = writeln!(
            out,
            "  {:>4}  {:>14}  {:>14}  {:>14}",
            "Year", "Invested", "Interest", "Balance"
        );
        for row in &result.rows {
            let _ = writeln!(
                out,
                "  {:>4}  {:>14}  {:>14}  {:>14}",
                row.year,
                format_currency_short(row.total_invested, locale),
                format_currency_short(row.interest(), locale),
                format_currency_short(row.deterministic, locale),
            );
        }
    }
}

fn scenario_section(out: &mut String, result: &SimulationResult, locale: Locale) {
    if result.scenarios.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nScenarios ({} trials)", result.trials);
    for s in &result.scenarios {
        let _ = writeln!(
            out,
            "  {:>6}  capital {}  contribution {}  rate {}  -> {}",
            s.label,
            format_currency_short(s.capital, locale),
            format_currency_short(s.contribution, locale),
            format_percentage(s.rate, locale),
            format_currency(s.final_balance, locale),
        );
    }
}

fn sensitivity_section(out: &mut String, result: &SimulationResult, locale: Locale) {
    let s = &result.sensitivity;
    let _ = writeln!(out, "\nSensitivity");
    let _ = writeln!(
        out,
        "  One more year:               {}",
        format_currency(s.d_time, locale)
    );
    let _ = writeln!(
        out,
        "  Per 1.00 monthly:            {}",
        format_currency(s.d_contribution, locale)
    );
    let _ = writeln!(
        out,
        "  Per 1.00 initial:            {}",
        format_currency(s.d_capital, locale)
    );
    let _ = writeln!(
        out,
        "  Per 1 pp annual rate:        {}",
        format_currency(s.d_rate / 100.0, locale)
    );
}

fn risk_section(out: &mut String, result: &SimulationResult, locale: Locale) {
    let Some(risk) = &result.risk else {
        return;
    };
    let _ = writeln!(out, "\nRisk");
    if let Some(p) = risk.success_probability {
        let _ = writeln!(out, "  Goal success:      {}", format_percentage(p, locale));
    }
    let _ = writeln!(
        out,
        "  Ruin:              {}",
        format_percentage(risk.ruin_probability, locale)
    );
    if risk.insolvency_probability > 0.0 {
        let _ = writeln!(
            out,
            "  Insolvency:        {}",
            format_percentage(risk.insolvency_probability, locale)
        );
    }
    let _ = writeln!(
        out,
        "  VaR 95%:           {}",
        format_currency(risk.value_at_risk_95, locale)
    );
    let _ = writeln!(
        out,
        "  CVaR 95%:          {}",
        format_currency(risk.conditional_value_at_risk_95, locale)
    );
    let _ = writeln!(
        out,
        "  Volatility:        {}",
        format_currency(risk.volatility, locale)
    );
    let _ = writeln!(
        out,
        "  Coeff. variation:  {}",
        format_decimal(risk.coefficient_of_variation, 3, locale)
    );
    let _ = writeln!(
        out,
        "  Sharpe ratio:      {}",
        format_decimal(risk.sharpe_ratio, 2, locale)
    );
    let _ = writeln!(
        out,
        "  Risk/return:       {}",
        format_decimal(risk.risk_return_ratio, 2, locale)
    );
    if let Some(seed) = result.seed {
        let _ = writeln!(out, "  Seed:              {seed}");
    }
}

/// Render the full text report.
pub fn render(result: &SimulationResult, band: ConfidenceBand, locale: Locale) -> String {
    let mut out = String::new();
    summary_section(&mut out, result, locale);
    yearly_section(&mut out, result, band, locale);
    scenario_section(&mut out, result, locale);
    sensitivity_section(&mut out, result, locale);
    risk_section(&mut out, result, locale);
    out
}
