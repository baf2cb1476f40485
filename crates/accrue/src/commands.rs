//! Subcommand handlers.

use std::io::Write;
use std::time::Duration;

use accrue_core::model::RateConvention;
use accrue_core::projection::implied_rate;
use color_eyre::eyre::{Context, bail};

use crate::cli::{
    Command, ExportEventsArgs, ImpliedRateArgs, ImportEventsArgs, InitConfigArgs, RunArgs,
};
use crate::config::RunFile;
use crate::events_csv::{read_events_csv, write_events_csv};
use crate::export::{to_json, write_csv, write_scenarios_csv};
use crate::format::{format_currency, format_percentage};
use crate::report::render;
use crate::worker::{SimulationRequest, SimulationResponse, SimulationWorker};

pub fn dispatch(command: &Command, out: &mut impl Write) -> color_eyre::Result<()> {
    match command {
        Command::Run(args) => run(args, out),
        Command::ImpliedRate(args) => implied(args, out),
        Command::InitConfig(args) => init_config(args, out),
        Command::ExportEvents(args) => export_events(args, out),
        Command::ImportEvents(args) => import_events(args, out),
    }
}

fn run(args: &RunArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let file = args.resolve()?;
    let params = file.parameters.to_parameters()?;
    let show_progress = !file.output.json;

    let worker = SimulationWorker::new();
    if !worker.send(SimulationRequest::Run {
        params: Box::new(params),
        config: file.monte_carlo.clone(),
    }) {
        bail!("simulation worker is not running");
    }

    let timeout = args.timeout_secs.map(Duration::from_secs);
    let response = worker.wait(timeout, |completed, total| {
        tracing::debug!(completed, total, "monte carlo progress");
        if show_progress {
            eprint!("\rSimulating... {completed}/{total} trials");
            if completed == total {
                eprintln!();
            }
        }
    });

    let result = match response {
        Some(SimulationResponse::Complete(result)) => result,
        Some(SimulationResponse::Cancelled) => bail!("simulation cancelled before completion"),
        Some(SimulationResponse::Failed(e)) => return Err(e).wrap_err("simulation failed"),
        None => bail!("simulation worker stopped unexpectedly"),
    };
    tracing::info!(
        path = ?result.path,
        trials = result.trials,
        final_balance = result.summary.final_balance,
        "simulation finished"
    );

    if let Some(path) = &file.output.csv {
        write_csv(
            path,
            &result,
            file.monte_carlo.band,
            file.parameters.goal,
            file.output.locale,
        )?;
    }
    if let Some(path) = &file.output.scenarios_csv {
        write_scenarios_csv(path, &result, file.output.locale)?;
    }

    if file.output.json {
        writeln!(out, "{}", to_json(&result)?)?;
    } else {
        write!(
            out,
            "{}",
            render(&result, file.monte_carlo.band, file.output.locale)
        )?;
    }
    Ok(())
}

fn implied(args: &ImpliedRateArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let convention = if args.nominal {
        RateConvention::Nominal
    } else {
        RateConvention::Effective
    };
    let found = implied_rate(
        args.target,
        args.capital,
        args.contribution,
        args.years,
        convention,
    )
    .wrap_err("searching for the implied rate")?;

    if !found.converged {
        tracing::warn!(
            rate = found.rate,
            balance = found.balance,
            "target is outside the searchable rate range"
        );
    }

    writeln!(
        out,
        "Implied annual rate: {}{}",
        format_percentage(found.rate, args.locale),
        if found.converged { "" } else { " (out of range)" }
    )?;
    writeln!(
        out,
        "Balance at that rate: {}",
        format_currency(found.balance, args.locale)
    )?;
    Ok(())
}

fn init_config(args: &InitConfigArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }
    RunFile::sample().save(&args.path)?;
    tracing::info!(path = %args.path.display(), "wrote sample run file");
    writeln!(out, "Wrote sample run file to {}", args.path.display())?;
    Ok(())
}

fn export_events(args: &ExportEventsArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let file = RunFile::load(&args.config)?;
    let events = &file.parameters.events;
    if events.is_empty() {
        bail!("{} has no events to export", args.config.display());
    }
    let locale = args.locale.unwrap_or(file.output.locale);
    write_events_csv(&args.out, events, locale)?;
    writeln!(
        out,
        "Exported {} events to {}",
        events.len(),
        args.out.display()
    )?;
    Ok(())
}

fn import_events(args: &ImportEventsArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let mut file = RunFile::load(&args.config)?;
    let locale = args.locale.unwrap_or(file.output.locale);
    let imported = read_events_csv(&args.csv, locale)?;

    if args.replace {
        file.parameters.events.clear();
    }
    let count = imported.len();
    file.parameters.events.extend(imported);
    file.parameters
        .to_parameters()
        .wrap_err("imported events do not fit the plan")?;
    file.save(&args.config)?;

    tracing::info!(
        path = %args.config.display(),
        imported = count,
        total = file.parameters.events.len(),
        "imported events"
    );
    writeln!(
        out,
        "Imported {count} events into {} ({} total)",
        args.config.display(),
        file.parameters.events.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::tempdir;

    fn execute(args: &[&str]) -> color_eyre::Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        dispatch(&cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_run_deterministic_report() {
        let text = execute(&[
            "accrue",
            "run",
            "--capital",
            "10000",
            "--contribution",
            "1000",
            "--rate",
            "0.10",
            "--years",
            "10",
            "--nominal",
        ])
        .unwrap();
        assert!(text.contains("$231,915.39"), "{text}");
    }

    #[test]
    fn test_run_json_and_csv() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("table.csv");
        let text = execute(&[
            "accrue",
            "run",
            "--capital",
            "8000:10000:12000",
            "--rate",
            "0.10",
            "--years",
            "5",
            "--trials",
            "300",
            "--seed",
            "1",
            "--json",
            "--csv",
            csv.to_str().unwrap(),
        ])
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["trials"], 300);
        let table = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(table.lines().count(), 7);
    }

    #[test]
    fn test_run_validation_error() {
        let err = execute(&[
            "accrue",
            "run",
            "--capital",
            "12000:10000:8000",
            "--rate",
            "0.10",
            "--years",
            "5",
        ])
        .unwrap_err();
        assert!(format!("{err:?}").contains("greater than max"));
    }

    #[test]
    fn test_implied_rate() {
        let text = execute(&[
            "accrue",
            "implied-rate",
            "--target",
            "225801.28",
            "--capital",
            "10000",
            "--contribution",
            "1000",
            "--years",
            "10",
        ])
        .unwrap();
        assert!(text.contains("Implied annual rate: 10.00%"), "{text}");
        assert!(!text.contains("out of range"));
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        let path_str = path.to_str().unwrap();

        execute(&["accrue", "init-config", path_str]).unwrap();
        assert!(RunFile::load(&path).is_ok());

        assert!(execute(&["accrue", "init-config", path_str]).is_err());
        assert!(execute(&["accrue", "init-config", path_str, "--force"]).is_ok());
    }

    #[test]
    fn test_export_then_import_events() {
        let dir = tempdir().unwrap();
        let plan = dir.path().join("plan.yaml");
        let csv = dir.path().join("events.csv");
        let plan_str = plan.to_str().unwrap();
        let csv_str = csv.to_str().unwrap();
        RunFile::sample().save(&plan).unwrap();

        let text = execute(&["accrue", "export-events", plan_str, csv_str]).unwrap();
        assert!(text.contains("Exported 2 events"), "{text}");

        let text = execute(&["accrue", "import-events", plan_str, csv_str]).unwrap();
        assert!(text.contains("Imported 2 events"), "{text}");
        assert_eq!(RunFile::load(&plan).unwrap().parameters.events.len(), 4);

        execute(&["accrue", "import-events", plan_str, csv_str, "--replace"]).unwrap();
        let loaded = RunFile::load(&plan).unwrap();
        assert_eq!(loaded.parameters.events, RunFile::sample().parameters.events);
    }

    #[test]
    fn test_export_without_events_fails() {
        let dir = tempdir().unwrap();
        let plan = dir.path().join("plan.yaml");
        let mut file = RunFile::sample();
        file.parameters.events.clear();
        file.save(&plan).unwrap();

        let csv = dir.path().join("events.csv");
        let result = execute(&[
            "accrue",
            "export-events",
            plan.to_str().unwrap(),
            csv.to_str().unwrap(),
        ]);
        assert!(result.is_err());
        assert!(!csv.exists());
    }

    #[test]
    fn test_run_writes_scenarios_csv() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("scenarios.csv");
        execute(&[
            "accrue",
            "run",
            "--capital",
            "8000:10000:12000",
            "--rate",
            "0.10",
            "--years",
            "5",
            "--trials",
            "200",
            "--seed",
            "3",
            "--json",
            "--scenarios-csv",
            csv.to_str().unwrap(),
        ])
        .unwrap();

        let table = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("scenario,trial,"));
        assert!(lines[7].starts_with("Mode,"));
    }
}
