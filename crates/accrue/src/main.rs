use accrue::commands::dispatch;
use accrue::{Cli, init_logging};
use clap::Parser;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref(), &cli.log_level)?;

    let mut stdout = std::io::stdout().lock();
    dispatch(&cli.command, &mut stdout)?;

    tracing::debug!("accrue finished");
    Ok(())
}
