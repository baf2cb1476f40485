//! Tracing setup for the CLI.
//!
//! Without `--log-file`, events go to stderr. With one, they are appended to
//! the file; a file grown past [`MAX_LOG_SIZE`] is moved aside to
//! `<name>.1` first, replacing any earlier backup.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::Context;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

fn backup_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

/// Move `log_path` to its backup when it is larger than `max_size`.
/// Returns whether it was moved.
fn roll_over(log_path: &Path, max_size: u64) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_size {
        return Ok(false);
    }
    fs::rename(log_path, backup_path(log_path))?;
    Ok(true)
}

/// `level` applies to the `accrue` target; `RUST_LOG` replaces the filter.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("accrue={level},accrue_core=warn")))
}

pub fn init_logging(log_file: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    let Some(log_path) = log_file else {
        registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .init();
        return Ok(());
    };

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating log directory {}", parent.display()))?;
    }
    let rolled = roll_over(log_path, MAX_LOG_SIZE)
        .wrap_err_with(|| format!("rolling over {}", log_path.display()))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .wrap_err_with(|| format!("opening log file {}", log_path.display()))?;

    registry
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    tracing::debug!(path = %log_path.display(), rolled, "file logging started");
    Ok(())
}
