//! Command-line front end for the accrue projection engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod events_csv;
pub mod export;
pub mod format;
pub mod io;
pub mod logging;
pub mod report;
pub mod worker;

pub use cli::Cli;
pub use logging::init_logging;
