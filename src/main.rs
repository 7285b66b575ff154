//! Application entry point.
//!
//! Parses command-line arguments, merges the settings layers and delegates
//! execution to [`runner::run`].

use country_router::{cli, runner};
use std::env;
use std::io;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let (parsed, matches) = cli::parse_from(env::args_os()).unwrap_or_else(|err| err.exit());
    let configured = runner::configure(&parsed, &matches);
    let verbose = configured
        .as_ref()
        .map_or(parsed.verbose, |(merged, _)| merged.verbose);
    let max_level = if verbose { Level::DEBUG } else { Level::ERROR };
    fmt().with_writer(io::stderr).with_max_level(max_level).init();
    match configured.and_then(|(merged, config)| runner::run(&merged, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            let help = runner::diagnostic_help(&err);
            tracing::error!(error = %message, help = help.as_deref(), "command failed");
            ExitCode::FAILURE
        }
    }
}
