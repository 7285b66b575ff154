//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal: [`configure`] loads the configuration
//! file and merges the settings layers, then [`run`] opens the preference
//! store, builds a [`SiteSession`] and runs the requested command.

mod error;
mod output;

pub use error::RunnerError;
pub use output::{CountryRow, PathReport, Report, emit};

use crate::cli::{
    Cli, Commands, CountryCommand, LanguageCommand, LinkArgs, ResolveArgs, merge_with_config,
};
use crate::config::{ConfigError, DEFAULT_STATE_DIR, SiteConfig};
use crate::language::{SysLocale, SystemLocale};
use crate::link::rewrite_link;
use crate::path::normalize_path;
use crate::preferences::{FileBackend, PreferenceStore};
use crate::resolver::SelectionError;
use crate::session::SiteSession;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::ArgMatches;
use miette::Diagnostic;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long shutdown waits for a lookup still running on the blocking pool.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Load the configuration file named by `cli` and merge every settings
/// layer over the parsed arguments.
///
/// # Errors
///
/// Returns an error when the configuration file is unreadable or invalid,
/// or when an environment variable holds a value of the wrong type.
pub fn configure(cli: &Cli, matches: &ArgMatches) -> Result<(Cli, SiteConfig)> {
    let config = load_config(cli.config.as_deref())?;
    let merged = merge_with_config(cli, matches, config.settings_layer())
        .context("failed to merge configuration layers")?;
    Ok((merged, config))
}

/// Execute a merged [`Cli`] command, writing results to standard output.
///
/// # Errors
///
/// Returns an error when a table in `config` is invalid, a country or
/// language argument is rejected, or output cannot be written.
pub fn run(cli: &Cli, config: &SiteConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(cli, config, &mut out, &SysLocale)
}

/// Execute `cli` with an explicit output sink and host locale provider.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(
    cli: &Cli,
    config: &SiteConfig,
    out: &mut impl Write,
    locale: &impl SystemLocale,
) -> Result<()> {
    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STATE_DIR));
    let store = open_store(&state_dir);
    let registry = Arc::new(config.registry().context("invalid country table")?);
    let supported = config
        .supported_languages()
        .context("invalid language table")?;

    let geolocation = config.geolocation.enabled
        && matches!(&cli.command, Commands::Resolve(args) if !args.no_geolocation);
    let mut session = SiteSession::new(registry, supported, store, locale)
        .with_geolocation(geolocation)
        .with_lookup_timeout(config.lookup_timeout());

    let report = match &cli.command {
        Commands::Resolve(args) => handle_resolve(&mut session, config, args)?,
        Commands::Link(args) => handle_link(&session, args)?,
        Commands::Canonical { path } => handle_canonical(&session, path),
        Commands::Country { action } => handle_country(&mut session, action)?,
        Commands::Language { action } => handle_language(&mut session, action)?,
    };
    emit(out, cli.format, &report).map_err(RunnerError::Output)?;
    Ok(())
}

/// Find the `help` text of the first diagnostic in `err`'s chain.
#[must_use]
pub fn diagnostic_help(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        let diagnostic = cause
            .downcast_ref::<RunnerError>()
            .map(|runner| runner as &dyn Diagnostic)
            .or_else(|| {
                cause
                    .downcast_ref::<ConfigError>()
                    .map(|config| config as &dyn Diagnostic)
            })?;
        diagnostic.help().map(|help| help.to_string())
    })
}

fn load_config(path: Option<&Utf8Path>) -> Result<SiteConfig> {
    path.map_or_else(
        || Ok(SiteConfig::default()),
        |path| {
            SiteConfig::load(path)
                .with_context(|| format!("failed to load configuration from {path}"))
        },
    )
}

fn open_store(state_dir: &Utf8Path) -> PreferenceStore {
    match FileBackend::open(state_dir) {
        Ok(backend) => {
            debug!(path = %state_dir, "opened preference state directory");
            PreferenceStore::new(backend)
        }
        Err(err) => {
            warn!(error = %err, "preferences will not persist for this run");
            PreferenceStore::disabled()
        }
    }
}

fn handle_resolve(
    session: &mut SiteSession,
    config: &SiteConfig,
    args: &ResolveArgs,
) -> Result<Report> {
    let locator = config.locator().context("invalid geolocation endpoint")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start the async runtime")?;
    let resolution = runtime.block_on(session.navigate_and_locate(&args.path, &locator));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    Ok(Report::Path(PathReport {
        path: args.path.clone(),
        code: resolution.country.code.to_string(),
        name: resolution.country.name,
        source: resolution.source,
        page: session.current_page().map(|page| page.path()),
        canonical: session.canonical(&args.path),
        language: session.current_language().to_string(),
        language_mode: session.language_mode(),
        services: session.services_nav(),
    }))
}

fn handle_link(session: &SiteSession, args: &LinkArgs) -> Result<Report> {
    let path = match &args.country {
        Some(code) => {
            let record = session.registry().by_code(code).ok_or_else(|| {
                RunnerError::from(SelectionError::UnknownCountry {
                    code: code.clone(),
                    known: known_codes(session),
                })
            })?;
            rewrite_link(session.registry(), &args.base_path, &record.to_resolved())
        }
        None => session.link(&args.base_path),
    };
    Ok(Report::Link { path })
}

fn handle_canonical(session: &SiteSession, path: &str) -> Report {
    match session.canonical(path) {
        Some(target) => Report::Canonical {
            path: target,
            redirect: true,
        },
        None => Report::Canonical {
            path: normalize_path(path),
            redirect: false,
        },
    }
}

fn handle_country(session: &mut SiteSession, action: &CountryCommand) -> Result<Report> {
    Ok(match action {
        CountryCommand::Select { code } => {
            Report::Country(session.select_country(code).map_err(RunnerError::from)?)
        }
        CountryCommand::Clear => Report::Country(session.clear_country()),
        CountryCommand::List => Report::Countries {
            countries: session.registry().iter().map(CountryRow::from).collect(),
        },
    })
}

fn handle_language(session: &mut SiteSession, action: &LanguageCommand) -> Result<Report> {
    match action {
        LanguageCommand::Show => {}
        LanguageCommand::Switch => {
            session.switch_language();
        }
        LanguageCommand::Select { tag } => {
            session.select_language(tag).map_err(RunnerError::from)?;
        }
        LanguageCommand::Reset => {
            session.reset_language();
        }
    }
    Ok(Report::Language {
        language: session.current_language().to_string(),
        mode: session.language_mode(),
        supported: session
            .supported_languages()
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

fn known_codes(session: &SiteSession) -> String {
    session
        .registry()
        .iter()
        .map(|record| record.code().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
