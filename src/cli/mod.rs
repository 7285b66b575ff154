//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands, and
//! [`merge_with_config`], which layers defaults, the configuration file,
//! `COUNTRY_ROUTER_*` environment variables and explicit flags into the
//! settings a run uses.

use camino::Utf8PathBuf;
use clap::parser::ValueSource;
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::{
    MergeComposer, OrthoConfig, OrthoError, OrthoMergeExt, OrthoResult, sanitize_value,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::sync::Arc;

mod parsing;

use parsing::{parse_country_code, parse_language_tag, parse_site_path};

/// Environment variable naming the site configuration file.
pub const CONFIG_ENV_VAR: &str = "COUNTRY_ROUTER_CONFIG";
/// Prefix shared by every environment variable the merge reads.
pub const ENV_PREFIX: &str = "COUNTRY_ROUTER_";

/// Fields that may be overridden from the command line.
const LAYERED_FIELDS: [&str; 4] = ["config", "state_dir", "verbose", "format"];

/// Resolve country variants, rewrite links and manage visitor preferences
/// for a multi-country site.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, OrthoConfig)]
#[command(author, version, about, long_about = None)]
#[ortho_config(prefix = "COUNTRY_ROUTER")]
pub struct Cli {
    /// Site configuration file (JSON).
    #[arg(long, value_name = "FILE", env = CONFIG_ENV_VAR, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding persisted preferences.
    ///
    /// Also read from `COUNTRY_ROUTER_STATE_DIR` and the configuration
    /// file's `state_dir`, in that order.
    #[arg(long, value_name = "DIR", global = true)]
    pub state_dir: Option<Utf8PathBuf>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    #[ortho_config(default = false)]
    pub verbose: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    #[ortho_config(default = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Command to execute.
    ///
    /// Layer merging ignores this field; CLI parsing supplies it.
    #[serde(skip)]
    #[command(subcommand)]
    #[ortho_config(skip_cli)]
    pub command: Commands,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            state_dir: None,
            verbose: false,
            format: OutputFormat::Text,
            command: Commands::default(),
        }
    }
}

/// Parse `args` into a [`Cli`] and keep the matches for [`merge_with_config`].
///
/// # Errors
///
/// Returns the clap error for unknown flags, missing commands or rejected
/// values.
pub fn parse_from<I, T>(args: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, matches))
}

/// Merge configuration layers over the parsed CLI values.
///
/// Precedence, lowest first: built-in defaults, `file_layer` (the settings
/// found in the site configuration file), `COUNTRY_ROUTER_*` environment
/// variables, then flags given on the command line.
///
/// # Errors
///
/// Returns an [`OrthoError`] when a layer cannot be read or the merged
/// values do not deserialize.
pub fn merge_with_config(
    cli: &Cli,
    matches: &ArgMatches,
    file_layer: Option<serde_json::Value>,
) -> OrthoResult<Cli> {
    let command = cli.command.clone();
    let mut errors = Vec::new();
    let mut composer = MergeComposer::with_capacity(4);

    match sanitize_value(&Cli::default()) {
        Ok(value) => composer.push_defaults(value),
        Err(err) => errors.push(err),
    }

    if let Some(value) = file_layer {
        composer.push_file(value, None);
    }

    match Figment::from(env_provider())
        .extract::<serde_json::Value>()
        .into_ortho_merge()
    {
        Ok(value) => composer.push_environment(value),
        Err(err) => errors.push(err),
    }

    match cli_overrides_from_matches(cli, matches) {
        Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
        Ok(_) => {}
        Err(err) => errors.push(err),
    }

    let composition = LayerComposition::new(composer.layers(), errors);
    let mut merged = composition.into_merge_result(Cli::merge_from_layers)?;
    merged.command = command;
    Ok(merged)
}

/// Return the prefixed environment provider for CLI settings.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// The merge pipeline treats an empty JSON object as "no overrides".
fn is_empty_value(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(map) if map.is_empty())
}

fn cli_overrides_from_matches(cli: &Cli, matches: &ArgMatches) -> OrthoResult<serde_json::Value> {
    let serde_json::Value::Object(mut map) = sanitize_value(cli)? else {
        return Err(Arc::new(OrthoError::Validation {
            key: String::from("cli"),
            message: String::from("expected parsed CLI values to serialize to an object"),
        }));
    };
    map.remove("command");
    for field in LAYERED_FIELDS {
        if matches.value_source(field) != Some(ValueSource::CommandLine) {
            map.remove(field);
        }
    }
    Ok(serde_json::Value::Object(map))
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON document per invocation.
    Json,
}

/// Arguments accepted by the `resolve` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ResolveArgs {
    /// Site path to resolve, for example `/myanmar/services/lcl`.
    #[arg(value_name = "PATH", value_parser = parse_site_path)]
    pub path: String,

    /// Skip the geolocation fallback for this run.
    #[arg(long)]
    pub no_geolocation: bool,
}

/// Arguments accepted by the `link` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct LinkArgs {
    /// Logical base path, for example `/contact`.
    #[arg(value_name = "BASE_PATH", value_parser = parse_site_path)]
    pub base_path: String,

    /// Country to rewrite for; defaults to the country resolved for `/`.
    #[arg(long, value_name = "CODE", value_parser = parse_country_code)]
    pub country: Option<String>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Commands {
    /// Resolve the active country and language for a path.
    Resolve(ResolveArgs),

    /// Rewrite a base path for a country.
    Link(LinkArgs),

    /// Print the canonical form of a path.
    Canonical {
        /// Path to canonicalize.
        #[arg(value_name = "PATH", value_parser = parse_site_path)]
        path: String,
    },

    /// Manage the stored country preference.
    Country {
        /// Country action.
        #[command(subcommand)]
        action: CountryCommand,
    },

    /// Manage the display language.
    Language {
        /// Language action.
        #[command(subcommand)]
        action: LanguageCommand,
    },
}

impl Default for Commands {
    /// `country list`, the one command with no arguments or side effects.
    fn default() -> Self {
        Self::Country {
            action: CountryCommand::List,
        }
    }
}

/// Country preference actions.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CountryCommand {
    /// Persist an explicit country choice.
    Select {
        /// ISO 3166-1 alpha-2 code, for example `lk`.
        #[arg(value_name = "CODE", value_parser = parse_country_code)]
        code: String,
    },
    /// Forget the stored country.
    Clear,
    /// List registered countries.
    List,
}

/// Display language actions.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum LanguageCommand {
    /// Show the active language and how it was chosen.
    Show,
    /// Cycle to the next supported language.
    Switch,
    /// Choose a supported language explicitly.
    Select {
        /// Language tag, for example `zh`.
        #[arg(value_name = "TAG", value_parser = parse_language_tag)]
        tag: String,
    },
    /// Forget the explicit language choice.
    Reset,
}
