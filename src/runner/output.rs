//! Command output in text and JSON form.

use crate::cli::OutputFormat;
use crate::language::BindingMode;
use crate::registry::CountryRecord;
use crate::resolver::{Resolution, ResolutionSource};
use crate::routes::NavEntry;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Everything `resolve` reports about a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    /// Path as given.
    pub path: String,
    /// Active country code.
    pub code: String,
    /// Active country name.
    pub name: String,
    /// Rule that chose the country.
    pub source: ResolutionSource,
    /// Logical page path, when the path names a known page.
    pub page: Option<String>,
    /// Redirect target when the path is not canonical.
    pub canonical: Option<String>,
    /// Active language tag.
    pub language: String,
    /// How the language was chosen.
    pub language_mode: BindingMode,
    /// Service navigation for the active country.
    pub services: Vec<NavEntry>,
}

/// One row of `country list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryRow {
    /// Country code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Whether this is the unprefixed default.
    pub default: bool,
    /// Dialling prefix.
    pub dial_code: Option<String>,
    /// Flag emoji.
    pub flag: String,
}

impl From<&CountryRecord> for CountryRow {
    fn from(record: &CountryRecord) -> Self {
        Self {
            code: record.code().to_string(),
            name: record.display_name().to_owned(),
            slug: record.url_slug().to_owned(),
            default: record.is_default(),
            dial_code: record.dial_code().map(str::to_owned),
            flag: record.flag(),
        }
    }
}

/// Result of a single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Report {
    /// Output of `resolve`.
    Path(PathReport),
    /// Output of `link`.
    Link {
        /// Rewritten path.
        path: String,
    },
    /// Output of `canonical`.
    Canonical {
        /// Canonical path.
        path: String,
        /// Whether the input needs redirecting.
        redirect: bool,
    },
    /// Output of `country select` and `country clear`.
    Country(Resolution),
    /// Output of `country list`.
    Countries {
        /// Registered countries, default first.
        countries: Vec<CountryRow>,
    },
    /// Output of the `language` commands.
    Language {
        /// Active language tag.
        language: String,
        /// How the language was chosen.
        mode: BindingMode,
        /// Supported tags, base first.
        supported: Vec<String>,
    },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(report) => {
                writeln!(f, "country: {} ({})", report.name, report.code)?;
                writeln!(f, "source: {}", report.source)?;
                writeln!(f, "page: {}", report.page.as_deref().unwrap_or("not found"))?;
                if let Some(target) = &report.canonical {
                    writeln!(f, "canonical: {target}")?;
                }
                writeln!(f, "language: {} ({})", report.language, report.language_mode)?;
                writeln!(f, "services:")?;
                for entry in &report.services {
                    writeln!(f, "  {} {}", entry.label_key, entry.path)?;
                }
                Ok(())
            }
            Self::Link { path } | Self::Canonical { path, .. } => writeln!(f, "{path}"),
            Self::Country(resolution) => writeln!(
                f,
                "{} ({}) via {}",
                resolution.country.name, resolution.country.code, resolution.source
            ),
            Self::Countries { countries } => {
                for row in countries {
                    write!(f, "{} {} {} /{}", row.flag, row.code, row.name, row.slug)?;
                    if let Some(dial) = &row.dial_code {
                        write!(f, " {dial}")?;
                    }
                    if row.default {
                        write!(f, " (default)")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            Self::Language {
                language,
                mode,
                supported,
            } => {
                writeln!(f, "{language} ({mode})")?;
                writeln!(f, "supported: {}", supported.join(", "))
            }
        }
    }
}

/// Write `report` to `out` in `format`.
///
/// # Errors
///
/// Returns an I/O error when writing fails.
pub fn emit(out: &mut impl Write, format: OutputFormat, report: &Report) -> io::Result<()> {
    match format {
        OutputFormat::Text => write!(out, "{report}"),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
    }
}
