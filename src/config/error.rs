//! Error types for site configuration.
//!
//! Kept in a submodule so the lint suppression needed by the derive macros
//! stays narrowly scoped.

// miette/thiserror derive expansion trips `unused_assignments` on some
// toolchains and not others, so `#[expect]` cannot be used.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::geolocation::GeolocationError;
use crate::language::LanguageError;
use crate::registry::RegistryError;
use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Errors raised while loading or validating a site configuration file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}'")]
    #[diagnostic(
        code(country_router::config::read),
        help("check that the path passed to --config or COUNTRY_ROUTER_CONFIG exists")
    )]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("failed to parse configuration file '{path}'")]
    #[diagnostic(code(country_router::config::parse))]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Decoder error, including line and column.
        #[source]
        source: serde_json::Error,
    },
    /// The `countries` table is invalid.
    #[error("invalid country table")]
    #[diagnostic(
        code(country_router::config::countries),
        help("codes and slugs must be unique, slugs use only a-z, 0-9 and \"-\" and may not name a page, and exactly one country needs \"default\": true")
    )]
    Countries {
        /// The violated registry invariant.
        #[source]
        source: RegistryError,
    },
    /// The `languages` table is invalid.
    #[error("invalid language table")]
    #[diagnostic(
        code(country_router::config::languages),
        help("use BCP 47 tags such as \"en\" or \"zh-CN\"")
    )]
    Languages {
        /// The offending language error.
        #[source]
        source: LanguageError,
    },
    /// A country names a default language that is not supported.
    #[error("country '{code}' defaults to unsupported language '{language}'")]
    #[diagnostic(
        code(country_router::config::country_language),
        help("add the language to languages.supported or remove default_language")
    )]
    CountryLanguage {
        /// Country code.
        code: String,
        /// The unsupported tag.
        language: String,
    },
    /// The geolocation endpoint is unusable.
    #[error("invalid geolocation endpoint")]
    #[diagnostic(code(country_router::config::endpoint))]
    Endpoint {
        /// Why the endpoint was rejected.
        #[source]
        source: GeolocationError,
    },
    /// The geolocation timeout was zero.
    #[error("geolocation.timeout_ms must be greater than zero")]
    #[diagnostic(code(country_router::config::timeout))]
    ZeroTimeout,
}
