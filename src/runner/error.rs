//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint
//! suppressions narrowly.

// miette/thiserror derive expansion trips `unused_assignments` on some
// toolchains and not others, so `#[expect]` cannot be used.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::language::LanguageError;
use crate::resolver::SelectionError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while executing a command.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The requested country is not registered.
    #[error(transparent)]
    #[diagnostic(
        code(country_router::runner::unknown_country),
        help("run `country-router country list` to see registered countries")
    )]
    UnknownCountry(#[from] SelectionError),

    /// The requested language is invalid or not offered.
    #[error(transparent)]
    #[diagnostic(
        code(country_router::runner::language),
        help("run `country-router language show` to see supported languages")
    )]
    Language(#[from] LanguageError),

    /// Writing command output failed.
    #[error("failed to write command output")]
    #[diagnostic(code(country_router::runner::output))]
    Output(#[source] std::io::Error),
}
