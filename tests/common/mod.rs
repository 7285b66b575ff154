//! Shared helpers for integration tests.
//!
//! Integration tests under `tests/` compile as independent crates. This module
//! is included via `mod common;` in individual test files to share fixtures and
//! helpers while keeping test modules small and avoiding duplication.

use country_router::language::SupportedLanguages;
use country_router::preferences::{MemoryBackend, PreferenceBackend, PreferenceStore};
use country_router::registry::CountryRegistry;
use country_router::session::SiteSession;
use rstest::fixture;
use std::sync::Arc;
use test_support::StubSystemLocale;

/// Shared in-memory backend, so a test can open several sessions over the
/// same stored preferences.
#[fixture]
pub fn backend() -> Arc<dyn PreferenceBackend> {
    Arc::new(MemoryBackend::new())
}

/// Open a session over `backend` with the built-in tables and no host
/// locale.
pub fn open_session(backend: &Arc<dyn PreferenceBackend>) -> SiteSession {
    open_session_with_locale(backend, &StubSystemLocale::default())
}

/// Open a session over `backend` for a host reporting `locale`.
pub fn open_session_with_locale(
    backend: &Arc<dyn PreferenceBackend>,
    locale: &StubSystemLocale,
) -> SiteSession {
    SiteSession::new(
        Arc::new(CountryRegistry::builtin()),
        SupportedLanguages::builtin(),
        PreferenceStore::from_shared(Arc::clone(backend)),
        locale,
    )
}
