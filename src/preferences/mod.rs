//! Persisted country and language preferences.
//!
//! [`PreferenceStore`] is the only component that reads or writes persisted
//! state. It never propagates storage failures: an unavailable medium reads
//! as "no preference" and writes become no-ops, so resolution keeps working
//! from path and default signals alone.

mod backend;
mod file;

pub use backend::{DisabledBackend, MemoryBackend, PreferenceBackend, StorageError};
pub use file::FileBackend;

use crate::language::{LanguageTag, SupportedLanguages};
use crate::registry::{CountryRegistry, ResolvedCountry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Storage key holding the serialized `{code, name}` country preference.
pub const COUNTRY_KEY: &str = "country-router.country";
/// Storage key holding the language tag string.
pub const LANGUAGE_KEY: &str = "country-router.language";

/// Gracefully degrading facade over a [`PreferenceBackend`].
///
/// Clones share the same backend.
///
/// # Examples
///
/// ```
/// use country_router::preferences::PreferenceStore;
/// use country_router::registry::CountryRegistry;
///
/// let registry = CountryRegistry::builtin();
/// let store = PreferenceStore::in_memory();
/// let lk = registry.by_code("lk").expect("sri lanka").to_resolved();
/// store.save_country(&lk);
/// assert_eq!(store.load_country(&registry), Some(lk));
///
/// let disabled = PreferenceStore::disabled();
/// disabled.save_country(&registry.default_country().to_resolved());
/// assert_eq!(disabled.load_country(&registry), None);
/// ```
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
}

impl PreferenceStore {
    /// Wrap `backend`.
    #[must_use]
    pub fn new(backend: impl PreferenceBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already shared backend.
    #[must_use]
    pub fn from_shared(backend: Arc<dyn PreferenceBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Store whose medium is unavailable.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(DisabledBackend)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "preference storage read failed; treating as absent");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            warn!(key, error = %err, "preference storage write failed; keeping choice in memory");
        }
    }

    fn delete(&self, key: &str) {
        if let Err(err) = self.backend.remove(key) {
            warn!(key, error = %err, "preference storage remove failed");
        }
    }

    /// Persist an explicit country choice.
    pub fn save_country(&self, country: &ResolvedCountry) {
        match serde_json::to_string(country) {
            Ok(json) => {
                self.write(COUNTRY_KEY, &json);
                info!(code = %country.code, "country preference saved");
            }
            Err(err) => warn!(error = %err, "failed to serialize country preference"),
        }
    }

    /// Load the stored country, validated against `registry`.
    ///
    /// Malformed records and codes missing from the registry read as absent.
    /// The returned name is the registry's current display name.
    #[must_use]
    pub fn load_country(&self, registry: &CountryRegistry) -> Option<ResolvedCountry> {
        let raw = self.read(COUNTRY_KEY)?;
        let stored: ResolvedCountry = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(err) => {
                debug!(error = %err, "ignoring malformed country preference");
                return None;
            }
        };
        let Some(record) = registry.lookup(&stored) else {
            debug!(code = %stored.code, "ignoring country preference outside the registry");
            return None;
        };
        Some(record.to_resolved())
    }

    /// Remove the stored country.
    pub fn clear_country(&self) {
        self.delete(COUNTRY_KEY);
    }

    /// Persist an explicit language choice.
    pub fn save_language(&self, tag: &LanguageTag) {
        self.write(LANGUAGE_KEY, tag.as_str());
        info!(language = %tag, "language preference saved");
    }

    /// Load the stored language if it is one of `supported`.
    #[must_use]
    pub fn load_language(&self, supported: &SupportedLanguages) -> Option<LanguageTag> {
        let raw = self.read(LANGUAGE_KEY)?;
        let found = supported.find(raw.trim()).cloned();
        if found.is_none() {
            debug!(stored = %raw, "ignoring unsupported language preference");
        }
        found
    }

    /// Remove the stored language.
    pub fn clear_language(&self) {
        self.delete(LANGUAGE_KEY);
    }

    /// Remove every stored preference.
    pub fn clear_all(&self) {
        self.clear_country();
        self.clear_language();
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn supported() -> SupportedLanguages {
        SupportedLanguages::builtin()
    }

    #[rstest]
    #[case(r#"{"code":"zz","name":"Nowhere"}"#)]
    #[case(r#"{"code":"lk"}"#)]
    #[case("not json")]
    #[case("")]
    fn malformed_country_preferences_read_as_absent(#[case] raw: &str) {
        let registry = CountryRegistry::builtin();
        let store = PreferenceStore::new(MemoryBackend::with_entries([(COUNTRY_KEY, raw)]));
        assert_eq!(store.load_country(&registry), None);
    }

    #[test]
    fn stale_display_name_is_refreshed_from_registry() {
        let registry = CountryRegistry::builtin();
        let store = PreferenceStore::new(MemoryBackend::with_entries([(
            COUNTRY_KEY,
            r#"{"code":"LK","name":"Ceylon"}"#,
        )]));
        let loaded = store.load_country(&registry).expect("valid preference");
        assert_eq!(loaded.name, "Sri Lanka");
    }

    #[test]
    fn language_round_trip_and_validation() {
        let store = PreferenceStore::in_memory();
        let zh = supported().find("zh").cloned().expect("zh supported");
        store.save_language(&zh);
        assert_eq!(store.load_language(&supported()), Some(zh));

        let unsupported =
            PreferenceStore::new(MemoryBackend::with_entries([(LANGUAGE_KEY, "fr")]));
        assert_eq!(unsupported.load_language(&supported()), None);
    }

    #[test]
    fn clear_all_removes_both_entries() {
        let registry = CountryRegistry::builtin();
        let store = PreferenceStore::in_memory();
        store.save_country(&registry.default_country().to_resolved());
        store.save_language(supported().base());
        store.clear_all();
        assert_eq!(store.load_country(&registry), None);
        assert_eq!(store.load_language(&supported()), None);
    }

    #[test]
    fn clones_share_the_backend() {
        let registry = CountryRegistry::builtin();
        let store = PreferenceStore::in_memory();
        let other = store.clone();
        let mm = registry.by_code("mm").expect("myanmar").to_resolved();
        other.save_country(&mm);
        assert_eq!(store.load_country(&registry), Some(mm));
    }

    #[test]
    fn disabled_storage_never_panics() {
        let registry = CountryRegistry::builtin();
        let store = PreferenceStore::disabled();
        store.save_language(supported().base());
        store.clear_all();
        assert_eq!(store.load_country(&registry), None);
        assert_eq!(store.load_language(&supported()), None);
    }
}
