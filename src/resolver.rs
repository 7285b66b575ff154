//! Country resolution.
//!
//! [`CountryResolver`] decides the active country from, in order: a country
//! slug in the current path, the stored preference, a one-off geolocation
//! lookup, and finally the registry default. Resolution never waits on the
//! network: [`CountryResolver::navigate`] answers synchronously and hands out
//! a [`LookupTicket`] when a lookup is worth running. Every navigation and
//! explicit selection bumps a generation counter so that late lookup results
//! cannot override a signal that has since become active.

use crate::geolocation::{LookupCompletion, LookupTicket};
use crate::path::{ParsedPath, parse_path};
use crate::preferences::PreferenceStore;
use crate::registry::{CountryRecord, CountryRegistry, ResolvedCountry};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    /// A country slug in the current path.
    Path,
    /// A previously persisted explicit or geolocated choice.
    StoredPreference,
    /// A geolocation lookup finished during this session.
    Geolocation,
    /// Nothing else applied.
    Default,
}

impl ResolutionSource {
    /// Whether this source takes precedence over a geolocation result.
    #[must_use]
    pub const fn outranks_geolocation(self) -> bool {
        matches!(self, Self::Path | Self::StoredPreference)
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::StoredPreference => "stored-preference",
            Self::Geolocation => "geolocation",
            Self::Default => "default",
        })
    }
}

/// The active country and the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The active country.
    pub country: ResolvedCountry,
    /// The winning rule.
    pub source: ResolutionSource,
}

/// Result of a navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Navigation {
    /// Best synchronous answer.
    pub resolution: Resolution,
    /// Present when a geolocation lookup should be run for this navigation.
    pub lookup: Option<LookupTicket>,
}

/// Errors raised by explicit country selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The code does not name a registered country.
    #[error("unknown country '{code}' (known: {known})")]
    UnknownCountry {
        /// The rejected code.
        code: String,
        /// Comma-separated list of registered codes.
        known: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupState {
    NotStarted,
    Pending(LookupTicket),
    Settled,
}

/// Stateful resolver owned by a single session.
#[derive(Debug, Clone)]
pub struct CountryResolver {
    registry: Arc<CountryRegistry>,
    store: PreferenceStore,
    geolocation_enabled: bool,
    generation: u64,
    // Generation of the latest `select_country` or `clear_preference`.
    explicit_generation: u64,
    path: ParsedPath,
    // Mirrors the persisted choice so it survives unavailable storage.
    session_choice: Option<ResolvedCountry>,
    resolution: Resolution,
    lookup: LookupState,
}

impl CountryResolver {
    /// Create a resolver positioned at the site root. Geolocation is enabled.
    #[must_use]
    pub fn new(registry: Arc<CountryRegistry>, store: PreferenceStore) -> Self {
        let resolution = Resolution {
            country: registry.default_country().to_resolved(),
            source: ResolutionSource::Default,
        };
        let mut resolver = Self {
            registry,
            store,
            geolocation_enabled: true,
            generation: 0,
            explicit_generation: 0,
            path: ParsedPath::root(),
            session_choice: None,
            resolution,
            lookup: LookupState::NotStarted,
        };
        resolver.resolution = resolver.resolve_current();
        resolver
    }

    /// Enable or disable the geolocation fallback.
    #[must_use]
    pub const fn with_geolocation(mut self, enabled: bool) -> Self {
        self.geolocation_enabled = enabled;
        self
    }

    /// The registry this resolver validates against.
    #[must_use]
    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    /// The current resolution.
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The active country.
    #[must_use]
    pub const fn current_country(&self) -> &ResolvedCountry {
        &self.resolution.country
    }

    /// Registry record for the active country.
    #[must_use]
    pub fn current_record(&self) -> &CountryRecord {
        self.registry
            .lookup(&self.resolution.country)
            .unwrap_or_else(|| self.registry.default_country())
    }

    /// The most recently navigated path.
    #[must_use]
    pub const fn current_path(&self) -> &ParsedPath {
        &self.path
    }

    /// Current generation counter.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a lookup ticket is outstanding.
    #[must_use]
    pub const fn lookup_pending(&self) -> bool {
        matches!(self.lookup, LookupState::Pending(_))
    }

    /// Recompute the resolution for `raw_path`.
    ///
    /// Path slugs are transient and never persisted. When only the default
    /// applies and no lookup has been attempted yet, the returned
    /// [`Navigation`] carries a ticket for one.
    pub fn navigate(&mut self, raw_path: &str) -> Navigation {
        self.generation += 1;
        self.path = parse_path(&self.registry, raw_path);
        self.resolution = self.resolve_current();

        let lookup = if self.resolution.source == ResolutionSource::Default
            && self.geolocation_enabled
            && self.lookup == LookupState::NotStarted
        {
            let ticket = LookupTicket::new(self.generation);
            self.lookup = LookupState::Pending(ticket);
            Some(ticket)
        } else {
            None
        };

        debug!(
            path = raw_path,
            generation = self.generation,
            code = %self.resolution.country.code,
            source = %self.resolution.source,
            lookup = lookup.is_some(),
            "resolved country"
        );
        Navigation {
            resolution: self.resolution.clone(),
            lookup,
        }
    }

    /// Feed back a finished lookup.
    ///
    /// Returns the new resolution when the result was accepted. Results for
    /// tickets this resolver did not issue, failed lookups, unregistered
    /// codes, results superseded by a path or stored preference and results
    /// for lookups started before the latest explicit selection or clear
    /// are dropped. Any settled ticket ends the session's lookup budget.
    pub fn apply_lookup(&mut self, completion: LookupCompletion) -> Option<Resolution> {
        let LookupCompletion { ticket, outcome } = completion;
        if self.lookup != LookupState::Pending(ticket) {
            debug!(
                generation = ticket.generation(),
                "ignoring lookup result for an unknown ticket"
            );
            return None;
        }
        self.lookup = LookupState::Settled;

        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                debug!(error = %err, "geolocation unavailable; keeping current resolution");
                return None;
            }
        };
        let Some(record) = self.registry.by_code(&report.code) else {
            debug!(code = %report.code, "discarding geolocation result outside the registry");
            return None;
        };
        if ticket.generation() < self.explicit_generation {
            debug!(
                ticket = ticket.generation(),
                explicit = self.explicit_generation,
                "discarding geolocation result older than an explicit choice"
            );
            return None;
        }
        if ticket.generation() != self.generation && self.resolution.source.outranks_geolocation()
        {
            debug!(
                ticket = ticket.generation(),
                current = self.generation,
                source = %self.resolution.source,
                "discarding stale geolocation result"
            );
            return None;
        }

        let country = record.to_resolved();
        self.store.save_country(&country);
        self.session_choice = Some(country.clone());
        self.resolution = Resolution {
            country,
            source: ResolutionSource::Geolocation,
        };
        info!(code = %self.resolution.country.code, "country resolved by geolocation");
        Some(self.resolution.clone())
    }

    /// Persist an explicit choice of `code` and re-resolve the current path.
    ///
    /// A slug in the current path still wins for this navigation.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownCountry`] when `code` is not
    /// registered; nothing is persisted in that case.
    pub fn select_country(&mut self, code: &str) -> Result<Resolution, SelectionError> {
        let record = self
            .registry
            .by_code(code)
            .ok_or_else(|| SelectionError::UnknownCountry {
                code: code.trim().to_owned(),
                known: self
                    .registry
                    .iter()
                    .map(|record| record.code().as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        let country = record.to_resolved();
        self.store.save_country(&country);
        self.session_choice = Some(country);
        self.generation += 1;
        self.explicit_generation = self.generation;
        self.resolution = self.resolve_current();
        Ok(self.resolution.clone())
    }

    /// Forget the stored country and re-resolve the current path.
    ///
    /// The geolocation budget is not restored.
    pub fn clear_preference(&mut self) -> Resolution {
        self.store.clear_country();
        self.session_choice = None;
        self.generation += 1;
        self.explicit_generation = self.generation;
        self.resolution = self.resolve_current();
        info!("country preference cleared");
        self.resolution.clone()
    }

    fn resolve_current(&self) -> Resolution {
        if let Some(record) = self.path.country(&self.registry) {
            return Resolution {
                country: record.to_resolved(),
                source: ResolutionSource::Path,
            };
        }
        if let Some(country) = self
            .store
            .load_country(&self.registry)
            .or_else(|| self.session_choice.clone())
        {
            return Resolution {
                country,
                source: ResolutionSource::StoredPreference,
            };
        }
        Resolution {
            country: self.registry.default_country().to_resolved(),
            source: ResolutionSource::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::{GeoReport, GeolocationError};
    use crate::preferences::{COUNTRY_KEY, MemoryBackend};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn registry() -> Arc<CountryRegistry> {
        Arc::new(CountryRegistry::builtin())
    }

    fn report(code: &str) -> GeoReport {
        GeoReport {
            code: code.to_owned(),
            name: None,
        }
    }

    fn complete(ticket: LookupTicket, code: &str) -> LookupCompletion {
        LookupCompletion {
            ticket,
            outcome: Ok(report(code)),
        }
    }

    fn stored(code: &str, name: &str) -> PreferenceStore {
        let json = format!(r#"{{"code":"{code}","name":"{name}"}}"#);
        PreferenceStore::new(MemoryBackend::with_entries([(COUNTRY_KEY, json.as_str())]))
    }

    #[rstest]
    fn path_slug_wins_over_stored_preference(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, stored("lk", "Sri Lanka"));
        let nav = resolver.navigate("/myanmar/services/lcl");
        assert_eq!(nav.resolution.country.code.as_str(), "mm");
        assert_eq!(nav.resolution.country.name, "Myanmar");
        assert_eq!(nav.resolution.source, ResolutionSource::Path);
        assert!(nav.lookup.is_none());
    }

    #[rstest]
    fn path_resolution_is_not_persisted(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        drop(resolver.navigate("/pakistan/contact"));
        assert_eq!(store.load_country(&registry), None);
    }

    #[rstest]
    fn stored_preference_skips_geolocation(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, stored("lk", "Sri Lanka"));
        let nav = resolver.navigate("/contact");
        assert_eq!(nav.resolution.country.code.as_str(), "lk");
        assert_eq!(nav.resolution.source, ResolutionSource::StoredPreference);
        assert!(nav.lookup.is_none());
    }

    #[rstest]
    fn malformed_preference_falls_back_to_default(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, stored("zz", "Nowhere"))
            .with_geolocation(false);
        let nav = resolver.navigate("/contact");
        assert_eq!(nav.resolution.country.code.as_str(), "sg");
        assert_eq!(nav.resolution.source, ResolutionSource::Default);
    }

    #[rstest]
    fn geolocation_result_is_persisted_and_reused(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());

        let nav = resolver.navigate("/contact");
        assert_eq!(nav.resolution.source, ResolutionSource::Default);
        let ticket = nav.lookup.expect("lookup eligible");

        let applied = resolver.apply_lookup(complete(ticket, "LK")).expect("applied");
        assert_eq!(applied.country.code.as_str(), "lk");
        assert_eq!(applied.source, ResolutionSource::Geolocation);
        assert_eq!(
            store.load_country(&registry).map(|c| c.name),
            Some(String::from("Sri Lanka"))
        );

        let again = resolver.navigate("/contact");
        assert_eq!(again.resolution.country.code.as_str(), "lk");
        assert_eq!(again.resolution.source, ResolutionSource::StoredPreference);
        assert!(again.lookup.is_none());
    }

    #[rstest]
    #[case(Err(GeolocationError::TimedOut { timeout: Duration::from_secs(4) }))]
    #[case(Err(GeolocationError::Status { url: String::from("http://geo"), status: 503 }))]
    #[case(Ok(report("zz")))]
    fn failed_lookups_leave_default_and_are_not_retried(
        registry: Arc<CountryRegistry>,
        #[case] outcome: Result<GeoReport, GeolocationError>,
    ) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory());
        let ticket = resolver.navigate("/").lookup.expect("ticket");
        assert!(resolver
            .apply_lookup(LookupCompletion { ticket, outcome })
            .is_none());
        assert_eq!(resolver.current_country().code.as_str(), "sg");

        let next = resolver.navigate("/gallery");
        assert_eq!(next.resolution.source, ResolutionSource::Default);
        assert!(next.lookup.is_none());
        assert!(!resolver.lookup_pending());
    }

    #[rstest]
    fn stale_result_after_slugged_navigation_is_discarded(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        let ticket = resolver.navigate("/contact").lookup.expect("ticket");
        drop(resolver.navigate("/bangladesh/projects"));

        assert!(resolver.apply_lookup(complete(ticket, "lk")).is_none());
        assert_eq!(resolver.current_country().code.as_str(), "bd");
        assert_eq!(store.load_country(&registry), None);
    }

    #[rstest]
    fn stale_result_after_slugless_navigation_is_applied(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory());
        let ticket = resolver.navigate("/contact").lookup.expect("ticket");
        let later = resolver.navigate("/gallery");
        assert!(later.lookup.is_none(), "only one lookup per session");

        let applied = resolver.apply_lookup(complete(ticket, "pk")).expect("applied");
        assert_eq!(applied.country.code.as_str(), "pk");
    }

    #[rstest]
    fn result_after_explicit_selection_is_discarded(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory());
        let ticket = resolver.navigate("/").lookup.expect("ticket");
        resolver.select_country("mm").expect("select");
        assert!(resolver.apply_lookup(complete(ticket, "lk")).is_none());
        assert_eq!(resolver.current_country().code.as_str(), "mm");
    }

    #[rstest]
    fn result_after_clearing_does_not_restore_a_preference(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        let ticket = resolver.navigate("/").lookup.expect("ticket");
        resolver.select_country("mm").expect("select");
        let cleared = resolver.clear_preference();
        assert_eq!(cleared.source, ResolutionSource::Default);

        assert!(resolver.apply_lookup(complete(ticket, "lk")).is_none());
        assert_eq!(resolver.resolution().source, ResolutionSource::Default);
        assert_eq!(resolver.current_country().code.as_str(), "sg");
        assert_eq!(store.load_country(&registry), None);
        assert!(!resolver.lookup_pending());
    }

    #[rstest]
    fn unknown_and_duplicate_tickets_are_ignored(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory());
        let ticket = resolver.navigate("/").lookup.expect("ticket");
        let forged = LookupTicket::new(ticket.generation() + 10);
        assert!(resolver.apply_lookup(complete(forged, "lk")).is_none());
        assert!(resolver.lookup_pending());

        assert!(resolver.apply_lookup(complete(ticket, "lk")).is_some());
        assert!(resolver.apply_lookup(complete(ticket, "pk")).is_none());
        assert_eq!(resolver.current_country().code.as_str(), "lk");
    }

    #[rstest]
    fn selection_persists_but_path_still_wins(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        drop(resolver.navigate("/myanmar/contact"));

        let resolution = resolver.select_country("LK").expect("select");
        assert_eq!(resolution.country.code.as_str(), "mm");
        assert_eq!(resolution.source, ResolutionSource::Path);
        assert_eq!(
            store.load_country(&registry).map(|c| c.code.to_string()),
            Some(String::from("lk"))
        );

        let nav = resolver.navigate("/contact");
        assert_eq!(nav.resolution.country.code.as_str(), "lk");
    }

    #[rstest]
    fn unknown_selection_is_rejected(registry: Arc<CountryRegistry>) {
        let store = PreferenceStore::in_memory();
        let mut resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        let err = resolver.select_country("zz").expect_err("unknown");
        assert_eq!(
            err.to_string(),
            "unknown country 'zz' (known: sg, lk, mm, bd, pk)"
        );
        assert_eq!(store.load_country(&registry), None);
    }

    #[rstest]
    fn clearing_returns_to_default_without_new_lookup(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory());
        let ticket = resolver.navigate("/").lookup.expect("ticket");
        resolver.apply_lookup(complete(ticket, "bd"));

        let cleared = resolver.clear_preference();
        assert_eq!(cleared.source, ResolutionSource::Default);
        assert!(resolver.navigate("/").lookup.is_none());
    }

    #[rstest]
    fn disabled_storage_keeps_choices_for_the_session(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::disabled());
        assert_eq!(
            resolver.navigate("/sri-lanka").resolution.source,
            ResolutionSource::Path
        );
        resolver.select_country("pk").expect("select");
        let nav = resolver.navigate("/contact");
        assert_eq!(nav.resolution.country.code.as_str(), "pk");
        assert_eq!(nav.resolution.source, ResolutionSource::StoredPreference);
    }

    #[rstest]
    fn generation_advances_on_every_event(registry: Arc<CountryRegistry>) {
        let mut resolver = CountryResolver::new(registry, PreferenceStore::in_memory())
            .with_geolocation(false);
        assert_eq!(resolver.generation(), 0);
        drop(resolver.navigate("/"));
        resolver.select_country("sg").expect("select");
        resolver.clear_preference();
        assert_eq!(resolver.generation(), 3);
    }
}
