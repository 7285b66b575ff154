//! Explicit per-visitor context tying resolution, links and language
//! together.
//!
//! Presentational code reads the active country and language from a
//! [`SiteSession`] and builds every link through it, so no caller has to
//! repeat slug matching or language selection on its own.

use crate::geolocation::{DEFAULT_TIMEOUT, GeoLocator, LookupCompletion, run_lookup};
use crate::language::{
    BindingMode, LanguageBinding, LanguageError, LanguageTag, SupportedLanguages, SystemLocale,
};
use crate::link::{canonical_path, rewrite_link};
use crate::preferences::PreferenceStore;
use crate::registry::{CountryRecord, CountryRegistry, ResolvedCountry};
use crate::resolver::{CountryResolver, Navigation, Resolution, SelectionError};
use crate::routes::{NavEntry, Page, services_nav};
use std::sync::Arc;
use std::time::Duration;

/// Per-visitor routing and language state.
///
/// # Examples
///
/// ```
/// use country_router::language::{SupportedLanguages, SystemLocale};
/// use country_router::preferences::PreferenceStore;
/// use country_router::registry::CountryRegistry;
/// use country_router::session::SiteSession;
/// use std::sync::Arc;
///
/// struct NoLocale;
/// impl SystemLocale for NoLocale {
///     fn system_locale(&self) -> Option<String> {
///         None
///     }
/// }
///
/// let mut session = SiteSession::new(
///     Arc::new(CountryRegistry::builtin()),
///     SupportedLanguages::builtin(),
///     PreferenceStore::in_memory(),
///     &NoLocale,
/// );
/// let nav = session.navigate("/myanmar/services/lcl");
/// assert_eq!(nav.resolution.country.name, "Myanmar");
/// assert_eq!(session.link("/contact"), "/myanmar/contact");
/// ```
#[derive(Debug, Clone)]
pub struct SiteSession {
    registry: Arc<CountryRegistry>,
    resolver: CountryResolver,
    language: LanguageBinding,
    lookup_timeout: Duration,
}

impl SiteSession {
    /// Build a session positioned at the site root.
    #[must_use]
    pub fn new(
        registry: Arc<CountryRegistry>,
        supported: SupportedLanguages,
        store: PreferenceStore,
        locale: &impl SystemLocale,
    ) -> Self {
        let resolver = CountryResolver::new(Arc::clone(&registry), store.clone());
        let language =
            LanguageBinding::new(supported, store, locale, Some(resolver.current_record()));
        Self {
            registry,
            resolver,
            language,
            lookup_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable or disable the geolocation fallback.
    #[must_use]
    pub fn with_geolocation(mut self, enabled: bool) -> Self {
        self.resolver = self.resolver.with_geolocation(enabled);
        self
    }

    /// Bound every geolocation lookup by `timeout`.
    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// The country registry.
    #[must_use]
    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    /// Timeout applied to geolocation lookups.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Re-resolve for `path`. Rebinds a non-explicit language when the
    /// country changes.
    pub fn navigate(&mut self, path: &str) -> Navigation {
        let navigation = self.resolver.navigate(path);
        self.rebind_language();
        navigation
    }

    /// Feed back a finished geolocation lookup.
    pub fn apply_lookup(&mut self, completion: LookupCompletion) -> Option<Resolution> {
        let applied = self.resolver.apply_lookup(completion);
        if applied.is_some() {
            self.rebind_language();
        }
        applied
    }

    /// Navigate to `path` and, when eligible, run the geolocation lookup
    /// through `locator` before returning the final resolution.
    pub async fn navigate_and_locate<L: GeoLocator>(
        &mut self,
        path: &str,
        locator: &L,
    ) -> Resolution {
        let navigation = self.navigate(path);
        let Some(ticket) = navigation.lookup else {
            return navigation.resolution;
        };
        let completion = run_lookup(locator, ticket, self.lookup_timeout).await;
        self.apply_lookup(completion)
            .unwrap_or(navigation.resolution)
    }

    /// The current resolution.
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        self.resolver.resolution()
    }

    /// The active country.
    #[must_use]
    pub const fn current_country(&self) -> &ResolvedCountry {
        self.resolver.current_country()
    }

    /// Registry record of the active country.
    #[must_use]
    pub fn current_record(&self) -> &CountryRecord {
        self.resolver.current_record()
    }

    /// Rewrite the logical `base_path` for the active country.
    #[must_use]
    pub fn link(&self, base_path: &str) -> String {
        rewrite_link(&self.registry, base_path, self.current_country())
    }

    /// Link to `page` for the active country.
    #[must_use]
    pub fn page_link(&self, page: &Page) -> String {
        page.link(&self.registry, self.current_country())
    }

    /// The page the current path points at, if any.
    #[must_use]
    pub fn current_page(&self) -> Option<Page> {
        Page::route(self.resolver.current_path())
    }

    /// Redirect target for `raw` when it is not canonical.
    #[must_use]
    pub fn canonical(&self, raw: &str) -> Option<String> {
        canonical_path(&self.registry, raw)
    }

    /// Service navigation menu for the active country.
    #[must_use]
    pub fn services_nav(&self) -> Vec<NavEntry> {
        services_nav(&self.registry, self.current_country())
    }

    /// The active language.
    #[must_use]
    pub const fn current_language(&self) -> &LanguageTag {
        self.language.current()
    }

    /// How the active language was chosen.
    #[must_use]
    pub const fn language_mode(&self) -> BindingMode {
        self.language.mode()
    }

    /// Supported language table.
    #[must_use]
    pub const fn supported_languages(&self) -> &SupportedLanguages {
        self.language.supported()
    }

    /// Cycle to the next language.
    pub fn switch_language(&mut self) -> &LanguageTag {
        self.language.switch_language()
    }

    /// Explicitly choose a language.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError`] when `tag` is invalid or unsupported.
    pub fn select_language(&mut self, tag: &str) -> Result<&LanguageTag, LanguageError> {
        self.language.select(tag)
    }

    /// Drop the explicit language choice.
    pub fn reset_language(&mut self) -> &LanguageTag {
        let country = self.resolver.current_record();
        self.language.reset(Some(country))
    }

    /// Explicitly choose and persist a country.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] when `code` is not registered.
    pub fn select_country(&mut self, code: &str) -> Result<Resolution, SelectionError> {
        let resolution = self.resolver.select_country(code)?;
        self.rebind_language();
        Ok(resolution)
    }

    /// Forget the stored country. The language choice is kept.
    pub fn clear_country(&mut self) -> Resolution {
        let resolution = self.resolver.clear_preference();
        self.rebind_language();
        resolution
    }

    /// Forget every stored preference and fall back to automatic choices.
    pub fn clear_preferences(&mut self) -> Resolution {
        let resolution = self.resolver.clear_preference();
        self.reset_language();
        resolution
    }

    fn rebind_language(&mut self) {
        let country = self.resolver.current_record();
        self.language.rebind(country);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::{GeoReport, GeolocationError};
    use crate::routes::ServicePage;
    use rstest::{fixture, rstest};
    use std::future::Future;

    struct Locale(Option<&'static str>);

    impl SystemLocale for Locale {
        fn system_locale(&self) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    struct Reports(&'static str);

    impl GeoLocator for Reports {
        fn locate(&self) -> impl Future<Output = Result<GeoReport, GeolocationError>> + Send {
            std::future::ready(Ok(GeoReport {
                code: self.0.to_owned(),
                name: None,
            }))
        }
    }

    #[fixture]
    fn session() -> SiteSession {
        SiteSession::new(
            Arc::new(CountryRegistry::builtin()),
            SupportedLanguages::builtin(),
            PreferenceStore::in_memory(),
            &Locale(None),
        )
    }

    #[rstest]
    fn links_follow_the_navigated_country(mut session: SiteSession) {
        drop(session.navigate("/myanmar/services/lcl"));
        assert_eq!(session.link("/contact"), "/myanmar/contact");
        assert_eq!(session.page_link(&Page::Home), "/myanmar/home");
        assert_eq!(session.page_link(&Page::Login), "/login");
        assert_eq!(session.current_page(), Some(Page::Service(ServicePage::Lcl)));

        drop(session.navigate("/contact"));
        assert_eq!(session.link("/contact"), "/contact");
        assert_eq!(session.services_nav().len(), 10);
    }

    #[rstest]
    #[tokio::test]
    async fn lookup_upgrades_the_resolution(mut session: SiteSession) {
        let resolution = session.navigate_and_locate("/contact", &Reports("lk")).await;
        assert_eq!(resolution.country.code.as_str(), "lk");
        assert_eq!(session.link("/contact"), "/sri-lanka/contact");
    }

    #[rstest]
    fn language_toggle_is_an_involution(mut session: SiteSession) {
        let original = session.current_language().clone();
        session.switch_language();
        assert_ne!(session.current_language(), &original);
        session.switch_language();
        assert_eq!(session.current_language(), &original);
        assert_eq!(session.language_mode(), BindingMode::Explicit);
    }

    #[test]
    fn country_changes_rebind_default_language() {
        let registry = CountryRegistry::new([
            CountryRecord::new("sg", "Singapore")
                .expect("sg")
                .as_default()
                .with_default_language("en"),
            CountryRecord::new("tw", "Taiwan")
                .expect("tw")
                .with_default_language("zh"),
        ])
        .expect("registry");
        let mut session = SiteSession::new(
            Arc::new(registry),
            SupportedLanguages::builtin(),
            PreferenceStore::in_memory(),
            &Locale(None),
        );
        drop(session.navigate("/taiwan/contact"));
        assert_eq!(session.current_language().as_str(), "zh");
        drop(session.navigate("/contact"));
        assert_eq!(session.current_language().as_str(), "en");

        session.select_language("zh").expect("zh");
        drop(session.navigate("/contact"));
        assert_eq!(session.current_language().as_str(), "zh");
    }

    #[rstest]
    fn clearing_preferences_resets_country_and_language(mut session: SiteSession) {
        session.select_country("bd").expect("bd");
        session.select_language("zh").expect("zh");
        let resolution = session.clear_preferences();
        assert_eq!(resolution.country.code.as_str(), "sg");
        assert_eq!(session.language_mode(), BindingMode::DefaultFromBrowser);
        assert_eq!(session.current_language().as_str(), "en");
    }

    #[rstest]
    fn canonical_delegates_to_the_registry(session: SiteSession) {
        assert_eq!(session.canonical("/singapore/contact").as_deref(), Some("/contact"));
        assert_eq!(session.canonical("/contact"), None);
    }
}
