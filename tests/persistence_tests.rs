//! Preference persistence through the file backend.
//!
//! Each test opens a session over a temporary state directory, changes a
//! preference, then opens a fresh session over the same directory to check
//! what survived.

use country_router::language::{BindingMode, SupportedLanguages};
use country_router::preferences::{FileBackend, PreferenceStore};
use country_router::registry::{CountryRecord, CountryRegistry};
use country_router::resolver::ResolutionSource;
use country_router::session::SiteSession;
use camino::Utf8Path;
use std::fs;
use std::sync::Arc;
use test_support::{StubSystemLocale, state_dir};

fn session_at(dir: &Utf8Path, registry: CountryRegistry) -> SiteSession {
    let backend = FileBackend::open(dir).expect("open state dir");
    SiteSession::new(
        Arc::new(registry),
        SupportedLanguages::builtin(),
        PreferenceStore::new(backend),
        &StubSystemLocale::default(),
    )
}

#[test]
fn country_and_language_survive_restart() {
    let (_guard, dir) = state_dir();
    {
        let mut session = session_at(&dir, CountryRegistry::builtin());
        session.select_country("BD").expect("bangladesh is registered");
        session.select_language("ZH").expect("zh is supported");
    }

    let session = session_at(&dir, CountryRegistry::builtin());
    assert_eq!(session.current_country().code.as_str(), "bd");
    assert_eq!(session.resolution().source, ResolutionSource::StoredPreference);
    assert_eq!(session.current_language().as_str(), "zh");
    assert_eq!(session.language_mode(), BindingMode::Explicit);
    assert_eq!(session.link("/services/fcl"), "/bangladesh/services/fcl");
}

#[test]
fn clearing_country_removes_the_file_but_keeps_language() {
    let (_guard, dir) = state_dir();
    {
        let mut session = session_at(&dir, CountryRegistry::builtin());
        session.select_country("mm").expect("myanmar is registered");
        session.select_language("zh").expect("zh is supported");
        let cleared = session.clear_country();
        assert_eq!(cleared.source, ResolutionSource::Default);
    }

    let session = session_at(&dir, CountryRegistry::builtin());
    assert_eq!(session.current_country().code.as_str(), "sg");
    assert_eq!(session.current_language().as_str(), "zh");
}

#[test]
fn country_dropped_from_registry_reads_as_absent() {
    let (_guard, dir) = state_dir();
    {
        let mut session = session_at(&dir, CountryRegistry::builtin());
        session.select_country("pk").expect("pakistan is registered");
    }

    let smaller = CountryRegistry::new([
        CountryRecord::new("sg", "Singapore").expect("record").as_default(),
        CountryRecord::new("lk", "Sri Lanka").expect("record"),
    ])
    .expect("registry");
    let session = session_at(&dir, smaller);
    assert_eq!(session.current_country().code.as_str(), "sg");
    assert_eq!(session.resolution().source, ResolutionSource::Default);
}

#[test]
fn corrupt_country_file_falls_back_to_default() {
    let (_guard, dir) = state_dir();
    fs::write(dir.join("country-router.country.pref"), "not json").expect("write corrupt pref");

    let session = session_at(&dir, CountryRegistry::builtin());
    assert_eq!(session.current_country().code.as_str(), "sg");
    assert_eq!(session.resolution().source, ResolutionSource::Default);
}

#[test]
fn stored_name_is_refreshed_from_registry() {
    let (_guard, dir) = state_dir();
    fs::write(
        dir.join("country-router.country.pref"),
        r#"{"code":"lk","name":"Ceylon"}"#,
    )
    .expect("write stale pref");

    let session = session_at(&dir, CountryRegistry::builtin());
    assert_eq!(session.current_country().name, "Sri Lanka");
}
