//! Site configuration.
//!
//! An optional JSON file replaces the built-in country and language tables
//! and tunes the geolocation fallback. Every field is optional; omitted
//! fields keep the built-in defaults.
//!
//! ```json
//! {
//!   "countries": [
//!     { "code": "sg", "name": "Singapore", "default": true, "dial_code": "+65" },
//!     { "code": "lk", "name": "Sri Lanka", "default_language": "en" }
//!   ],
//!   "languages": { "base": "en", "supported": ["en", "zh"] },
//!   "geolocation": { "enabled": true, "endpoint": "https://ipapi.co/json/", "timeout_ms": 4000 },
//!   "state_dir": ".country-router"
//! }
//! ```

mod error;

pub use error::ConfigError;

use crate::geolocation::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, HttpGeoLocator};
use crate::language::SupportedLanguages;
use crate::registry::{CountryRecord, CountryRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use tracing::debug;

/// State directory used when neither the command line, the environment
/// nor the configuration file names one.
pub const DEFAULT_STATE_DIR: &str = ".country-router";

/// One entry of the `countries` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountryEntry {
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Slug override; derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Whether this is the unprefixed default country.
    #[serde(default)]
    pub default: bool,
    /// International dialling prefix.
    #[serde(default)]
    pub dial_code: Option<String>,
    /// Language shown to visitors without an explicit choice.
    #[serde(default)]
    pub default_language: Option<String>,
}

impl CountryEntry {
    fn to_record(&self) -> Result<CountryRecord, ConfigError> {
        let mut record = CountryRecord::new(&self.code, &self.name)
            .map_err(|source| ConfigError::Countries { source })?;
        if self.default {
            record = record.as_default();
        }
        if let Some(slug) = &self.slug {
            record = record.with_slug(slug);
        }
        if let Some(dial_code) = &self.dial_code {
            record = record.with_dial_code(dial_code.clone());
        }
        if let Some(language) = &self.default_language {
            record = record.with_default_language(language.clone());
        }
        Ok(record)
    }
}

/// The `languages` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguagesSection {
    /// Base language, used when nothing else matches.
    pub base: String,
    /// Every language the site renders. The base is added when missing.
    #[serde(default)]
    pub supported: Vec<String>,
}

/// The `geolocation` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GeolocationSection {
    /// Whether the fallback lookup runs at all.
    pub enabled: bool,
    /// JSON endpoint queried for the visitor's country.
    pub endpoint: String,
    /// Lookup timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GeolocationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::from(DEFAULT_ENDPOINT),
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(4_000),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Country table replacing the built-in one.
    #[serde(default)]
    pub countries: Option<Vec<CountryEntry>>,
    /// Language table replacing the built-in one.
    #[serde(default)]
    pub languages: Option<LanguagesSection>,
    /// Geolocation settings.
    #[serde(default)]
    pub geolocation: GeolocationSection,
    /// Directory holding persisted preferences.
    #[serde(default)]
    pub state_dir: Option<Utf8PathBuf>,
}

impl SiteConfig {
    /// Read and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is not valid
    /// JSON, or describes an invalid country or language table.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_json(&data).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_owned(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path, "loaded site configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or invalid tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use country_router::config::SiteConfig;
    ///
    /// let config = SiteConfig::from_json(r#"{"geolocation": {"enabled": false}}"#)
    ///     .expect("valid config");
    /// assert!(!config.geolocation.enabled);
    /// assert_eq!(config.registry().expect("builtin").len(), 5);
    /// ```
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data).map_err(|source| ConfigError::Parse {
            path: Utf8PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The CLI settings this file provides, as a merge layer.
    ///
    /// Only `state_dir` overlaps the command line; the country, language
    /// and geolocation tables are read from the config directly.
    #[must_use]
    pub fn settings_layer(&self) -> Option<serde_json::Value> {
        self.state_dir
            .as_ref()
            .map(|dir| serde_json::json!({ "state_dir": dir }))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let registry = self.registry()?;
        let supported = self.supported_languages()?;
        for record in registry.iter() {
            if let Some(language) = record.default_language()
                && supported.find(language).is_none()
            {
                return Err(ConfigError::CountryLanguage {
                    code: record.code().to_string(),
                    language: language.to_owned(),
                });
            }
        }
        if self.geolocation.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.locator()?;
        Ok(())
    }

    /// The configured country registry, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Countries`] when the table is invalid.
    pub fn registry(&self) -> Result<CountryRegistry, ConfigError> {
        let Some(entries) = &self.countries else {
            return Ok(CountryRegistry::builtin());
        };
        let records = entries
            .iter()
            .map(CountryEntry::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        CountryRegistry::new(records).map_err(|source| ConfigError::Countries { source })
    }

    /// The configured language table, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Languages`] when a tag is malformed.
    pub fn supported_languages(&self) -> Result<SupportedLanguages, ConfigError> {
        let Some(section) = &self.languages else {
            return Ok(SupportedLanguages::builtin());
        };
        let tags = std::iter::once(section.base.as_str())
            .chain(section.supported.iter().map(String::as_str));
        SupportedLanguages::new(tags).map_err(|source| ConfigError::Languages { source })
    }

    /// Timeout applied to each geolocation lookup.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation.timeout_ms)
    }

    /// HTTP locator for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Endpoint`] when the endpoint is not an HTTP URL.
    pub fn locator(&self) -> Result<HttpGeoLocator, ConfigError> {
        HttpGeoLocator::new(&self.geolocation.endpoint, self.lookup_timeout())
            .map_err(|source| ConfigError::Endpoint { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use rstest::rstest;

    #[test]
    fn empty_object_keeps_builtin_defaults() {
        let config = SiteConfig::from_json("{}").expect("config");
        assert_eq!(config.registry().expect("registry"), CountryRegistry::builtin());
        assert_eq!(
            config.supported_languages().expect("languages"),
            SupportedLanguages::builtin()
        );
        assert!(config.geolocation.enabled);
        assert_eq!(config.lookup_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.state_dir, None);
    }

    #[test]
    fn custom_tables_are_applied() {
        let config = SiteConfig::from_json(
            r#"{
                "countries": [
                    {"code": "SG", "name": "Singapore", "default": true},
                    {"code": "my", "name": "Malaysia", "slug": "MY Office", "dial_code": "+60", "default_language": "ms"}
                ],
                "languages": {"base": "en", "supported": ["ms"]},
                "geolocation": {"timeout_ms": 1500},
                "state_dir": "/var/lib/site"
            }"#,
        )
        .expect("config");
        let registry = config.registry().expect("registry");
        let malaysia = registry.by_code("MY").expect("malaysia");
        assert_eq!(malaysia.url_slug(), "my-office");
        assert_eq!(malaysia.dial_code(), Some("+60"));
        assert_eq!(
            config
                .supported_languages()
                .expect("languages")
                .iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>(),
            ["en", "ms"]
        );
        assert_eq!(config.lookup_timeout(), Duration::from_millis(1500));
        assert_eq!(config.state_dir.as_deref(), Some(Utf8Path::new("/var/lib/site")));
    }

    #[rstest]
    #[case(r#"{"countries": []}"#)]
    #[case(r#"{"countries": [{"code": "sg", "name": "Singapore"}]}"#)]
    #[case(r#"{"countries": [{"code": "sgp", "name": "Singapore", "default": true}]}"#)]
    #[case(r#"{"countries": [{"code": "sg", "name": "Singapore", "default": true, "slug": "   "}]}"#)]
    #[case(r#"{"countries": [{"code": "sg", "name": "Singapore", "default": true, "slug": "sg/hq"}]}"#)]
    #[case(r#"{"countries": [{"code": "sg", "name": "Singapore", "default": true}, {"code": "my", "name": "Malaysia", "slug": "services"}]}"#)]
    fn invalid_country_tables_are_rejected(#[case] json: &str) {
        assert!(matches!(
            SiteConfig::from_json(json),
            Err(ConfigError::Countries { .. })
        ));
    }

    #[test]
    fn state_dir_becomes_a_settings_layer() {
        let config = SiteConfig::from_json(r#"{"state_dir": "/var/lib/site"}"#).expect("config");
        assert_eq!(
            config.settings_layer(),
            Some(serde_json::json!({"state_dir": "/var/lib/site"}))
        );
        assert_eq!(SiteConfig::default().settings_layer(), None);
    }

    #[test]
    fn missing_default_reports_registry_error() {
        let err = SiteConfig::from_json(r#"{"countries": [{"code": "lk", "name": "Sri Lanka"}]}"#)
            .expect_err("no default");
        assert!(matches!(
            err,
            ConfigError::Countries {
                source: RegistryError::MissingDefault
            }
        ));
    }

    #[rstest]
    #[case(r#"{"geolocation": {"timeout_ms": 0}}"#, "timeout")]
    #[case(r#"{"geolocation": {"endpoint": "ftp://geo.example"}}"#, "endpoint")]
    #[case(r#"{"languages": {"base": "!!"}}"#, "languages")]
    #[case(r#"{"countries": [{"code": "sg", "name": "Singapore", "default": true, "default_language": "fr"}]}"#, "country_language")]
    #[case(r#"{"unknown": 1}"#, "parse")]
    fn invalid_settings_carry_diagnostic_codes(#[case] json: &str, #[case] suffix: &str) {
        use miette::Diagnostic;
        let err = SiteConfig::from_json(json).expect_err("invalid");
        let code = err.code().map(|code| code.to_string()).unwrap_or_default();
        assert_eq!(code, format!("country_router::config::{suffix}"));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = SiteConfig::load(Utf8Path::new("/definitely/missing/site.json"))
            .expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
