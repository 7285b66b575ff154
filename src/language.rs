//! Display language binding.
//!
//! The binding starts in [`BindingMode::DefaultFromBrowser`], deriving its
//! language from the host locale and the active country, and moves to
//! [`BindingMode::Explicit`] once the user picks a language. Explicit
//! choices are persisted through the [`PreferenceStore`] and survive
//! country changes.

use crate::preferences::PreferenceStore;
use crate::registry::CountryRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use unic_langid::LanguageIdentifier;

/// Errors raised for language tags and language tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    /// The tag is not a well-formed BCP 47 language identifier.
    #[error("'{tag}' is not a valid language tag")]
    Invalid {
        /// The rejected input.
        tag: String,
    },
    /// The tag is well formed but the site does not offer it.
    #[error("language '{tag}' is not supported (supported: {supported})")]
    Unsupported {
        /// The requested tag.
        tag: String,
        /// Comma-separated list of supported tags.
        supported: String,
    },
    /// No languages were configured.
    #[error("at least one supported language is required")]
    Empty,
}

/// A validated BCP 47 language tag in canonical casing (`en`, `zh-CN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse and canonicalize `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::Invalid`] when `raw` is not a language
    /// identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use country_router::language::LanguageTag;
    ///
    /// let tag = LanguageTag::parse("ZH-cn").expect("valid tag");
    /// assert_eq!(tag.as_str(), "zh-CN");
    /// assert_eq!(tag.primary(), "zh");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, LanguageError> {
        let trimmed = raw.trim();
        let invalid = || LanguageError::Invalid {
            tag: raw.to_owned(),
        };
        if trimmed.is_empty() {
            return Err(invalid());
        }
        LanguageIdentifier::from_str(trimmed)
            .map(|id| Self(id.to_string()))
            .map_err(|_| invalid())
    }

    /// The canonical tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag (`zh` for `zh-CN`).
    #[must_use]
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(value: LanguageTag) -> Self {
        value.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw host locale string into a BCP 47 language tag.
///
/// Strips encoding suffixes (`.UTF-8`) and variant sections (`@latin`) and
/// replaces underscores with hyphens before validating.
///
/// # Examples
///
/// ```
/// use country_router::language::normalize_locale_tag;
///
/// assert_eq!(normalize_locale_tag("zh_CN.UTF-8"), Some("zh-CN".to_string()));
/// assert_eq!(normalize_locale_tag("sr_RS@latin"), Some("sr-RS".to_string()));
/// assert_eq!(normalize_locale_tag(".UTF-8"), None);
/// ```
#[must_use]
pub fn normalize_locale_tag(raw: &str) -> Option<String> {
    let stripped = raw.trim().split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() {
        return None;
    }
    LanguageTag::parse(&stripped.replace('_', "-"))
        .ok()
        .map(String::from)
}

/// System locale provider for the current host.
pub trait SystemLocale {
    /// Return the system locale string when available.
    fn system_locale(&self) -> Option<String>;
}

/// System locale provider backed by `sys-locale`.
#[derive(Debug, Default, Copy, Clone)]
pub struct SysLocale;

impl SystemLocale for SysLocale {
    fn system_locale(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// The closed set of languages the site renders, base language first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLanguages {
    base: LanguageTag,
    alternates: Vec<LanguageTag>,
}

impl SupportedLanguages {
    /// Build a table from `tags`; the first tag is the base language.
    /// Duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::Empty`] for an empty list and
    /// [`LanguageError::Invalid`] for a malformed tag.
    pub fn new<'a>(tags: impl IntoIterator<Item = &'a str>) -> Result<Self, LanguageError> {
        let mut parsed: Vec<LanguageTag> = Vec::new();
        for raw in tags {
            let tag = LanguageTag::parse(raw)?;
            if !parsed.contains(&tag) {
                parsed.push(tag);
            }
        }
        let mut parsed = parsed.into_iter();
        let base = parsed.next().ok_or(LanguageError::Empty)?;
        Ok(Self {
            base,
            alternates: parsed.collect(),
        })
    }

    /// English base with Chinese as the alternate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            base: LanguageTag(String::from("en")),
            alternates: vec![LanguageTag(String::from("zh"))],
        }
    }

    /// The base language.
    #[must_use]
    pub const fn base(&self) -> &LanguageTag {
        &self.base
    }

    /// Iterate over the supported tags, base first.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageTag> {
        iter::once(&self.base).chain(self.alternates.iter())
    }

    /// Number of supported languages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.alternates.len() + 1
    }

    /// Always `false`: the base language is always present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The supported tag equal to `raw` after canonicalization.
    #[must_use]
    pub fn find(&self, raw: &str) -> Option<&LanguageTag> {
        let wanted = LanguageTag::parse(raw).ok()?;
        self.iter().find(|tag| **tag == wanted)
    }

    /// Resolve `raw` to a supported tag.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::Invalid`] or [`LanguageError::Unsupported`].
    pub fn require(&self, raw: &str) -> Result<&LanguageTag, LanguageError> {
        let wanted = LanguageTag::parse(raw)?;
        self.iter()
            .find(|tag| **tag == wanted)
            .ok_or_else(|| LanguageError::Unsupported {
                tag: wanted.to_string(),
                supported: self.describe(),
            })
    }

    /// Match a host locale: full tag first, then the primary subtag.
    ///
    /// # Examples
    ///
    /// ```
    /// use country_router::language::SupportedLanguages;
    ///
    /// let supported = SupportedLanguages::builtin();
    /// assert_eq!(supported.match_locale("zh_TW.UTF-8").map(|t| t.as_str()), Some("zh"));
    /// assert!(supported.match_locale("fr_FR").is_none());
    /// ```
    #[must_use]
    pub fn match_locale(&self, raw: &str) -> Option<&LanguageTag> {
        let normalized = LanguageTag::parse(&normalize_locale_tag(raw)?).ok()?;
        self.iter()
            .find(|tag| **tag == normalized)
            .or_else(|| self.iter().find(|tag| tag.as_str() == normalized.primary()))
            .or_else(|| self.iter().find(|tag| tag.primary() == normalized.primary()))
    }

    /// The tag after `current`, wrapping around. Unknown tags yield the base.
    #[must_use]
    pub fn next_after(&self, current: &LanguageTag) -> &LanguageTag {
        let mut rest = self.iter().skip_while(|tag| *tag != current);
        rest.next()
            .and_then(|_| rest.next())
            .unwrap_or(&self.base)
    }

    fn describe(&self) -> String {
        self.iter()
            .map(LanguageTag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for SupportedLanguages {
    fn default() -> Self {
        Self::builtin()
    }
}

/// How the current language was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingMode {
    /// Derived from the host locale and the active country.
    DefaultFromBrowser,
    /// Chosen by the user and persisted.
    Explicit,
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DefaultFromBrowser => "default-from-browser",
            Self::Explicit => "explicit",
        })
    }
}

/// Current display language and its persistence.
#[derive(Debug, Clone)]
pub struct LanguageBinding {
    supported: SupportedLanguages,
    store: PreferenceStore,
    host_locale: Option<String>,
    current: LanguageTag,
    mode: BindingMode,
}

impl LanguageBinding {
    /// Initialise from the stored preference, else from `locale` and the
    /// active `country`.
    #[must_use]
    pub fn new(
        supported: SupportedLanguages,
        store: PreferenceStore,
        locale: &impl SystemLocale,
        country: Option<&CountryRecord>,
    ) -> Self {
        let host_locale = locale.system_locale();
        if let Some(stored) = store.load_language(&supported) {
            debug!(language = %stored, "using stored language preference");
            return Self {
                supported,
                store,
                host_locale,
                current: stored,
                mode: BindingMode::Explicit,
            };
        }
        let current = derive_default(&supported, host_locale.as_deref(), country);
        debug!(language = %current, locale = ?host_locale, "derived default language");
        Self {
            supported,
            store,
            host_locale,
            current,
            mode: BindingMode::DefaultFromBrowser,
        }
    }

    /// The active language.
    #[must_use]
    pub const fn current(&self) -> &LanguageTag {
        &self.current
    }

    /// How the active language was chosen.
    #[must_use]
    pub const fn mode(&self) -> BindingMode {
        self.mode
    }

    /// The supported language table.
    #[must_use]
    pub const fn supported(&self) -> &SupportedLanguages {
        &self.supported
    }

    /// Cycle to the next supported language and persist the choice.
    ///
    /// The in-memory language changes even if persistence fails.
    pub fn switch_language(&mut self) -> &LanguageTag {
        let next = self.supported.next_after(&self.current).clone();
        self.commit(next)
    }

    /// Explicitly choose `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError`] when `raw` is invalid or unsupported; the
    /// binding is left unchanged.
    pub fn select(&mut self, raw: &str) -> Result<&LanguageTag, LanguageError> {
        let tag = self.supported.require(raw)?.clone();
        Ok(self.commit(tag))
    }

    /// Forget the explicit choice and derive the language again.
    pub fn reset(&mut self, country: Option<&CountryRecord>) -> &LanguageTag {
        self.store.clear_language();
        self.mode = BindingMode::DefaultFromBrowser;
        self.current = derive_default(&self.supported, self.host_locale.as_deref(), country);
        &self.current
    }

    /// Re-derive the language after a country change. Explicit choices are
    /// kept. Returns `true` when the language changed.
    pub fn rebind(&mut self, country: &CountryRecord) -> bool {
        if self.mode == BindingMode::Explicit {
            return false;
        }
        let derived = derive_default(&self.supported, self.host_locale.as_deref(), Some(country));
        if derived == self.current {
            return false;
        }
        debug!(from = %self.current, to = %derived, country = %country.code(), "rebinding language");
        self.current = derived;
        true
    }

    fn commit(&mut self, tag: LanguageTag) -> &LanguageTag {
        self.current = tag;
        self.mode = BindingMode::Explicit;
        self.store.save_language(&self.current);
        &self.current
    }
}

fn derive_default(
    supported: &SupportedLanguages,
    host_locale: Option<&str>,
    country: Option<&CountryRecord>,
) -> LanguageTag {
    host_locale
        .and_then(|raw| supported.match_locale(raw))
        .or_else(|| {
            country
                .and_then(CountryRecord::default_language)
                .and_then(|tag| supported.find(tag))
        })
        .unwrap_or_else(|| supported.base())
        .clone()
}
