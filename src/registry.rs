//! Country registry: the static table of countries the site serves.
//!
//! Every other component validates country identifiers against this table,
//! so a code or slug that is not registered here can never become the
//! active country or appear as a link prefix.

use crate::routes::RESERVED_SEGMENTS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;
use thiserror::Error;

/// Errors raised while building a [`CountryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A country code was not a two-letter ISO 3166-1 alpha-2 code.
    #[error("country code '{code}' must be two ASCII letters")]
    InvalidCode {
        /// The rejected code.
        code: String,
    },
    /// A display name was empty or whitespace.
    #[error("country '{code}' has an empty display name")]
    EmptyName {
        /// Code of the offending record.
        code: String,
    },
    /// The table contained no records at all.
    #[error("country registry must contain at least one country")]
    Empty,
    /// No record was flagged as the default country.
    #[error("country registry has no default country")]
    MissingDefault,
    /// More than one record was flagged as the default country.
    #[error("countries '{first}' and '{second}' are both marked as default")]
    MultipleDefaults {
        /// Code of the first default record.
        first: String,
        /// Code of the second default record.
        second: String,
    },
    /// Two records share the same code.
    #[error("country code '{code}' is registered twice")]
    DuplicateCode {
        /// The duplicated code.
        code: String,
    },
    /// A URL slug cannot be used as a path segment.
    #[error("URL slug '{slug}' for country '{code}' {reason}")]
    InvalidSlug {
        /// Code of the offending record.
        code: String,
        /// The rejected slug.
        slug: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Two records share the same URL slug.
    #[error("URL slug '{slug}' is used by more than one country")]
    DuplicateSlug {
        /// The duplicated slug.
        slug: String,
    },
}

/// Lowercase ISO 3166-1 alpha-2 country code.
///
/// # Examples
///
/// ```
/// use country_router::registry::CountryCode;
///
/// let code = CountryCode::parse("MM").expect("valid code");
/// assert_eq!(code.as_str(), "mm");
/// assert!(CountryCode::parse("mmr").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse and normalize a country code.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidCode`] unless the trimmed input is
    /// exactly two ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let trimmed = raw.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(RegistryError::InvalidCode {
                code: raw.to_owned(),
            })
        }
    }

    /// Borrow the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Regional-indicator flag emoji for this code (for example `🇱🇰`).
    #[must_use]
    pub fn flag(&self) -> String {
        self.0
            .chars()
            .filter_map(|c| {
                let offset = u32::from(c.to_ascii_uppercase()) - u32::from('A');
                char::from_u32(0x1F1E6 + offset)
            })
            .collect()
    }
}

impl TryFrom<String> for CountryCode {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive a URL slug from a display name.
///
/// Lowercases the name and joins whitespace-separated words with a single
/// hyphen.
///
/// # Examples
///
/// ```
/// use country_router::registry::slugify;
///
/// assert_eq!(slugify("Sri Lanka"), "sri-lanka");
/// assert_eq!(slugify("  United   Arab Emirates "), "united-arab-emirates");
/// ```
#[must_use]
pub fn slugify(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// One row of the country table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    code: CountryCode,
    display_name: String,
    url_slug: String,
    is_default: bool,
    dial_code: Option<String>,
    default_language: Option<String>,
}

impl CountryRecord {
    /// Create a non-default record whose slug is derived from `display_name`.
    ///
    /// # Errors
    ///
    /// Returns an error when the code is invalid or the name is empty.
    pub fn new(code: &str, display_name: &str) -> Result<Self, RegistryError> {
        let parsed = CountryCode::parse(code)?;
        let name = display_name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName {
                code: parsed.to_string(),
            });
        }
        Ok(Self {
            url_slug: slugify(name),
            code: parsed,
            display_name: name.to_owned(),
            is_default: false,
            dial_code: None,
            default_language: None,
        })
    }

    /// Mark this record as the default (unprefixed) country.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Override the derived slug. The value is passed through [`slugify`].
    #[must_use]
    pub fn with_slug(mut self, slug: &str) -> Self {
        self.url_slug = slugify(slug);
        self
    }

    /// Attach an international dialling prefix such as `+94`.
    #[must_use]
    pub fn with_dial_code(mut self, dial_code: impl Into<String>) -> Self {
        self.dial_code = Some(dial_code.into());
        self
    }

    /// Attach the language tag this country's visitors see by default.
    #[must_use]
    pub fn with_default_language(mut self, tag: impl Into<String>) -> Self {
        self.default_language = Some(tag.into());
        self
    }

    /// Country code.
    #[must_use]
    pub const fn code(&self) -> &CountryCode {
        &self.code
    }

    /// Human readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Lowercase hyphenated slug used as the leading path segment.
    #[must_use]
    pub fn url_slug(&self) -> &str {
        &self.url_slug
    }

    /// Whether this is the default country.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Dialling prefix, when known.
    #[must_use]
    pub fn dial_code(&self) -> Option<&str> {
        self.dial_code.as_deref()
    }

    /// Default language tag, when configured.
    #[must_use]
    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    /// Flag emoji derived from the country code.
    #[must_use]
    pub fn flag(&self) -> String {
        self.code.flag()
    }

    /// The `{code, name}` pair used for resolution and persistence.
    #[must_use]
    pub fn to_resolved(&self) -> ResolvedCountry {
        ResolvedCountry {
            code: self.code.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// The active country for the current navigation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCountry {
    /// Country code.
    pub code: CountryCode,
    /// Display name.
    pub name: String,
}

fn check_slug(record: &CountryRecord) -> Result<(), RegistryError> {
    let slug = record.url_slug();
    let reason = if slug.is_empty() {
        "must not be empty"
    } else if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        "may only contain lowercase letters, digits and hyphens"
    } else if RESERVED_SEGMENTS.contains(&slug) {
        "is the name of a site page"
    } else {
        return Ok(());
    };
    Err(RegistryError::InvalidSlug {
        code: record.code().to_string(),
        slug: slug.to_owned(),
        reason,
    })
}

/// Validated table of countries with exactly one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRegistry {
    default: CountryRecord,
    others: Vec<CountryRecord>,
}

impl CountryRegistry {
    /// Build a registry, enforcing valid and unique slugs, unique codes and
    /// a single default.
    ///
    /// A slug must be non-empty, use only `[a-z0-9-]` and must not be the
    /// first segment of a site page such as `services`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] describing the first violated invariant.
    pub fn new(records: impl IntoIterator<Item = CountryRecord>) -> Result<Self, RegistryError> {
        let mut default: Option<CountryRecord> = None;
        let mut others: Vec<CountryRecord> = Vec::new();
        let mut seen: Vec<(CountryCode, String)> = Vec::new();

        for record in records {
            check_slug(&record)?;
            if seen.iter().any(|(code, _)| code == record.code()) {
                return Err(RegistryError::DuplicateCode {
                    code: record.code().to_string(),
                });
            }
            if seen.iter().any(|(_, slug)| slug == record.url_slug()) {
                return Err(RegistryError::DuplicateSlug {
                    slug: record.url_slug().to_owned(),
                });
            }
            seen.push((record.code().clone(), record.url_slug().to_owned()));

            if record.is_default() {
                if let Some(existing) = &default {
                    return Err(RegistryError::MultipleDefaults {
                        first: existing.code().to_string(),
                        second: record.code().to_string(),
                    });
                }
                default = Some(record);
            } else {
                others.push(record);
            }
        }

        if seen.is_empty() {
            return Err(RegistryError::Empty);
        }
        let default = default.ok_or(RegistryError::MissingDefault)?;
        Ok(Self { default, others })
    }

    /// The registry shipped with the site: Singapore (default), Sri Lanka,
    /// Myanmar, Bangladesh and Pakistan.
    #[must_use]
    pub fn builtin() -> Self {
        let default = CountryRecord {
            code: CountryCode(String::from("sg")),
            display_name: String::from("Singapore"),
            url_slug: String::from("singapore"),
            is_default: true,
            dial_code: Some(String::from("+65")),
            default_language: Some(String::from("en")),
        };
        let others = [
            ("lk", "Sri Lanka", "+94"),
            ("mm", "Myanmar", "+95"),
            ("bd", "Bangladesh", "+880"),
            ("pk", "Pakistan", "+92"),
        ]
        .into_iter()
        .map(|(code, name, dial)| CountryRecord {
            code: CountryCode(code.to_owned()),
            display_name: name.to_owned(),
            url_slug: slugify(name),
            is_default: false,
            dial_code: Some(dial.to_owned()),
            default_language: Some(String::from("en")),
        })
        .collect();
        Self { default, others }
    }

    /// The default country's record.
    #[must_use]
    pub const fn default_country(&self) -> &CountryRecord {
        &self.default
    }

    /// Iterate over every record, default first.
    pub fn iter(&self) -> impl Iterator<Item = &CountryRecord> {
        iter::once(&self.default).chain(self.others.iter())
    }

    /// Number of registered countries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.others.len() + 1
    }

    /// Always `false`: a registry holds at least the default country.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Case-insensitive lookup by country code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&CountryRecord> {
        let needle = code.trim();
        self.iter()
            .find(|record| record.code().as_str().eq_ignore_ascii_case(needle))
    }

    /// Case-insensitive lookup by URL slug.
    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&CountryRecord> {
        self.iter()
            .find(|record| record.url_slug().eq_ignore_ascii_case(slug))
    }

    /// Return the registered record matching `country`, if any.
    ///
    /// Only the code is compared; a stale display name does not make an
    /// otherwise registered country invalid.
    #[must_use]
    pub fn lookup(&self, country: &ResolvedCountry) -> Option<&CountryRecord> {
        self.by_code(country.code.as_str())
    }

    /// Whether `code` names the default country.
    #[must_use]
    pub fn is_default(&self, code: &CountryCode) -> bool {
        self.default.code() == code
    }
}

impl Default for CountryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
