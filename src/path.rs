//! Path parsing: split an optional leading country slug off a site path.
//!
//! Matching is restricted to the registry's slug set, so page names such
//! as `services` or `contact` can never be mistaken for a country.

use crate::registry::{CountryRecord, CountryRegistry};

/// Result of splitting a path into its country slug and logical remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Canonical (lowercase) slug of a non-default country, when present.
    pub country_slug: Option<String>,
    /// Normalized logical path with the slug removed.
    pub remainder: String,
}

impl ParsedPath {
    /// The root path with no country signal.
    #[must_use]
    pub fn root() -> Self {
        Self {
            country_slug: None,
            remainder: String::from("/"),
        }
    }

    /// Look up the record for the extracted slug.
    #[must_use]
    pub fn country<'a>(&self, registry: &'a CountryRegistry) -> Option<&'a CountryRecord> {
        self.country_slug
            .as_deref()
            .and_then(|slug| registry.by_slug(slug))
    }
}

/// Separate `raw` into its path part and any `?query` / `#fragment` suffix.
pub(crate) fn split_suffix(raw: &str) -> (&str, &str) {
    raw.find(['?', '#'])
        .map_or((raw, ""), |index| raw.split_at(index))
}

fn join_segments<'a>(segments: impl Iterator<Item = &'a str>, suffix: &str) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out.push_str(suffix);
    out
}

/// Normalize a path: ensure a leading `/`, collapse empty segments and drop
/// a trailing `/`. Query strings and fragments are kept verbatim.
///
/// # Examples
///
/// ```
/// use country_router::path::normalize_path;
///
/// assert_eq!(normalize_path("services//lcl/"), "/services/lcl");
/// assert_eq!(normalize_path(""), "/");
/// assert_eq!(normalize_path("/blog/?page=2"), "/blog?page=2");
/// ```
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let (path, suffix) = split_suffix(raw.trim());
    join_segments(path.split('/').filter(|s| !s.is_empty()), suffix)
}

/// Extract a leading country slug from `raw`.
///
/// Only slugs of non-default countries are recognized; the default
/// country's slug is left in the remainder (see
/// [`crate::link::canonical_path`] for redirecting such paths).
///
/// # Examples
///
/// ```
/// use country_router::path::parse_path;
/// use country_router::registry::CountryRegistry;
///
/// let registry = CountryRegistry::builtin();
/// let parsed = parse_path(&registry, "/sri-lanka/services/lcl");
/// assert_eq!(parsed.country_slug.as_deref(), Some("sri-lanka"));
/// assert_eq!(parsed.remainder, "/services/lcl");
/// ```
#[must_use]
pub fn parse_path(registry: &CountryRegistry, raw: &str) -> ParsedPath {
    let (path, suffix) = split_suffix(raw.trim());
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

    let country = segments
        .peek()
        .and_then(|first| registry.by_slug(first))
        .filter(|record| !record.is_default());

    match country {
        Some(record) => {
            segments.next();
            ParsedPath {
                country_slug: Some(record.url_slug().to_owned()),
                remainder: join_segments(segments, suffix),
            }
        }
        None => ParsedPath {
            country_slug: None,
            remainder: join_segments(segments, suffix),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/myanmar/services/lcl", Some("myanmar"), "/services/lcl")]
    #[case("/Sri-Lanka/contact", Some("sri-lanka"), "/contact")]
    #[case("/pakistan", Some("pakistan"), "/")]
    #[case("/pakistan/", Some("pakistan"), "/")]
    #[case("bangladesh/about-us", Some("bangladesh"), "/about-us")]
    #[case("/contact", None, "/contact")]
    #[case("/", None, "/")]
    #[case("", None, "/")]
    #[case("/services/myanmar", None, "/services/myanmar")]
    #[case("/singapore/contact", None, "/singapore/contact")]
    #[case("/srilanka/contact", None, "/srilanka/contact")]
    #[case("/myanmar/blog/?page=2", Some("myanmar"), "/blog?page=2")]
    #[case("/myanmar#top", Some("myanmar"), "/#top")]
    fn parses_country_prefix(
        #[case] raw: &str,
        #[case] slug: Option<&str>,
        #[case] remainder: &str,
    ) {
        let registry = CountryRegistry::builtin();
        let parsed = parse_path(&registry, raw);
        assert_eq!(parsed.country_slug.as_deref(), slug, "slug for {raw}");
        assert_eq!(parsed.remainder, remainder, "remainder for {raw}");
    }

    #[test]
    fn parsed_path_resolves_record() {
        let registry = CountryRegistry::builtin();
        let parsed = parse_path(&registry, "/myanmar/contact");
        let record = parsed.country(&registry).expect("myanmar record");
        assert_eq!(record.code().as_str(), "mm");
        assert!(ParsedPath::root().country(&registry).is_none());
    }
}
