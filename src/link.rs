//! Link rewriting and canonical redirects.
//!
//! Callers pass *logical* base paths (for example `/services/lcl`), never
//! raw browser paths. The rewriter still refuses to stack a second copy of
//! the same slug, so repeated rewriting is harmless.

use crate::path::{normalize_path, parse_path, split_suffix};
use crate::registry::{CountryRegistry, ResolvedCountry};

/// Produce the country-prefixed form of `base_path`.
///
/// The default country, and any country missing from the registry, yields
/// the normalized base path unchanged.
///
/// # Examples
///
/// ```
/// use country_router::link::rewrite_link;
/// use country_router::registry::CountryRegistry;
///
/// let registry = CountryRegistry::builtin();
/// let mm = registry.by_code("mm").expect("myanmar").to_resolved();
/// assert_eq!(rewrite_link(&registry, "/contact", &mm), "/myanmar/contact");
///
/// let sg = registry.default_country().to_resolved();
/// assert_eq!(rewrite_link(&registry, "/contact", &sg), "/contact");
/// ```
#[must_use]
pub fn rewrite_link(
    registry: &CountryRegistry,
    base_path: &str,
    country: &ResolvedCountry,
) -> String {
    let base = normalize_path(base_path);
    let Some(record) = registry.lookup(country) else {
        return base;
    };
    if record.is_default() {
        return base;
    }
    let slug = record.url_slug();
    let parsed = parse_path(registry, &base);
    if parsed.country_slug.as_deref() == Some(slug) {
        return base;
    }
    prefix_slug(slug, &base)
}

/// Join a slug and a normalized remainder without leaving a bare `/` after
/// the slug.
fn prefix_slug(slug: &str, remainder: &str) -> String {
    match remainder.strip_prefix('/') {
        Some(rest) if rest.is_empty() || rest.starts_with(['?', '#']) => format!("/{slug}{rest}"),
        _ => format!("/{slug}{remainder}"),
    }
}

/// Return the redirect target for `raw` when it is not in canonical form.
///
/// A path is canonical when it is normalized, carries no default-country
/// slug prefix and spells any country slug in its registered case.
///
/// # Examples
///
/// ```
/// use country_router::link::canonical_path;
/// use country_router::registry::CountryRegistry;
///
/// let registry = CountryRegistry::builtin();
/// assert_eq!(
///     canonical_path(&registry, "/singapore/contact").as_deref(),
///     Some("/contact")
/// );
/// assert_eq!(canonical_path(&registry, "/myanmar/contact"), None);
/// ```
#[must_use]
pub fn canonical_path(registry: &CountryRegistry, raw: &str) -> Option<String> {
    let normalized = normalize_path(raw);
    let default_slug = registry.default_country().url_slug();
    let without_default = strip_default_prefix(&normalized, default_slug);

    let parsed = parse_path(registry, &without_default);
    let canonical = match parsed.country_slug {
        Some(slug) => prefix_slug(&slug, &parsed.remainder),
        None => parsed.remainder,
    };

    (canonical != raw).then_some(canonical)
}

fn strip_default_prefix(normalized: &str, default_slug: &str) -> String {
    let (path, suffix) = split_suffix(normalized);
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match segments.next() {
        Some(first) if first.eq_ignore_ascii_case(default_slug) => {
            let rest: Vec<&str> = segments.collect();
            normalize_path(&format!("/{}{suffix}", rest.join("/")))
        }
        _ => normalized.to_owned(),
    }
}
