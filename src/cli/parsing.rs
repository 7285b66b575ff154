//! CLI parsing helpers for clap value parsers.

use crate::language::LanguageTag;
use crate::registry::CountryCode;

/// Validate a two-letter country code and return it in lowercase.
///
/// Registration is checked later against the configured registry.
pub(super) fn parse_country_code(s: &str) -> Result<String, String> {
    CountryCode::parse(s)
        .map(String::from)
        .map_err(|err| err.to_string())
}

/// Validate a BCP 47 tag and return its canonical form.
pub(super) fn parse_language_tag(s: &str) -> Result<String, String> {
    LanguageTag::parse(s)
        .map(String::from)
        .map_err(|err| err.to_string())
}

pub(super) fn parse_site_path(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(String::from("path must not be empty"));
    }
    if trimmed.contains("://") {
        return Err(format!(
            "'{trimmed}' looks like a URL; pass only the path, for example /contact"
        ));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("LK", Ok("lk"))]
    #[case(" pk ", Ok("pk"))]
    #[case("l1", Err(()))]
    #[case("", Err(()))]
    fn country_codes(#[case] raw: &str, #[case] expected: Result<&str, ()>) {
        assert_eq!(parse_country_code(raw).as_deref().map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("contact", Ok("contact"))]
    #[case(" /myanmar ", Ok("/myanmar"))]
    #[case("https://example.com/contact", Err(()))]
    #[case("   ", Err(()))]
    fn site_paths(#[case] raw: &str, #[case] expected: Result<&str, ()>) {
        assert_eq!(parse_site_path(raw).as_deref().map_err(|_| ()), expected);
    }
}
