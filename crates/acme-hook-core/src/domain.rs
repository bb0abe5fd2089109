// # Domain Parser
//
// Splits a certbot validation domain into the pieces the 1cloud.ru API
// wants: the hosted zone (always the last two dot-separated labels) and
// the host entry to create under it.
//
// The provider uses `@` as the host name for apex and wildcard entries,
// so `example.com` and `*.example.com` both parse to host `@`.

use crate::error::{Error, Result};

/// A domain name decomposed into the provider's (host, zone) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDomain {
    /// Host entry under the zone (`@` for apex/wildcard)
    pub subdomain: String,
    /// Zone name as registered with the provider
    pub zone: String,
}

/// Parse a fully qualified domain name into `(subdomain, zone)`.
///
/// The zone is the trailing two labels. Everything before them, minus the
/// joining dot, is the subdomain. Names with fewer than three labels fall
/// back to the whole input as the zone with subdomain `@`. A leading `*`
/// label is folded into `@` per the provider convention.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty input, or for a name whose
/// subdomain part exists but is empty (e.g. `.example.com`).
///
/// # Examples
///
/// ```
/// use acme_hook_core::domain::parse;
///
/// let d = parse("sub.example.com").unwrap();
/// assert_eq!(d.subdomain, "sub");
/// assert_eq!(d.zone, "example.com");
///
/// let d = parse("*.example.com").unwrap();
/// assert_eq!(d.subdomain, "@");
/// ```
pub fn parse(input: &str) -> Result<ParsedDomain> {
    if input.is_empty() {
        return Err(Error::invalid_input("domain is empty"));
    }

    let labels: Vec<&str> = input.split('.').collect();

    // The zone must be two non-empty trailing labels. Anything else
    // (short names, trailing dot) keeps the whole input as the zone.
    if labels.len() < 3 || labels[labels.len() - 2..].iter().any(|l| l.is_empty()) {
        return Ok(ParsedDomain {
            subdomain: "@".to_string(),
            zone: input.to_string(),
        });
    }

    let zone = labels[labels.len() - 2..].join(".");
    let prefix = &input[..input.len() - zone.len() - 1];

    if prefix.is_empty() {
        return Err(Error::invalid_input(format!(
            "cannot parse domain {input:?}: empty subdomain"
        )));
    }

    let subdomain = if prefix.split('.').next() == Some("*") {
        "@".to_string()
    } else {
        prefix.to_string()
    };

    Ok(ParsedDomain { subdomain, zone })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subdomain() {
        let d = parse("sub.example.com").unwrap();
        assert_eq!(d.subdomain, "sub");
        assert_eq!(d.zone, "example.com");
    }

    #[test]
    fn test_parse_deep_subdomain() {
        let d = parse("a.b.example.com").unwrap();
        assert_eq!(d.subdomain, "a.b");
        assert_eq!(d.zone, "example.com");
        // the split is lossless for non-wildcard names
        assert_eq!(format!("{}.{}", d.subdomain, d.zone), "a.b.example.com");
    }

    #[test]
    fn test_parse_apex() {
        let d = parse("example.com").unwrap();
        assert_eq!(d.subdomain, "@");
        assert_eq!(d.zone, "example.com");
    }

    #[test]
    fn test_parse_wildcard() {
        let d = parse("*.example.com").unwrap();
        assert_eq!(d.subdomain, "@");
        assert_eq!(d.zone, "example.com");
    }

    #[test]
    fn test_parse_wildcard_with_subdomain() {
        // a leading wildcard label maps to the apex entry
        let d = parse("*.sub.example.com").unwrap();
        assert_eq!(d.subdomain, "@");
        assert_eq!(d.zone, "example.com");
    }

    #[test]
    fn test_parse_single_label() {
        let d = parse("localhost").unwrap();
        assert_eq!(d.subdomain, "@");
        assert_eq!(d.zone, "localhost");
    }

    #[test]
    fn test_parse_trailing_dot_falls_back() {
        let d = parse("sub.example.com.").unwrap();
        assert_eq!(d.subdomain, "@");
        assert_eq!(d.zone, "sub.example.com.");
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(parse(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parse_empty_subdomain_is_error() {
        assert!(matches!(parse(".example.com"), Err(Error::InvalidInput(_))));
    }
}
