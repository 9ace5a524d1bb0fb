//! Edit-time validation of sites and bookmarks.
//!
//! Rule editors run user input through these functions before building a new
//! [`Configuration`]. Every failure is a validation error
//! ([`Error::is_validation`]) carrying a message suitable for display; the
//! edit should be rejected and nothing persisted.
//!
//! Successful validation returns the value normalized for storage.

use crate::pattern::{GROUP_PREFIX, compile_bookmark};
use crate::{
    AttributeMatcher, Bookmark, BookmarkCategory, Configuration, Error, PatternMatchKind, Result,
    Site, UrlMatchKind,
};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

#[allow(clippy::expect_used)]
static HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+(?::\d+)?$").expect("host regex is valid"));

/// Check a bookmark entered by the user.
///
/// The pattern must be non-empty and, for `REGEX` bookmarks, compile.
pub fn validate_bookmark(bookmark: Bookmark) -> Result<Bookmark> {
    if bookmark.pattern.is_empty() {
        return Err(Error::EmptyPattern);
    }
    if bookmark.pattern_match == PatternMatchKind::Regex {
        compile_bookmark(&bookmark)?;
    }
    Ok(bookmark)
}

/// Parse the attribute field of a bookmark editor.
///
/// Blank input yields no matchers.
pub fn parse_attribute_matchers(text: &str) -> Result<Vec<AttributeMatcher>> {
    AttributeMatcher::parse_list(text.trim())
}

/// Check that a site's `REGEX` bookmarks can be searched together.
///
/// Bookmarks of one category are joined into a single alternation, so a
/// named group may appear in only one of them. Names starting with `__qj_`
/// are reserved.
pub fn validate_site_bookmarks(site: &Site) -> Result<()> {
    for category in BookmarkCategory::ALL {
        let mut seen = HashSet::new();
        let regex_bookmarks = site
            .bookmarks
            .iter()
            .filter(|b| b.category == *category && b.pattern_match == PatternMatchKind::Regex);
        for bookmark in regex_bookmarks {
            let regex = compile_bookmark(bookmark)?;
            for name in regex.capture_names().flatten() {
                let message = if name.starts_with(GROUP_PREFIX) {
                    format!("group names starting with '{GROUP_PREFIX}' are reserved")
                } else if !seen.insert(name.to_string()) {
                    format!("group name '{name}' is already used by another {category:?} bookmark")
                } else {
                    continue;
                };
                return Err(Error::PatternCompile {
                    pattern: bookmark.pattern.clone(),
                    message,
                });
            }
        }
    }
    Ok(())
}

/// Check a site entered by the user against the other configured sites.
///
/// `others` must not include the site being edited. `DOMAIN` and `SUBDOMAIN`
/// domains come back lower-cased. The site's bookmarks are checked with
/// [`validate_site_bookmarks`].
pub fn validate_site(mut site: Site, others: &[Arc<Site>]) -> Result<Site> {
    match site.url_match {
        UrlMatchKind::Ignore => {
            if !site.domain.is_empty() {
                return Err(Error::InvalidDomainFormat(
                    "A site matching all URLs must have a blank domain".into(),
                ));
            }
        },
        _ if site.domain.is_empty() => {
            return Err(Error::InvalidDomainFormat("Domain cannot be empty".into()));
        },
        UrlMatchKind::Domain | UrlMatchKind::Subdomain => {
            if !HOST_RE.is_match(&site.domain) {
                return Err(Error::InvalidDomainFormat(format!(
                    "'{}' is not a domain, expected something like en.wikipedia.org",
                    site.domain
                )));
            }
            site.domain = site.domain.to_lowercase();
        },
        UrlMatchKind::Regex => {
            Regex::new(&site.domain).map_err(|e| Error::pattern_compile(&site.domain, &e))?;
        },
        UrlMatchKind::Substring | UrlMatchKind::Exact => {},
    }
    validate_site_bookmarks(&site)?;

    if let Some(duplicate) = others
        .iter()
        .find(|other| other.url_match == site.url_match && other.domain == site.domain)
    {
        return Err(Error::DuplicateSite(duplicate.display_name().to_string()));
    }
    Ok(site)
}

/// [`validate_site`] against every site of `config` except `replacing`.
pub fn validate_site_in(
    config: &Configuration,
    site: Site,
    replacing: Option<&Arc<Site>>,
) -> Result<Site> {
    let others: Vec<Arc<Site>> = config
        .sites
        .iter()
        .filter(|other| replacing.is_none_or(|r| !Arc::ptr_eq(other, r)))
        .cloned()
        .collect();
    validate_site(site, &others)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{Attribute, BookmarkCategory};

    fn site(domain: &str, url_match: UrlMatchKind) -> Site {
        Site {
            url_match,
            ..Site::for_domain(domain)
        }
    }

    #[test]
    fn test_bookmark_rules() {
        assert!(matches!(
            validate_bookmark(Bookmark::template()),
            Err(Error::EmptyPattern)
        ));

        let bad = Bookmark {
            pattern_match: PatternMatchKind::Regex,
            ..Bookmark::substring(BookmarkCategory::QuickJump, "(unclosed")
        };
        let err = validate_bookmark(bad).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, Error::PatternCompile { ref pattern, .. } if pattern == "(unclosed"));

        // Special characters are fine when matched literally
        let literal = Bookmark::substring(BookmarkCategory::QuickJump, "(unclosed");
        assert!(validate_bookmark(literal).is_ok());
    }

    #[test]
    fn test_attribute_field_parsing() {
        let matchers = parse_attribute_matchers("  role:12  !font-size:10pt ").unwrap();
        assert_eq!(matchers.len(), 2);
        assert_eq!(matchers[0].attribute, Attribute::role(12));
        assert!(matchers[1].invert);

        assert!(parse_attribute_matchers("   ").unwrap().is_empty());
        assert!(matches!(
            parse_attribute_matchers("colour:red"),
            Err(Error::InvalidAttribute(_))
        ));
    }

    #[test]
    fn test_domain_presence_rules() {
        assert!(validate_site(site("", UrlMatchKind::Ignore), &[]).is_ok());
        assert!(matches!(
            validate_site(site("example.com", UrlMatchKind::Ignore), &[]),
            Err(Error::InvalidDomainFormat(_))
        ));
        for kind in [
            UrlMatchKind::Domain,
            UrlMatchKind::Subdomain,
            UrlMatchKind::Substring,
            UrlMatchKind::Exact,
            UrlMatchKind::Regex,
        ] {
            assert!(matches!(
                validate_site(site("", kind), &[]),
                Err(Error::InvalidDomainFormat(_))
            ));
        }
    }

    #[test]
    fn test_domain_format_and_normalization() {
        // Given: A mixed-case domain with a port
        let validated = validate_site(site("Docs.Example.COM:8080", UrlMatchKind::Domain), &[]).unwrap();

        // Then: It is stored lower-cased
        assert_eq!(validated.domain, "docs.example.com:8080");

        for bad in ["https://example.com", "example.com/path", "exa mple.com"] {
            assert!(
                matches!(
                    validate_site(site(bad, UrlMatchKind::Subdomain), &[]),
                    Err(Error::InvalidDomainFormat(_))
                ),
                "expected {bad:?} to be rejected"
            );
        }

        // Substring and exact sites are stored as typed
        let exact = validate_site(site("https://Example.com/A", UrlMatchKind::Exact), &[]).unwrap();
        assert_eq!(exact.domain, "https://Example.com/A");
    }

    #[test]
    fn test_regex_site_must_compile() {
        assert!(validate_site(site(r"example\.(com|org)", UrlMatchKind::Regex), &[]).is_ok());
        assert!(matches!(
            validate_site(site("[", UrlMatchKind::Regex), &[]),
            Err(Error::PatternCompile { .. })
        ));
    }

    #[test]
    fn test_group_names_must_not_clash_within_a_category() {
        let regex = |category, pattern: &str| Bookmark {
            pattern_match: PatternMatchKind::Regex,
            ..Bookmark::substring(category, pattern)
        };

        // Given: Two QuickJump bookmarks that both name a group "user"
        let site = Site::for_domain("example.com")
            .with_bookmark_added(regex(BookmarkCategory::QuickJump, r"(?P<user>\w+) wrote"))
            .with_bookmark_added(regex(BookmarkCategory::QuickJump, r"by (?P<user>\w+)"));

        // Then: Each passes alone but the site is rejected
        for bookmark in &site.bookmarks {
            assert!(validate_bookmark((**bookmark).clone()).is_ok());
        }
        let err = validate_site(site, &[]).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, Error::PatternCompile { ref pattern, ref message }
            if pattern == r"by (?P<user>\w+)" && message.contains("'user'")));

        // The same name in different categories never shares an alternation
        let split = Site::for_domain("example.com")
            .with_bookmark_added(regex(BookmarkCategory::QuickJump, r"(?P<user>\w+) wrote"))
            .with_bookmark_added(regex(BookmarkCategory::QuickJump2, r"by (?P<user>\w+)"));
        assert!(validate_site_bookmarks(&split).is_ok());

        let reserved = Site::for_domain("example.com")
            .with_bookmark_added(regex(BookmarkCategory::QuickJump, r"(?P<__qj_0>x)"));
        assert!(matches!(
            validate_site_bookmarks(&reserved),
            Err(Error::PatternCompile { .. })
        ));
    }

    #[test]
    fn test_duplicate_sites_rejected_after_normalization() {
        // Given: An existing SUBDOMAIN site
        let existing = Arc::new(Site {
            name: "Example".into(),
            ..Site::for_domain("example.com")
        });
        let config = Configuration {
            sites: vec![Arc::clone(&existing)],
        };

        // When: Adding the same domain in another case
        let err = validate_site_in(&config, Site::for_domain("EXAMPLE.com"), None).unwrap_err();

        // Then: The duplicate is reported by display name
        assert!(matches!(err, Error::DuplicateSite(ref name) if name == "Example"));

        // A different match kind is not a duplicate
        assert!(validate_site_in(&config, site("example.com", UrlMatchKind::Domain), None).is_ok());

        // Re-validating the site being edited does not clash with itself
        let edited = Site {
            name: "Renamed".into(),
            ..(*existing).clone()
        };
        assert!(validate_site_in(&config, edited, Some(&existing)).is_ok());
    }
}
