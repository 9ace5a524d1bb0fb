//! URL-to-site resolution.
//!
//! Maps a document URL to the configured [`Site`]s that apply to it, and
//! derives the focus directive and the bookmark list for a navigation command.
//!
//! The free functions are pure. [`SiteResolver`] memoizes them per URL for
//! one configuration; handing it a different configuration clears its cache.
//!
//! ```rust
//! use quickjump_core::resolver::{domain_of, is_match};
//! use quickjump_core::Site;
//!
//! assert_eq!(domain_of("https://user:pw@Docs.Example.com:8080/a?b")?, "docs.example.com");
//!
//! let site = Site::for_domain("example.com");
//! assert!(is_match("http://sub.example.com/page", &site)?);
//! assert!(!is_match("http://other-example.com", &site)?);
//! # Ok::<(), quickjump_core::Error>(())
//! ```

use crate::{
    Bookmark, BookmarkCategory, Configuration, Error, FocusMode, Result, Site, UrlMatchKind,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

#[allow(clippy::expect_used)]
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        // http://
        r"^(?:\w+://)?",
        // username:password@
        r#"(?:[\w.,:"-]+@)?"#,
        // example.com
        r"(?P<domain>[\w.-]+)",
        // :80
        r"(?::\d+)?",
    ))
    .expect("domain regex is valid")
});

/// Extract the lower-cased host part of a URL-like string.
///
/// Tolerates a missing scheme, credentials, a port and any trailing path.
pub fn domain_of(url: &str) -> Result<String> {
    DOMAIN_RE
        .captures(url)
        .and_then(|caps| caps.name("domain"))
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| Error::DomainExtraction(url.to_string()))
}

/// Number of URLs a [`SiteResolver`] remembers before it starts over.
const MAX_CACHED_URLS: usize = 128;

/// Compiled site-domain regexes, keyed by pattern text.
type RegexCache = HashMap<String, Regex>;

fn site_regex<'c>(cache: &'c mut RegexCache, pattern: &str) -> Result<&'c Regex> {
    if !cache.contains_key(pattern) {
        let regex = Regex::new(pattern).map_err(|e| Error::pattern_compile(pattern, &e))?;
        cache.insert(pattern.to_string(), regex);
    }
    cache
        .get(pattern)
        .ok_or_else(|| Error::NotFound(format!("compiled pattern {pattern}")))
}

/// Domain of `url`, extracted once per resolution and shared across sites.
struct UrlParts<'u> {
    url: &'u str,
    lower: String,
    domain: Option<String>,
}

impl<'u> UrlParts<'u> {
    fn new(url: &'u str) -> Self {
        let domain = match domain_of(url) {
            Ok(domain) => Some(domain),
            Err(err) => {
                warn!(%url, error = %err, "treating domain-based sites as not matching");
                None
            },
        };
        Self {
            url,
            lower: url.to_lowercase(),
            domain,
        }
    }
}

fn site_matches(parts: &UrlParts<'_>, site: &Site, regexes: &mut RegexCache) -> Result<bool> {
    let matched = match site.url_match {
        UrlMatchKind::Ignore => true,
        UrlMatchKind::Domain | UrlMatchKind::Subdomain => {
            let Some(domain) = parts.domain.as_deref() else {
                return Ok(false);
            };
            let site_domain = site.domain.to_lowercase();
            domain == site_domain
                || (site.url_match == UrlMatchKind::Subdomain
                    && domain
                        .strip_suffix(site_domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.')))
        },
        UrlMatchKind::Substring => parts.lower.contains(&site.domain.to_lowercase()),
        UrlMatchKind::Exact => parts.lower == site.domain.to_lowercase(),
        UrlMatchKind::Regex => site_regex(regexes, &site.domain)?.is_match(parts.url),
    };
    Ok(matched)
}

/// Whether `site` applies to `url`.
///
/// A URL without a recognizable domain never matches `DOMAIN`/`SUBDOMAIN`
/// sites. Fails only when a `REGEX` site's pattern does not compile.
pub fn is_match(url: &str, site: &Site) -> Result<bool> {
    site_matches(&UrlParts::new(url), site, &mut RegexCache::new())
}

fn collect_sites(
    config: &Configuration,
    url: &str,
    regexes: &mut RegexCache,
) -> Result<Vec<Arc<Site>>> {
    let parts = UrlParts::new(url);
    let mut sites = Vec::new();
    for site in &config.sites {
        if site_matches(&parts, site, regexes)? {
            sites.push(Arc::clone(site));
        }
    }
    Ok(sites)
}

fn focus_mode_of(sites: &[Arc<Site>]) -> FocusMode {
    sites
        .iter()
        .map(|site| site.focus_mode)
        .max()
        .unwrap_or(FocusMode::Unchanged)
}

fn bookmarks_of(sites: &[Arc<Site>], category: Option<BookmarkCategory>) -> Vec<Arc<Bookmark>> {
    sites
        .iter()
        .flat_map(|site| site.bookmarks.iter())
        .filter(|bookmark| bookmark.enabled && category.is_none_or(|c| bookmark.category == c))
        .cloned()
        .collect()
}

/// All sites matching `url`, in configured order.
pub fn find_sites(url: &str, config: &Configuration) -> Result<Vec<Arc<Site>>> {
    collect_sites(config, url, &mut RegexCache::new())
}

/// Strongest focus directive among the sites matching `url`.
///
/// `UNCHANGED` when no site matches.
pub fn resolve_focus_mode(url: &str, config: &Configuration) -> Result<FocusMode> {
    Ok(focus_mode_of(&find_sites(url, config)?))
}

/// Enabled bookmarks of every site matching `url`, in site order then bookmark order.
///
/// With `category` set, only bookmarks of that category are returned.
pub fn find_applicable_bookmarks(
    config: &Configuration,
    url: &str,
    category: Option<BookmarkCategory>,
) -> Result<Vec<Arc<Bookmark>>> {
    Ok(bookmarks_of(&find_sites(url, config)?, category))
}

/// Memoizing front end for the resolution functions.
///
/// Results are cached per URL for the configuration last passed in. The
/// resolver holds that configuration, so comparing by identity is reliable:
/// any swapped-in configuration is a different allocation and clears the cache.
/// At most 128 URLs are remembered; the cache is cleared when that fills up.
#[derive(Debug, Default)]
pub struct SiteResolver {
    config: Option<Arc<Configuration>>,
    sites: HashMap<String, Arc<[Arc<Site>]>>,
    bookmarks: HashMap<(String, Option<BookmarkCategory>), Arc<[Arc<Bookmark>]>>,
    regexes: RegexCache,
}

impl SiteResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every memoized result.
    pub fn invalidate(&mut self) {
        self.config = None;
        self.sites.clear();
        self.bookmarks.clear();
        self.regexes.clear();
    }

    fn sync(&mut self, config: &Arc<Configuration>) {
        let current = self
            .config
            .as_ref()
            .is_some_and(|held| Arc::ptr_eq(held, config));
        if !current {
            debug!("configuration changed, clearing resolver cache");
            self.invalidate();
            self.config = Some(Arc::clone(config));
        }
    }

    /// Memoized [`find_sites`].
    pub fn find_sites(&mut self, config: &Arc<Configuration>, url: &str) -> Result<Arc<[Arc<Site>]>> {
        self.sync(config);
        if let Some(sites) = self.sites.get(url) {
            return Ok(Arc::clone(sites));
        }
        let sites: Arc<[Arc<Site>]> = collect_sites(config, url, &mut self.regexes)?.into();
        debug!(%url, matched = sites.len(), "resolved sites");
        if self.sites.len() >= MAX_CACHED_URLS {
            debug!(entries = self.sites.len(), "resolver cache full, clearing");
            self.sites.clear();
            self.bookmarks.clear();
        }
        self.sites.insert(url.to_string(), Arc::clone(&sites));
        Ok(sites)
    }

    /// Memoized [`resolve_focus_mode`].
    pub fn resolve_focus_mode(&mut self, config: &Arc<Configuration>, url: &str) -> Result<FocusMode> {
        Ok(focus_mode_of(&self.find_sites(config, url)?))
    }

    /// Memoized [`find_applicable_bookmarks`].
    ///
    /// Repeated calls with an unchanged configuration return the same
    /// allocation, so bookmark handles keep their identity and compiled
    /// patterns stay cached.
    pub fn find_applicable_bookmarks(
        &mut self,
        config: &Arc<Configuration>,
        url: &str,
        category: Option<BookmarkCategory>,
    ) -> Result<Arc<[Arc<Bookmark>]>> {
        let sites = self.find_sites(config, url)?;
        let key = (url.to_string(), category);
        if let Some(bookmarks) = self.bookmarks.get(&key) {
            return Ok(Arc::clone(bookmarks));
        }
        let bookmarks: Arc<[Arc<Bookmark>]> = bookmarks_of(&sites, category).into();
        if self.bookmarks.len() >= MAX_CACHED_URLS * BookmarkCategory::ALL.len() {
            self.bookmarks.clear();
        }
        self.bookmarks.insert(key, Arc::clone(&bookmarks));
        Ok(bookmarks)
    }
}
