//! Configuration persistence and structural edits.
//!
//! [`Configuration`] is the root of the rule tree. It is loaded once from the
//! user's rules file (falling back to the bundled defaults), replaced as a
//! whole on every edit, and saved back as deterministic pretty-printed JSON.
//!
//! Edits never mutate. Each `with_*` method returns a new tree in which every
//! untouched site and bookmark is the same `Arc` as before, so identity-keyed
//! caches stay warm across unrelated edits.
//!
//! ```rust
//! use quickjump_core::{Configuration, Site};
//!
//! let config = Configuration::default().with_site_added(Site::for_domain("example.com"));
//! let site = std::sync::Arc::clone(&config.sites[0]);
//!
//! let renamed = config.with_site_replaced(&site, Site {
//!     name: "Example".into(),
//!     ..(*site).clone()
//! })?;
//! assert_eq!(renamed.sites[0].display_name(), "Example");
//! assert_eq!(config.sites[0].display_name(), "example.com");
//! # Ok::<(), quickjump_core::Error>(())
//! ```

use crate::{Bookmark, Error, Result, Site};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "QUICKJUMP_CONFIG_DIR";

/// File name of the user rules file inside the configuration directory.
pub const RULES_FILE_NAME: &str = "rules.json";

const APP_DIR: &str = "quickjump";

const BUNDLED_RULES: &str = include_str!("../defaults/rules.json");

/// The root of the rule tree: an ordered list of sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Sites in display order.
    #[serde(default)]
    pub sites: Vec<Arc<Site>>,
}

/// Determine the configuration directory honoring overrides.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join(APP_DIR));
        }
    }

    ProjectDirs::from("", "", APP_DIR)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Failed to determine configuration directory".into()))
}

/// Path of the user rules file.
pub fn rules_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(RULES_FILE_NAME))
}

fn position<T>(items: &[Arc<T>], item: &Arc<T>) -> Option<usize> {
    items.iter().position(|candidate| Arc::ptr_eq(candidate, item))
}

/// `items` with the element at `index` shifted by `offset`; unchanged when
/// the target falls outside the list.
fn shifted<T>(items: &[Arc<T>], index: usize, offset: isize) -> Vec<Arc<T>> {
    let mut items = items.to_vec();
    if let Some(target) = index
        .checked_add_signed(offset)
        .filter(|target| *target < items.len())
    {
        let item = items.remove(index);
        items.insert(target, item);
    }
    items
}

impl Configuration {
    /// The rule set shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_RULES)
            .map_err(|e| Error::Config(format!("Bundled rules are invalid: {e}")))
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration from a JSON value tree.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The JSON value tree of this configuration; object keys are sorted.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Pretty-printed JSON with 4-space indentation and sorted keys.
    pub fn to_json(&self) -> Result<String> {
        let value = self.to_value()?;
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Load the user rules file, or the bundled rules when there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(&rules_path()?)
    }

    /// Load rules from `path`, or the bundled rules when `path` does not exist.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no user rules file, using bundled rules");
                return Self::bundled();
            },
            Err(e) => return Err(Error::Io(e)),
        };

        let config = Self::from_json(&json)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
        info!(path = %path.display(), sites = config.sites.len(), "loaded rules");
        Ok(config)
    }

    /// Save to the user rules file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&rules_path()?)
    }

    /// Save to `path`, replacing it atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create {}: {e}", parent.display())))?;
        }

        // Write to a temp file first to ensure atomicity
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json)
            .map_err(|e| Error::Config(format!("Failed to write temp rules: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| Error::Config(format!("Failed to remove existing rules: {e}")))?;
        }
        fs::rename(&tmp_path, path)
            .map_err(|e| Error::Config(format!("Failed to persist rules: {e}")))?;

        info!(path = %path.display(), sites = self.sites.len(), "saved rules");
        Ok(())
    }

    /// Index of `site` (by identity).
    pub fn site_index(&self, site: &Arc<Site>) -> Option<usize> {
        position(&self.sites, site)
    }

    /// The site owning `bookmark` (by identity).
    pub fn site_of_bookmark(&self, bookmark: &Arc<Bookmark>) -> Option<&Arc<Site>> {
        self.sites.iter().find(|site| site.contains_bookmark(bookmark))
    }

    fn require_site(&self, site: &Arc<Site>) -> Result<usize> {
        self.site_index(site)
            .ok_or_else(|| Error::NotFound(format!("site '{}'", site.display_name())))
    }

    /// Same configuration with a new site list.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn with_sites(&self, sites: Vec<Arc<Site>>) -> Self {
        Self { sites }
    }

    /// Append `site`.
    #[must_use]
    pub fn with_site_added(&self, site: Site) -> Self {
        let mut sites = self.sites.clone();
        sites.push(Arc::new(site));
        self.with_sites(sites)
    }

    /// Replace `old` with `new` at the same position.
    pub fn with_site_replaced(&self, old: &Arc<Site>, new: Site) -> Result<Self> {
        let index = self.require_site(old)?;
        let mut sites = self.sites.clone();
        sites[index] = Arc::new(new);
        Ok(self.with_sites(sites))
    }

    /// Remove `site`.
    pub fn with_site_removed(&self, site: &Arc<Site>) -> Result<Self> {
        let index = self.require_site(site)?;
        let mut sites = self.sites.clone();
        sites.remove(index);
        Ok(self.with_sites(sites))
    }

    /// Shift `site` by `offset` positions; no-op past either end.
    pub fn with_site_moved(&self, site: &Arc<Site>, offset: isize) -> Result<Self> {
        let index = self.require_site(site)?;
        Ok(self.with_sites(shifted(&self.sites, index, offset)))
    }

    /// Sites stably sorted by display name.
    #[must_use]
    pub fn with_sites_sorted(&self) -> Self {
        let mut sites = self.sites.clone();
        sites.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        self.with_sites(sites)
    }

    /// Move `bookmark` from its owning site to the end of `target`.
    ///
    /// The bookmark keeps its identity. Moving to its own site is a no-op.
    pub fn with_bookmark_moved_to_site(
        &self,
        bookmark: &Arc<Bookmark>,
        target: &Arc<Site>,
    ) -> Result<Self> {
        let owner = self
            .site_of_bookmark(bookmark)
            .ok_or_else(|| Error::NotFound(format!("bookmark '{}'", bookmark.display_name())))?;
        let owner_index = self.require_site(owner)?;
        let target_index = self.require_site(target)?;
        if owner_index == target_index {
            return Ok(self.clone());
        }

        let mut target_bookmarks = target.bookmarks.clone();
        target_bookmarks.push(Arc::clone(bookmark));

        let mut sites = self.sites.clone();
        sites[owner_index] = Arc::new(owner.with_bookmark_removed(bookmark)?);
        sites[target_index] = Arc::new(target.with_bookmarks(target_bookmarks));
        debug!(
            bookmark = bookmark.display_name(),
            from = owner.display_name(),
            to = target.display_name(),
            "moved bookmark"
        );
        Ok(self.with_sites(sites))
    }
}

impl Site {
    fn require_bookmark(&self, bookmark: &Arc<Bookmark>) -> Result<usize> {
        position(&self.bookmarks, bookmark)
            .ok_or_else(|| Error::NotFound(format!("bookmark '{}'", bookmark.display_name())))
    }

    /// Same site with a new bookmark list.
    #[must_use]
    pub fn with_bookmarks(&self, bookmarks: Vec<Arc<Bookmark>>) -> Self {
        Self {
            bookmarks,
            ..self.clone()
        }
    }

    /// Append `bookmark`.
    #[must_use]
    pub fn with_bookmark_added(&self, bookmark: Bookmark) -> Self {
        let mut bookmarks = self.bookmarks.clone();
        bookmarks.push(Arc::new(bookmark));
        self.with_bookmarks(bookmarks)
    }

    /// Replace `old` with `new` at the same position.
    pub fn with_bookmark_replaced(&self, old: &Arc<Bookmark>, new: Bookmark) -> Result<Self> {
        let index = self.require_bookmark(old)?;
        let mut bookmarks = self.bookmarks.clone();
        bookmarks[index] = Arc::new(new);
        Ok(self.with_bookmarks(bookmarks))
    }

    /// Remove `bookmark`.
    pub fn with_bookmark_removed(&self, bookmark: &Arc<Bookmark>) -> Result<Self> {
        let index = self.require_bookmark(bookmark)?;
        let mut bookmarks = self.bookmarks.clone();
        bookmarks.remove(index);
        Ok(self.with_bookmarks(bookmarks))
    }

    /// Shift `bookmark` by `offset` positions; no-op past either end.
    pub fn with_bookmark_moved(&self, bookmark: &Arc<Bookmark>, offset: isize) -> Result<Self> {
        let index = self.require_bookmark(bookmark)?;
        Ok(self.with_bookmarks(shifted(&self.bookmarks, index, offset)))
    }

    /// Bookmarks stably sorted by display name.
    #[must_use]
    pub fn with_bookmarks_sorted(&self) -> Self {
        let mut bookmarks = self.bookmarks.clone();
        bookmarks.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        self.with_bookmarks(bookmarks)
    }
}
