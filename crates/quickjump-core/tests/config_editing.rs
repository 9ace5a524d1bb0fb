//! Editing, validating and persisting rules through a `ConfigStore`.

#![allow(clippy::unwrap_used, clippy::panic)]

use quickjump_core::config::RULES_FILE_NAME;
use quickjump_core::validate::{parse_attribute_matchers, validate_bookmark, validate_site_in};
use quickjump_core::{
    Bookmark, BookmarkCategory, ConfigStore, Configuration, Error, PatternMatchKind, Site,
    SiteResolver,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[test]
fn edit_session_round_trips_through_disk() {
    // Given: A store on an empty config directory
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(RULES_FILE_NAME);
    let mut store = ConfigStore::open(&path).unwrap();
    let bundled = store.current();

    let resolver = Arc::new(Mutex::new(SiteResolver::new()));
    let hooked = Arc::clone(&resolver);
    store.on_swap(move |_, _| hooked.lock().unwrap().invalidate());

    // When: The user adds a validated site with a validated bookmark
    let site = validate_site_in(&bundled, Site::for_domain("Docs.RS"), None).unwrap();
    let bookmark = validate_bookmark(Bookmark {
        name: "Item".into(),
        pattern_match: PatternMatchKind::Regex,
        attribute_matchers: parse_attribute_matchers("!font-size:8pt").unwrap(),
        ..Bookmark::substring(BookmarkCategory::QuickJump, r"^(Struct|Enum|Trait) ")
    })
    .unwrap();
    let edited = bundled.with_site_added(site.with_bookmark_added(bookmark));
    store.commit(edited).unwrap();

    // Then: The file holds the normalized edit and reloads identically
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"domain\": \"docs.rs\""));
    assert!(saved.contains("\"attribute\": \"font-size\""));

    let reloaded = Configuration::load_from(&path).unwrap();
    assert_eq!(reloaded, *store.current());
    assert_eq!(reloaded.sites.len(), bundled.sites.len() + 1);
    assert_eq!(store.version(), 1);

    let bookmarks = resolver
        .lock()
        .unwrap()
        .find_applicable_bookmarks(&store.current(), "https://docs.rs/regex", Some(BookmarkCategory::QuickJump))
        .unwrap();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].name, "Item");
}

#[test]
fn rejected_edits_leave_the_store_untouched() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(RULES_FILE_NAME);
    let store = ConfigStore::open(&path).unwrap();
    let current = store.current();

    // A duplicate of the bundled GitHub site
    let duplicate = validate_site_in(&current, Site::for_domain("GitHub.com"), None).unwrap_err();
    assert!(duplicate.is_validation());
    assert!(matches!(duplicate, Error::DuplicateSite(ref name) if name == "GitHub"));

    let empty = validate_bookmark(Bookmark::template()).unwrap_err();
    assert_eq!(empty.category(), "empty_pattern");

    assert_eq!(store.version(), 0);
    assert!(!path.exists());
}

#[test]
fn moving_a_bookmark_between_sites_persists() {
    // Given: A committed configuration with two sites
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(RULES_FILE_NAME);
    let store = ConfigStore::open(&path).unwrap();
    let config = store.current();
    let github = Arc::clone(&config.sites[0]);
    let gmail = Arc::clone(&config.sites[1]);
    let bookmark = Arc::clone(&github.bookmarks[0]);

    // When: Moving GitHub's first bookmark to Gmail and committing
    let moved = config.with_bookmark_moved_to_site(&bookmark, &gmail).unwrap();
    store.commit(moved).unwrap();

    // Then: The reloaded rules reflect the move
    let reloaded = Configuration::load_from(&path).unwrap();
    assert_eq!(reloaded.sites[0].bookmarks.len(), github.bookmarks.len() - 1);
    assert_eq!(reloaded.sites[1].bookmarks.last().unwrap().pattern, bookmark.pattern);
}
