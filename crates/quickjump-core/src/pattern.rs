//! Bookmark pattern compilation and composite matching.
//!
//! Each bookmark compiles to a regular expression according to its
//! [`PatternMatchKind`]. To find which of many bookmarks matches a paragraph,
//! the bookmarks are joined into one alternation with a named group per
//! bookmark and searched once. The regex engine's leftmost-first semantics give
//! the tie-break for free:
//!
//! 1. the match with the smallest start offset wins;
//! 2. among matches starting at the same offset, the bookmark listed first wins.
//!
//! ```rust
//! use quickjump_core::{Bookmark, BookmarkCategory, CompositeMatcher};
//! use std::sync::Arc;
//!
//! let bookmarks = vec![
//!     Arc::new(Bookmark::substring(BookmarkCategory::QuickJump, "cat")),
//!     Arc::new(Bookmark::substring(BookmarkCategory::QuickJump, "catalog")),
//! ];
//! let matcher = CompositeMatcher::new(bookmarks)?;
//! let found = matcher.find("the catalog store").expect("match");
//! assert_eq!(found.text, "cat");
//! assert_eq!(found.start, 4);
//! # Ok::<(), quickjump_core::Error>(())
//! ```

use crate::utils::byte_to_char_offset;
use crate::{Bookmark, Error, PatternMatchKind, Result, RuleId};
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Prefix of the per-bookmark capture group names in a composite regex.
pub(crate) const GROUP_PREFIX: &str = "__qj_";

/// Number of composite matchers kept before the cache starts over.
const MAX_CACHED_MATCHERS: usize = 128;

/// Standalone regex source for a bookmark.
///
/// `EXACT` patterns are anchored to the whole text; a single trailing newline
/// is tolerated because host paragraphs commonly end with one.
pub fn pattern_source(bookmark: &Bookmark) -> String {
    match bookmark.pattern_match {
        PatternMatchKind::Exact => format!(r"\A{}\n?\z", regex::escape(&bookmark.pattern)),
        PatternMatchKind::Substring => regex::escape(&bookmark.pattern),
        PatternMatchKind::Regex => bookmark.pattern.clone(),
    }
}

/// Compile a single bookmark's pattern.
pub fn compile_bookmark(bookmark: &Bookmark) -> Result<Regex> {
    let source = pattern_source(bookmark);
    Regex::new(&source).map_err(|e| Error::pattern_compile(&bookmark.pattern, &e))
}

/// Alternation branch for `bookmark` with its match captured in `group`.
///
/// For `EXACT` the anchors and the optional trailing newline stay outside the
/// group so the reported span covers the pattern text only.
fn branch_source(bookmark: &Bookmark, group: &str) -> String {
    match bookmark.pattern_match {
        PatternMatchKind::Exact => format!(
            r"(?:\A(?P<{group}>{})\n?\z)",
            regex::escape(&bookmark.pattern)
        ),
        PatternMatchKind::Substring => {
            format!("(?P<{group}>{})", regex::escape(&bookmark.pattern))
        },
        PatternMatchKind::Regex => format!("(?P<{group}>{})", bookmark.pattern),
    }
}

/// A bookmark match inside one paragraph.
///
/// `start` and `end` are character offsets into the paragraph text, the unit
/// host cursors move by. `byte_range` indexes the same span in the `&str`.
#[derive(Debug, Clone)]
pub struct BookmarkMatch {
    /// The bookmark that matched.
    pub bookmark: Arc<Bookmark>,
    /// Matched text.
    pub text: String,
    /// Start offset in characters.
    pub start: usize,
    /// End offset (exclusive) in characters.
    pub end: usize,
    /// Matched span in bytes.
    pub byte_range: Range<usize>,
}

impl BookmarkMatch {
    /// Length of the match in characters.
    pub const fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Many bookmarks compiled into one searchable alternation.
#[derive(Debug, Clone)]
pub struct CompositeMatcher {
    bookmarks: Vec<Arc<Bookmark>>,
    /// `None` when there are no bookmarks.
    regex: Option<Regex>,
    /// Capture group index of each bookmark's branch.
    slots: Vec<usize>,
}

impl CompositeMatcher {
    /// Compile `bookmarks`, in priority order, into a composite matcher.
    ///
    /// Every `REGEX` bookmark is compiled on its own first, so a malformed
    /// pattern is reported against its own text and cannot unbalance the
    /// alternation.
    pub fn new(bookmarks: Vec<Arc<Bookmark>>) -> Result<Self> {
        if bookmarks.is_empty() {
            return Ok(Self {
                bookmarks,
                regex: None,
                slots: Vec::new(),
            });
        }

        for bookmark in &bookmarks {
            if bookmark.pattern_match == PatternMatchKind::Regex {
                compile_bookmark(bookmark)?;
            }
        }

        let source = bookmarks
            .iter()
            .enumerate()
            .map(|(i, bookmark)| branch_source(bookmark, &format!("{GROUP_PREFIX}{i}")))
            .collect::<Vec<_>>()
            .join("|");
        debug!(branches = bookmarks.len(), "compiling composite pattern");
        let regex = Regex::new(&source).map_err(|e| Error::pattern_compile(&source, &e))?;

        let slots = (0..bookmarks.len())
            .map(|i| {
                let name = format!("{GROUP_PREFIX}{i}");
                regex
                    .capture_names()
                    .position(|n| n == Some(name.as_str()))
                    .ok_or_else(|| Error::PatternCompile {
                        pattern: source.clone(),
                        message: format!("missing capture group {name}"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bookmarks,
            regex: Some(regex),
            slots,
        })
    }

    /// Bookmarks in priority order.
    pub fn bookmarks(&self) -> &[Arc<Bookmark>] {
        &self.bookmarks
    }

    /// Whether the matcher has no bookmarks and can never match.
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Find the winning bookmark in `text` with a single search pass.
    pub fn find(&self, text: &str) -> Option<BookmarkMatch> {
        let regex = self.regex.as_ref()?;
        let caps = regex.captures(text)?;
        let (index, m) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(i, &slot)| caps.get(slot).map(|m| (i, m)))?;

        Some(BookmarkMatch {
            bookmark: Arc::clone(&self.bookmarks[index]),
            text: m.as_str().to_string(),
            start: byte_to_char_offset(text, m.start()),
            end: byte_to_char_offset(text, m.end()),
            byte_range: m.range(),
        })
    }
}

/// Cache of composite matchers keyed by the identity of the bookmark list.
///
/// Bookmarks are immutable, so a list of the same bookmark handles always
/// compiles to the same matcher. Cached matchers hold their bookmarks, which
/// keeps the identities in the key valid for the lifetime of the entry.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: HashMap<Vec<RuleId>, Arc<CompositeMatcher>>,
    hits: u64,
    misses: u64,
}

impl PatternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or compile the composite matcher for `bookmarks`.
    pub fn composite(&mut self, bookmarks: &[Arc<Bookmark>]) -> Result<Arc<CompositeMatcher>> {
        let key: Vec<RuleId> = bookmarks.iter().map(RuleId::of).collect();
        if let Some(matcher) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(matcher));
        }

        self.misses += 1;
        let matcher = Arc::new(CompositeMatcher::new(bookmarks.to_vec())?);
        if self.entries.len() >= MAX_CACHED_MATCHERS {
            debug!(entries = self.entries.len(), "pattern cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key, Arc::clone(&matcher));
        Ok(matcher)
    }

    /// Drop every cached matcher.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached matchers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub const fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// First bookmark in `bookmarks` matching `text`, by leftmost start then list order.
pub fn find_first(
    cache: &mut PatternCache,
    bookmarks: &[Arc<Bookmark>],
    text: &str,
) -> Result<Option<BookmarkMatch>> {
    Ok(cache.composite(bookmarks)?.find(text))
}

/// At most one match per bookmark in `text`.
///
/// Repeats the composite search, removing each winner from the candidates,
/// until no candidates remain or nothing else matches. Results are in the
/// order they were found.
pub fn find_all(
    cache: &mut PatternCache,
    bookmarks: &[Arc<Bookmark>],
    text: &str,
) -> Result<Vec<BookmarkMatch>> {
    let mut candidates = bookmarks.to_vec();
    let mut found = Vec::new();
    while !candidates.is_empty() {
        let Some(m) = find_first(cache, &candidates, text)? else {
            break;
        };
        candidates.retain(|b| !Arc::ptr_eq(b, &m.bookmark));
        found.push(m);
    }
    Ok(found)
}
