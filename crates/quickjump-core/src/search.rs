//! QuickJump document search.
//!
//! [`search`] walks a [`TextCursor`] paragraph by paragraph in one direction,
//! runs the composite matcher of the candidate bookmarks over each paragraph
//! and stops at the first match or at the document boundary. On a match the
//! cursor is narrowed to the matched characters and committed.
//!
//! [`quick_jump`] is the navigation command built on top of it: it resolves
//! the bookmarks that apply to the current URL and category first.
//!
//! ```rust
//! use quickjump_core::cursor::{Direction, ParagraphBuffer};
//! use quickjump_core::search::{search, SearchOutcome};
//! use quickjump_core::{Bookmark, BookmarkCategory, PatternCache};
//! use std::sync::Arc;
//!
//! let mut doc = ParagraphBuffer::new("intro\nnothing here\nalice commented 2 days ago\n");
//! let bookmarks = [Arc::new(Bookmark::substring(BookmarkCategory::QuickJump, "commented"))];
//! let mut cache = PatternCache::new();
//!
//! let outcome = search(&mut doc, &bookmarks, Direction::Forward, &mut (), &mut cache)?;
//! let SearchOutcome::Found(hit) = outcome else { panic!("expected a match") };
//! assert_eq!(hit.distance, 2);
//! assert_eq!(doc.selected_text().as_deref(), Some("commented"));
//! # Ok::<(), quickjump_core::Error>(())
//! ```

use crate::cursor::{Direction, TextCursor};
use crate::pattern::{find_all, BookmarkMatch, PatternCache};
use crate::resolver::{find_applicable_bookmarks, find_sites};
use crate::{Attribute, Bookmark, BookmarkCategory, Configuration, Error, Result, Site};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Observer of a running search.
///
/// Hosts use it for feedback: pumping their event loop between steps, a tone
/// proportional to the distance on a match, a "no more matches" message at
/// the boundary. All methods default to doing nothing; `()` is the silent
/// listener.
pub trait SearchListener {
    /// Called after each successful paragraph step, before matching.
    fn on_step(&mut self, _distance: usize) {}

    /// Called once the cursor has been narrowed to a match and committed.
    fn on_match(&mut self, _hit: &SearchHit) {}

    /// Called when the document boundary is reached without a match.
    fn on_boundary(&mut self) {}
}

impl SearchListener for () {}

/// A successful search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Paragraph steps taken; 1 is the adjacent paragraph.
    pub distance: usize,
    /// The match within the paragraph.
    pub found: BookmarkMatch,
}

impl SearchHit {
    /// The bookmark that matched.
    pub const fn bookmark(&self) -> &Arc<Bookmark> {
        &self.found.bookmark
    }
}

/// Result of [`search`].
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// A paragraph matched.
    Found(SearchHit),
    /// The document boundary was reached.
    Boundary,
}

/// Result of [`quick_jump`].
#[derive(Debug, Clone)]
pub enum JumpOutcome {
    /// No enabled bookmark of the category applies to the URL; the cursor was
    /// not touched.
    NoBookmarks,
    /// A paragraph matched.
    Found(SearchHit),
    /// The document boundary was reached.
    Boundary,
}

impl From<SearchOutcome> for JumpOutcome {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Found(hit) => Self::Found(hit),
            SearchOutcome::Boundary => Self::Boundary,
        }
    }
}

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

/// Find the next paragraph in `direction` matching any of `bookmarks`.
///
/// The paragraph under the cursor is skipped. Bookmarks compete as in
/// [`CompositeMatcher::find`](crate::CompositeMatcher::find). A bookmark
/// pattern that does not compile fails the whole call before the cursor moves.
pub fn search<C, L>(
    cursor: &mut C,
    bookmarks: &[Arc<Bookmark>],
    direction: Direction,
    listener: &mut L,
    cache: &mut PatternCache,
) -> Result<SearchOutcome>
where
    C: TextCursor + ?Sized,
    L: SearchListener + ?Sized,
{
    let matcher = cache.composite(bookmarks)?;

    cursor.collapse();
    cursor.expand_to_paragraph();
    let mut distance = 0;
    loop {
        distance += 1;
        cursor.collapse();
        if cursor.move_by_paragraph(direction) == 0 {
            debug!(%direction, steps = distance - 1, "reached document boundary");
            listener.on_boundary();
            return Ok(SearchOutcome::Boundary);
        }
        listener.on_step(distance);

        cursor.expand_to_paragraph();
        let Some(found) = matcher.find(&cursor.text()) else {
            continue;
        };

        cursor.collapse();
        cursor.move_by_characters(to_isize(found.start));
        cursor.move_end_by_characters(to_isize(found.char_len()));
        cursor.commit();

        let hit = SearchHit { distance, found };
        debug!(
            %direction,
            distance,
            bookmark = hit.bookmark().display_name(),
            "quick jump match"
        );
        listener.on_match(&hit);
        return Ok(SearchOutcome::Found(hit));
    }
}

/// The QuickJump command: jump to the next paragraph matching a bookmark of
/// `category` configured for `url`.
pub fn quick_jump<C, L>(
    cursor: &mut C,
    config: &Configuration,
    url: &str,
    category: BookmarkCategory,
    direction: Direction,
    listener: &mut L,
    cache: &mut PatternCache,
) -> Result<JumpOutcome>
where
    C: TextCursor + ?Sized,
    L: SearchListener + ?Sized,
{
    let bookmarks = find_applicable_bookmarks(config, url, Some(category))?;
    if bookmarks.is_empty() {
        debug!(%url, ?category, "no bookmarks configured");
        return Ok(JumpOutcome::NoBookmarks);
    }
    Ok(search(cursor, &bookmarks, direction, listener, cache)?.into())
}

/// One bookmark matching an inspected paragraph.
#[derive(Debug, Clone)]
pub struct ParagraphMatch {
    /// Site owning the bookmark.
    pub site: Arc<Site>,
    /// The match.
    pub found: BookmarkMatch,
    /// Whether the bookmark's attribute matchers accept the paragraph.
    pub attributes_match: bool,
}

/// Every bookmark configured for `url`, of any category, matching `text`.
///
/// Each bookmark appears at most once. Used to show which rules fire on the
/// paragraph under the caret.
pub fn inspect_paragraph(
    config: &Configuration,
    url: &str,
    text: &str,
    attributes: &HashSet<Attribute>,
    cache: &mut PatternCache,
) -> Result<Vec<ParagraphMatch>> {
    let sites = find_sites(url, config)?;
    let bookmarks = find_applicable_bookmarks(config, url, None)?;

    find_all(cache, &bookmarks, text)?
        .into_iter()
        .map(|found| {
            let site = sites
                .iter()
                .find(|site| site.contains_bookmark(&found.bookmark))
                .cloned()
                .ok_or_else(|| {
                    Error::NotFound(format!("site of bookmark '{}'", found.bookmark.display_name()))
                })?;
            let attributes_match = found.bookmark.attributes_match(attributes);
            Ok(ParagraphMatch {
                site,
                found,
                attributes_match,
            })
        })
        .collect()
}
