//! # quickjump-core
//!
//! Rule engine for site-scoped paragraph navigation in screen readers.
//!
//! Users configure *sites* (URL matching rules) that own *bookmarks* (text
//! patterns). A QuickJump command walks the document paragraph by paragraph
//! and stops on the first paragraph matching one of the bookmarks that apply
//! to the current URL.
//!
//! ## Architecture
//!
//! - **Types**: immutable sites, bookmarks and attribute matchers
//! - **Patterns**: per-bookmark regexes combined into one composite matcher
//! - **Resolver**: URL to sites, focus mode and applicable bookmarks
//! - **Configuration**: JSON persistence and copy-on-edit updates, held by a
//!   [`ConfigStore`] that swaps whole trees
//! - **Search**: paragraph traversal over a host [`TextCursor`]
//!
//! ## Quick Start
//!
//! ```rust
//! use quickjump_core::cursor::{Direction, ParagraphBuffer};
//! use quickjump_core::search::{quick_jump, JumpOutcome};
//! use quickjump_core::{BookmarkCategory, Configuration, PatternCache};
//!
//! let config = Configuration::bundled()?;
//! let mut doc = ParagraphBuffer::new("Pull request\nalice commented yesterday\nLooks good\n");
//! let mut cache = PatternCache::new();
//!
//! let outcome = quick_jump(
//!     &mut doc,
//!     &config,
//!     "https://github.com/org/repo/pull/1",
//!     BookmarkCategory::QuickJump,
//!     Direction::Forward,
//!     &mut (),
//!     &mut cache,
//! )?;
//! assert!(matches!(outcome, JumpOutcome::Found(ref hit) if hit.distance == 1));
//! assert_eq!(doc.selected_text().as_deref(), Some(" commented "));
//! # Ok::<(), quickjump_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! "No match" is never an error. Failures are malformed input, such as a
//! stored regex that does not compile, or an unreadable rules file:
//!
//! ```rust
//! use quickjump_core::{Error, Configuration};
//!
//! match Configuration::from_json("{\"sites\": 3}") {
//!     Ok(_) => unreachable!(),
//!     Err(e) if e.is_validation() => eprintln!("Rejected edit: {e}"),
//!     Err(e) => eprintln!("{}: {e}", e.category()),
//! }
//! ```

/// Paragraph attribute extraction from host text fields
pub mod attributes;
/// Rule file persistence and copy-on-edit updates
pub mod config;
/// Text cursor trait and in-memory paragraph buffer
pub mod cursor;
/// Error types and result aliases
pub mod error;
/// Bookmark pattern compilation and composite matching
pub mod pattern;
/// URL to site resolution
pub mod resolver;
/// QuickJump paragraph search
pub mod search;
/// Process-wide configuration handle
pub mod store;
/// Core data types and structures
pub mod types;
/// String offset helpers
pub mod utils;
/// Edit-time validation of sites and bookmarks
pub mod validate;

// Re-export commonly used types
pub use attributes::{TextField, extract_attributes};
pub use config::Configuration;
pub use cursor::{Direction, ParagraphBuffer, TextCursor};
pub use error::{Error, Result};
pub use pattern::{BookmarkMatch, CompositeMatcher, PatternCache};
pub use resolver::SiteResolver;
pub use search::{JumpOutcome, SearchHit, SearchListener, SearchOutcome};
pub use store::ConfigStore;
pub use types::*;
