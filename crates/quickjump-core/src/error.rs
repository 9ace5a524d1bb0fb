//! Error types and handling for quickjump-core operations.
//!
//! This module provides a single error type covering every failure in the rule
//! engine. Errors fall into two groups:
//!
//! - **Validation errors**: raised while a user edits a site or bookmark. These
//!   are meant to be shown to the user and the edit rejected.
//! - **Runtime errors**: configuration files that cannot be read or parsed, and
//!   malformed patterns that slipped past validation and were hit while matching.
//!
//! "No match" is never an error. Matching and resolution functions return
//! `Option`/empty collections for that case.
//!
//! ```rust
//! use quickjump_core::Error;
//!
//! let err = Error::EmptyPattern;
//! assert!(err.is_validation());
//! assert_eq!(err.category(), "empty_pattern");
//! ```

use thiserror::Error;

/// The main error type for quickjump-core operations.
///
/// All fallible public functions return `Result<T, Error>`.
#[derive(Error, Debug)]
pub enum Error {
    /// No domain-shaped substring could be found in a URL.
    ///
    /// Site matching recovers from this locally by treating the site as not
    /// matching; callers only see it from [`crate::resolver::domain_of`].
    #[error("Domain not found in URL {0}")]
    DomainExtraction(String),

    /// A regular expression in a bookmark pattern or site domain failed to compile.
    ///
    /// `message` carries the regex compiler's own description so it can be
    /// shown verbatim.
    #[error("Failed to compile regular expression '{pattern}': {message}")]
    PatternCompile {
        /// The offending pattern text.
        pattern: String,
        /// Compiler error text.
        message: String,
    },

    /// A site with the same domain and URL match kind already exists.
    ///
    /// Carries the display name of the existing site.
    #[error("This site is a duplicate of another existing site {0}")]
    DuplicateSite(String),

    /// A bookmark was given an empty pattern.
    #[error("Pattern cannot be empty")]
    EmptyPattern,

    /// A site domain does not fit its URL match kind.
    #[error("Invalid domain format: {0}")]
    InvalidDomainFormat(String),

    /// An attribute matcher string could not be parsed.
    #[error("Cannot parse attribute: {0}")]
    InvalidAttribute(String),

    /// An integer-coded enumeration carried a value outside its range.
    #[error("Invalid {kind} value: {value}")]
    InvalidEnumValue {
        /// Name of the enumeration.
        kind: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// The rules file could not be read, parsed or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An edit referred to a site or bookmark that is not in the configuration.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Build a [`Error::PatternCompile`] from a regex compiler error.
    pub(crate) fn pattern_compile(pattern: &str, err: &regex::Error) -> Self {
        Self::PatternCompile {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error is produced by edit-time validation.
    ///
    /// Validation errors should be displayed to the user and the edit
    /// rejected. Everything else is an operational failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::PatternCompile { .. }
                | Self::DuplicateSite(_)
                | Self::EmptyPattern
                | Self::InvalidDomainFormat(_)
                | Self::InvalidAttribute(_)
        )
    }

    /// Get the error category as a stable string identifier.
    ///
    /// Useful as a structured logging field:
    ///
    /// ```rust
    /// use quickjump_core::Error;
    ///
    /// let err = Error::Config("bad json".into());
    /// tracing::warn!(category = err.category(), "{err}");
    /// ```
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::DomainExtraction(_) => "domain_extraction",
            Self::PatternCompile { .. } => "pattern_compile",
            Self::DuplicateSite(_) => "duplicate_site",
            Self::EmptyPattern => "empty_pattern",
            Self::InvalidDomainFormat(_) => "invalid_domain_format",
            Self::InvalidAttribute(_) => "invalid_attribute",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
