//! Core data model: sites, bookmarks and paragraph attributes.
//!
//! Every type here is an immutable value. Edits produce new values (see the
//! `with_*` methods in [`crate::config`]), and shared children are held behind
//! `Arc` so an unchanged bookmark or site keeps its identity across edits.
//!
//! Structural equality (`PartialEq`) compares contents. Where identity matters,
//! such as "remove *this* bookmark from the candidate list", compare handles
//! with `Arc::ptr_eq` or key maps by [`RuleId`]. `Site` and `Bookmark`
//! deliberately do not implement `Hash`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Declares a fieldless enum persisted as its integer discriminant.
macro_rules! int_coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value as Self
            }
        }

        impl TryFrom<i64> for $name {
            type Error = Error;

            fn try_from(value: i64) -> Result<Self> {
                match value {
                    $( $value => Ok(Self::$variant), )+
                    _ => Err(Error::InvalidEnumValue {
                        kind: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

/// Identity of a shared rule object.
///
/// Two handles have the same `RuleId` exactly when they point at the same
/// allocation. The id is only meaningful while some handle keeps the
/// allocation alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    /// Identity of the value behind `handle`.
    pub fn of<T>(handle: &Arc<T>) -> Self {
        Self(Arc::as_ptr(handle).addr())
    }
}

/// Kind of structural or formatting property observed in a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Semantic role of a control boundary (tab, dialog, menu item, ...).
    #[serde(rename = "role")]
    Role,
    /// Font size from a formatting change.
    #[serde(rename = "font-size")]
    FontSize,
}

impl AttributeKind {
    /// Persisted and user-facing name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::FontSize => "font-size",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "role" => Ok(Self::Role),
            "font-size" => Ok(Self::FontSize),
            other => Err(Error::InvalidAttribute(format!(
                "unknown attribute '{other}'"
            ))),
        }
    }
}

/// Value of an [`Attribute`].
///
/// Host role identifiers are numeric; formatting values such as font sizes are
/// strings. Non-integer numbers are kept in their decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged, from = "RawAttributeValue")]
pub enum AttributeValue {
    /// Integer value, typically a host role id.
    Number(i64),
    /// Free-form text value.
    Text(String),
}

/// Any JSON scalar an attribute value may be stored as.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttributeValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<RawAttributeValue> for AttributeValue {
    fn from(raw: RawAttributeValue) -> Self {
        match raw {
            RawAttributeValue::Integer(n) => Self::Number(n),
            RawAttributeValue::Float(n) => Self::Text(n.to_string()),
            RawAttributeValue::Text(s) => Self::Text(s),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A structural or formatting property of a paragraph.
///
/// Values are normalized on construction and on load: a role given as
/// integer text becomes a number, and a font size is always text. Build
/// attributes through [`Attribute::new`] so equal properties compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawAttribute")]
pub struct Attribute {
    /// Which property this is.
    #[serde(rename = "attribute")]
    pub kind: AttributeKind,
    /// Observed value.
    pub value: AttributeValue,
}

#[derive(Deserialize)]
struct RawAttribute {
    attribute: AttributeKind,
    value: AttributeValue,
}

impl From<RawAttribute> for Attribute {
    fn from(raw: RawAttribute) -> Self {
        Self::new(raw.attribute, raw.value)
    }
}

impl Attribute {
    /// Attribute of `kind` with a normalized `value`.
    pub fn new(kind: AttributeKind, value: impl Into<AttributeValue>) -> Self {
        let value = match (kind, value.into()) {
            (AttributeKind::Role, AttributeValue::Text(s)) => s
                .parse::<i64>()
                .map_or(AttributeValue::Text(s), AttributeValue::Number),
            (AttributeKind::FontSize, AttributeValue::Number(n)) => AttributeValue::Text(n.to_string()),
            (_, value) => value,
        };
        Self { kind, value }
    }

    /// A `role` attribute.
    pub fn role(value: impl Into<AttributeValue>) -> Self {
        Self::new(AttributeKind::Role, value)
    }

    /// A `font-size` attribute.
    pub fn font_size(value: impl Into<AttributeValue>) -> Self {
        Self::new(AttributeKind::FontSize, value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

impl FromStr for Attribute {
    type Err = Error;

    /// Parses `kind:value`, e.g. `role:12` or `font-size:10pt`.
    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.trim().split(':').collect();
        let [kind, value] = tokens.as_slice() else {
            return Err(Error::InvalidAttribute(format!(
                "expected 'attribute:value' but found {} tokens in '{s}'",
                tokens.len()
            )));
        };
        let kind = kind.parse::<AttributeKind>()?;
        if value.is_empty() {
            return Err(Error::InvalidAttribute(format!("missing value in '{s}'")));
        }
        Ok(Self::new(kind, *value))
    }
}

/// Requires (or, when inverted, forbids) an attribute in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMatcher {
    /// Invert the test: match when the attribute is absent.
    pub invert: bool,
    /// Attribute to look for.
    pub attribute: Attribute,
}

impl AttributeMatcher {
    /// Whether the paragraph attribute set satisfies this matcher.
    pub fn matches(&self, attributes: &HashSet<Attribute>) -> bool {
        attributes.contains(&self.attribute) != self.invert
    }

    /// Parse a whitespace separated list such as `role:12 !font-size:8pt`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.split_whitespace().map(str::parse).collect()
    }
}

impl fmt::Display for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert {
            f.write_str("!")?;
        }
        write!(f, "{}", self.attribute)
    }
}

impl FromStr for AttributeMatcher {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAttribute("empty string".to_string()));
        }
        let (invert, rest) = s.strip_prefix('!').map_or((false, s), |rest| (true, rest));
        Ok(Self {
            invert,
            attribute: rest.parse()?,
        })
    }
}

int_coded_enum! {
    /// How a bookmark pattern is matched against paragraph text.
    pub enum PatternMatchKind {
        /// Whole paragraph equals the pattern.
        Exact = 1,
        /// Paragraph contains the pattern literally.
        Substring = 2,
        /// Pattern is a regular expression searched in the paragraph.
        Regex = 3,
    }
}

int_coded_enum! {
    /// Navigation command a bookmark belongs to.
    pub enum BookmarkCategory {
        /// Primary QuickJump command.
        QuickJump = 1,
        /// Second QuickJump command.
        QuickJump2 = 2,
        /// Third QuickJump command.
        QuickJump3 = 3,
        /// Paragraphs skipped automatically during line navigation.
        SkipClutter = 4,
        /// Paragraphs activated automatically.
        AutoPress = 5,
    }
}

int_coded_enum! {
    /// How a site's `domain` field is compared with a document URL.
    pub enum UrlMatchKind {
        /// Matches every URL; the domain must be empty.
        Ignore = 0,
        /// Extracted domain equals the site domain.
        Domain = 1,
        /// Extracted domain equals the site domain or ends with `.` + domain.
        Subdomain = 2,
        /// Case-insensitive substring of the URL.
        Substring = 3,
        /// Case-insensitive equality with the URL.
        Exact = 4,
        /// Regular expression searched in the URL.
        Regex = 5,
    }
}

int_coded_enum! {
    /// Focus handling directive for a site.
    ///
    /// Ordered by precedence; when several sites match, the maximum wins.
    pub enum FocusMode {
        /// Keep the host's default focus behavior.
        Unchanged = 0,
        /// React to focus events but never switch into form mode.
        DontEnterFormMode = 1,
        /// Ignore focus events entirely.
        DisableFocus = 2,
    }
}

impl Default for FocusMode {
    fn default() -> Self {
        Self::Unchanged
    }
}

/// A named text pattern used to find paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Disabled bookmarks are never applied.
    pub enabled: bool,
    /// Command this bookmark serves.
    pub category: BookmarkCategory,
    /// Optional display name.
    #[serde(default)]
    pub name: String,
    /// Pattern text; interpretation depends on `pattern_match`.
    pub pattern: String,
    /// How `pattern` is matched.
    #[serde(rename = "patternMatch")]
    pub pattern_match: PatternMatchKind,
    /// Attribute gates, all of which must hold.
    #[serde(rename = "attributes", default)]
    pub attribute_matchers: Vec<AttributeMatcher>,
}

impl Bookmark {
    /// Blank bookmark used as the starting point for a new entry.
    pub fn template() -> Self {
        Self {
            enabled: true,
            category: BookmarkCategory::QuickJump,
            name: String::new(),
            pattern: String::new(),
            pattern_match: PatternMatchKind::Substring,
            attribute_matchers: Vec::new(),
        }
    }

    /// Enabled substring bookmark in the given category.
    pub fn substring(category: BookmarkCategory, pattern: impl Into<String>) -> Self {
        Self {
            category,
            pattern: pattern.into(),
            ..Self::template()
        }
    }

    /// Name if set, otherwise the pattern.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.pattern
        } else {
            &self.name
        }
    }

    /// Whether every attribute matcher accepts `attributes`.
    pub fn attributes_match(&self, attributes: &HashSet<Attribute>) -> bool {
        self.attribute_matchers.iter().all(|m| m.matches(attributes))
    }
}

/// A URL-matching rule bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Domain, URL or regex depending on `url_match`.
    pub domain: String,
    /// How `domain` is compared with URLs.
    #[serde(rename = "urlMatch")]
    pub url_match: UrlMatchKind,
    /// Optional display name.
    #[serde(default)]
    pub name: String,
    /// Focus handling on matching documents.
    #[serde(rename = "focusMode", default)]
    pub focus_mode: FocusMode,
    /// Bookmarks in priority order.
    #[serde(default)]
    pub bookmarks: Vec<Arc<Bookmark>>,
}

impl Site {
    /// New site matching `domain` and its subdomains.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            url_match: UrlMatchKind::Subdomain,
            name: String::new(),
            focus_mode: FocusMode::Unchanged,
            bookmarks: Vec::new(),
        }
    }

    /// New site matching exactly `url`.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url_match: UrlMatchKind::Exact,
            ..Self::for_domain(url)
        }
    }

    /// Name if set, otherwise the domain.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.domain
        } else {
            &self.name
        }
    }

    /// Whether `bookmark` (by identity) belongs to this site.
    pub fn contains_bookmark(&self, bookmark: &Arc<Bookmark>) -> bool {
        self.bookmarks.iter().any(|b| Arc::ptr_eq(b, bookmark))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_matcher() {
        // Given: An inverted matcher on role:tab
        let matcher = AttributeMatcher {
            invert: true,
            attribute: Attribute::role("tab"),
        };

        // Then: Presence fails, absence passes
        let with_tab: HashSet<_> = [Attribute::role("tab")].into_iter().collect();
        let with_dialog: HashSet<_> = [Attribute::role("dialog")].into_iter().collect();
        assert!(!matcher.matches(&with_tab));
        assert!(matcher.matches(&with_dialog));
    }

    #[test]
    fn test_matcher_text_form() {
        let matcher: AttributeMatcher = "!role:12".parse().unwrap();
        assert!(matcher.invert);
        assert_eq!(matcher.attribute, Attribute::role(12));
        assert_eq!(matcher.to_string(), "!role:12");

        let matcher: AttributeMatcher = " font-size:10pt ".parse().unwrap();
        assert!(!matcher.invert);
        assert_eq!(matcher.attribute, Attribute::font_size("10pt"));
        assert_eq!(matcher.to_string(), "font-size:10pt");
    }

    #[test]
    fn test_values_are_normalized_per_kind() {
        // Font sizes stay text even when they look like integers
        let matcher: AttributeMatcher = "font-size:12".parse().unwrap();
        assert_eq!(matcher.attribute.value, AttributeValue::Text("12".into()));
        assert_eq!(Attribute::font_size(12), Attribute::font_size("12"));

        // Roles given as integer text are numbers
        assert_eq!(Attribute::role("12").value, AttributeValue::Number(12));
        assert_eq!(Attribute::role("tab").value, AttributeValue::Text("tab".into()));
    }

    #[test]
    fn test_stored_values_normalize_on_load() {
        let fractional: Attribute =
            serde_json::from_str(r#"{"attribute": "font-size", "value": 10.5}"#).unwrap();
        assert_eq!(fractional, Attribute::font_size("10.5"));

        let integer: Attribute =
            serde_json::from_str(r#"{"attribute": "font-size", "value": 12}"#).unwrap();
        assert_eq!(integer, Attribute::font_size("12"));

        let role: Attribute = serde_json::from_str(r#"{"attribute": "role", "value": "7"}"#).unwrap();
        assert_eq!(role, Attribute::role(7));
        assert_eq!(serde_json::to_value(&role).unwrap()["value"], 7);
    }

    #[test]
    fn test_matcher_text_form_errors() {
        for bad in ["", "   ", "role", "role:1:2", "color:red", "role:"] {
            let result = bad.parse::<AttributeMatcher>();
            assert!(
                matches!(result, Err(Error::InvalidAttribute(_))),
                "expected failure for {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_list() {
        let list = AttributeMatcher::parse_list("role:3  !font-size:8pt").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[1].invert);
        assert!(AttributeMatcher::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_int_coded_enums() {
        assert_eq!(i64::from(UrlMatchKind::Regex), 5);
        assert_eq!(UrlMatchKind::try_from(2).unwrap(), UrlMatchKind::Subdomain);
        assert_eq!(BookmarkCategory::try_from(4).unwrap(), BookmarkCategory::SkipClutter);
        assert!(matches!(
            PatternMatchKind::try_from(0),
            Err(Error::InvalidEnumValue {
                kind: "PatternMatchKind",
                value: 0
            })
        ));
        assert_eq!(serde_json::to_string(&FocusMode::DisableFocus).unwrap(), "2");
        assert_eq!(UrlMatchKind::ALL.len(), 6);
    }

    #[test]
    fn test_focus_mode_precedence_order() {
        assert!(FocusMode::DisableFocus > FocusMode::DontEnterFormMode);
        assert!(FocusMode::DontEnterFormMode > FocusMode::Unchanged);
    }

    #[test]
    fn test_display_names_fall_back() {
        let mut site = Site::for_domain("example.com");
        assert_eq!(site.display_name(), "example.com");
        site.name = "Example".to_string();
        assert_eq!(site.display_name(), "Example");

        let bookmark = Bookmark::substring(BookmarkCategory::QuickJump, "Reply");
        assert_eq!(bookmark.display_name(), "Reply");
    }

    #[test]
    fn test_site_templates() {
        let site = Site::for_url("https://example.com/inbox");
        assert_eq!(site.url_match, UrlMatchKind::Exact);
        assert_eq!(site.focus_mode, FocusMode::Unchanged);
        assert!(site.bookmarks.is_empty());
        assert_eq!(Site::for_domain("a.b").url_match, UrlMatchKind::Subdomain);
    }

    #[test]
    fn test_rule_id_is_identity() {
        let a = Arc::new(Bookmark::substring(BookmarkCategory::QuickJump, "x"));
        let b = Arc::new(Bookmark::substring(BookmarkCategory::QuickJump, "x"));
        assert_eq!(a, b);
        assert_ne!(RuleId::of(&a), RuleId::of(&b));
        assert_eq!(RuleId::of(&a), RuleId::of(&Arc::clone(&a)));
    }

    #[test]
    fn test_bookmark_json_shape() {
        let bookmark = Bookmark {
            attribute_matchers: vec!["!role:4".parse().unwrap()],
            ..Bookmark::substring(BookmarkCategory::QuickJump2, "Next")
        };
        let value = serde_json::to_value(&bookmark).unwrap();
        assert_eq!(value["category"], 2);
        assert_eq!(value["patternMatch"], 2);
        assert_eq!(value["attributes"][0]["invert"], true);
        assert_eq!(value["attributes"][0]["attribute"]["attribute"], "role");
        assert_eq!(value["attributes"][0]["attribute"]["value"], 4);
    }
}
