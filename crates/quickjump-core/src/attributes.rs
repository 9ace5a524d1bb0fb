//! Paragraph attribute extraction.
//!
//! Hosts describe a paragraph as a stream of [`TextField`]s: literal text runs
//! interleaved with control boundaries and formatting changes. The extractor
//! collects the distinct [`Attribute`]s found anywhere in the stream, which
//! bookmark attribute matchers are then tested against.

use crate::{Attribute, AttributeKind, AttributeValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Field key carrying the role of a control.
pub const ROLE_KEY: &str = "role";

/// Field key carrying the font size of a formatting change.
pub const FONT_SIZE_KEY: &str = "font-size";

/// One item of a paragraph's structured text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum TextField {
    /// Literal text.
    Text {
        /// The text run.
        text: String,
    },
    /// Start of a control; properties usually include `role`.
    ControlStart {
        /// Control properties.
        #[serde(default)]
        field: Map<String, Value>,
    },
    /// End of the innermost control.
    ControlEnd,
    /// Formatting change; properties may include `font-size`.
    FormatChange {
        /// Formatting properties.
        #[serde(default)]
        field: Map<String, Value>,
    },
}

impl TextField {
    /// A literal text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// A control start carrying only a role.
    pub fn control_start(role: impl Into<Value>) -> Self {
        let mut field = Map::new();
        field.insert(ROLE_KEY.to_string(), role.into());
        Self::ControlStart { field }
    }

    /// A formatting change carrying only a font size.
    pub fn font_size(size: impl Into<Value>) -> Self {
        let mut field = Map::new();
        field.insert(FONT_SIZE_KEY.to_string(), size.into());
        Self::FormatChange { field }
    }
}

/// Convert a host property value into an attribute value.
///
/// Numbers and strings are accepted; a number that is not an integer keeps
/// its decimal text. Anything else (objects, arrays, null) is skipped.
fn attribute_value(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| AttributeValue::Text(n.to_string()), AttributeValue::Number),
        ),
        Value::String(s) => Some(AttributeValue::Text(s.clone())),
        _ => None,
    }
}

fn lookup(field: &Map<String, Value>, key: &str, kind: AttributeKind) -> Option<Attribute> {
    let value = attribute_value(field.get(key)?)?;
    Some(Attribute::new(kind, value))
}

/// Collect the set of attributes present in a paragraph.
///
/// One `role` attribute per distinct role seen at a control start, one
/// `font-size` attribute per distinct size seen at a formatting change.
/// Missing or malformed properties are ignored.
pub fn extract_attributes<'a, I>(fields: I) -> HashSet<Attribute>
where
    I: IntoIterator<Item = &'a TextField>,
{
    fields
        .into_iter()
        .filter_map(|item| match item {
            TextField::ControlStart { field } => lookup(field, ROLE_KEY, AttributeKind::Role),
            TextField::FormatChange { field } => {
                lookup(field, FONT_SIZE_KEY, AttributeKind::FontSize)
            },
            TextField::Text { .. } | TextField::ControlEnd => None,
        })
        .collect()
}

/// Concatenated literal text of a paragraph.
pub fn plain_text<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a TextField>,
{
    fields
        .into_iter()
        .filter_map(|item| match item {
            TextField::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
