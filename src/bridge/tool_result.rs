//! Tool results and their reduction to a success flag.

use serde::{Deserialize, Serialize};

/// Texts accepted as a successful tool outcome (after trim + lowercase).
pub const SUCCESS_TOKENS: [&str; 4] = ["true", "1", "ok", "yes"];

/// One content item of a tool result. Only `text` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Text payload, if the item carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Any other fields (type tags, annotations, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    /// Item carrying only a text payload.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Result of a remote tool call as it arrives on the wire.
///
/// The remote side may answer with a bare boolean or with a list of content
/// items. Anything else is kept as [`ToolResult::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    /// Native boolean.
    Boolean(bool),
    /// Ordered content items, each optionally carrying text.
    TextItems(Vec<ContentItem>),
    /// Shape not understood.
    Unrecognized(serde_json::Value),
}

impl ToolResult {
    /// Result made of a single text item.
    #[must_use]
    pub fn single_text(text: impl Into<String>) -> Self {
        Self::TextItems(vec![ContentItem::text(text)])
    }

    /// Classify an arbitrary JSON value.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Self::Unrecognized(value))
    }

    /// Reduce the result to a success flag.
    ///
    /// Booleans are returned as-is. For content items, the first non-empty
    /// text decides: it is trimmed, lowercased and checked against
    /// [`SUCCESS_TOKENS`]. No text, or an unrecognized shape, is a failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Boolean(value) => *value,
            Self::TextItems(items) => items
                .iter()
                .filter_map(|item| item.text.as_deref())
                .find(|text| !text.is_empty())
                .is_some_and(|text| {
                    let normalized = text.trim().to_lowercase();
                    SUCCESS_TOKENS.contains(&normalized.as_str())
                }),
            Self::Unrecognized(_) => false,
        }
    }
}

impl From<bool> for ToolResult {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
