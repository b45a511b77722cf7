//! Heuristic isolation of a JSON payload inside a model answer.
//!
//! Language models rarely honor "JSON only" instructions exactly. The answer
//! may be fenced in markdown, wrapped in prose, or clean. This module narrows
//! the text down to the most likely JSON region without parsing it. The same
//! function runs on both sides of the Store boundary.

use std::sync::LazyLock;

use regex::Regex;

/// Fenced code block, optionally tagged `json` in any letter case.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("fenced block pattern is valid")
});

/// Which rule produced the extracted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Inner content of a fenced code block.
    Fenced,
    /// Span from the first `{` to the last `}`.
    Object,
    /// Span from the first `[` to the last `]`.
    Array,
    /// Nothing matched; the whole text, trimmed.
    Fallback,
}

/// Extract the JSON-looking part of `raw`.
///
/// Rules are tried in order and the first match wins: fenced block, object
/// brackets, array brackets, then the trimmed text itself. Only the
/// outermost first-to-last span is captured, so several independent
/// documents in one answer come back as a single (probably invalid) span.
#[must_use]
pub fn extract_json_payload(raw: &str) -> &str {
    extract_with_rule(raw).0
}

/// Same as [`extract_json_payload`], also reporting which rule matched.
#[must_use]
pub fn extract_with_rule(raw: &str) -> (&str, Extraction) {
    if let Some(inner) = FENCED_BLOCK.captures(raw).and_then(|c| c.get(1)) {
        return (inner.as_str().trim(), Extraction::Fenced);
    }
    if let Some(span) = bracket_span(raw, '{', '}') {
        return (span, Extraction::Object);
    }
    if let Some(span) = bracket_span(raw, '[', ']') {
        return (span, Extraction::Array);
    }
    (raw.trim(), Extraction::Fallback)
}

/// Inclusive span between the first `open` and the last `close`, if ordered.
fn bracket_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim())
}
