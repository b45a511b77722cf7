//! Grounded prompt composition.

/// Role and capability preamble placed at the top of every prompt.
pub const PREAMBLE: &str = "You are an assistant that answers user questions using the provided context and reference material.
You are an expert in JSON structure and can modify JSON according to a description.
The context contains a JSON document describing a metadata object of a business automation web application.
The application has a designer that describes metadata object structure with JSON and changes objects by importing JSON that describes the new structure.
Change the JSON the way the user asks, using the context and the reference material.
When the user asks to do something with metadata objects, they mean creating or editing the JSON describing that object.";

/// Policy annotations appended to the types reference.
pub const TYPES_POLICY: &str = "New fields have an empty identifier (\"uid\": \"\").";

/// Closing instruction. Always the last line of the prompt.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Answer with JSON only: no text before or after it, no extra characters.";

/// Render the prompt for one question.
///
/// `_object_uid_text` is accepted so callers can pass all three resources,
/// but it is not rendered.
#[must_use]
pub fn compose_prompt(
    question: &str,
    input_text: &str,
    types_text: &str,
    _object_uid_text: &str,
) -> String {
    format!(
        "{PREAMBLE}

Context (metadata object JSON):
{input_text}

Reference (data types):
{types_text}
{TYPES_POLICY}

Question: {question}

{JSON_ONLY_INSTRUCTION}"
    )
}
