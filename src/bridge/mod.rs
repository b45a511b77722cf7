//! Answer normalization and tool bridge.
//!
//! Turns a user question into a persisted JSON document:
//!
//! ```text
//! fetch x3 -> compose -> (model) -> extract -> persist -> saved?
//! ```
//!
//! # Example
//!
//! ```
//! use metadata_agent::bridge::extract_json_payload;
//!
//! let raw = "Here it is:\n```json\n{\"fields\": []}\n```";
//! assert_eq!(extract_json_payload(raw), "{\"fields\": []}");
//! ```

mod extract;
mod fetch;
mod invoker;
mod pipeline;
mod prompt;
mod tool_result;

pub use extract::{extract_json_payload, extract_with_rule, Extraction};
pub use fetch::fetch_resource_text;
pub use invoker::persist_payload;
pub use pipeline::{Answer, Assistant, GroundingContext, PipelineError};
pub use prompt::{compose_prompt, JSON_ONLY_INSTRUCTION, PREAMBLE, TYPES_POLICY};
pub use tool_result::{ContentItem, ToolResult, SUCCESS_TOKENS};
