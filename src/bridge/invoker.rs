//! Persistence through the Store's write tool.

use serde_json::json;

use crate::store::{ResourceStore, StoreError, WRITE_JSON_OUTPUT};

/// Send `candidate` to the Store's `write_json_output` tool.
///
/// Returns whether the Store reports success. A result that cannot be
/// interpreted counts as failure.
///
/// # Errors
///
/// Transport and protocol errors from the Store are returned unchanged.
pub async fn persist_payload(
    store: &dyn ResourceStore,
    candidate: &str,
) -> Result<bool, StoreError> {
    let result = store
        .call_tool(WRITE_JSON_OUTPUT, json!({ "json_output": candidate }))
        .await?;
    let saved = result.is_success();
    tracing::debug!(?result, saved, "Persistence tool answered");
    Ok(saved)
}
