//! Resource fetching.

use crate::store::{ResourceStore, ResourceUri, StoreError};

/// Fetch the full text of a resource.
///
/// Fragments without text (absent or empty) are skipped; the rest are
/// joined with `\n` in source order. A resource with no text yields an
/// empty string.
///
/// # Errors
///
/// Store errors are returned unchanged.
pub async fn fetch_resource_text(
    store: &dyn ResourceStore,
    uri: ResourceUri,
) -> Result<String, StoreError> {
    let contents = store.read_resource(uri).await?;
    let text = contents
        .iter()
        .filter_map(|content| content.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    tracing::debug!(
        uri = %uri,
        fragments = contents.len(),
        bytes = text.len(),
        "Fetched resource"
    );
    Ok(text)
}
