//! File-backed Store.
//!
//! Each resource is one JSON file inside the data directory. The
//! `write_json_output` tool validates the incoming text and replaces the
//! output file wholesale.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::bridge::{extract_json_payload, ToolResult};
use crate::config::StoreConfig;

use super::{
    Catalog, ResourceContent, ResourceDescriptor, ResourceStore, ResourceUri, StoreError,
    ToolDescriptor, ECHO, WRITE_JSON_OUTPUT,
};

/// Indentation of the persisted document.
const OUTPUT_INDENT: &[u8] = b"    ";

/// Writer locks keyed by canonical destination path, shared by every store
/// in the process.
static WRITE_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(Default::default);

/// Store serving resources from, and writing output to, a data directory.
#[derive(Debug)]
pub struct LocalStore {
    data_dir: PathBuf,
    input_file: String,
    types_file: String,
    object_uid_file: String,
    output_file: String,
}

impl LocalStore {
    /// Create a store over `data_dir` with the default file names.
    #[must_use]
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::from_config(&StoreConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..StoreConfig::default()
        })
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            input_file: config.input_file.clone(),
            types_file: config.types_file.clone(),
            object_uid_file: config.object_uid_file.clone(),
            output_file: config.output_file.clone(),
        }
    }

    /// Data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File backing a resource.
    #[must_use]
    pub fn resource_path(&self, uri: ResourceUri) -> PathBuf {
        let file = match uri {
            ResourceUri::Input => &self.input_file,
            ResourceUri::Types => &self.types_file,
            ResourceUri::ObjectUid => &self.object_uid_file,
        };
        self.data_dir.join(file)
    }

    /// Destination of `write_json_output`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }

    /// Validate `text` as JSON and persist it.
    ///
    /// The text is normalized with the same extraction heuristic the client
    /// uses. Returns `Ok(false)` without touching the output file if it does
    /// not parse. On success the document is written to a fresh temporary
    /// file in the destination directory and renamed over the destination.
    /// Writers to the same destination are serialized within the process;
    /// across processes the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory or file cannot be written.
    pub async fn write_json_output(&self, text: &str) -> Result<bool, StoreError> {
        let candidate = extract_json_payload(text);
        let value: serde_json::Value = match serde_json::from_str(candidate) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected output that is not valid JSON");
                return Ok(false);
            }
        };
        let rendered = render_document(&value)?;

        let path = resolve_destination(&self.output_path()).await?;
        let lock = writer_lock(&path);
        let _guard = lock.lock().await;

        let bytes = rendered.len();
        replace_file(path.clone(), rendered).await?;

        tracing::info!(path = %path.display(), bytes, "Output document written");
        Ok(true)
    }

    fn catalog() -> Catalog {
        Catalog {
            resources: ResourceUri::ALL
                .into_iter()
                .map(ResourceDescriptor::from)
                .collect(),
            tools: vec![
                ToolDescriptor {
                    name: WRITE_JSON_OUTPUT.to_string(),
                    description: "Validate a JSON document and save it as the output".to_string(),
                    arguments: vec!["json_output".to_string()],
                },
                ToolDescriptor {
                    name: ECHO.to_string(),
                    description: "Return the given text".to_string(),
                    arguments: vec!["text".to_string()],
                },
            ],
        }
    }
}

#[async_trait]
impl ResourceStore for LocalStore {
    async fn read_resource(&self, uri: ResourceUri) -> Result<Vec<ResourceContent>, StoreError> {
        let path = self.resource_path(uri);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::ResourceRead { uri, path, source })?;
        Ok(vec![ResourceContent::text(uri, text)])
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, StoreError> {
        match name {
            WRITE_JSON_OUTPUT => {
                let text = string_argument(name, &arguments, "json_output")?;
                Ok(ToolResult::Boolean(self.write_json_output(text).await?))
            }
            ECHO => {
                let text = string_argument(name, &arguments, "text")?;
                Ok(ToolResult::single_text(text))
            }
            other => Err(StoreError::UnknownTool(other.to_string())),
        }
    }

    async fn list(&self) -> Result<Catalog, StoreError> {
        Ok(Self::catalog())
    }
}

/// Serialize with 4-space indentation, leaving non-ASCII characters literal.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn render_document(value: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(
        &mut buf,
        PrettyFormatter::with_indent(OUTPUT_INDENT),
    );
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Create the parent directory and return the canonical destination path.
async fn resolve_destination(path: &Path) -> Result<PathBuf, StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("output path {} has no file name", path.display()),
        )
    })?;
    tokio::fs::create_dir_all(parent).await?;
    let dir = tokio::fs::canonicalize(parent).await?;
    Ok(dir.join(file_name))
}

fn writer_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = WRITE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}

/// Write `contents` to a unique temporary file next to `path`, then rename
/// it over `path`. The temporary file is removed on any failure.
async fn replace_file(path: PathBuf, contents: Vec<u8>) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(())
}

fn string_argument<'a>(
    tool: &str,
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, StoreError> {
    arguments
        .get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| StoreError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("missing string argument `{key}`"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &Path) -> LocalStore {
        LocalStore::new(dir)
    }

    #[test]
    fn test_render_document_indent_and_unicode() {
        let value = json!({"name": "Почта", "list": [1]});
        let rendered = String::from_utf8(render_document(&value).unwrap()).unwrap();
        assert_eq!(
            rendered,
            "{\n    \"name\": \"Почта\",\n    \"list\": [\n        1\n    ]\n}"
        );
    }

    #[test]
    fn test_render_document_keeps_key_order() {
        let value: serde_json::Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
        let rendered = String::from_utf8(render_document(&value).unwrap()).unwrap();
        assert!(rendered.find("\"z\"").unwrap() < rendered.find("\"a\"").unwrap());
    }

    #[tokio::test]
    async fn test_write_valid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());

        assert!(store.write_json_output(r#"{"a": 1}"#).await.unwrap());
        let written = std::fs::read_to_string(store.output_path()).unwrap();
        assert_eq!(written, "{\n    \"a\": 1\n}");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_normalizes_fenced_text() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());

        let text = "Here you go:\n```json\n[true, false]\n```";
        assert!(store.write_json_output(text).await.unwrap());
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.output_path()).unwrap()).unwrap();
        assert_eq!(written, json!([true, false]));
    }

    #[tokio::test]
    async fn test_write_invalid_json_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());
        std::fs::write(store.output_path(), "previous").unwrap();

        assert!(!store.write_json_output("hello world").await.unwrap());
        assert_eq!(
            std::fs::read_to_string(store.output_path()).unwrap(),
            "previous"
        );
    }

    #[tokio::test]
    async fn test_write_creates_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(&temp_dir.path().join("nested").join("data"));

        assert!(store.write_json_output("{}").await.unwrap());
        assert!(store.output_path().exists());
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_no_temp_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());
        std::fs::create_dir(store.output_path()).unwrap();
        std::fs::write(store.output_path().join("keep"), "x").unwrap();

        let err = store.write_json_output("{}").await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("output.json")]);
    }

    #[tokio::test]
    async fn test_same_destination_shares_lock() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("data");
        std::fs::create_dir(&nested).unwrap();

        let direct = resolve_destination(&nested.join("output.json")).await.unwrap();
        let dotted = resolve_destination(&nested.join(".").join("output.json"))
            .await
            .unwrap();
        assert_eq!(direct, dotted);
        assert!(Arc::ptr_eq(&writer_lock(&direct), &writer_lock(&dotted)));
    }

    #[tokio::test]
    async fn test_read_resource_returns_file_text() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("input.json"), r#"{"fields":[]}"#).unwrap();
        let store = store_in(temp_dir.path());

        let contents = store.read_resource(ResourceUri::Input).await.unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].uri, "resource://input");
        assert_eq!(contents[0].text.as_deref(), Some(r#"{"fields":[]}"#));
    }

    #[tokio::test]
    async fn test_read_missing_resource_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());

        let err = store.read_resource(ResourceUri::Types).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ResourceRead {
                uri: ResourceUri::Types,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_call_tool_dispatch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());

        let result = store
            .call_tool(WRITE_JSON_OUTPUT, json!({"json_output": "[1]"}))
            .await
            .unwrap();
        assert_eq!(result, ToolResult::Boolean(true));

        let echoed = store.call_tool(ECHO, json!({"text": "ping"})).await.unwrap();
        assert_eq!(echoed, ToolResult::single_text("ping"));

        let err = store.call_tool("delete_all", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTool(_)));

        let err = store
            .call_tool(WRITE_JSON_OUTPUT, json!({"json_output": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_list_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let catalog = store_in(temp_dir.path()).list().await.unwrap();
        assert_eq!(catalog.resources.len(), 3);
        assert!(catalog.tools.iter().any(|t| t.name == WRITE_JSON_OUTPUT));
    }
}
