//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_SOCKET_PATH;

/// AI provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Claude,
}

/// Configuration for the language model client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider to use (gemini or claude).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable name for the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// HTTP connect timeout, seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole request timeout, seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_tokens() -> u32 {
    65536
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Where the Store keeps its files and listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding resource files and the output document.
    pub data_dir: PathBuf,
    /// File backing `resource://input`.
    pub input_file: String,
    /// File backing `resource://types`.
    pub types_file: String,
    /// File backing `resource://object_uid`.
    pub object_uid_file: String,
    /// Output document written by `write_json_output`.
    pub output_file: String,
    /// Unix socket of the Store server.
    pub socket_path: PathBuf,
    /// Per-request bound for socket clients, milliseconds. Unset means no bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data_dir"),
            input_file: "input.json".to_string(),
            types_file: "data_types.json".to_string(),
            object_uid_file: "object_uid.json".to_string(),
            output_file: "output.json".to_string(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            timeout_ms: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub store: StoreConfig,
}
