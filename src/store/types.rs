//! Store resource types and errors.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// URI scheme shared by all Store resources.
pub const RESOURCE_SCHEME: &str = "resource://";

/// Name of the tool that validates and persists the answer document.
pub const WRITE_JSON_OUTPUT: &str = "write_json_output";

/// Name of the liveness tool that returns its argument.
pub const ECHO: &str = "echo";

/// One of the named text resources exposed by the Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceUri {
    /// The metadata object being edited.
    Input,
    /// Data type reference.
    Types,
    /// Object identifier reference.
    ObjectUid,
}

impl ResourceUri {
    /// Every known resource, in prompt order.
    pub const ALL: [Self; 3] = [Self::Input, Self::Types, Self::ObjectUid];

    /// Short resource name (`input`, `types`, `object_uid`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Types => "types",
            Self::ObjectUid => "object_uid",
        }
    }

    /// Full URI, e.g. `resource://input`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "resource://input",
            Self::Types => "resource://types",
            Self::ObjectUid => "resource://object_uid",
        }
    }

    /// Human readable description for listings.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "Metadata object description to modify",
            Self::Types => "Reference of available data types",
            Self::ObjectUid => "Reference of object identifiers",
        }
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceUri {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix(RESOURCE_SCHEME).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|uri| uri.name() == name)
            .ok_or_else(|| StoreError::UnknownResource(s.to_string()))
    }
}

/// One fragment of a resource read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    /// URI the fragment belongs to.
    pub uri: String,
    /// Text payload, absent for binary fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// MIME type of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ResourceContent {
    /// Text fragment for `uri`.
    #[must_use]
    pub fn text(uri: ResourceUri, text: impl Into<String>) -> Self {
        Self {
            uri: uri.as_str().to_string(),
            text: Some(text.into()),
            mime_type: Some("application/json".to_string()),
        }
    }
}

/// Resource entry in a Store listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
}

impl From<ResourceUri> for ResourceDescriptor {
    fn from(uri: ResourceUri) -> Self {
        Self {
            uri: uri.as_str().to_string(),
            name: uri.name().to_string(),
            description: uri.description().to_string(),
        }
    }
}

/// Tool entry in a Store listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// Names of the string arguments the tool expects.
    pub arguments: Vec<String>,
}

/// Everything a Store exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub resources: Vec<ResourceDescriptor>,
    pub tools: Vec<ToolDescriptor>,
}

/// Errors from Store operations and transport.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Generic I/O failure (socket, output file).
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A resource file could not be read.
    #[error("Failed to read resource {uri} from {path}: {source}")]
    ResourceRead {
        uri: ResourceUri,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URI does not name a known resource.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The tool name is not known to the Store.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments are missing or have the wrong type.
    #[error("Invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Failed to serialize or deserialize a protocol message.
    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote Store answered with an error.
    #[error("Store error: {0}")]
    Remote(String),

    /// The remote Store answered with an unexpected message.
    #[error("Invalid response from store")]
    InvalidResponse,

    /// The Store socket does not exist.
    #[error("Store not running (socket not found)")]
    NotRunning,

    /// The operation timed out.
    #[error("Store timeout after {0}ms")]
    Timeout(u64),
}
