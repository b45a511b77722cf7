//! Store wire messages.
//!
//! One JSON line per request and one per response.

use serde::{Deserialize, Serialize};

use crate::bridge::ToolResult;

use super::{Catalog, ResourceContent, ResourceDescriptor, ToolDescriptor};

/// Request from a client to the Store server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StoreRequest {
    /// Read all fragments of a resource.
    ReadResource { uri: String },
    /// Invoke a tool with named arguments.
    CallTool {
        name: String,
        #[serde(default)]
        arguments: serde_json::Value,
    },
    /// Describe the exposed resources and tools.
    List,
}

/// Response from the Store server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoreResponse {
    /// Resource fragments, in source order.
    Contents { contents: Vec<ResourceContent> },
    /// Raw tool result.
    ToolResult { result: ToolResult },
    /// Store catalog.
    Listing {
        resources: Vec<ResourceDescriptor>,
        tools: Vec<ToolDescriptor>,
    },
    /// The request failed on the server.
    Error { message: String },
}

impl From<Catalog> for StoreResponse {
    fn from(catalog: Catalog) -> Self {
        Self::Listing {
            resources: catalog.resources,
            tools: catalog.tools,
        }
    }
}
