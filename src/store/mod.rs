//! The Store: named text resources and the persistence tool.
//!
//! The Store owns the on-disk JSON files. It exposes them through a
//! resource-by-URI read and a single write tool, either in-process
//! ([`LocalStore`]) or over a socket ([`StoreServer`] / [`StoreClient`]).
//!
//! # Protocol
//!
//! ```text
//! Client                              Store
//!   |-- {"method":"read_resource"} ---->|
//!   |<-- {"status":"contents"} ---------|
//!   |-- {"method":"call_tool"} -------->| (validate, write)
//!   |<-- {"status":"tool_result"} ------|
//! ```

use async_trait::async_trait;

use crate::bridge::ToolResult;

pub mod client;
pub mod local;
pub mod protocol;
pub mod server;
mod types;

pub use client::StoreClient;
pub use local::{render_document, LocalStore};
pub use protocol::{StoreRequest, StoreResponse};
pub use server::{ServerHandle, StoreServer};
pub use types::*;

/// Default socket path for the Store server.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/metadata-agent-store.sock";

/// Resource and tool access to a Store.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Read every fragment of a resource, in source order.
    async fn read_resource(&self, uri: ResourceUri) -> Result<Vec<ResourceContent>, StoreError>;

    /// Invoke a tool by name.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, StoreError>;

    /// Describe exposed resources and tools.
    async fn list(&self) -> Result<Catalog, StoreError>;
}
