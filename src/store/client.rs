//! Store client over a Unix domain socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::bridge::ToolResult;
use crate::config::StoreConfig;

use super::{
    Catalog, ResourceContent, ResourceStore, ResourceUri, StoreError, StoreRequest, StoreResponse,
};

/// Remote [`ResourceStore`] reached through a [`super::StoreServer`] socket.
///
/// No timeout is applied unless one is set with [`StoreClient::with_timeout`]
/// or `timeout_ms` in the store configuration.
#[derive(Debug, Clone)]
pub struct StoreClient {
    socket_path: PathBuf,
    timeout: Option<Duration>,
}

impl StoreClient {
    /// Creates a client for the server listening on `path`.
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            timeout: None,
        }
    }

    /// Creates a client for the configured socket, with its timeout if set.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        let client = Self::with_path(&config.socket_path);
        match config.timeout_ms {
            Some(ms) => client.with_timeout(Duration::from_millis(ms)),
            None => client,
        }
    }

    /// Bounds every request by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks if the server socket exists.
    #[must_use]
    pub fn is_server_running(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends one request and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The server is not running ([`StoreError::NotRunning`])
    /// - The connection fails ([`StoreError::Io`])
    /// - The operation times out ([`StoreError::Timeout`])
    /// - Message serialization fails ([`StoreError::Serialization`])
    /// - The connection closes without a response ([`StoreError::InvalidResponse`])
    pub async fn request(&self, request: &StoreRequest) -> Result<StoreResponse, StoreError> {
        if !self.is_server_running() {
            return Err(StoreError::NotRunning);
        }

        let Some(timeout) = self.timeout else {
            return self.exchange(request).await;
        };

        // Safe: timeout values are never going to exceed u64::MAX milliseconds
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = timeout.as_millis() as u64;

        match tokio::time::timeout(timeout, self.exchange(request)).await {
            Ok(inner) => inner,
            Err(_) => Err(StoreError::Timeout(timeout_ms)),
        }
    }

    async fn exchange(&self, request: &StoreRequest) -> Result<StoreResponse, StoreError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (reader, mut writer) = stream.into_split();

        let mut request_json = serde_json::to_string(request)?;
        request_json.push('\n');
        writer.write_all(request_json.as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut response_line = String::new();
        let bytes_read = reader.read_line(&mut response_line).await?;

        if bytes_read == 0 {
            return Err(StoreError::InvalidResponse);
        }

        Ok(serde_json::from_str(response_line.trim())?)
    }
}

#[async_trait]
impl ResourceStore for StoreClient {
    async fn read_resource(&self, uri: ResourceUri) -> Result<Vec<ResourceContent>, StoreError> {
        let request = StoreRequest::ReadResource {
            uri: uri.as_str().to_string(),
        };
        match self.request(&request).await? {
            StoreResponse::Contents { contents } => Ok(contents),
            StoreResponse::Error { message } => Err(StoreError::Remote(message)),
            _ => Err(StoreError::InvalidResponse),
        }
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, StoreError> {
        let request = StoreRequest::CallTool {
            name: name.to_string(),
            arguments,
        };
        match self.request(&request).await? {
            StoreResponse::ToolResult { result } => Ok(result),
            StoreResponse::Error { message } => Err(StoreError::Remote(message)),
            _ => Err(StoreError::InvalidResponse),
        }
    }

    async fn list(&self) -> Result<Catalog, StoreError> {
        match self.request(&StoreRequest::List).await? {
            StoreResponse::Listing { resources, tools } => Ok(Catalog { resources, tools }),
            StoreResponse::Error { message } => Err(StoreError::Remote(message)),
            _ => Err(StoreError::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_with_path_uses_custom_path() {
        let client = StoreClient::with_path("/custom/path.sock");
        assert_eq!(client.socket_path(), Path::new("/custom/path.sock"));
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn client_with_timeout_sets_timeout() {
        let client = StoreClient::with_path("/x.sock").with_timeout(Duration::from_secs(10));
        assert_eq!(client.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn client_from_config_applies_timeout() {
        let mut config = StoreConfig {
            socket_path: PathBuf::from("/run/store.sock"),
            ..StoreConfig::default()
        };
        let client = StoreClient::from_config(&config);
        assert_eq!(client.socket_path(), Path::new("/run/store.sock"));
        assert_eq!(client.timeout(), None);

        config.timeout_ms = Some(750);
        let client = StoreClient::from_config(&config);
        assert_eq!(client.timeout(), Some(Duration::from_millis(750)));
    }

    #[tokio::test]
    async fn client_reports_missing_server() {
        let client = StoreClient::with_path("/nonexistent/store.sock");
        assert!(!client.is_server_running());
        let err = client.read_resource(ResourceUri::Input).await.unwrap_err();
        assert!(matches!(err, StoreError::NotRunning));
    }
}
