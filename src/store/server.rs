//! Store server over a Unix domain socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::watch;

use super::{ResourceStore, ResourceUri, StoreError, StoreRequest, StoreResponse};

/// Serves a [`ResourceStore`] to socket clients.
///
/// Each connection carries one request line and gets one response line.
#[derive(Debug)]
pub struct StoreServer {
    socket_path: PathBuf,
}

impl StoreServer {
    /// Creates a server bound to `socket_path` once started.
    #[must_use]
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Binds the socket and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if a stale socket cannot be removed or the bind fails.
    pub fn start(&self, store: Arc<dyn ResourceStore>) -> Result<ServerHandle, StoreError> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!(path = %self.socket_path.display(), "Store server started");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Store server shutting down");
                            break;
                        }
                    }

                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, _addr)) => {
                                let store = Arc::clone(&store);
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, store).await {
                                        tracing::warn!(error = %e, "Connection handler error");
                                    }
                                });
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to accept connection");
                            }
                        }
                    }
                }
            }
        });

        Ok(ServerHandle {
            socket_path: self.socket_path.clone(),
            shutdown_tx,
        })
    }
}

/// Handle for a running Store server.
///
/// When dropped, the server stops and the socket file is removed.
#[derive(Debug)]
pub struct ServerHandle {
    socket_path: PathBuf,
    shutdown_tx: watch::Sender<bool>,
}

impl ServerHandle {
    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                tracing::warn!(
                    path = %self.socket_path.display(),
                    error = %e,
                    "Failed to remove socket file"
                );
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    store: Arc<dyn ResourceStore>,
) -> Result<(), StoreError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(());
    }

    let response = match serde_json::from_str::<StoreRequest>(line.trim()) {
        Ok(request) => dispatch(store.as_ref(), request).await,
        Err(e) => StoreResponse::Error {
            message: format!("Malformed request: {e}"),
        },
    };

    let mut response_json = serde_json::to_string(&response)?;
    response_json.push('\n');
    writer.write_all(response_json.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

/// Run one request against the store, folding errors into the response.
pub async fn dispatch(store: &dyn ResourceStore, request: StoreRequest) -> StoreResponse {
    let result = match request {
        StoreRequest::ReadResource { uri } => {
            tracing::debug!(uri = %uri, "Resource read");
            match uri.parse::<ResourceUri>() {
                Ok(uri) => store
                    .read_resource(uri)
                    .await
                    .map(|contents| StoreResponse::Contents { contents }),
                Err(e) => Err(e),
            }
        }
        StoreRequest::CallTool { name, arguments } => {
            tracing::debug!(tool = %name, "Tool call");
            store
                .call_tool(&name, arguments)
                .await
                .map(|result| StoreResponse::ToolResult { result })
        }
        StoreRequest::List => store.list().await.map(StoreResponse::from),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Store request failed");
        StoreResponse::Error {
            message: e.to_string(),
        }
    })
}
