//! Newline-delimited JSON-RPC over a byte stream
//!
//! One transport connection is one MCP session. The session id is generated
//! when the transport starts; when the stream ends the session is
//! unregistered, which closes its backend connection.

use mcp_milvus_session::SessionHooks;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::McpServerError;
use crate::server::McpServer;

const BUFFER_CAPACITY: usize = 8192;

/// A single MCP session served over a reader/writer pair
#[derive(Debug)]
pub struct StdioTransport {
    server: McpServer,
    session_id: String,
}

impl StdioTransport {
    pub fn new(server: McpServer) -> Self {
        Self::with_session_id(server, Uuid::now_v7().to_string())
    }

    pub fn with_session_id(server: McpServer, session_id: impl Into<String>) -> Self {
        Self {
            server,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Serve until `reader` reaches end of stream.
    ///
    /// The session is unregistered on the way out, also when reading or
    /// writing fails.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), McpServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let hooks = SessionHooks::new(self.server.sessions().clone());
        hooks.on_register(&self.session_id).await;

        let outcome = self.run(reader, writer).await;
        if let Err(e) = &outcome {
            error!(session_id = %self.session_id, error = %e, "Transport failed");
        }

        hooks.on_unregister(&self.session_id).await;
        outcome
    }

    async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), McpServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::with_capacity(BUFFER_CAPACITY, reader).lines();
        let mut writer = BufWriter::with_capacity(BUFFER_CAPACITY, writer);

        info!(session_id = %self.session_id, "Stdio transport ready");
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(response) = self.server.handle_message(&self.session_id, line).await else {
                continue;
            };
            let encoded = serde_json::to_string(&response)?;
            writer.write_all(encoded.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        debug!(session_id = %self.session_id, "Input closed");
        Ok(())
    }
}

/// Serve one session over the process's stdin and stdout
pub async fn serve_stdio(server: McpServer) -> Result<(), McpServerError> {
    StdioTransport::new(server)
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await
}
