//! # Milvus MCP Server
//!
//! Exposes Milvus operations as MCP tools. Every protocol session owns its
//! own backend connection, established by the `milvus_connector` tool and
//! cached by the [`mcp_milvus_session::SessionManager`]; every other tool
//! call is gated on that connection by [`middleware::AuthMiddleware`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_milvus_client::RestConnector;
//! use mcp_milvus_server::{McpServer, serve_stdio};
//! use mcp_milvus_session::{SessionManager, SessionManagerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sessions = SessionManager::new(SessionManagerConfig::default(), Arc::new(RestConnector::new()?));
//! serve_stdio(McpServer::new(sessions.clone())).await?;
//! sessions.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tool;
pub mod tools;
pub mod transport;

pub use config::{LogFormat, ServerConfig};
pub use error::{McpServerError, ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use server::{McpServer, McpServerBuilder};
pub use tool::{McpTool, ToolArguments, ToolContext};
pub use transport::{StdioTransport, serve_stdio};
