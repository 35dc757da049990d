//! # Milvus Session Manager
//!
//! Per-session backend connections for the Milvus MCP server.
//!
//! Each protocol session establishes its own authenticated backend
//! connection (through the `milvus_connector` tool); the [`SessionManager`]
//! caches those connections with a TTL, a soft cap on concurrent sessions
//! and asynchronous lifecycle events.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_milvus_client::RestConnector;
//! use mcp_milvus_session::{ConnConfig, SessionManager, SessionManagerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManager::new(SessionManagerConfig::default(), Arc::new(RestConnector::new()?));
//! manager
//!     .set("session-1", &ConnConfig::new("http://localhost:19530").with_token("root:Milvus"))
//!     .await?;
//! let client = manager.get("session-1").await?;
//! println!("{:?}", client.list_collections().await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod monitoring;
pub mod state;

pub use config::{ConfigError, ConnConfig};
pub use error::{SessionError, SessionResult};
pub use hooks::{CLIENT_CONNECTED_AT, CLIENT_TYPE, SessionHooks};
pub use manager::{SessionManager, SessionManagerConfig};
pub use monitoring::register_monitoring_callbacks;
pub use state::{SessionEvent, SessionEventCallback, SessionState};
