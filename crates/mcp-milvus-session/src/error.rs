//! Session manager errors

use mcp_milvus_client::ClientError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session ID cannot be empty")]
    EmptySessionId,

    /// Absent, removed or expired
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("maximum number of sessions ({0}) reached")]
    MaxSessionsReached(usize),

    #[error("failed to parse milvus config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("failed to create milvus client: {0}")]
    Connect(#[source] ClientError),

    #[error("session manager is closed")]
    Closed,
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}
