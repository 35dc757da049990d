//! Error types for backend client operations

use thiserror::Error;

/// Result type for backend client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to a Milvus backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network/connection errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with a non-zero result code
    #[error("Milvus error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("invalid Milvus address '{0}'")]
    InvalidAddress(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The client was closed by its owning session
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// Whether the error came from the backend itself rather than the transport
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            ClientError::Api { .. }
                | ClientError::DatabaseNotFound(_)
                | ClientError::CollectionNotFound(_)
        )
    }
}
