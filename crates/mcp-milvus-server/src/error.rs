//! Error types for the MCP server

use mcp_milvus_client::ClientError;
use mcp_milvus_session::SessionError;
use thiserror::Error;

use crate::protocol::error_codes;

/// Result type for tool handlers
pub type ToolResult<T> = Result<T, ToolError>;

/// Failure of a single tool call.
///
/// These never become protocol errors; the dispatcher renders them as a tool
/// result flagged `isError` whose text is the error message.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("required argument \"{0}\" not found")]
    MissingArgument(String),

    #[error("argument \"{0}\" is not a string")]
    NotAString(String),

    /// Session lookup or connection failure, reported verbatim
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Backend failure, reported verbatim
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Fully formatted message
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// `prefix` followed by the error's own message
    pub fn context(prefix: &str, err: impl std::fmt::Display) -> Self {
        Self::Failed(format!("{}{}", prefix, err))
    }
}

/// Protocol-level failures of the dispatcher
#[derive(Error, Debug)]
pub enum McpServerError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpServerError {
    /// JSON-RPC error code for this error
    pub fn code(&self) -> i64 {
        match self {
            McpServerError::Parse(_) => error_codes::PARSE_ERROR,
            McpServerError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpServerError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpServerError::InvalidParams(_) | McpServerError::ToolNotFound(_) => {
                error_codes::INVALID_PARAMS
            }
            McpServerError::Io(_) => error_codes::INTERNAL_ERROR,
        }
    }
}
