//! Middleware error types

use thiserror::Error;

/// Rejection raised by a middleware hook.
///
/// The stack turns it into a tool result flagged `isError` carrying the
/// error message, so callers see it exactly like a handler failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// The call lacks an established session
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Internal middleware error: {0}")]
    Internal(String),
}

impl MiddlewareError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MiddlewareError::unauthenticated("auth first, please call milvus_connector tool");
        assert_eq!(err.to_string(), "auth first, please call milvus_connector tool");

        let err = MiddlewareError::internal("lock poisoned");
        assert_eq!(err.to_string(), "Internal middleware error: lock poisoned");
    }
}
