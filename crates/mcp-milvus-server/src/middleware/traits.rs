//! Core middleware trait definitions

use async_trait::async_trait;

use super::{MiddlewareError, ToolCallContext};
use crate::protocol::CallToolResult;

/// Interceptor around every tool invocation
///
/// # Lifecycle
///
/// 1. **Before call**: runs in registration order before the handler. An
///    error stops the chain; the handler is not invoked and the error is
///    returned to the caller as a tool error.
/// 2. **After call**: runs in reverse registration order with the result,
///    for every middleware whose before hook completed. An error replaces
///    the result.
#[async_trait]
pub trait ToolMiddleware: Send + Sync {
    /// Called before the tool handler executes
    async fn before_call(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError>;

    /// Called after the tool handler completes or a later middleware rejected the call
    #[allow(unused_variables)]
    async fn after_call(
        &self,
        ctx: &ToolCallContext<'_>,
        result: &mut CallToolResult,
    ) -> Result<(), MiddlewareError> {
        Ok(())
    }
}
