//! Middleware stack execution

use std::future::Future;
use std::sync::Arc;

use super::{MiddlewareError, ToolCallContext, ToolMiddleware};
use crate::protocol::CallToolResult;

/// Ordered collection of middleware with execution logic
///
/// 1. **Before call**: middleware execute in registration order; the first
///    error stops the chain.
/// 2. **After call**: the middleware that were entered execute in reverse
///    order; errors replace the result.
#[derive(Default, Clone)]
pub struct MiddlewareStack {
    middleware: Vec<Arc<dyn ToolMiddleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware to the end of the stack
    pub fn push(&mut self, middleware: Arc<dyn ToolMiddleware>) {
        self.middleware.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Execute before hooks in registration order, stopping at the first error
    pub async fn execute_before(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError> {
        ctx.entered = 0;
        for middleware in &self.middleware {
            middleware.before_call(ctx).await?;
            ctx.entered += 1;
        }
        Ok(())
    }

    /// Execute after hooks of the entered middleware in reverse order
    pub async fn execute_after(
        &self,
        ctx: &ToolCallContext<'_>,
        result: &mut CallToolResult,
    ) -> Result<(), MiddlewareError> {
        let entered = ctx.entered.min(self.middleware.len());
        for middleware in self.middleware[..entered].iter().rev() {
            middleware.after_call(ctx, result).await?;
        }
        Ok(())
    }

    /// Run `handler` wrapped by the whole stack.
    ///
    /// `handler` is only polled when every before hook succeeds.
    pub async fn execute<F>(&self, ctx: &mut ToolCallContext<'_>, handler: F) -> CallToolResult
    where
        F: Future<Output = CallToolResult> + Send,
    {
        let mut result = match self.execute_before(ctx).await {
            Ok(()) => handler.await,
            Err(rejection) => CallToolResult::error_text(rejection.to_string()),
        };
        if let Err(e) = self.execute_after(ctx, &mut result).await {
            result = CallToolResult::error_text(e.to_string());
        }
        result
    }
}
