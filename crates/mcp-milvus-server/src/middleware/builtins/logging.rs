//! Tool call logging with duration tracking

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::auth::DATABASE_METADATA_KEY;
use crate::middleware::{MiddlewareError, ToolCallContext, ToolMiddleware};
use crate::protocol::CallToolResult;

/// Logs the outcome and duration of every tool call.
///
/// Register it first so its timing covers the rest of the stack and it also
/// reports calls rejected by later middleware.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolMiddleware for LoggingMiddleware {
    async fn before_call(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError> {
        // Keys only; values may carry credentials or whole datasets
        let arguments: Vec<&str> = ctx.arguments().keys().map(String::as_str).collect();
        debug!(
            session = ctx.session_id().unwrap_or_default(),
            tool = ctx.tool_name(),
            ?arguments,
            "Tool call started"
        );
        Ok(())
    }

    async fn after_call(
        &self,
        ctx: &ToolCallContext<'_>,
        result: &mut CallToolResult,
    ) -> Result<(), MiddlewareError> {
        let duration_ms = ctx.elapsed().as_secs_f64() * 1000.0;
        let session = ctx.session_id().unwrap_or_default();
        let database = ctx
            .metadata()
            .get(DATABASE_METADATA_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if result.is_error {
            error!(
                session,
                database,
                tool = ctx.tool_name(),
                duration_ms,
                error = %result.joined_text(),
                "Tool call failed"
            );
        } else {
            info!(session, database, tool = ctx.tool_name(), duration_ms, "Tool call completed");
        }
        Ok(())
    }
}
