//! Session gate for tool calls

use async_trait::async_trait;
use mcp_milvus_session::SessionManager;
use serde_json::Value;
use tracing::debug;

use crate::middleware::{MiddlewareError, ToolCallContext, ToolMiddleware};
use crate::tools::CONNECTOR_TOOL;

pub const MISSING_SESSION_MESSAGE: &str = "must provide an available session id";
pub const NOT_CONNECTED_MESSAGE: &str = "auth first, please call milvus_connector tool";

/// Metadata key holding the database the session's connection is bound to
pub const DATABASE_METADATA_KEY: &str = "database";

/// Rejects calls that have no established backend session.
///
/// The connector tool is let through so a session can be established.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    sessions: SessionManager,
}

impl AuthMiddleware {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl ToolMiddleware for AuthMiddleware {
    async fn before_call(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError> {
        let Some(session_id) = ctx.session_id() else {
            return Err(MiddlewareError::unauthenticated(MISSING_SESSION_MESSAGE));
        };

        if ctx.tool_name() == CONNECTOR_TOOL {
            return Ok(());
        }

        match self.sessions.get(session_id).await {
            Ok(client) => {
                ctx.add_metadata(DATABASE_METADATA_KEY, Value::String(client.database()));
                Ok(())
            }
            Err(e) => {
                debug!(session = session_id, tool = ctx.tool_name(), error = %e, "Rejected unauthenticated tool call");
                Err(MiddlewareError::unauthenticated(NOT_CONNECTED_MESSAGE))
            }
        }
    }
}
