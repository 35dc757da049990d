use async_trait::async_trait;
use mcp_milvus_client::DEFAULT_DATABASE;
use mcp_milvus_session::ConnConfig;

use super::CONNECTOR_TOOL;
use crate::error::ToolResult;
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register(ConnectorTool);
}

/// Opens the caller's backend session, replacing any previous one
pub struct ConnectorTool;

#[async_trait]
impl McpTool for ConnectorTool {
    fn name(&self) -> &'static str {
        CONNECTOR_TOOL
    }

    fn description(&self) -> &'static str {
        "Connect to a Milvus server instance with authentication and database selection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "address",
                JsonSchema::string_with_description(
                    "The URI address of the Milvus server, e.g., 'http://localhost:19530'.",
                ),
            )
            .with_property(
                "token",
                JsonSchema::string_with_description(
                    "Authentication credentials in the format 'username:password'.",
                ),
            )
            .with_property(
                "db_name",
                JsonSchema::string_with_description(
                    "The name of the database to connect to, e.g., 'default'.",
                )
                .with_default(DEFAULT_DATABASE),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        args.require_str("address")?;
        let config: ConnConfig = args.bind()?;

        ctx.sessions().set(ctx.session_id(), &config).await?;

        Ok(CallToolResult::text(format!(
            "Connected to Milvus successfully, database: {}",
            config.db_name
        )))
    }
}
