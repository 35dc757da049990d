use async_trait::async_trait;

use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry
        .register(ListDatabasesTool)
        .register(CreateDatabaseTool)
        .register(UseDatabaseTool);
}

pub struct ListDatabasesTool;

#[async_trait]
impl McpTool for ListDatabasesTool {
    fn name(&self) -> &'static str {
        "milvus_list_databases"
    }

    fn description(&self) -> &'static str {
        "List all databases in the connected Milvus instance."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
    }

    async fn call(&self, _args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let databases = client.list_databases().await?;
        Ok(CallToolResult::text(format!("Databases: [{}]", databases.join(" "))))
    }
}

pub struct CreateDatabaseTool;

#[async_trait]
impl McpTool for CreateDatabaseTool {
    fn name(&self) -> &'static str {
        "milvus_create_database"
    }

    fn description(&self) -> &'static str {
        "Create a new database in Milvus."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object().with_required_property(
            "database_name",
            JsonSchema::string_with_description("Name of the database to create."),
        )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let database_name = args.require_str("database_name")?;

        client
            .create_database(database_name)
            .await
            .map_err(|e| ToolError::context("Failed to create database: ", e))?;

        Ok(CallToolResult::text(format!(
            "Database '{}' created successfully",
            database_name
        )))
    }
}

/// Switches the database of the caller's connection for later calls
pub struct UseDatabaseTool;

#[async_trait]
impl McpTool for UseDatabaseTool {
    fn name(&self) -> &'static str {
        "milvus_use_database"
    }

    fn description(&self) -> &'static str {
        "Switch to a specific database."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object().with_required_property(
            "database_name",
            JsonSchema::string_with_description("Name of the database to switch to."),
        )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let database_name = args.require_str("database_name")?;

        client.use_database(database_name).await?;

        Ok(CallToolResult::text(format!(
            "Successfully switched to database: {}",
            database_name
        )))
    }
}
