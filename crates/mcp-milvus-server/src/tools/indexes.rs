use async_trait::async_trait;
use mcp_milvus_client::IndexSpec;
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext, parse_json_arg};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register(CreateIndexTool).register(DropIndexTool);
}

pub struct CreateIndexTool;

#[async_trait]
impl McpTool for CreateIndexTool {
    fn name(&self) -> &'static str {
        "milvus_create_index"
    }

    fn description(&self) -> &'static str {
        "Create an index for a collection field."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of the collection."),
            )
            .with_required_property(
                "field_name",
                JsonSchema::string_with_description("Name of the field to create index for."),
            )
            .with_required_property(
                "index_type",
                JsonSchema::string_with_description("Type of the index, e.g. IVF_FLAT, HNSW, etc."),
            )
            .with_required_property(
                "metric_type",
                JsonSchema::string_with_description("Metric type, e.g. COSINE, L2, etc."),
            )
            .with_property(
                "params",
                JsonSchema::string_with_description("Index parameters as JSON, e.g. {\"nlist\": 128}"),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let field_name = args.require_str("field_name")?;
        let index_type = args.require_str("index_type")?;
        let metric_type = args.require_str("metric_type")?;

        let raw_params = args.get_string("params", "");
        let params: Map<String, Value> = if raw_params.is_empty() {
            Map::new()
        } else {
            parse_json_arg(&raw_params, "Invalid params JSON: ")?
        };

        let index = params.into_iter().fold(
            IndexSpec::new(field_name, index_type, metric_type),
            |spec, (key, value)| spec.with_param(key, value),
        );
        client
            .create_index(collection_name, &index)
            .await
            .map_err(|e| ToolError::context("CreateIndex failed: ", e))?;

        Ok(CallToolResult::text(format!(
            "Index created successfully for collection '{}', field '{}'",
            collection_name, field_name
        )))
    }
}

pub struct DropIndexTool;

#[async_trait]
impl McpTool for DropIndexTool {
    fn name(&self) -> &'static str {
        "milvus_drop_index"
    }

    fn description(&self) -> &'static str {
        "Drop an index from a collection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of the collection."),
            )
            .with_required_property(
                "index_name",
                JsonSchema::string_with_description("Name of the index to drop."),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let index_name = args.require_str("index_name")?;

        client
            .drop_index(collection_name, index_name)
            .await
            .map_err(|e| ToolError::context("Failed to drop index: ", e))?;

        Ok(CallToolResult::text(format!(
            "Index '{}' dropped successfully from collection '{}'",
            index_name, collection_name
        )))
    }
}
