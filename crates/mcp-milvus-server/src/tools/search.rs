use async_trait::async_trait;
use mcp_milvus_client::SearchRequest;

use super::entities::output_fields;
use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext, parse_json_arg};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register(VectorSearchTool);
}

/// Single-vector similarity search; each hit is printed as compact JSON
pub struct VectorSearchTool;

#[async_trait]
impl McpTool for VectorSearchTool {
    fn name(&self) -> &'static str {
        "milvus_vector_search"
    }

    fn description(&self) -> &'static str {
        "Perform vector similarity search on a collection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of the collection to search."),
            )
            .with_required_property(
                "vector",
                JsonSchema::string_with_description("Query vector as JSON array."),
            )
            .with_property(
                "vector_field",
                JsonSchema::string_with_description(
                    "Field containing vectors to search (default: 'vector').",
                )
                .with_default("vector"),
            )
            .with_property(
                "limit",
                JsonSchema::string_with_description("Maximum number of results (default: 5).")
                    .with_default("5"),
            )
            .with_property(
                "output_fields",
                JsonSchema::string_with_description("Fields to include in results as JSON array."),
            )
            .with_property(
                "metric_type",
                JsonSchema::string_with_description(
                    "Distance metric (COSINE, L2, IP) (default: 'COSINE').",
                )
                .with_default("COSINE"),
            )
            .with_property(
                "filter_expr",
                JsonSchema::string_with_description("Optional filter expression."),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let raw_vector = args.require_str("vector")?;

        let vector: Vec<f32> = parse_json_arg(raw_vector, "Invalid vector JSON: ")?;
        let filter = args.get_string("filter_expr", "");

        let request = SearchRequest {
            collection_name: collection_name.to_string(),
            vector,
            vector_field: args.get_string("vector_field", "vector"),
            limit: args.get_u32("limit", 5),
            output_fields: output_fields(args)?,
            metric_type: args.get_string("metric_type", "COSINE"),
            filter: (!filter.is_empty()).then_some(filter),
        };
        let hits = client.search(&request).await?;

        let mut output = format!("Vector search results for collection '{}':\n\n", collection_name);
        if hits.is_empty() {
            output.push_str("No results found\n");
        }
        for hit in &hits {
            let line = serde_json::to_string(hit)
                .map_err(|e| ToolError::context("Failed to format results: ", e))?;
            output.push_str(&line);
            output.push_str("\n\n");
        }

        Ok(CallToolResult::text(output))
    }
}
