use async_trait::async_trait;
use mcp_milvus_client::QueryRequest;
use serde_json::Value;

use super::convert::transform_rows;
use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext, parse_json_arg};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry
        .register(InsertDataTool)
        .register(UpsertTool)
        .register(DeleteEntitiesTool)
        .register(QueryTool);
}

/// Optional JSON array of field names; empty input selects no explicit fields
pub(super) fn output_fields(args: &ToolArguments) -> ToolResult<Vec<String>> {
    let raw = args.get_string("output_fields", "");
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    parse_json_arg(&raw, "Invalid output_fields JSON: ")
}

pub struct InsertDataTool;

#[async_trait]
impl McpTool for InsertDataTool {
    fn name(&self) -> &'static str {
        "milvus_insert_data"
    }

    fn description(&self) -> &'static str {
        "Insert data into a collection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of collection."),
            )
            .with_required_property(
                "data",
                JsonSchema::string_with_description("List of dictionaries, each representing a record."),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let raw_data = args.require_str("data")?;

        let data: Vec<Value> = parse_json_arg(raw_data, "Invalid data JSON: ")?;
        let collection = client.describe_collection(collection_name).await?;
        let rows = transform_rows(&collection, data)
            .map_err(|e| ToolError::context("Data transformation failed: ", e))?;

        let result = client.insert(collection_name, None, rows).await?;

        Ok(CallToolResult::text(format!("Inserted Count: {}", result.count)))
    }
}

pub struct UpsertTool;

#[async_trait]
impl McpTool for UpsertTool {
    fn name(&self) -> &'static str {
        "milvus_upsert"
    }

    fn description(&self) -> &'static str {
        "Upsert (insert or update) data into a collection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of the collection to upsert data into."),
            )
            .with_required_property(
                "data",
                JsonSchema::string_with_description(
                    "List of dictionaries, each representing a record to upsert.",
                ),
            )
            .with_property(
                "partition_name",
                JsonSchema::string_with_description(
                    "Name of the partition to upsert data into (optional, defaults to default partition).",
                ),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let raw_data = args.require_str("data")?;
        let partition_name = args.get_string("partition_name", "");

        let data: Vec<Value> = parse_json_arg(raw_data, "Invalid data JSON: ")?;
        if data.is_empty() {
            return Err(ToolError::failed("Data cannot be empty"));
        }
        let record_count = data.len();

        let collection = client.describe_collection(collection_name).await?;
        let rows = transform_rows(&collection, data)
            .map_err(|e| ToolError::context("Failed to transform data: ", e))?;

        let partition = (!partition_name.is_empty()).then_some(partition_name.as_str());
        let result = client
            .upsert(collection_name, partition, rows)
            .await
            .map_err(|e| ToolError::context("Failed to upsert data: ", e))?;

        Ok(CallToolResult::text(format!(
            "Upserted {} records successfully. Upsert count: {}",
            record_count, result.count
        )))
    }
}

pub struct DeleteEntitiesTool;

#[async_trait]
impl McpTool for DeleteEntitiesTool {
    fn name(&self) -> &'static str {
        "milvus_delete_entities"
    }

    fn description(&self) -> &'static str {
        "Delete entities from a collection based on filter expression."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of collection."),
            )
            .with_required_property(
                "filter_expr",
                JsonSchema::string_with_description("Filter expression to select entities to delete."),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let filter = args.require_str("filter_expr")?;

        let deleted = client.delete(collection_name, filter).await?;

        Ok(CallToolResult::text(format!("Delete result: {}", deleted)))
    }
}

pub struct QueryTool;

#[async_trait]
impl McpTool for QueryTool {
    fn name(&self) -> &'static str {
        "milvus_query"
    }

    fn description(&self) -> &'static str {
        "Query collection using filter expressions."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name of the collection to query."),
            )
            .with_required_property(
                "filter_expr",
                JsonSchema::string_with_description("Filter expression (e.g. 'age > 20')."),
            )
            .with_property(
                "output_fields",
                JsonSchema::string_with_description("Fields to include in results as JSON array."),
            )
            .with_property(
                "limit",
                JsonSchema::string_with_description("Maximum number of results (default: 10).")
                    .with_default("10"),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let filter = args.require_str("filter_expr")?;

        let request = QueryRequest {
            collection_name: collection_name.to_string(),
            filter: filter.to_string(),
            output_fields: output_fields(args)?,
            limit: args.get_u32("limit", 10),
        };
        let rows = client.query(&request).await?;
        let results = serde_json::to_string_pretty(&rows)
            .map_err(|e| ToolError::context("Failed to format results: ", e))?;

        Ok(CallToolResult::text(format!(
            "Query results for '{}' in collection '{}':\n\nResults: {}\n",
            filter, collection_name, results
        )))
    }
}
