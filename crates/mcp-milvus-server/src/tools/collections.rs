use async_trait::async_trait;
use mcp_milvus_client::IndexSpec;
use mcp_milvus_schema::build_schema_from_map;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, JsonSchema, ToolSchema};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext, parse_json_arg};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry
        .register(ListCollectionsTool)
        .register(CreateCollectionTool)
        .register(DropCollectionTool)
        .register(RenameCollectionTool)
        .register(GetCollectionInfoTool)
        .register(LoadCollectionTool)
        .register(ReleaseCollectionTool);
}

fn collection_name_schema(description: &str) -> ToolSchema {
    ToolSchema::object()
        .with_required_property("collection_name", JsonSchema::string_with_description(description))
}

pub struct ListCollectionsTool;

#[async_trait]
impl McpTool for ListCollectionsTool {
    fn name(&self) -> &'static str {
        "milvus_list_collections"
    }

    fn description(&self) -> &'static str {
        "List all collections in the database."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
    }

    async fn call(&self, _args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collections = client.list_collections().await?;
        Ok(CallToolResult::text(format!(
            "Collections in database:\n{}",
            collections.join(", ")
        )))
    }
}

/// One entry of the `index_params` argument
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndexParamsEntry {
    field_name: String,
    index_type: String,
    metric_type: String,
    params: Map<String, Value>,
}

impl From<IndexParamsEntry> for IndexSpec {
    fn from(entry: IndexParamsEntry) -> Self {
        entry.params.into_iter().fold(
            IndexSpec::new(entry.field_name, entry.index_type, entry.metric_type),
            |spec, (key, value)| spec.with_param(key, value),
        )
    }
}

/// Creates a collection from a JSON schema description, then its indexes
pub struct CreateCollectionTool;

#[async_trait]
impl McpTool for CreateCollectionTool {
    fn name(&self) -> &'static str {
        "milvus_create_collection"
    }

    fn description(&self) -> &'static str {
        "Create a new collection with specified schema."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "collection_name",
                JsonSchema::string_with_description("Name for the new collection."),
            )
            .with_required_property(
                "collection_schema",
                JsonSchema::string_with_description(
                    "Collection schema definition as JSON. Example: {\"auto_id\": false, \"enable_dynamic_field\": true, \"fields\": [{\"name\": \"id\", \"data_type\": \"Int64\", \"is_primary_key\": true}, {\"name\": \"vector\", \"data_type\": \"FloatVector\", \"dim\": 128}]}",
                ),
            )
            .with_property(
                "index_params",
                JsonSchema::string_with_description(
                    "Optional index parameters as JSON array. Example: [{\"field_name\": \"vector\", \"index_type\": \"AUTOINDEX\", \"metric_type\": \"COSINE\", \"params\": {}}]",
                ),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let raw_schema = args.require_str("collection_schema")?;

        let description: Map<String, Value> =
            parse_json_arg(raw_schema, "Invalid collection_schema JSON: ")?;
        let schema = build_schema_from_map(&description)
            .map_err(|e| ToolError::context("Failed to build schema: ", e))?;

        // Validated before anything is created
        let raw_indexes = args.get_string("index_params", "");
        let indexes: Vec<IndexSpec> = if raw_indexes.is_empty() {
            Vec::new()
        } else {
            parse_json_arg::<Vec<IndexParamsEntry>>(&raw_indexes, "Invalid index_params JSON: ")?
                .into_iter()
                .map(IndexSpec::from)
                .collect()
        };

        client
            .create_collection(collection_name, &schema, &[])
            .await
            .map_err(|e| ToolError::context("Failed to create collection: ", e))?;

        for index in &indexes {
            client
                .create_index(collection_name, index)
                .await
                .map_err(|e| {
                    ToolError::failed(format!(
                        "CreateIndex failed for field {}: {}",
                        index.field_name, e
                    ))
                })?;
        }

        Ok(CallToolResult::text(format!(
            "Collection '{}' created successfully with {} fields",
            collection_name,
            schema.fields.len()
        )))
    }
}

pub struct DropCollectionTool;

#[async_trait]
impl McpTool for DropCollectionTool {
    fn name(&self) -> &'static str {
        "milvus_drop_collection"
    }

    fn description(&self) -> &'static str {
        "Drop a collection and all its data from Milvus."
    }

    fn input_schema(&self) -> ToolSchema {
        collection_name_schema("Name of the collection to drop.")
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;

        client
            .drop_collection(collection_name)
            .await
            .map_err(|e| ToolError::context("Failed to drop collection: ", e))?;

        Ok(CallToolResult::text(format!(
            "Collection '{}' dropped successfully",
            collection_name
        )))
    }
}

pub struct RenameCollectionTool;

#[async_trait]
impl McpTool for RenameCollectionTool {
    fn name(&self) -> &'static str {
        "milvus_rename_collection"
    }

    fn description(&self) -> &'static str {
        "Rename an existing collection."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::object()
            .with_required_property(
                "old_collection_name",
                JsonSchema::string_with_description("Current name of the collection to rename."),
            )
            .with_required_property(
                "new_collection_name",
                JsonSchema::string_with_description("New name for the collection."),
            )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let old_name = args.require_str("old_collection_name")?;
        let new_name = args.require_str("new_collection_name")?;

        client
            .rename_collection(old_name, new_name)
            .await
            .map_err(|e| ToolError::context("Failed to rename collection: ", e))?;

        Ok(CallToolResult::text(format!(
            "Collection '{}' renamed to '{}' successfully",
            old_name, new_name
        )))
    }
}

pub struct GetCollectionInfoTool;

#[async_trait]
impl McpTool for GetCollectionInfoTool {
    fn name(&self) -> &'static str {
        "milvus_get_collection_info"
    }

    fn description(&self) -> &'static str {
        "Lists detailed information about a specific collection"
    }

    fn input_schema(&self) -> ToolSchema {
        collection_name_schema("Name of the collection to describe.")
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;

        let info = client.describe_collection(collection_name).await?;
        let formatted = serde_json::to_string_pretty(&info)
            .map_err(|e| ToolError::context("Failed to format collection info: ", e))?;

        Ok(CallToolResult::text(format!("Collection information:\n{}", formatted)))
    }
}

pub struct LoadCollectionTool;

#[async_trait]
impl McpTool for LoadCollectionTool {
    fn name(&self) -> &'static str {
        "milvus_load_collection"
    }

    fn description(&self) -> &'static str {
        "Load a collection into memory for search and query."
    }

    fn input_schema(&self) -> ToolSchema {
        collection_name_schema("Name of collection to load.").with_property(
            "replica_number",
            JsonSchema::string_with_description("Number of replicas (default: 1).").with_default("1"),
        )
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;
        let replica_number = args.get_u32("replica_number", 1);

        client
            .load_collection(collection_name)
            .await
            .map_err(|e| ToolError::context("Load collection failed: ", e))?;

        Ok(CallToolResult::text(format!(
            "Collection '{}' loaded successfully with {} replica(s)",
            collection_name, replica_number
        )))
    }
}

pub struct ReleaseCollectionTool;

#[async_trait]
impl McpTool for ReleaseCollectionTool {
    fn name(&self) -> &'static str {
        "milvus_release_collection"
    }

    fn description(&self) -> &'static str {
        "Release a collection from memory."
    }

    fn input_schema(&self) -> ToolSchema {
        collection_name_schema("Name of collection to release.")
    }

    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult> {
        let client = ctx.client().await?;
        let collection_name = args.require_str("collection_name")?;

        client.release_collection(collection_name).await?;

        Ok(CallToolResult::text("Collection released successfully."))
    }
}
