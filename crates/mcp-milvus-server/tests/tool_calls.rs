//! End-to-end tool calls through the dispatcher against the in-memory backend

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcp_milvus_client::testing::FakeConnector;
use mcp_milvus_server::McpServer;
use mcp_milvus_server::middleware::builtins::{MISSING_SESSION_MESSAGE, NOT_CONNECTED_MESSAGE};
use mcp_milvus_server::middleware::{MiddlewareError, ToolCallContext, ToolMiddleware};
use mcp_milvus_session::{SessionManager, SessionManagerConfig};
use serde_json::{Value, json};

const SCHEMA: &str = r#"{
    "auto_id": false,
    "enable_dynamic_field": true,
    "fields": [
        {"name": "id", "data_type": "Int64", "is_primary_key": true},
        {"name": "title", "data_type": "VarChar", "max_length": 64},
        {"name": "vector", "data_type": "FloatVector", "dim": 2}
    ]
}"#;

struct Harness {
    server: McpServer,
    sessions: SessionManager,
    connector: Arc<FakeConnector>,
}

impl Harness {
    fn new() -> Self {
        Self::with_server(McpServer::new)
    }

    fn with_server(build: impl FnOnce(SessionManager) -> McpServer) -> Self {
        let connector = Arc::new(FakeConnector::new());
        let sessions = SessionManager::new(SessionManagerConfig::default(), connector.clone());
        Self {
            server: build(sessions.clone()),
            sessions,
            connector,
        }
    }

    /// Raw `tools/call` result
    async fn call(&self, session_id: &str, tool: &str, arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        });
        let response = self
            .server
            .handle_message(session_id, &request.to_string())
            .await
            .expect("request must be answered");
        assert!(!response.is_error(), "protocol error: {:?}", response.error);
        response.result.unwrap()
    }

    async fn call_ok(&self, session_id: &str, tool: &str, arguments: Value) -> String {
        let result = self.call(session_id, tool, arguments).await;
        assert_eq!(result.get("isError"), None, "tool failed: {}", result);
        result["content"][0]["text"].as_str().unwrap().to_string()
    }

    async fn call_err(&self, session_id: &str, tool: &str, arguments: Value) -> String {
        let result = self.call(session_id, tool, arguments).await;
        assert_eq!(result["isError"], true, "tool succeeded: {}", result);
        result["content"][0]["text"].as_str().unwrap().to_string()
    }

    async fn connect(&self, session_id: &str) {
        let text = self
            .call_ok(
                session_id,
                "milvus_connector",
                json!({"address": "http://localhost:19530", "token": "root:Milvus"}),
            )
            .await;
        assert_eq!(text, "Connected to Milvus successfully, database: default");
    }

    async fn create_docs(&self, session_id: &str) {
        let text = self
            .call_ok(
                session_id,
                "milvus_create_collection",
                json!({
                    "collection_name": "docs",
                    "collection_schema": SCHEMA,
                    "index_params": r#"[{"field_name": "vector", "index_type": "AUTOINDEX", "metric_type": "COSINE", "params": {}}]"#
                }),
            )
            .await;
        assert_eq!(text, "Collection 'docs' created successfully with 3 fields");
    }

    async fn insert_docs(&self, session_id: &str) {
        let text = self
            .call_ok(
                session_id,
                "milvus_insert_data",
                json!({
                    "collection_name": "docs",
                    "data": r#"[{"id": 1, "title": "a", "vector": [0.1, 0.2]}, {"id": 2, "title": "b", "vector": [0.3, 0.4]}]"#
                }),
            )
            .await;
        assert_eq!(text, "Inserted Count: 2");
    }
}

#[tokio::test]
async fn test_calls_rejected_before_connecting() {
    let harness = Harness::new();

    let text = harness.call_err("s1", "milvus_list_collections", json!({})).await;
    assert_eq!(text, NOT_CONNECTED_MESSAGE);

    let text = harness.call_err("", "milvus_connector", json!({"address": "http://localhost:19530"})).await;
    assert_eq!(text, MISSING_SESSION_MESSAGE);
    assert_eq!(harness.connector.connect_count(), 0);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let harness = Harness::new();
    harness.connect("s1").await;

    harness.call_ok("s1", "milvus_list_databases", json!({})).await;
    let text = harness.call_err("s2", "milvus_list_databases", json!({})).await;
    assert_eq!(text, NOT_CONNECTED_MESSAGE);
    assert_eq!(harness.sessions.size(), 1);
}

#[tokio::test]
async fn test_connector_errors() {
    let harness = Harness::new();

    let text = harness
        .call_err("s1", "milvus_connector", json!({"address": "http://localhost:19530", "token": "nocolon"}))
        .await;
    assert_eq!(
        text,
        "failed to parse milvus config: invalid token format, e.g. username:password"
    );

    let text = harness.call_err("s1", "milvus_connector", json!({"token": "root:Milvus"})).await;
    assert_eq!(text, "required argument \"address\" not found");

    harness.connector.fail_connects("connection refused");
    let text = harness
        .call_err("s1", "milvus_connector", json!({"address": "http://localhost:19530"}))
        .await;
    assert!(text.starts_with("failed to create milvus client: "), "{}", text);
    assert!(text.contains("connection refused"));
    assert_eq!(harness.sessions.size(), 0);
}

#[tokio::test]
async fn test_reconnect_replaces_backend_connection() {
    let harness = Harness::new();
    harness.connect("s1").await;

    let text = harness
        .call_ok(
            "s1",
            "milvus_connector",
            json!({"address": "http://localhost:19530", "db_name": "analytics"}),
        )
        .await;
    assert_eq!(text, "Connected to Milvus successfully, database: analytics");
    assert_eq!(harness.connector.connect_count(), 2);
    assert_eq!(harness.connector.open_clients(), 1);
    assert_eq!(harness.sessions.size(), 1);
}

#[tokio::test]
async fn test_database_tools() {
    let harness = Harness::new();
    harness.connect("s1").await;

    let text = harness
        .call_ok("s1", "milvus_create_database", json!({"database_name": "analytics"}))
        .await;
    assert_eq!(text, "Database 'analytics' created successfully");

    let text = harness.call_ok("s1", "milvus_list_databases", json!({})).await;
    assert_eq!(text, "Databases: [default analytics]");

    let text = harness
        .call_ok("s1", "milvus_use_database", json!({"database_name": "analytics"}))
        .await;
    assert_eq!(text, "Successfully switched to database: analytics");

    let text = harness
        .call_err("s1", "milvus_create_database", json!({"database_name": "analytics"}))
        .await;
    assert!(text.starts_with("Failed to create database: "), "{}", text);
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness.create_docs("s1").await;

    let text = harness.call_ok("s1", "milvus_list_collections", json!({})).await;
    assert_eq!(text, "Collections in database:\ndocs");

    let text = harness
        .call_ok("s1", "milvus_get_collection_info", json!({"collection_name": "docs"}))
        .await;
    let info: Value = serde_json::from_str(text.strip_prefix("Collection information:\n").unwrap()).unwrap();
    assert_eq!(info["collectionName"], "docs");
    assert_eq!(info["fields"].as_array().unwrap().len(), 3);
    assert_eq!(info["indexes"][0]["fieldName"], "vector");

    let text = harness
        .call_ok("s1", "milvus_load_collection", json!({"collection_name": "docs", "replica_number": "2"}))
        .await;
    assert_eq!(text, "Collection 'docs' loaded successfully with 2 replica(s)");

    let text = harness
        .call_ok("s1", "milvus_release_collection", json!({"collection_name": "docs"}))
        .await;
    assert_eq!(text, "Collection released successfully.");

    let text = harness
        .call_ok(
            "s1",
            "milvus_rename_collection",
            json!({"old_collection_name": "docs", "new_collection_name": "articles"}),
        )
        .await;
    assert_eq!(text, "Collection 'docs' renamed to 'articles' successfully");

    let text = harness
        .call_ok("s1", "milvus_drop_collection", json!({"collection_name": "articles"}))
        .await;
    assert_eq!(text, "Collection 'articles' dropped successfully");

    let text = harness
        .call_err("s1", "milvus_drop_collection", json!({"collection_name": "articles"}))
        .await;
    assert_eq!(text, "Failed to drop collection: collection not found: articles");
}

#[tokio::test]
async fn test_create_collection_validation() {
    let harness = Harness::new();
    harness.connect("s1").await;

    let text = harness
        .call_err("s1", "milvus_create_collection", json!({"collection_name": "docs", "collection_schema": "{"}))
        .await;
    assert!(text.starts_with("Invalid collection_schema JSON: "), "{}", text);

    let text = harness
        .call_err(
            "s1",
            "milvus_create_collection",
            json!({"collection_name": "docs", "collection_schema": r#"{"fields": []}"#}),
        )
        .await;
    assert_eq!(text, "Failed to build schema: schema must contain at least one field");

    let text = harness
        .call_err(
            "s1",
            "milvus_create_collection",
            json!({"collection_name": "docs", "collection_schema": SCHEMA, "index_params": "not json"}),
        )
        .await;
    assert!(text.starts_with("Invalid index_params JSON: "), "{}", text);

    // Nothing was created by the rejected calls
    let text = harness.call_ok("s1", "milvus_list_collections", json!({})).await;
    assert_eq!(text, "Collections in database:\n");
}

#[tokio::test]
async fn test_index_tools() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness
        .call_ok(
            "s1",
            "milvus_create_collection",
            json!({"collection_name": "docs", "collection_schema": SCHEMA}),
        )
        .await;

    let text = harness
        .call_ok(
            "s1",
            "milvus_create_index",
            json!({
                "collection_name": "docs",
                "field_name": "vector",
                "index_type": "IVF_FLAT",
                "metric_type": "L2",
                "params": r#"{"nlist": 128}"#
            }),
        )
        .await;
    assert_eq!(text, "Index created successfully for collection 'docs', field 'vector'");

    let text = harness
        .call_err(
            "s1",
            "milvus_create_index",
            json!({
                "collection_name": "docs",
                "field_name": "vector",
                "index_type": "IVF_FLAT",
                "metric_type": "L2",
                "params": "{nlist}"
            }),
        )
        .await;
    assert!(text.starts_with("Invalid params JSON: "), "{}", text);

    let text = harness
        .call_ok("s1", "milvus_drop_index", json!({"collection_name": "docs", "index_name": "vector"}))
        .await;
    assert_eq!(text, "Index 'vector' dropped successfully from collection 'docs'");

    let text = harness
        .call_err("s1", "milvus_drop_index", json!({"collection_name": "docs", "index_name": "vector"}))
        .await;
    assert!(text.starts_with("Failed to drop index: "), "{}", text);
}

#[tokio::test]
async fn test_insert_query_and_search() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness.create_docs("s1").await;
    harness.insert_docs("s1").await;

    let text = harness
        .call_ok(
            "s1",
            "milvus_query",
            json!({"collection_name": "docs", "filter_expr": "id > 0", "output_fields": r#"["title"]"#}),
        )
        .await;
    assert!(text.starts_with("Query results for 'id > 0' in collection 'docs':\n\nResults: "));
    assert!(text.contains("\"title\": \"a\""));
    assert!(!text.contains("vector"));

    let text = harness
        .call_ok(
            "s1",
            "milvus_vector_search",
            json!({"collection_name": "docs", "vector": "[0.1, 0.2]", "limit": "1", "output_fields": r#"["title"]"#}),
        )
        .await;
    assert!(text.starts_with("Vector search results for collection 'docs':\n\n"));
    assert!(text.contains("\"title\":\"a\""));
    assert!(!text.contains("\"title\":\"b\""));
    assert!(text.ends_with("}\n\n"));

    let client = &harness.connector.clients()[0];
    assert_eq!(client.filters(), vec!["id > 0".to_string()]);
}

#[tokio::test]
async fn test_search_without_hits() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness.create_docs("s1").await;

    let text = harness
        .call_ok("s1", "milvus_vector_search", json!({"collection_name": "docs", "vector": "[0.1, 0.2]"}))
        .await;
    assert_eq!(text, "Vector search results for collection 'docs':\n\nNo results found\n");

    let text = harness
        .call_err("s1", "milvus_vector_search", json!({"collection_name": "docs", "vector": "0.1"}))
        .await;
    assert!(text.starts_with("Invalid vector JSON: "), "{}", text);
}

#[tokio::test]
async fn test_insert_rejects_dimension_mismatch() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness.create_docs("s1").await;

    let text = harness
        .call_err(
            "s1",
            "milvus_insert_data",
            json!({"collection_name": "docs", "data": r#"[{"id": 3, "title": "c", "vector": [0.1]}]"#}),
        )
        .await;
    assert_eq!(
        text,
        "Data transformation failed: failed to convert field 'vector' at row 0: vector dimension mismatch: expected 2, got 1 elements"
    );
    assert!(harness.connector.clients()[0].rows("docs").is_empty());
}

#[tokio::test]
async fn test_upsert_and_delete() {
    let harness = Harness::new();
    harness.connect("s1").await;
    harness.create_docs("s1").await;

    let text = harness
        .call_err("s1", "milvus_upsert", json!({"collection_name": "docs", "data": "[]"}))
        .await;
    assert_eq!(text, "Data cannot be empty");

    let text = harness
        .call_ok(
            "s1",
            "milvus_upsert",
            json!({"collection_name": "docs", "data": r#"[{"id": 1, "title": "a", "vector": [1, 0]}]"#}),
        )
        .await;
    assert_eq!(text, "Upserted 1 records successfully. Upsert count: 1");

    let text = harness
        .call_ok("s1", "milvus_delete_entities", json!({"collection_name": "docs", "filter_expr": "id in [1]"}))
        .await;
    assert_eq!(text, "Delete result: 0");
}

struct RecordingMiddleware {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ToolMiddleware for RecordingMiddleware {
    async fn before_call(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError> {
        self.seen.lock().unwrap().push(ctx.tool_name().to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_middleware_runs_after_auth() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recording = Arc::new(RecordingMiddleware { seen: Arc::clone(&seen) });
    let harness = Harness::with_server(move |sessions| {
        McpServer::builder(sessions)
            .with_milvus_tools()
            .middleware(recording)
            .build()
    });

    harness.call_err("s1", "milvus_list_collections", json!({})).await;
    harness.connect("s1").await;
    harness.call_ok("s1", "milvus_list_collections", json!({})).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["milvus_connector".to_string(), "milvus_list_collections".to_string()]
    );
}
