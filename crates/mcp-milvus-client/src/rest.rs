//! Milvus RESTful v2 client
//!
//! Every operation is a `POST {address}/v2/vectordb/{resource}/{action}` with
//! a JSON body carrying `dbName`. Responses use the envelope
//! `{"code": 0, "data": ...}`; a non-zero code carries a `message`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mcp_milvus_schema::{CollectionSchema, FieldSchema, FunctionSchema};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use url::Url;

use crate::api::{Connector, MilvusClient};
use crate::error::{ClientError, ClientResult};
use crate::options::ClientOptions;
use crate::types::{CollectionInfo, IndexSpec, MutationResult, QueryRequest, Row, SearchRequest};

/// Timeout applied to every backend request unless configured otherwise
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_PREFIX: &str = "v2/vectordb";

/// Opens [`RestClient`] connections sharing one HTTP connection pool
#[derive(Debug, Clone)]
pub struct RestConnector {
    http: Client,
}

impl RestConnector {
    pub fn new() -> ClientResult<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mcp-milvus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Connector for RestConnector {
    async fn connect(&self, options: ClientOptions) -> ClientResult<Arc<dyn MilvusClient>> {
        let client = RestClient::new(self.http.clone(), &options)?;
        // Probe so unreachable or unauthenticated backends fail here
        client.list_collections().await?;
        info!(address = %client.endpoint, db_name = %options.db_name, "Connected to Milvus");
        Ok(Arc::new(client))
    }
}

/// One authenticated connection to a Milvus server
#[derive(Debug)]
pub struct RestClient {
    http: Client,
    endpoint: String,
    token: Option<String>,
    db_name: parking_lot::RwLock<String>,
    closed: AtomicBool,
}

impl RestClient {
    pub fn new(http: Client, options: &ClientOptions) -> ClientResult<Self> {
        Ok(Self {
            http,
            endpoint: normalize_address(&options.address)?,
            token: options.bearer_token(),
            db_name: parking_lot::RwLock::new(options.db_name.clone()),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// Send one request and unwrap the response envelope, returning `data`
    async fn post(&self, path: &str, mut body: Value) -> ClientResult<Value> {
        self.ensure_open()?;
        if let Value::Object(map) = &mut body {
            map.entry("dbName")
                .or_insert_with(|| Value::String(self.database()));
        }

        let url = format!("{}/{}/{}", self.endpoint, API_PREFIX, path);
        debug!(%url, "Milvus request");

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response.json().await?;
        envelope.into_data()
    }
}

#[async_trait]
impl MilvusClient for RestClient {
    fn address(&self) -> &str {
        &self.endpoint
    }

    fn database(&self) -> String {
        self.db_name.read().clone()
    }

    async fn list_databases(&self) -> ClientResult<Vec<String>> {
        let data = self.post("databases/list", json!({})).await?;
        decode_list(data)
    }

    async fn create_database(&self, name: &str) -> ClientResult<()> {
        self.post("databases/create", json!({ "dbName": name }))
            .await?;
        Ok(())
    }

    async fn use_database(&self, name: &str) -> ClientResult<()> {
        let databases = self.list_databases().await?;
        if !databases.iter().any(|db| db == name) {
            return Err(ClientError::DatabaseNotFound(name.to_string()));
        }
        *self.db_name.write() = name.to_string();
        Ok(())
    }

    async fn list_collections(&self) -> ClientResult<Vec<String>> {
        let data = self.post("collections/list", json!({})).await?;
        decode_list(data)
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
        indexes: &[IndexSpec],
    ) -> ClientResult<()> {
        self.post("collections/create", create_collection_body(name, schema))
            .await?;
        for index in indexes {
            self.create_index(name, index).await?;
        }
        Ok(())
    }

    async fn describe_collection(&self, name: &str) -> ClientResult<CollectionInfo> {
        let data = self
            .post("collections/describe", json!({ "collectionName": name }))
            .await?;
        if data.is_null() {
            return Err(ClientError::CollectionNotFound(name.to_string()));
        }
        Ok(serde_json::from_value(data)?)
    }

    async fn drop_collection(&self, name: &str) -> ClientResult<()> {
        self.post("collections/drop", json!({ "collectionName": name }))
            .await?;
        Ok(())
    }

    async fn rename_collection(&self, old_name: &str, new_name: &str) -> ClientResult<()> {
        self.post(
            "collections/rename",
            json!({ "collectionName": old_name, "newCollectionName": new_name }),
        )
        .await?;
        Ok(())
    }

    async fn load_collection(&self, name: &str) -> ClientResult<()> {
        self.post("collections/load", json!({ "collectionName": name }))
            .await?;
        Ok(())
    }

    async fn release_collection(&self, name: &str) -> ClientResult<()> {
        self.post("collections/release", json!({ "collectionName": name }))
            .await?;
        Ok(())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> ClientResult<()> {
        self.post(
            "indexes/create",
            json!({
                "collectionName": collection,
                "indexParams": [index_params(index)],
            }),
        )
        .await?;
        Ok(())
    }

    async fn drop_index(&self, collection: &str, index_name: &str) -> ClientResult<()> {
        self.post(
            "indexes/drop",
            json!({ "collectionName": collection, "indexName": index_name }),
        )
        .await?;
        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult> {
        let data = self
            .post("entities/insert", mutation_body(collection, partition, rows))
            .await?;
        Ok(mutation_result(&data, "insertCount", "insertIds"))
    }

    async fn upsert(
        &self,
        collection: &str,
        partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult> {
        let data = self
            .post("entities/upsert", mutation_body(collection, partition, rows))
            .await?;
        Ok(mutation_result(&data, "upsertCount", "upsertIds"))
    }

    async fn delete(&self, collection: &str, filter: &str) -> ClientResult<u64> {
        let data = self
            .post(
                "entities/delete",
                json!({ "collectionName": collection, "filter": filter }),
            )
            .await?;
        Ok(data.get("deleteCount").and_then(Value::as_u64).unwrap_or(0))
    }

    async fn query(&self, request: &QueryRequest) -> ClientResult<Vec<Row>> {
        let mut body = json!({
            "collectionName": request.collection_name,
            "filter": request.filter,
            "limit": request.limit,
        });
        if !request.output_fields.is_empty() {
            body["outputFields"] = json!(request.output_fields);
        }
        let data = self.post("entities/query", body).await?;
        decode_list(data)
    }

    async fn search(&self, request: &SearchRequest) -> ClientResult<Vec<Row>> {
        let data = self.post("entities/search", search_body(request)).await?;
        decode_list(data)
    }

    async fn close(&self) -> ClientResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(address = %self.endpoint, "Milvus client closed");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    fn into_data(self) -> ClientResult<Value> {
        if self.code != 0 {
            return Err(ClientError::Api {
                code: self.code,
                message: self.message,
            });
        }
        Ok(self.data)
    }
}

/// Accept `host:port` as well as full URLs; returns the base without a trailing slash
pub fn normalize_address(address: &str) -> ClientResult<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidAddress(address.to_string()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|_| ClientError::InvalidAddress(address.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ClientError::InvalidAddress(address.to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// A `null` data payload means an empty list
fn decode_list<T: serde::de::DeserializeOwned>(data: Value) -> ClientResult<Vec<T>> {
    if data.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(data)?)
}

fn create_collection_body(name: &str, schema: &CollectionSchema) -> Value {
    let fields: Vec<Value> = schema.fields.iter().map(field_body).collect();
    let mut schema_body = json!({
        "autoId": schema.auto_id || schema.fields.iter().any(|f| f.is_primary_key && f.auto_id),
        "enableDynamicField": schema.enable_dynamic_field,
        "fields": fields,
    });
    if !schema.functions.is_empty() {
        let functions: Vec<Value> = schema.functions.iter().map(function_body).collect();
        schema_body["functions"] = Value::Array(functions);
    }
    json!({ "collectionName": name, "schema": schema_body })
}

fn field_body(field: &FieldSchema) -> Value {
    let mut body = json!({
        "fieldName": field.name,
        "dataType": field.data_type.as_str(),
        "isPrimary": field.is_primary_key,
    });
    if !field.description.is_empty() {
        body["description"] = json!(field.description);
    }
    if field.nullable {
        body["nullable"] = json!(true);
    }
    if !field.type_params.is_empty() {
        body["elementTypeParams"] = json!(field.type_params);
    }
    body
}

fn function_body(function: &FunctionSchema) -> Value {
    json!({
        "name": function.name,
        "description": function.description,
        "type": function.function_type.as_str(),
        "inputFieldNames": function.input_field_names,
        "outputFieldNames": function.output_field_names,
        "params": function.params,
    })
}

fn index_params(index: &IndexSpec) -> Value {
    let mut params: Map<String, Value> = index
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    params.insert("index_type".to_string(), json!(index.index_type));
    json!({
        "fieldName": index.field_name,
        "indexName": index.effective_name(),
        "metricType": index.metric_type,
        "params": params,
    })
}

fn mutation_body(collection: &str, partition: Option<&str>, rows: Vec<Row>) -> Value {
    let mut body = json!({ "collectionName": collection, "data": rows });
    if let Some(partition) = partition.filter(|p| !p.is_empty()) {
        body["partitionName"] = json!(partition);
    }
    body
}

fn mutation_result(data: &Value, count_key: &str, ids_key: &str) -> MutationResult {
    let ids = data
        .get(ids_key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let count = data
        .get(count_key)
        .and_then(Value::as_u64)
        .unwrap_or(ids.len() as u64);
    MutationResult { count, ids }
}

fn search_body(request: &SearchRequest) -> Value {
    let mut body = json!({
        "collectionName": request.collection_name,
        "data": [request.vector],
        "annsField": request.vector_field,
        "limit": request.limit,
        "searchParams": { "metricType": request.metric_type },
    });
    if !request.output_fields.is_empty() {
        body["outputFields"] = json!(request.output_fields);
    }
    if let Some(filter) = request.filter.as_deref().filter(|f| !f.is_empty()) {
        body["filter"] = json!(filter);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_milvus_schema::{DataType, FunctionType, SchemaBuilder};

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("localhost:19530").unwrap(),
            "http://localhost:19530"
        );
        assert_eq!(
            normalize_address("https://milvus.example.com/").unwrap(),
            "https://milvus.example.com"
        );
        assert!(matches!(
            normalize_address("   "),
            Err(ClientError::InvalidAddress(_))
        ));
        assert!(matches!(
            normalize_address("ftp://host:21"),
            Err(ClientError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_envelope_error_code() {
        let envelope: Envelope =
            serde_json::from_value(json!({"code": 1800, "message": "user hasn't authenticated"}))
                .unwrap();
        let err = envelope.into_data().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Milvus error (code 1800): user hasn't authenticated"
        );
        assert!(err.is_api_error());
    }

    #[test]
    fn test_create_collection_body() {
        let mut builder = SchemaBuilder::new();
        builder.with_dynamic_field(true);
        builder
            .add_field("id", "pk", DataType::Int64)
            .with_primary_key(true)
            .with_auto_id(true);
        builder.add_field("text", "", DataType::VarChar).with_max_length(256);
        builder.add_field("sparse", "", DataType::SparseFloatVector);
        builder
            .add_function("bm25", "", FunctionType::Bm25)
            .with_input_fields(["text"])
            .with_output_fields(["sparse"]);
        let schema = builder.build().unwrap();

        let body = create_collection_body("docs", &schema);
        assert_eq!(body["collectionName"], "docs");
        assert_eq!(body["schema"]["autoId"], true);
        assert_eq!(body["schema"]["enableDynamicField"], true);
        assert_eq!(body["schema"]["fields"][0]["isPrimary"], true);
        assert_eq!(body["schema"]["fields"][1]["dataType"], "VarChar");
        assert_eq!(body["schema"]["fields"][1]["elementTypeParams"]["max_length"], "256");
        assert_eq!(body["schema"]["functions"][0]["type"], "BM25");
    }

    #[test]
    fn test_index_params_carry_index_type() {
        let spec = IndexSpec::new("vector", "IVF_FLAT", "L2").with_param("nlist", 128);
        let body = index_params(&spec);
        assert_eq!(body["indexName"], "vector");
        assert_eq!(body["metricType"], "L2");
        assert_eq!(body["params"]["index_type"], "IVF_FLAT");
        assert_eq!(body["params"]["nlist"], 128);
    }

    #[test]
    fn test_search_body() {
        let body = search_body(&SearchRequest {
            collection_name: "docs".to_string(),
            vector: vec![0.1, 0.2],
            vector_field: "embedding".to_string(),
            limit: 5,
            output_fields: vec![],
            metric_type: "COSINE".to_string(),
            filter: Some(String::new()),
        });
        assert_eq!(body["annsField"], "embedding");
        assert_eq!(body["searchParams"]["metricType"], "COSINE");
        assert!(body.get("filter").is_none());
        assert!(body.get("outputFields").is_none());
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_mutation_result_fallback_count() {
        let result = mutation_result(&json!({"insertIds": [1, 2, 3]}), "insertCount", "insertIds");
        assert_eq!(result.count, 3);
        let result = mutation_result(&json!({"upsertCount": 2}), "upsertCount", "upsertIds");
        assert_eq!(result.count, 2);
        assert!(result.ids.is_empty());
    }

    #[tokio::test]
    async fn test_https_connect_reaches_the_network() {
        let connector = RestConnector::with_timeout(Duration::from_secs(2)).unwrap();
        let err = match connector.connect(ClientOptions::new("https://127.0.0.1:9")).await {
            Ok(_) => panic!("nothing listens on port 9"),
            Err(err) => err,
        };
        let ClientError::Http(source) = &err else {
            panic!("expected an HTTP error, got {err}");
        };
        assert!(source.is_connect() || source.is_timeout(), "{source:?}");

        let mut chain: Option<&dyn std::error::Error> = Some(source);
        while let Some(cause) = chain {
            assert!(!cause.to_string().contains("scheme is not http"), "{cause}");
            chain = cause.source();
        }
    }

    #[tokio::test]
    async fn test_closed_client_rejects_requests() {
        let options = ClientOptions::new("localhost:19530");
        let client = RestClient::new(Client::new(), &options).unwrap();
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(matches!(
            client.list_collections().await,
            Err(ClientError::Closed)
        ));
    }
}
