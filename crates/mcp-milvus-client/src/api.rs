//! Backend client traits
//!
//! A [`Connector`] opens connections; each connection is a [`MilvusClient`]
//! owned by exactly one session and closed when that session goes away.

use std::sync::Arc;

use async_trait::async_trait;
use mcp_milvus_schema::CollectionSchema;

use crate::error::ClientResult;
use crate::options::ClientOptions;
use crate::types::{CollectionInfo, IndexSpec, MutationResult, QueryRequest, Row, SearchRequest};

/// Operations available on one authenticated backend connection
#[async_trait]
pub trait MilvusClient: Send + Sync {
    /// Address this client is connected to
    fn address(&self) -> &str;

    /// Database currently selected
    fn database(&self) -> String;

    async fn list_databases(&self) -> ClientResult<Vec<String>>;

    async fn create_database(&self, name: &str) -> ClientResult<()>;

    /// Switch the database used by subsequent calls
    async fn use_database(&self, name: &str) -> ClientResult<()>;

    async fn list_collections(&self) -> ClientResult<Vec<String>>;

    /// Create a collection, then build the given indexes
    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
        indexes: &[IndexSpec],
    ) -> ClientResult<()>;

    async fn describe_collection(&self, name: &str) -> ClientResult<CollectionInfo>;

    async fn drop_collection(&self, name: &str) -> ClientResult<()>;

    async fn rename_collection(&self, old_name: &str, new_name: &str) -> ClientResult<()>;

    async fn load_collection(&self, name: &str) -> ClientResult<()>;

    async fn release_collection(&self, name: &str) -> ClientResult<()>;

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> ClientResult<()>;

    async fn drop_index(&self, collection: &str, index_name: &str) -> ClientResult<()>;

    async fn insert(
        &self,
        collection: &str,
        partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult>;

    async fn upsert(
        &self,
        collection: &str,
        partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult>;

    /// Delete entities matching `filter`, returning the reported delete count
    async fn delete(&self, collection: &str, filter: &str) -> ClientResult<u64>;

    async fn query(&self, request: &QueryRequest) -> ClientResult<Vec<Row>>;

    /// Hits for a single query vector, best first
    async fn search(&self, request: &SearchRequest) -> ClientResult<Vec<Row>>;

    /// Release the connection. Calls after the first are no-ops.
    async fn close(&self) -> ClientResult<()>;
}

/// Factory for backend connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open and verify a connection
    async fn connect(&self, options: ClientOptions) -> ClientResult<Arc<dyn MilvusClient>>;
}
