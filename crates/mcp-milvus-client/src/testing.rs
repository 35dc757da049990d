//! In-memory fakes for tests (enabled with the `test-utils` feature)
//!
//! [`FakeConnector`] hands out [`FakeClient`]s and remembers every one of
//! them, so tests can check which connections were opened and closed.
//! [`FakeClient`] keeps databases, collections and rows in memory; filter
//! expressions are recorded but not evaluated.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mcp_milvus_schema::CollectionSchema;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::api::{Connector, MilvusClient};
use crate::error::{ClientError, ClientResult};
use crate::options::{ClientOptions, DEFAULT_DATABASE};
use crate::types::{CollectionInfo, IndexInfo, IndexSpec, MutationResult, QueryRequest, Row, SearchRequest};

/// Connector producing [`FakeClient`]s
#[derive(Debug, Default)]
pub struct FakeConnector {
    connects: AtomicUsize,
    fail_with: Mutex<Option<String>>,
    fail_close: AtomicBool,
    clients: Mutex<Vec<Arc<FakeClient>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful and failed connection attempts
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Make subsequent connection attempts fail with `message`
    pub fn fail_connects(&self, message: impl Into<String>) {
        *self.fail_with.lock() = Some(message.into());
    }

    pub fn succeed_connects(&self) {
        *self.fail_with.lock() = None;
    }

    /// Clients created from now on report an error from `close`
    pub fn fail_closes(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Every client handed out so far, oldest first
    pub fn clients(&self) -> Vec<Arc<FakeClient>> {
        self.clients.lock().clone()
    }

    /// Clients not yet closed
    pub fn open_clients(&self) -> usize {
        self.clients.lock().iter().filter(|c| !c.is_closed()).count()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, options: ClientOptions) -> ClientResult<Arc<dyn MilvusClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(ClientError::Api { code: 2, message });
        }

        let client = Arc::new(FakeClient::new(options));
        client
            .fail_close
            .store(self.fail_close.load(Ordering::SeqCst), Ordering::SeqCst);
        self.clients.lock().push(Arc::clone(&client));
        Ok(client)
    }
}

#[derive(Debug, Default, Clone)]
struct FakeCollection {
    info: CollectionInfo,
    rows: Vec<Row>,
}

/// In-memory stand-in for a backend connection
#[derive(Debug)]
pub struct FakeClient {
    options: ClientOptions,
    db_name: Mutex<String>,
    databases: Mutex<Vec<String>>,
    collections: Mutex<HashMap<String, FakeCollection>>,
    filters: Mutex<Vec<String>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    fail_close: AtomicBool,
}

impl FakeClient {
    pub fn new(options: ClientOptions) -> Self {
        let mut databases = vec![DEFAULT_DATABASE.to_string()];
        if options.db_name != DEFAULT_DATABASE {
            databases.push(options.db_name.clone());
        }
        Self {
            db_name: Mutex::new(options.db_name.clone()),
            options,
            databases: Mutex::new(databases),
            collections: Mutex::new(HashMap::new()),
            filters: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Filter expressions received by query, search and delete
    pub fn filters(&self) -> Vec<String> {
        self.filters.lock().clone()
    }

    /// Rows stored in `collection`
    pub fn rows(&self, collection: &str) -> Vec<Row> {
        self.collections
            .lock()
            .get(&self.key(collection))
            .map(|c| c.rows.clone())
            .unwrap_or_default()
    }

    fn key(&self, collection: &str) -> String {
        format!("{}/{}", self.db_name.lock(), collection)
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    fn with_collection<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut FakeCollection) -> T,
    ) -> ClientResult<T> {
        self.ensure_open()?;
        let key = self.key(name);
        let mut collections = self.collections.lock();
        let collection = collections
            .get_mut(&key)
            .ok_or_else(|| ClientError::CollectionNotFound(name.to_string()))?;
        Ok(f(collection))
    }
}

fn project(row: &Row, output_fields: &[String]) -> Row {
    if output_fields.is_empty() {
        return row.clone();
    }
    row.iter()
        .filter(|(k, _)| output_fields.iter().any(|f| f == *k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[async_trait]
impl MilvusClient for FakeClient {
    fn address(&self) -> &str {
        &self.options.address
    }

    fn database(&self) -> String {
        self.db_name.lock().clone()
    }

    async fn list_databases(&self) -> ClientResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.databases.lock().clone())
    }

    async fn create_database(&self, name: &str) -> ClientResult<()> {
        self.ensure_open()?;
        let mut databases = self.databases.lock();
        if databases.iter().any(|db| db == name) {
            return Err(ClientError::Api {
                code: 65535,
                message: format!("database already exist: {}", name),
            });
        }
        databases.push(name.to_string());
        Ok(())
    }

    async fn use_database(&self, name: &str) -> ClientResult<()> {
        self.ensure_open()?;
        if !self.databases.lock().iter().any(|db| db == name) {
            return Err(ClientError::DatabaseNotFound(name.to_string()));
        }
        *self.db_name.lock() = name.to_string();
        Ok(())
    }

    async fn list_collections(&self) -> ClientResult<Vec<String>> {
        self.ensure_open()?;
        let prefix = format!("{}/", self.db_name.lock());
        let mut names: Vec<String> = self
            .collections
            .lock()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
        indexes: &[IndexSpec],
    ) -> ClientResult<()> {
        self.ensure_open()?;
        let key = self.key(name);
        {
            let mut collections = self.collections.lock();
            if collections.contains_key(&key) {
                return Err(ClientError::Api {
                    code: 65535,
                    message: format!("collection already exists: {}", name),
                });
            }
            collections.insert(
                key,
                FakeCollection {
                    info: CollectionInfo::from_schema(name, schema),
                    rows: Vec::new(),
                },
            );
        }
        for index in indexes {
            self.create_index(name, index).await?;
        }
        Ok(())
    }

    async fn describe_collection(&self, name: &str) -> ClientResult<CollectionInfo> {
        self.with_collection(name, |c| c.info.clone())
    }

    async fn drop_collection(&self, name: &str) -> ClientResult<()> {
        self.ensure_open()?;
        let key = self.key(name);
        self.collections
            .lock()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| ClientError::CollectionNotFound(name.to_string()))
    }

    async fn rename_collection(&self, old_name: &str, new_name: &str) -> ClientResult<()> {
        self.ensure_open()?;
        let (old_key, new_key) = (self.key(old_name), self.key(new_name));
        let mut collections = self.collections.lock();
        let mut collection = collections
            .remove(&old_key)
            .ok_or_else(|| ClientError::CollectionNotFound(old_name.to_string()))?;
        collection.info.collection_name = new_name.to_string();
        collections.insert(new_key, collection);
        Ok(())
    }

    async fn load_collection(&self, name: &str) -> ClientResult<()> {
        self.with_collection(name, |c| c.info.load = "LoadStateLoaded".to_string())
    }

    async fn release_collection(&self, name: &str) -> ClientResult<()> {
        self.with_collection(name, |c| c.info.load = "LoadStateNotLoad".to_string())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> ClientResult<()> {
        self.with_collection(collection, |c| {
            c.info.indexes.push(IndexInfo {
                field_name: index.field_name.clone(),
                index_name: index.effective_name().to_string(),
                metric_type: index.metric_type.clone(),
            });
        })
    }

    async fn drop_index(&self, collection: &str, index_name: &str) -> ClientResult<()> {
        self.with_collection(collection, |c| {
            let before = c.info.indexes.len();
            c.info.indexes.retain(|i| i.index_name != index_name);
            before != c.info.indexes.len()
        })?
        .then_some(())
        .ok_or_else(|| ClientError::Api {
            code: 65535,
            message: format!("index not found: {}", index_name),
        })
    }

    async fn insert(
        &self,
        collection: &str,
        _partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult> {
        self.with_collection(collection, |c| {
            let start = c.rows.len();
            let ids = (start..start + rows.len()).map(|i| json!(i)).collect();
            let count = rows.len() as u64;
            c.rows.extend(rows);
            MutationResult { count, ids }
        })
    }

    async fn upsert(
        &self,
        collection: &str,
        partition: Option<&str>,
        rows: Vec<Row>,
    ) -> ClientResult<MutationResult> {
        self.insert(collection, partition, rows).await
    }

    async fn delete(&self, collection: &str, filter: &str) -> ClientResult<u64> {
        self.filters.lock().push(filter.to_string());
        self.with_collection(collection, |_| 0)
    }

    async fn query(&self, request: &QueryRequest) -> ClientResult<Vec<Row>> {
        self.filters.lock().push(request.filter.clone());
        self.with_collection(&request.collection_name, |c| {
            c.rows
                .iter()
                .take(request.limit as usize)
                .map(|row| project(row, &request.output_fields))
                .collect()
        })
    }

    async fn search(&self, request: &SearchRequest) -> ClientResult<Vec<Row>> {
        if let Some(filter) = &request.filter {
            self.filters.lock().push(filter.clone());
        }
        self.with_collection(&request.collection_name, |c| {
            c.rows
                .iter()
                .take(request.limit as usize)
                .enumerate()
                .map(|(i, row)| {
                    let mut hit = project(row, &request.output_fields);
                    hit.insert("id".to_string(), row.get("id").cloned().unwrap_or(json!(i)));
                    hit.insert("distance".to_string(), Value::from(i as f64 * 0.1));
                    hit
                })
                .collect()
        })
    }

    async fn close(&self) -> ClientResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(ClientError::UnexpectedResponse(
                "connection reset while closing".to_string(),
            ));
        }
        Ok(())
    }
}
