//! Milvus tools
//!
//! One tool per backend operation. Every tool parameter is a string; JSON
//! payloads (schemas, rows, vectors, field lists) are passed JSON-encoded.

mod collections;
mod connector;
pub mod convert;
mod databases;
mod entities;
mod indexes;
mod search;

pub use collections::{
    CreateCollectionTool, DropCollectionTool, GetCollectionInfoTool, ListCollectionsTool,
    LoadCollectionTool, ReleaseCollectionTool, RenameCollectionTool,
};
pub use connector::ConnectorTool;
pub use databases::{CreateDatabaseTool, ListDatabasesTool, UseDatabaseTool};
pub use entities::{DeleteEntitiesTool, InsertDataTool, QueryTool, UpsertTool};
pub use indexes::{CreateIndexTool, DropIndexTool};
pub use search::VectorSearchTool;

use crate::registry::ToolRegistry;

/// Name of the tool that establishes a session's backend connection
pub const CONNECTOR_TOOL: &str = "milvus_connector";

/// Register every Milvus tool
pub fn register_all(registry: &mut ToolRegistry) {
    connector::register(registry);
    databases::register(registry);
    collections::register(registry);
    indexes::register(registry);
    entities::register(registry);
    search::register(registry);
}
