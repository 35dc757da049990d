//! # Milvus Backend Client
//!
//! The backend collaborator used by the session manager and tool handlers.
//!
//! - [`MilvusClient`] - operations on one authenticated connection
//! - [`Connector`] - factory that opens and verifies connections
//! - [`RestConnector`] / [`RestClient`] - implementation over the Milvus
//!   RESTful v2 API
//!
//! With the `test-utils` feature, the `testing` module provides in-memory
//! fakes for both traits.

pub mod api;
pub mod error;
pub mod options;
pub mod rest;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::{Connector, MilvusClient};
pub use error::{ClientError, ClientResult};
pub use options::{ClientOptions, DEFAULT_DATABASE};
pub use rest::{DEFAULT_REQUEST_TIMEOUT, RestClient, RestConnector};
pub use types::{
    CollectionInfo, FieldInfo, IndexInfo, IndexSpec, KeyValue, MutationResult, QueryRequest, Row,
    SearchRequest,
};
