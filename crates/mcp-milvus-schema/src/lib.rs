//! # Milvus Collection Schemas
//!
//! Translates loosely-typed collection descriptions into validated,
//! strongly-typed [`CollectionSchema`] values.
//!
//! Two entry points are provided:
//!
//! - [`SchemaBuilder`] - a fluent API for building schemas in code
//! - [`build_schema_from_value`] - construction from a JSON description, as
//!   received from MCP tool arguments
//!
//! Type names resolve case-insensitively and accept both concatenated and
//! underscore-separated spellings, so `"FloatVector"`, `"float_vector"` and
//! `"FLOAT_VECTOR"` all name [`DataType::FloatVector`].

pub mod builder;
pub mod error;
pub mod from_value;
pub mod schema;
pub mod types;

pub use builder::{FieldBuilder, FunctionBuilder, SchemaBuilder};
pub use error::{SchemaError, SchemaResult};
pub use from_value::{build_schema_from_map, build_schema_from_str, build_schema_from_value};
pub use schema::{CollectionSchema, DIM_KEY, FieldSchema, FunctionSchema, MAX_LENGTH_KEY};
pub use types::{DataType, FunctionType};
