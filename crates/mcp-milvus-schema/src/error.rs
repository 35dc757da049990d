//! Schema construction errors

use thiserror::Error;

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building or validating a collection schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema must contain at least one field")]
    NoFields,

    #[error("schema must have a primary key field")]
    NoPrimaryKey,

    #[error("schema contains duplicate field name '{0}'")]
    DuplicateField(String),

    #[error("schema must contain a 'fields' array")]
    MissingFields,

    #[error("schema description must be an object")]
    NotAnObject,

    /// A top-level collection (`fields`, `functions`) had the wrong shape
    #[error("'{0}' must be an array")]
    NotAnArray(&'static str),

    /// An element of `fields` or `functions` was not an object
    #[error("{kind} {index} must be an object")]
    ElementNotAnObject { kind: &'static str, index: usize },

    #[error("{kind} {index} missing required '{property}' property")]
    MissingProperty {
        kind: &'static str,
        index: usize,
        property: &'static str,
    },

    #[error("field {index} has unknown data type '{name}'")]
    UnknownDataType { index: usize, name: String },

    #[error("function {index} has unknown type '{name}'")]
    UnknownFunctionType { index: usize, name: String },

    #[error("function {index} {list} field {position} must be a string")]
    InvalidFieldName {
        index: usize,
        list: &'static str,
        position: usize,
    },

    #[error("invalid schema JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
