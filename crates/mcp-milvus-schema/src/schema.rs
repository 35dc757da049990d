//! Strongly-typed collection schema
//!
//! These are the values produced by [`crate::SchemaBuilder::build`]. They are
//! plain data: validation happens in the builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DataType, FunctionType};

/// Type parameter key holding a vector field's dimension
pub const DIM_KEY: &str = "dim";
/// Type parameter key holding a string field's maximum length
pub const MAX_LENGTH_KEY: &str = "max_length";

/// A validated collection schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub auto_id: bool,
    pub enable_dynamic_field: bool,
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub functions: Vec<FunctionSchema>,
}

impl CollectionSchema {
    /// The first field flagged as primary key
    pub fn primary_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.is_primary_key)
    }

    /// Name of the primary key field
    pub fn primary_field_name(&self) -> Option<&str> {
        self.primary_field().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single field of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_type: DataType,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Type parameters such as `dim` or `max_length`, always string-valued
    #[serde(default)]
    pub type_params: BTreeMap<String, String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data_type,
            is_primary_key: false,
            auto_id: false,
            nullable: false,
            type_params: BTreeMap::new(),
        }
    }

    pub fn type_param(&self, key: &str) -> Option<&str> {
        self.type_params.get(key).map(String::as_str)
    }

    /// Vector dimension, if the `dim` parameter is present and numeric
    pub fn dimension(&self) -> Option<u32> {
        self.type_param(DIM_KEY)?.trim().parse().ok()
    }

    /// Maximum string length, if the `max_length` parameter is present and numeric
    pub fn max_length(&self) -> Option<u32> {
        self.type_param(MAX_LENGTH_KEY)?.trim().parse().ok()
    }
}

/// A derived-value function (for example BM25 sparse embedding of a text field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub function_type: FunctionType,
    #[serde(default)]
    pub input_field_names: Vec<String>,
    #[serde(default)]
    pub output_field_names: Vec<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl FunctionSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        function_type: FunctionType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            function_type,
            input_field_names: Vec::new(),
            output_field_names: Vec::new(),
            params: BTreeMap::new(),
        }
    }
}
