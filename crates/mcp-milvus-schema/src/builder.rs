//! Fluent schema builder
//!
//! ```rust
//! use mcp_milvus_schema::{DataType, FunctionType, SchemaBuilder};
//!
//! let mut builder = SchemaBuilder::new();
//! builder.with_dynamic_field(true);
//! builder.add_field("id", "primary key", DataType::Int64).with_primary_key(true);
//! builder.add_field("text", "", DataType::VarChar).with_max_length(1024);
//! builder.add_field("sparse", "", DataType::SparseFloatVector);
//! builder
//!     .add_function("bm25", "", FunctionType::Bm25)
//!     .with_input_fields(["text"])
//!     .with_output_fields(["sparse"]);
//!
//! let schema = builder.build().unwrap();
//! assert_eq!(schema.primary_field_name(), Some("id"));
//! ```

use std::collections::HashSet;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{CollectionSchema, DIM_KEY, FieldSchema, FunctionSchema, MAX_LENGTH_KEY};
use crate::types::{DataType, FunctionType};

/// Accumulates fields and functions; validation is deferred to [`SchemaBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    auto_id: bool,
    enable_dynamic_field: bool,
    fields: Vec<FieldSchema>,
    functions: Vec<FunctionSchema>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_id(&mut self, auto_id: bool) -> &mut Self {
        self.auto_id = auto_id;
        self
    }

    pub fn with_dynamic_field(&mut self, enable: bool) -> &mut Self {
        self.enable_dynamic_field = enable;
        self
    }

    /// Append a field and return a builder to configure it
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        data_type: DataType,
    ) -> FieldBuilder<'_> {
        let index = self.fields.len();
        self.fields.push(FieldSchema::new(name, description, data_type));
        FieldBuilder {
            field: &mut self.fields[index],
        }
    }

    /// Append a function and return a builder to configure it
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        function_type: FunctionType,
    ) -> FunctionBuilder<'_> {
        let index = self.functions.len();
        self.functions
            .push(FunctionSchema::new(name, description, function_type));
        FunctionBuilder {
            function: &mut self.functions[index],
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Validate and produce the schema.
    ///
    /// Requires at least one field, at least one primary key field and unique
    /// field names.
    pub fn build(&self) -> SchemaResult<CollectionSchema> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        if !self.fields.iter().any(|f| f.is_primary_key) {
            return Err(SchemaError::NoPrimaryKey);
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        Ok(CollectionSchema {
            auto_id: self.auto_id,
            enable_dynamic_field: self.enable_dynamic_field,
            fields: self.fields.clone(),
            functions: self.functions.clone(),
        })
    }
}

/// Configures the field most recently added with [`SchemaBuilder::add_field`]
#[derive(Debug)]
pub struct FieldBuilder<'a> {
    field: &'a mut FieldSchema,
}

impl FieldBuilder<'_> {
    pub fn with_primary_key(self, is_primary: bool) -> Self {
        self.field.is_primary_key = is_primary;
        self
    }

    pub fn with_auto_id(self, auto_id: bool) -> Self {
        self.field.auto_id = auto_id;
        self
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        self.field.nullable = nullable;
        self
    }

    pub fn with_dimension(self, dim: u32) -> Self {
        self.with_type_param(DIM_KEY, dim.to_string())
    }

    pub fn with_max_length(self, max_length: u32) -> Self {
        self.with_type_param(MAX_LENGTH_KEY, max_length.to_string())
    }

    /// Set a raw type parameter; later values for the same key win
    pub fn with_type_param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field.type_params.insert(key.into(), value.into());
        self
    }
}

/// Configures the function most recently added with [`SchemaBuilder::add_function`]
#[derive(Debug)]
pub struct FunctionBuilder<'a> {
    function: &'a mut FunctionSchema,
}

impl FunctionBuilder<'_> {
    pub fn with_input_fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function
            .input_field_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_output_fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function
            .output_field_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.function.params.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_fields() {
        let err = SchemaBuilder::new().build().unwrap_err();
        assert!(matches!(err, SchemaError::NoFields));
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn test_build_requires_primary_key() {
        let mut builder = SchemaBuilder::new();
        builder.add_field("id", "", DataType::Int64);
        builder.add_field("vector", "", DataType::FloatVector).with_dimension(8);

        let err = builder.build().unwrap_err();
        assert!(matches!(err, SchemaError::NoPrimaryKey));
        assert!(err.to_string().contains("primary key"));
    }

    #[test]
    fn test_build_rejects_duplicate_names() {
        let mut builder = SchemaBuilder::new();
        builder.add_field("id", "", DataType::Int64).with_primary_key(true);
        builder.add_field("id", "", DataType::VarChar);

        let err = builder.build().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(ref name) if name == "id"));
    }

    #[test]
    fn test_fluent_configuration() {
        let mut builder = SchemaBuilder::new();
        builder.with_auto_id(true).with_dynamic_field(true);
        builder
            .add_field("id", "Primary key", DataType::Int64)
            .with_primary_key(true)
            .with_auto_id(true);
        builder
            .add_field("title", "", DataType::VarChar)
            .with_max_length(512)
            .with_nullable(true);
        builder
            .add_field("embedding", "", DataType::FloatVector)
            .with_dimension(768)
            .with_type_param("mmap_enabled", "true");
        builder
            .add_function("bm25", "sparse text", FunctionType::Bm25)
            .with_input_fields(vec!["title".to_string()])
            .with_output_fields(["embedding"])
            .with_param("k1", "1.2");

        let schema = builder.build().unwrap();
        assert!(schema.auto_id);
        assert!(schema.enable_dynamic_field);
        assert_eq!(schema.fields.len(), 3);

        let id = schema.primary_field().unwrap();
        assert!(id.auto_id);
        assert_eq!(id.description, "Primary key");

        let title = schema.field("title").unwrap();
        assert!(title.nullable);
        assert_eq!(title.max_length(), Some(512));

        let embedding = schema.field("embedding").unwrap();
        assert_eq!(embedding.dimension(), Some(768));
        assert_eq!(embedding.type_param("mmap_enabled"), Some("true"));

        let function = &schema.functions[0];
        assert_eq!(function.function_type, FunctionType::Bm25);
        assert_eq!(function.input_field_names, vec!["title"]);
        assert_eq!(function.output_field_names, vec!["embedding"]);
        assert_eq!(function.params.get("k1").map(String::as_str), Some("1.2"));
    }

    #[test]
    fn test_build_is_repeatable() {
        let mut builder = SchemaBuilder::new();
        builder.add_field("pk", "", DataType::VarChar).with_primary_key(true);

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first, second);
    }
}
