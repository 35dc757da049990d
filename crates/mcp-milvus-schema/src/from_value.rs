//! Schema construction from loosely-typed JSON descriptions
//!
//! Tool callers describe collections as JSON objects, for example:
//!
//! ```json
//! {
//!   "auto_id": false,
//!   "enable_dynamic_field": true,
//!   "fields": [
//!     {"name": "id", "data_type": "Int64", "is_primary": true},
//!     {"name": "vector", "data_type": "float_vector", "type_params": {"dim": "128"}}
//!   ],
//!   "functions": [
//!     {"name": "bm25", "type": "BM25", "input_fields": ["text"], "output_fields": ["sparse"]}
//!   ]
//! }
//! ```
//!
//! Every required property is checked with an error naming the offending
//! index and property; the result then goes through [`SchemaBuilder::build`].

use serde_json::{Map, Value};
use tracing::debug;

use crate::builder::SchemaBuilder;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::CollectionSchema;
use crate::types::{DataType, FunctionType};

/// Parse a JSON string and build the schema it describes
pub fn build_schema_from_str(json: &str) -> SchemaResult<CollectionSchema> {
    let value: Value = serde_json::from_str(json)?;
    build_schema_from_value(&value)
}

/// Build a schema from a JSON object description
pub fn build_schema_from_value(value: &Value) -> SchemaResult<CollectionSchema> {
    let description = value.as_object().ok_or(SchemaError::NotAnObject)?;
    build_schema_from_map(description)
}

/// Build a schema from an already-decoded JSON object
pub fn build_schema_from_map(description: &Map<String, Value>) -> SchemaResult<CollectionSchema> {
    let mut builder = SchemaBuilder::new();

    if let Some(auto_id) = description.get("auto_id").and_then(Value::as_bool) {
        builder.with_auto_id(auto_id);
    }
    if let Some(enable) = description
        .get("enable_dynamic_field")
        .and_then(Value::as_bool)
    {
        builder.with_dynamic_field(enable);
    }

    let fields = description
        .get("fields")
        .ok_or(SchemaError::MissingFields)?
        .as_array()
        .ok_or(SchemaError::NotAnArray("fields"))?;

    for (index, field) in fields.iter().enumerate() {
        add_field(&mut builder, index, field)?;
    }

    if let Some(functions) = description.get("functions") {
        let functions = functions
            .as_array()
            .ok_or(SchemaError::NotAnArray("functions"))?;
        for (index, function) in functions.iter().enumerate() {
            add_function(&mut builder, index, function)?;
        }
    }

    debug!(fields = builder.field_count(), "Building collection schema from description");
    builder.build()
}

fn add_field(builder: &mut SchemaBuilder, index: usize, value: &Value) -> SchemaResult<()> {
    let field = value
        .as_object()
        .ok_or(SchemaError::ElementNotAnObject { kind: "field", index })?;

    let name = required_str(field, "field", index, &["name"])?;
    let type_name = required_str(field, "field", index, &["data_type", "type"])?;
    let data_type = DataType::from_name(type_name);
    if data_type.is_none() {
        return Err(SchemaError::UnknownDataType {
            index,
            name: type_name.to_string(),
        });
    }
    let description = optional_str(field, "description");

    let mut field_builder = builder.add_field(name, description, data_type);

    if first_bool(field, &["is_primary", "is_primary_key"]) == Some(true) {
        field_builder = field_builder.with_primary_key(true);
    }
    if let Some(auto_id) = field.get("auto_id").and_then(Value::as_bool) {
        field_builder = field_builder.with_auto_id(auto_id);
    }
    if let Some(nullable) = field.get("nullable").and_then(Value::as_bool) {
        field_builder = field_builder.with_nullable(nullable);
    }
    if let Some(dim) = first_u32(field, &["dimension", "dim"]) {
        field_builder = field_builder.with_dimension(dim);
    }
    if let Some(max_length) = first_u32(field, &["max_length"]) {
        field_builder = field_builder.with_max_length(max_length);
    }
    if let Some(params) = field.get("type_params").and_then(Value::as_object) {
        for (key, value) in params {
            field_builder = field_builder.with_type_param(key.clone(), param_string(value));
        }
    }

    Ok(())
}

fn add_function(builder: &mut SchemaBuilder, index: usize, value: &Value) -> SchemaResult<()> {
    let function = value
        .as_object()
        .ok_or(SchemaError::ElementNotAnObject { kind: "function", index })?;

    let name = required_str(function, "function", index, &["name"])?;
    let type_name = required_str(function, "function", index, &["type"])?;
    let function_type = FunctionType::from_name(type_name);
    if function_type.is_unknown() {
        return Err(SchemaError::UnknownFunctionType {
            index,
            name: type_name.to_string(),
        });
    }
    let description = optional_str(function, "description");

    let inputs = field_names(function, index, "input", &["input_fields", "input_field_names"])?;
    let outputs = field_names(function, index, "output", &["output_fields", "output_field_names"])?;

    let mut function_builder = builder
        .add_function(name, description, function_type)
        .with_input_fields(inputs)
        .with_output_fields(outputs);

    if let Some(params) = function.get("params").and_then(Value::as_object) {
        for (key, value) in params {
            function_builder = function_builder.with_param(key.clone(), param_string(value));
        }
    }

    Ok(())
}

/// First present key wins; its value must be a string
fn required_str<'a>(
    object: &'a Map<String, Value>,
    kind: &'static str,
    index: usize,
    keys: &[&'static str],
) -> SchemaResult<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .and_then(Value::as_str)
        .ok_or(SchemaError::MissingProperty {
            kind,
            index,
            property: keys[0],
        })
}

fn optional_str<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn first_bool(object: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_bool))
}

/// Numbers are accepted as JSON numbers or numeric strings; anything else is ignored
fn first_u32(object: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn field_names(
    function: &Map<String, Value>,
    index: usize,
    list: &'static str,
    keys: &[&str],
) -> SchemaResult<Vec<String>> {
    let Some(names) = keys
        .iter()
        .find_map(|key| function.get(*key).and_then(Value::as_array))
    else {
        return Ok(Vec::new());
    };

    names
        .iter()
        .enumerate()
        .map(|(position, name)| {
            name.as_str()
                .map(str::to_string)
                .ok_or(SchemaError::InvalidFieldName {
                    index,
                    list,
                    position,
                })
        })
        .collect()
}

/// Type and function parameters travel as strings
fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
