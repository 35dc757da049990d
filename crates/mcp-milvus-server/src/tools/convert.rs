//! Row conversion against a collection description
//!
//! JSON numbers arrive untyped; each value is checked and narrowed to the
//! declared field type before insert or upsert. Vector lengths are checked
//! against the field dimension. Fields unknown to the collection are kept
//! as-is for the dynamic field.

use std::collections::HashMap;

use mcp_milvus_client::{CollectionInfo, Row};
use mcp_milvus_schema::DataType;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("data item at index {0} is not an object")]
    NotAnObject(usize),

    #[error("failed to convert field '{field}' at row {row}: {reason}")]
    Field {
        field: String,
        row: usize,
        reason: String,
    },
}

struct FieldTarget {
    data_type: DataType,
    dimension: Option<usize>,
}

/// Convert `data` (an array of JSON objects) into rows for `collection`
pub fn transform_rows(collection: &CollectionInfo, data: Vec<Value>) -> Result<Vec<Row>, ConversionError> {
    let targets: HashMap<&str, FieldTarget> = collection
        .fields
        .iter()
        .map(|field| {
            let data_type = field.resolved_type();
            let dimension = data_type.is_vector().then(|| field.dimension()).flatten();
            (field.name.as_str(), FieldTarget { data_type, dimension })
        })
        .collect();

    data.into_iter()
        .enumerate()
        .map(|(row, item)| {
            let Value::Object(item) = item else {
                return Err(ConversionError::NotAnObject(row));
            };
            item.into_iter()
                .map(|(field, value)| match targets.get(field.as_str()) {
                    None => Ok((field, value)),
                    Some(target) => match convert_value(value, target) {
                        Ok(converted) => Ok((field, converted)),
                        Err(reason) => Err(ConversionError::Field { field, row, reason }),
                    },
                })
                .collect::<Result<Row, _>>()
        })
        .collect()
}

fn convert_value(value: Value, target: &FieldTarget) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match target.data_type {
        DataType::Bool => match value {
            Value::Bool(_) => Ok(value),
            other => Err(format!("expected bool, got {}", type_name(&other))),
        },
        DataType::Int8 => integer(&value, "int8").map(|v| Value::from(v as i8)),
        DataType::Int16 => integer(&value, "int16").map(|v| Value::from(v as i16)),
        DataType::Int32 => integer(&value, "int32").map(|v| Value::from(v as i32)),
        DataType::Int64 => integer(&value, "int64").map(Value::from),
        DataType::Float => number(&value, "float32").map(|_| value),
        DataType::Double => number(&value, "float64").map(|_| value),
        DataType::VarChar | DataType::String | DataType::Text | DataType::Geometry => match value {
            Value::String(_) => Ok(value),
            other => Err(format!("expected string, got {}", type_name(&other))),
        },
        DataType::FloatVector | DataType::Float16Vector | DataType::BFloat16Vector => {
            let elements = vector_elements(&value, target.data_type)?;
            check_dimension(target.dimension, elements.len())?;
            Ok(Value::from(elements))
        }
        DataType::Int8Vector => {
            let elements = vector_elements(&value, target.data_type)?;
            check_dimension(target.dimension, elements.len())?;
            Ok(Value::from(
                elements.into_iter().map(|v| v as i8).collect::<Vec<_>>(),
            ))
        }
        DataType::BinaryVector => {
            let elements = vector_elements(&value, target.data_type)?;
            if let Some(dim) = target.dimension.filter(|d| *d > 0) {
                let expected_bytes = dim / 8;
                if elements.len() != expected_bytes {
                    return Err(format!(
                        "binary vector dimension mismatch: expected {} bits ({} bytes), got {} bytes",
                        dim,
                        expected_bytes,
                        elements.len()
                    ));
                }
            }
            Ok(Value::from(
                elements.into_iter().map(|v| v as u8).collect::<Vec<_>>(),
            ))
        }
        DataType::Json | DataType::Array | DataType::SparseFloatVector => Ok(value),
        DataType::None => Err(format!("unsupported field type: {}", target.data_type)),
    }
}

fn number(value: &Value, type_label: &str) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected number for {}, got {}", type_label, type_name(value)))
}

fn integer(value: &Value, type_label: &str) -> Result<i64, String> {
    match value.as_i64() {
        Some(v) => Ok(v),
        None => number(value, type_label).map(|v| v as i64),
    }
}

fn vector_elements(value: &Value, data_type: DataType) -> Result<Vec<f64>, String> {
    let Value::Array(items) = value else {
        return Err(format!("expected array for {}, got {}", data_type, type_name(value)));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64().ok_or_else(|| {
                format!("vector element at index {}: expected number, got {}", i, type_name(item))
            })
        })
        .collect()
}

fn check_dimension(expected: Option<usize>, actual: usize) -> Result<(), String> {
    match expected {
        Some(dim) if dim > 0 && dim != actual => Err(format!(
            "vector dimension mismatch: expected {}, got {} elements",
            dim, actual
        )),
        _ => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
