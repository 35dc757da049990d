//! Request and response types shared by every [`crate::MilvusClient`] implementation

use std::collections::BTreeMap;

use mcp_milvus_schema::{CollectionSchema, DIM_KEY, DataType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity, keyed by field name
pub type Row = Map<String, Value>;

/// Index to build on a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub field_name: String,
    /// Defaults to the field name when empty
    #[serde(default)]
    pub index_name: String,
    pub index_type: String,
    pub metric_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl IndexSpec {
    pub fn new(
        field_name: impl Into<String>,
        index_type: impl Into<String>,
        metric_type: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            index_name: String::new(),
            index_type: index_type.into(),
            metric_type: metric_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn effective_name(&self) -> &str {
        if self.index_name.is_empty() {
            &self.field_name
        } else {
            &self.index_name
        }
    }
}

/// Scalar query by filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub collection_name: String,
    pub filter: String,
    #[serde(default)]
    pub output_fields: Vec<String>,
    pub limit: u32,
}

/// Single-vector similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub collection_name: String,
    pub vector: Vec<f32>,
    pub vector_field: String,
    pub limit: u32,
    #[serde(default)]
    pub output_fields: Vec<String>,
    pub metric_type: String,
    #[serde(default)]
    pub filter: Option<String>,
}

/// Outcome of an insert or upsert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub count: u64,
    #[serde(default)]
    pub ids: Vec<Value>,
}

/// Collection description as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub collection_name: String,
    #[serde(rename = "collectionID", default)]
    pub collection_id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub enable_dynamic_field: bool,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
    /// Load state name, e.g. `LoadStateLoaded`
    #[serde(default)]
    pub load: String,
    #[serde(default)]
    pub shards_num: i64,
    #[serde(default)]
    pub partitions_num: i64,
    #[serde(default)]
    pub consistency_level: String,
}

impl CollectionInfo {
    /// Describe a collection created from `schema`, as a freshly created collection would report it
    pub fn from_schema(name: impl Into<String>, schema: &CollectionSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| FieldInfo {
                name: field.name.clone(),
                data_type: field.data_type.as_str().to_string(),
                primary_key: field.is_primary_key,
                auto_id: field.auto_id || (field.is_primary_key && schema.auto_id),
                nullable: field.nullable,
                description: field.description.clone(),
                params: field
                    .type_params
                    .iter()
                    .map(|(key, value)| KeyValue {
                        key: key.clone(),
                        value: Value::String(value.clone()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            collection_name: name.into(),
            auto_id: schema.auto_id,
            enable_dynamic_field: schema.enable_dynamic_field,
            fields,
            load: "LoadStateNotLoad".to_string(),
            shards_num: 1,
            partitions_num: 1,
            consistency_level: "Bounded".to_string(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_loaded(&self) -> bool {
        self.load == "LoadStateLoaded"
    }
}

/// Field description as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<KeyValue>,
}

impl FieldInfo {
    /// Resolved data type; [`DataType::None`] when the backend reports a name we do not know
    pub fn resolved_type(&self) -> DataType {
        DataType::from_name(&self.data_type)
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.params.iter().find(|p| p.key == key).map(|p| match &p.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn dimension(&self) -> Option<usize> {
        self.param(DIM_KEY)?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

/// Index summary embedded in a collection description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub field_name: String,
    pub index_name: String,
    #[serde(default)]
    pub metric_type: String,
}
