//! Field data types and function types
//!
//! Both enumerations carry the backend's wire values. Name resolution is
//! case-insensitive and accepts concatenated as well as underscore-separated
//! spellings (`FloatVector`, `float_vector`, `FLOAT_VECTOR`), backed by lookup
//! tables that are built once on first use.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Data type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataType {
    /// Sentinel for unresolved names; never valid in a schema
    None = 0,
    Bool = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    Float = 10,
    Double = 11,
    String = 20,
    VarChar = 21,
    Array = 22,
    Json = 23,
    Geometry = 24,
    Text = 25,
    BinaryVector = 100,
    FloatVector = 101,
    Float16Vector = 102,
    BFloat16Vector = 103,
    SparseFloatVector = 104,
    Int8Vector = 105,
}

impl DataType {
    /// Every known data type, sentinel included
    pub const ALL: [DataType; 20] = [
        DataType::None,
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::VarChar,
        DataType::Array,
        DataType::Json,
        DataType::Geometry,
        DataType::Text,
        DataType::BinaryVector,
        DataType::FloatVector,
        DataType::Float16Vector,
        DataType::BFloat16Vector,
        DataType::SparseFloatVector,
        DataType::Int8Vector,
    ];

    /// Canonical name as understood by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::None => "None",
            DataType::Bool => "Bool",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::String => "String",
            DataType::VarChar => "VarChar",
            DataType::Array => "Array",
            DataType::Json => "JSON",
            DataType::Geometry => "Geometry",
            DataType::Text => "Text",
            DataType::BinaryVector => "BinaryVector",
            DataType::FloatVector => "FloatVector",
            DataType::Float16Vector => "Float16Vector",
            DataType::BFloat16Vector => "BFloat16Vector",
            DataType::SparseFloatVector => "SparseFloatVector",
            DataType::Int8Vector => "Int8Vector",
        }
    }

    /// Wire value
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DataType::None)
    }

    pub fn is_vector(&self) -> bool {
        matches!(
            self,
            DataType::BinaryVector
                | DataType::FloatVector
                | DataType::Float16Vector
                | DataType::BFloat16Vector
                | DataType::SparseFloatVector
                | DataType::Int8Vector
        )
    }

    /// Resolve a type name in any supported spelling.
    ///
    /// Unknown names resolve to [`DataType::None`], which callers must treat
    /// as a validation failure.
    pub fn from_name(name: &str) -> DataType {
        DATA_TYPES
            .get(&name.trim().to_lowercase())
            .copied()
            .unwrap_or(DataType::None)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a derived-value function attached to a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FunctionType {
    /// Sentinel for unresolved names; never valid in a schema
    Unknown = 0,
    Bm25 = 1,
    TextEmbedding = 2,
    Rerank = 3,
}

impl FunctionType {
    pub const ALL: [FunctionType; 4] = [
        FunctionType::Unknown,
        FunctionType::Bm25,
        FunctionType::TextEmbedding,
        FunctionType::Rerank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionType::Unknown => "Unknown",
            FunctionType::Bm25 => "BM25",
            FunctionType::TextEmbedding => "TextEmbedding",
            FunctionType::Rerank => "Rerank",
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FunctionType::Unknown)
    }

    /// Resolve a function type name; unknown names map to [`FunctionType::Unknown`]
    pub fn from_name(name: &str) -> FunctionType {
        FUNCTION_TYPES
            .get(&name.trim().to_lowercase())
            .copied()
            .unwrap_or(FunctionType::Unknown)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DATA_TYPES: Lazy<HashMap<String, DataType>> =
    Lazy::new(|| lookup_table(DataType::ALL.iter().map(|t| (t.as_str(), *t))));

static FUNCTION_TYPES: Lazy<HashMap<String, FunctionType>> =
    Lazy::new(|| lookup_table(FunctionType::ALL.iter().map(|t| (t.as_str(), *t))));

/// Build a lowercase-keyed table holding every spelling variant of each name
fn lookup_table<T: Copy>(entries: impl Iterator<Item = (&'static str, T)>) -> HashMap<String, T> {
    let mut table = HashMap::new();
    for (name, value) in entries {
        for variant in name_variants(name) {
            table.insert(variant.to_lowercase(), value);
        }
    }
    table
}

/// Spelling variants of a PascalCase name.
///
/// Produces the name itself, its upper/lower forms, an underscore before every
/// capital (`B_Float16_Vector`) and an underscore at word boundaries only
/// (`JSON` stays whole, `BFloat16Vector` becomes `B_Float16_Vector`).
pub(crate) fn name_variants(name: &str) -> Vec<String> {
    let per_capital = split_before_capitals(name, |_, _, _| true);
    let word_boundary = split_before_capitals(name, |prev, _, next| {
        prev.is_ascii_lowercase()
            || prev.is_ascii_digit()
            || next.is_some_and(|n| n.is_ascii_lowercase())
    });

    let mut variants = Vec::with_capacity(9);
    for base in [name.to_string(), per_capital, word_boundary] {
        for candidate in [base.to_lowercase(), base.to_uppercase(), base] {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
    }
    variants
}

fn split_before_capitals(name: &str, split: impl Fn(char, char, Option<char>) -> bool) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() && split(chars[i - 1], c, chars.get(i + 1).copied()) {
            out.push('_');
        }
        out.push(c);
    }
    out
}

// Serialized by canonical name, which is also how the REST API spells them.

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match DataType::from_name(&name) {
            DataType::None => Err(serde::de::Error::custom(format!(
                "unknown data type '{}'",
                name
            ))),
            data_type => Ok(data_type),
        }
    }
}

impl Serialize for FunctionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FunctionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match FunctionType::from_name(&name) {
            FunctionType::Unknown => Err(serde::de::Error::custom(format!(
                "unknown function type '{}'",
                name
            ))),
            function_type => Ok(function_type),
        }
    }
}
