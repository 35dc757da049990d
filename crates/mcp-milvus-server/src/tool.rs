//! MCP Tool Trait
//!
//! This module defines the trait every Milvus tool implements, the per-call
//! context handed to it, and helpers for reading its string arguments.

use std::sync::Arc;

use async_trait::async_trait;
use mcp_milvus_client::MilvusClient;
use mcp_milvus_session::SessionManager;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};
use crate::protocol::{CallToolResult, Tool, ToolSchema};

/// A tool callable through `tools/call`
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Stable identifier used by callers
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> ToolSchema;

    /// Execute the tool. Errors are reported to the caller as tool errors.
    async fn call(&self, args: &ToolArguments, ctx: &ToolContext) -> ToolResult<CallToolResult>;

    /// Descriptor listed by `tools/list`
    fn to_tool(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: self.input_schema(),
        }
    }
}

/// Per-call context: the caller's session and the shared session manager
#[derive(Debug, Clone)]
pub struct ToolContext {
    session_id: String,
    sessions: SessionManager,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, sessions: SessionManager) -> Self {
        Self {
            session_id: session_id.into(),
            sessions,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Backend client of the caller's session, valid for this call only
    pub async fn client(&self) -> ToolResult<Arc<dyn MilvusClient>> {
        Ok(self.sessions.get(&self.session_id).await?)
    }
}

/// Tool call arguments
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Accepts an object or null; anything else yields no arguments
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(values)) => Self::new(values),
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Required string argument
    pub fn require_str(&self, name: &str) -> ToolResult<&str> {
        match self.values.get(name) {
            None | Some(Value::Null) => Err(ToolError::MissingArgument(name.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ToolError::NotAString(name.to_string())),
        }
    }

    /// Optional string argument; numbers and booleans are accepted in string form
    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.values.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
            _ => default.to_string(),
        }
    }

    /// Optional integer argument; unparsable values fall back to `default`
    pub fn get_u32(&self, name: &str, default: u32) -> u32 {
        self.get_string(name, "").trim().parse().unwrap_or(default)
    }

    /// Deserialize all arguments into `T`
    pub fn bind<T: DeserializeOwned>(&self) -> ToolResult<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| ToolError::failed(e.to_string()))
    }
}

/// Parse a JSON-encoded string argument
pub(crate) fn parse_json_arg<T: DeserializeOwned>(raw: &str, invalid_prefix: &str) -> ToolResult<T> {
    serde_json::from_str(raw).map_err(|e| ToolError::context(invalid_prefix, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArguments {
        ToolArguments::from_value(Some(value))
    }

    #[test]
    fn test_require_str() {
        let args = args(json!({"name": "docs", "count": 3, "empty": null}));
        assert_eq!(args.require_str("name").unwrap(), "docs");
        assert_eq!(
            args.require_str("missing").unwrap_err().to_string(),
            "required argument \"missing\" not found"
        );
        assert!(matches!(args.require_str("empty"), Err(ToolError::MissingArgument(_))));
        assert!(matches!(args.require_str("count"), Err(ToolError::NotAString(_))));
    }

    #[test]
    fn test_optional_values_and_defaults() {
        let args = args(json!({"limit": "20", "replicas": 2, "bad": "many"}));
        assert_eq!(args.get_u32("limit", 10), 20);
        assert_eq!(args.get_u32("replicas", 1), 2);
        assert_eq!(args.get_u32("bad", 5), 5);
        assert_eq!(args.get_u32("absent", 5), 5);
        assert_eq!(args.get_string("absent", "vector"), "vector");
    }

    #[test]
    fn test_non_object_arguments_are_empty() {
        let args = ToolArguments::from_value(Some(json!([1, 2])));
        assert!(args.as_map().is_empty());
        assert!(ToolArguments::from_value(None).as_map().is_empty());
    }

    #[test]
    fn test_parse_json_arg_prefixes_errors() {
        let err = parse_json_arg::<Vec<f32>>("[1, oops]", "Invalid vector JSON: ").unwrap_err();
        assert!(err.to_string().starts_with("Invalid vector JSON: "));
        let vector: Vec<f32> = parse_json_arg("[0.5, 1]", "Invalid vector JSON: ").unwrap();
        assert_eq!(vector, vec![0.5, 1.0]);
    }
}
