//! Tool call context seen by middleware

use std::time::{Duration, Instant};

use serde_json::{Map, Value};

/// One `tools/call` as it passes through the middleware stack
#[derive(Debug, Clone)]
pub struct ToolCallContext<'a> {
    tool_name: &'a str,
    session_id: Option<&'a str>,
    arguments: &'a Map<String, Value>,
    metadata: Map<String, Value>,
    started_at: Instant,
    /// Number of middleware whose before hook completed
    pub(crate) entered: usize,
}

impl<'a> ToolCallContext<'a> {
    pub fn new(
        tool_name: &'a str,
        session_id: Option<&'a str>,
        arguments: &'a Map<String, Value>,
    ) -> Self {
        Self {
            tool_name,
            session_id: session_id.filter(|id| !id.is_empty()),
            arguments,
            metadata: Map::new(),
            started_at: Instant::now(),
            entered: 0,
        }
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name
    }

    /// Caller's session, `None` when absent or empty
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        self.arguments
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Time since the call entered the stack
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_session_id_is_absent() {
        let args = Map::new();
        let ctx = ToolCallContext::new("milvus_query", Some(""), &args);
        assert_eq!(ctx.session_id(), None);

        let ctx = ToolCallContext::new("milvus_query", Some("s1"), &args);
        assert_eq!(ctx.session_id(), Some("s1"));
        assert_eq!(ctx.tool_name(), "milvus_query");
    }

    #[test]
    fn test_metadata() {
        let args = Map::new();
        let mut ctx = ToolCallContext::new("milvus_query", None, &args);
        ctx.add_metadata("client-ip", json!("127.0.0.1"));
        assert_eq!(ctx.metadata()["client-ip"], "127.0.0.1");
    }
}
