//! MCP dispatcher
//!
//! Routes JSON-RPC requests to the protocol handlers and runs tool calls
//! through the middleware stack.

use std::collections::HashMap;
use std::sync::Arc;

use mcp_milvus_session::SessionManager;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::McpServerError;
use crate::middleware::{
    AuthMiddleware, LoggingMiddleware, MiddlewareStack, ToolCallContext, ToolMiddleware,
};
use crate::protocol::{
    CallToolParams, CallToolResult, JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse,
    MCP_PROTOCOL_VERSION, RequestId, SERVER_NAME, SERVER_VERSION, error_codes,
};
use crate::registry::ToolRegistry;
use crate::tool::{McpTool, ToolArguments, ToolContext};
use crate::tools;

/// Builder for [`McpServer`]
pub struct McpServerBuilder {
    sessions: SessionManager,
    registry: ToolRegistry,
    middleware: Vec<Arc<dyn ToolMiddleware>>,
}

impl McpServerBuilder {
    /// Register every Milvus tool
    pub fn with_milvus_tools(mut self) -> Self {
        tools::register_all(&mut self.registry);
        self
    }

    /// Register a single tool
    pub fn tool<T: McpTool + 'static>(mut self, tool: T) -> Self {
        self.registry.register(tool);
        self
    }

    /// Append middleware after the built-in logging and auth layers
    pub fn middleware(mut self, middleware: Arc<dyn ToolMiddleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn build(self) -> McpServer {
        let (tools, tools_by_name) = self.registry.into_tools();

        let mut stack = MiddlewareStack::new();
        stack.push(Arc::new(LoggingMiddleware::new()));
        stack.push(Arc::new(AuthMiddleware::new(self.sessions.clone())));
        for middleware in self.middleware {
            stack.push(middleware);
        }

        info!(tools = tools.len(), middleware = stack.len(), "MCP server built");
        McpServer {
            inner: Arc::new(ServerInner {
                tools,
                tools_by_name,
                middleware: stack,
                sessions: self.sessions,
            }),
        }
    }
}

struct ServerInner {
    tools: Vec<Arc<dyn McpTool>>,
    tools_by_name: HashMap<String, Arc<dyn McpTool>>,
    middleware: MiddlewareStack,
    sessions: SessionManager,
}

/// Cloneable handle to the dispatcher
#[derive(Clone)]
pub struct McpServer {
    inner: Arc<ServerInner>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("tools", &self.tool_names())
            .field("middleware", &self.inner.middleware.len())
            .finish()
    }
}

impl McpServer {
    pub fn builder(sessions: SessionManager) -> McpServerBuilder {
        McpServerBuilder {
            sessions,
            registry: ToolRegistry::new(),
            middleware: Vec::new(),
        }
    }

    /// Server exposing every Milvus tool behind the logging and auth middleware
    pub fn new(sessions: SessionManager) -> Self {
        Self::builder(sessions).with_milvus_tools().build()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Tool names in listing order
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.inner.tools.iter().map(|t| t.name()).collect()
    }

    /// Handle one raw JSON-RPC message from `session_id`.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, session_id: &str, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                let err = McpServerError::Parse(e);
                warn!(session_id, error = %err, "Unparsable message");
                return Some(JsonRpcResponse::error(None, err.code(), err.to_string()));
            }
        };

        let request_id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    request_id,
                    error_codes::INVALID_REQUEST,
                    McpServerError::InvalidRequest(e.to_string()).to_string(),
                ));
            }
        };

        self.handle_request(session_id, request).await
    }

    /// Handle a parsed request; `None` for notifications
    pub async fn handle_request(
        &self,
        session_id: &str,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            let err = McpServerError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return Some(JsonRpcResponse::error(request.id, err.code(), err.to_string()));
        }

        debug!(session_id, method = %request.method, "Handling request");
        let outcome = self.dispatch(session_id, &request.method, request.params).await;

        if request.id.is_none() {
            if let Err(e) = outcome {
                debug!(session_id, method = %request.method, error = %e, "Notification failed");
            }
            return None;
        }

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => JsonRpcResponse::error(request.id, e.code(), e.to_string()),
        })
    }

    async fn dispatch(
        &self,
        session_id: &str,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, McpServerError> {
        match method {
            "initialize" => Ok(self.initialize_result()),
            "notifications/initialized" => {
                info!(session_id, "Client initialized");
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools: Vec<_> = self.inner.tools.iter().map(|t| t.to_tool()).collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => {
                let params = params
                    .ok_or_else(|| McpServerError::InvalidParams("missing params".to_string()))?;
                let params: CallToolParams = serde_json::from_value(params)
                    .map_err(|e| McpServerError::InvalidParams(e.to_string()))?;
                let result = self.call_tool(session_id, params).await?;
                serde_json::to_value(result).map_err(McpServerError::Parse)
            }
            other => Err(McpServerError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        })
    }

    /// Run a tool through the middleware stack.
    ///
    /// Only an unknown tool is a protocol error; every other failure comes
    /// back as a result flagged `isError`.
    pub async fn call_tool(
        &self,
        session_id: &str,
        params: CallToolParams,
    ) -> Result<CallToolResult, McpServerError> {
        let tool = self
            .inner
            .tools_by_name
            .get(&params.name)
            .cloned()
            .ok_or_else(|| McpServerError::ToolNotFound(params.name.clone()))?;

        let args = ToolArguments::from_value(params.arguments);
        let tool_ctx = ToolContext::new(session_id, self.inner.sessions.clone());
        let mut ctx = ToolCallContext::new(tool.name(), Some(session_id), args.as_map());

        let handler = async {
            tool.call(&args, &tool_ctx)
                .await
                .unwrap_or_else(|e| CallToolResult::error_text(e.to_string()))
        };
        Ok(self.inner.middleware.execute(&mut ctx, handler).await)
    }
}
