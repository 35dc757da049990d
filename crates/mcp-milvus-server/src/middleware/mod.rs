//! Middleware system for tool calls
//!
//! - [`ToolMiddleware`] - core trait with before/after hooks
//! - [`ToolCallContext`] - the call as seen by middleware
//! - [`MiddlewareStack`] - ordered execution of multiple middleware layers
//! - [`builtins`] - logging and session authentication
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use mcp_milvus_server::middleware::{MiddlewareError, ToolCallContext, ToolMiddleware};
//! use serde_json::json;
//!
//! struct TagDestructiveCalls;
//!
//! #[async_trait]
//! impl ToolMiddleware for TagDestructiveCalls {
//!     async fn before_call(&self, ctx: &mut ToolCallContext<'_>) -> Result<(), MiddlewareError> {
//!         if ctx.tool_name().starts_with("milvus_drop_") {
//!             ctx.add_metadata("destructive", json!(true));
//!         }
//!         Ok(())
//!     }
//! }
//! ```

pub mod builtins;
pub mod context;
pub mod error;
pub mod stack;
pub mod traits;

pub use builtins::{AuthMiddleware, LoggingMiddleware};
pub use context::ToolCallContext;
pub use error::MiddlewareError;
pub use stack::MiddlewareStack;
pub use traits::ToolMiddleware;
