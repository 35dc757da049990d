//! Transports carrying JSON-RPC messages to the [`crate::McpServer`]

pub mod stdio;

pub use stdio::{StdioTransport, serve_stdio};
