//! Command-line and environment configuration

use std::time::Duration;

use clap::{Parser, ValueEnum};
use mcp_milvus_session::SessionManagerConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// MCP server for Milvus, speaking JSON-RPC over stdio
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-milvus", version, about)]
pub struct ServerConfig {
    /// Maximum number of concurrent backend sessions
    #[arg(long, env = "MCP_MILVUS_MAX_SESSIONS", default_value_t = 100)]
    pub max_sessions: usize,

    /// Idle time after which a backend session expires (seconds)
    #[arg(long, env = "MCP_MILVUS_SESSION_TTL_SECS", default_value_t = 3600)]
    pub session_ttl_secs: u64,

    /// Period of the expired-session sweep (seconds, 0 disables it)
    #[arg(long, env = "MCP_MILVUS_MONITOR_INTERVAL_SECS", default_value_t = 900)]
    pub monitor_interval_secs: u64,

    /// Timeout for each backend HTTP request (seconds)
    #[arg(long, env = "MCP_MILVUS_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log filter, used when RUST_LOG is not set. Supports tracing filter syntax.
    #[arg(short = 'l', long, env = "MCP_MILVUS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "MCP_MILVUS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn to_session_config(&self) -> SessionManagerConfig {
        SessionManagerConfig::default()
            .with_max_sessions(self.max_sessions)
            .with_default_ttl(Duration::from_secs(self.session_ttl_secs))
            .with_monitor_interval(Duration::from_secs(self.monitor_interval_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
