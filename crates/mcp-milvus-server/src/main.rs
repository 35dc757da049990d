//! `mcp-milvus` binary: one MCP session over stdio

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_milvus_client::RestConnector;
use mcp_milvus_server::{LogFormat, McpServer, ServerConfig, serve_stdio};
use mcp_milvus_session::{SessionManager, register_monitoring_callbacks};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config);

    let connector = RestConnector::with_timeout(config.request_timeout())
        .context("failed to build backend HTTP client")?;
    let sessions = SessionManager::new(config.to_session_config(), Arc::new(connector));
    register_monitoring_callbacks(&sessions);

    let server = McpServer::new(sessions.clone());
    info!(
        tools = server.tool_names().len(),
        max_sessions = config.max_sessions,
        "Starting Milvus MCP server on stdio"
    );

    tokio::select! {
        served = serve_stdio(server) => {
            if let Err(e) = served {
                error!(error = %e, "Server stopped with error");
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    let total_sessions = sessions.size();
    sessions.close().await.context("failed to close session manager")?;
    info!(total_sessions, "Server shutdown complete");
    Ok(())
}

/// Logs go to stderr; stdout carries the protocol
fn init_logging(config: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Wait for SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
