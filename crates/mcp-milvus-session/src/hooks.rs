//! Transport session hooks
//!
//! Tie the lifetime of a backend session to the lifetime of the protocol
//! session that owns it.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::manager::SessionManager;

/// Metadata key stamped when a protocol session (re)attaches
pub const CLIENT_CONNECTED_AT: &str = "client_connected_at";
/// Metadata key naming the kind of client
pub const CLIENT_TYPE: &str = "client_type";

#[derive(Debug, Clone)]
pub struct SessionHooks {
    manager: SessionManager,
}

impl SessionHooks {
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }

    /// A protocol session started; annotate its backend session if one exists
    pub async fn on_register(&self, session_id: &str) {
        info!(session_id, "Session registered");

        if self.manager.get_state(session_id).await.is_err() {
            return;
        }
        let stamped = match self
            .manager
            .set_session_metadata(session_id, CLIENT_CONNECTED_AT, Utc::now().to_rfc3339())
            .await
        {
            Ok(()) => {
                self.manager
                    .set_session_metadata(session_id, CLIENT_TYPE, Value::from("mcp_client"))
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = stamped {
            warn!(session_id, error = %e, "Failed to annotate session");
        }
    }

    /// A protocol session ended; close its backend connection
    pub async fn on_unregister(&self, session_id: &str) {
        info!(session_id, "Session unregistered");

        if let Err(e) = self.manager.remove(session_id).await {
            warn!(session_id, error = %e, "Failed to cleanup session");
        }
    }
}
