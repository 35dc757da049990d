//! Session state and lifecycle events

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mcp_milvus_client::MilvusClient;
use serde_json::Value;

use crate::config::ConnConfig;

/// Snapshot of one session.
///
/// Values stored in the cache are never mutated; every transition stores a
/// new snapshot. Clones share the backend client but own their metadata.
#[derive(Clone)]
pub struct SessionState {
    pub session_id: String,
    pub config: ConnConfig,
    pub client: Arc<dyn MilvusClient>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
    pub metadata: HashMap<String, Value>,
}

impl SessionState {
    pub(crate) fn new(session_id: &str, config: ConnConfig, client: Arc<dyn MilvusClient>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            config,
            client,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            metadata: HashMap::new(),
        }
    }

    /// Next snapshot after one access
    pub(crate) fn accessed(&self) -> Self {
        let mut next = self.clone();
        next.access_count += 1;
        next.last_accessed = Utc::now();
        next
    }

    /// Next snapshot with `key` set in the metadata
    pub(crate) fn with_metadata(&self, key: &str, value: Value) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.to_string(), value);
        next
    }

    /// Time since the session was created
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("session_id", &self.session_id)
            .field("address", &self.config.address)
            .field("db_name", &self.config.db_name)
            .field("created_at", &self.created_at)
            .field("last_accessed", &self.last_accessed)
            .field("access_count", &self.access_count)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Session lifecycle transitions reported to callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Created,
    Removed,
    Accessed,
    Expired,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::Created => "session_created",
            SessionEvent::Removed => "session_removed",
            SessionEvent::Accessed => "session_accessed",
            SessionEvent::Expired => "session_expired",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer invoked for every lifecycle event, each call on its own task
pub type SessionEventCallback = Arc<dyn Fn(SessionEvent, &str, &SessionState) + Send + Sync>;
