//! Session manager / connection cache
//!
//! Maps session identifiers to live backend connections plus usage metadata.
//! Entries carry a TTL that is re-armed on every write; expired entries are
//! treated as absent, evicted on lookup and swept by a background monitor.
//! Every eviction, removal or replacement closes the evicted connection.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::join_all;
use mcp_milvus_client::{Connector, MilvusClient};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConnConfig;
use crate::error::{SessionError, SessionResult};
use crate::state::{SessionEvent, SessionEventCallback, SessionState};

/// Configuration for the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionManagerConfig {
    /// Maximum number of live sessions
    pub max_sessions: usize,
    /// Idle time after which a session expires
    pub default_ttl: Duration,
    /// Period of the background expiry sweep; zero disables it
    pub monitor_interval: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            default_ttl: Duration::from_secs(60 * 60),
            monitor_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl SessionManagerConfig {
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }
}

struct CacheEntry {
    state: Arc<SessionState>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(state: Arc<SessionState>, ttl: Duration) -> Self {
        Self {
            state,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Inner {
    config: SessionManagerConfig,
    connector: Arc<dyn Connector>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Live entries; only changed while holding the `entries` write lock
    session_count: AtomicUsize,
    callbacks: parking_lot::RwLock<Vec<SessionEventCallback>>,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

/// Cloneable handle to the shared session cache
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("sessions", &self.size())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl SessionManager {
    /// Create a manager opening connections through `connector`.
    ///
    /// When called inside a tokio runtime the background monitor is started;
    /// it stops on [`SessionManager::close`] or once every handle is dropped.
    pub fn new(config: SessionManagerConfig, connector: Arc<dyn Connector>) -> Self {
        let inner = Arc::new(Inner {
            config,
            connector,
            entries: RwLock::new(HashMap::new()),
            session_count: AtomicUsize::new(0),
            callbacks: parking_lot::RwLock::new(Vec::new()),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        });

        let period = inner.config.monitor_interval;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if !period.is_zero() => {
                handle.spawn(monitor(Arc::downgrade(&inner), inner.shutdown.clone(), period));
            }
            Ok(_) => debug!("Session monitor disabled"),
            Err(_) => debug!("No tokio runtime, expired sessions are evicted on lookup only"),
        }

        Self { inner }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of live sessions
    pub fn size(&self) -> usize {
        self.inner.session_count.load(Ordering::SeqCst)
    }

    /// Establish a backend connection for `session_id`, replacing any existing one.
    ///
    /// The credential token is validated before any connection attempt. If
    /// connecting fails, an existing session for the same id is left intact.
    pub async fn set(&self, session_id: &str, config: &ConnConfig) -> SessionResult<()> {
        if session_id.is_empty() {
            return Err(SessionError::EmptySessionId);
        }
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        // An expired entry for this id no longer holds a slot
        self.evict_if_expired(session_id).await;

        // Early rejection; re-checked under the write lock after connecting
        let max = self.inner.config.max_sessions;
        if !self.contains_live(session_id).await && self.size() >= max {
            return Err(SessionError::MaxSessionsReached(max));
        }

        let options = config.to_client_options()?;
        let client = self
            .inner
            .connector
            .connect(options)
            .await
            .map_err(SessionError::Connect)?;

        let state = Arc::new(SessionState::new(session_id, config.clone(), client));
        let previous = {
            let mut entries = self.inner.entries.write().await;
            if self.is_closed() {
                drop(entries);
                close_client_safely(&state.client, session_id).await;
                return Err(SessionError::Closed);
            }
            if !entries.contains_key(session_id)
                && self.inner.session_count.load(Ordering::SeqCst) >= max
            {
                drop(entries);
                close_client_safely(&state.client, session_id).await;
                return Err(SessionError::MaxSessionsReached(max));
            }
            let previous = entries.insert(
                session_id.to_string(),
                CacheEntry::new(Arc::clone(&state), self.inner.config.default_ttl),
            );
            if previous.is_none() {
                self.inner.session_count.fetch_add(1, Ordering::SeqCst);
            }
            previous
        };

        if let Some(previous) = previous {
            debug!(session = %session_id, "Replacing existing session connection");
            close_client_safely(&previous.state.client, session_id).await;
        }

        self.trigger_event(SessionEvent::Created, session_id, state);

        info!(
            session = %session_id,
            address = %config.address,
            database = %config.db_name,
            total_sessions = self.size(),
            "Session created successfully"
        );
        Ok(())
    }

    /// Backend client of a live session; counts as one access
    pub async fn get(&self, session_id: &str) -> SessionResult<Arc<dyn MilvusClient>> {
        let state = self.update(session_id, SessionState::accessed).await?;
        let client = Arc::clone(&state.client);
        self.trigger_event(SessionEvent::Accessed, session_id, state);
        Ok(client)
    }

    /// Copy of a live session's state; does not count as an access
    pub async fn get_state(&self, session_id: &str) -> SessionResult<SessionState> {
        if session_id.is_empty() {
            return Err(SessionError::EmptySessionId);
        }

        {
            let entries = self.inner.entries.read().await;
            match entries.get(session_id) {
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    return Ok(entry.state.as_ref().clone());
                }
                Some(_) => {}
                None => return Err(SessionError::NotFound(session_id.to_string())),
            }
        }

        self.evict_if_expired(session_id).await;
        Err(SessionError::NotFound(session_id.to_string()))
    }

    /// Close the session's connection and forget it
    pub async fn remove(&self, session_id: &str) -> SessionResult<()> {
        if session_id.is_empty() {
            return Err(SessionError::EmptySessionId);
        }

        let removed = {
            let mut entries = self.inner.entries.write().await;
            let removed = entries.remove(session_id);
            if removed.is_some() {
                self.inner.session_count.fetch_sub(1, Ordering::SeqCst);
            }
            removed
        };

        let Some(entry) = removed else {
            return Err(SessionError::NotFound(session_id.to_string()));
        };
        if entry.is_expired(Instant::now()) {
            self.expire_entry(session_id, entry).await;
            return Err(SessionError::NotFound(session_id.to_string()));
        }

        close_client_safely(&entry.state.client, session_id).await;
        self.trigger_event(SessionEvent::Removed, session_id, entry.state);

        info!(
            session = %session_id,
            total_sessions = self.size(),
            "Session removed successfully"
        );
        Ok(())
    }

    /// Close every connection and drop all sessions
    pub async fn clear(&self) -> SessionResult<()> {
        let drained: Vec<(String, CacheEntry)> = {
            let mut entries = self.inner.entries.write().await;
            self.inner.session_count.store(0, Ordering::SeqCst);
            entries.drain().collect()
        };

        join_all(
            drained
                .iter()
                .map(|(id, entry)| close_client_safely(&entry.state.client, id)),
        )
        .await;

        info!(cleared = drained.len(), "All sessions cleared");
        Ok(())
    }

    /// Ids of live sessions, sorted
    pub async fn session_ids(&self) -> Vec<String> {
        let now = Instant::now();
        let entries = self.inner.entries.read().await;
        let mut ids: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Set one metadata key on a live session
    pub async fn set_session_metadata(
        &self,
        session_id: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> SessionResult<()> {
        let value = value.into();
        self.update(session_id, |state| state.with_metadata(key, value))
            .await
            .map(|_| ())
    }

    /// Copy of a live session's metadata
    pub async fn get_session_metadata(&self, session_id: &str) -> SessionResult<HashMap<String, Value>> {
        Ok(self.get_state(session_id).await?.metadata)
    }

    /// Register an observer for every lifecycle event
    pub fn add_event_callback<F>(&self, callback: F)
    where
        F: Fn(SessionEvent, &str, &SessionState) + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push(Arc::new(callback));
    }

    /// Stop the monitor and close every session. Calls after the first are no-ops.
    pub async fn close(&self) -> SessionResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.shutdown.cancel();
        self.clear().await?;
        info!("Session manager closed");
        Ok(())
    }

    /// Evict every expired session, returning how many were evicted
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(String, CacheEntry)> = {
            let mut entries = self.inner.entries.write().await;
            let ids: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(id, _)| id.clone())
                .collect();
            let removed: Vec<(String, CacheEntry)> = ids
                .into_iter()
                .filter_map(|id| entries.remove(&id).map(|entry| (id, entry)))
                .collect();
            self.inner
                .session_count
                .fetch_sub(removed.len(), Ordering::SeqCst);
            removed
        };

        let count = expired.len();
        for (id, entry) in expired {
            self.expire_entry(&id, entry).await;
        }
        count
    }

    /// Replace the live state of `session_id` with `next(current)` and re-arm its TTL.
    ///
    /// Runs under the write lock so concurrent updates are never lost.
    async fn update(
        &self,
        session_id: &str,
        next: impl FnOnce(&SessionState) -> SessionState,
    ) -> SessionResult<Arc<SessionState>> {
        if session_id.is_empty() {
            return Err(SessionError::EmptySessionId);
        }

        let now = Instant::now();
        let mut entries = self.inner.entries.write().await;
        match entries.get_mut(session_id) {
            Some(entry) if !entry.is_expired(now) => {
                let state = Arc::new(next(&entry.state));
                entry.state = Arc::clone(&state);
                entry.expires_at = now + self.inner.config.default_ttl;
                return Ok(state);
            }
            Some(_) => {}
            None => return Err(SessionError::NotFound(session_id.to_string())),
        }

        let expired = entries.remove(session_id);
        if expired.is_some() {
            self.inner.session_count.fetch_sub(1, Ordering::SeqCst);
        }
        drop(entries);

        if let Some(entry) = expired {
            self.expire_entry(session_id, entry).await;
        }
        Err(SessionError::NotFound(session_id.to_string()))
    }

    async fn contains_live(&self, session_id: &str) -> bool {
        self.inner
            .entries
            .read()
            .await
            .get(session_id)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    async fn evict_if_expired(&self, session_id: &str) {
        let expired = {
            let mut entries = self.inner.entries.write().await;
            let is_expired = entries
                .get(session_id)
                .is_some_and(|entry| entry.is_expired(Instant::now()));
            if !is_expired {
                return;
            }
            self.inner.session_count.fetch_sub(1, Ordering::SeqCst);
            entries.remove(session_id)
        };

        if let Some(entry) = expired {
            self.expire_entry(session_id, entry).await;
        }
    }

    async fn expire_entry(&self, session_id: &str, entry: CacheEntry) {
        debug!(session = %session_id, "Session expired");
        close_client_safely(&entry.state.client, session_id).await;
        self.trigger_event(SessionEvent::Expired, session_id, entry.state);
    }

    /// Fire callbacks, each on its own task; panics are caught and logged
    fn trigger_event(&self, event: SessionEvent, session_id: &str, state: Arc<SessionState>) {
        let callbacks = self.inner.callbacks.read().clone();
        for callback in callbacks {
            let session_id = session_id.to_string();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    callback(event, session_id.as_str(), state.as_ref())
                }));
                if let Err(panic) = outcome {
                    error!(
                        event = %event,
                        session = %session_id,
                        panic = %panic_message(panic.as_ref()),
                        "Session event callback panicked"
                    );
                }
            });
        }
    }
}

async fn close_client_safely(client: &Arc<dyn MilvusClient>, session_id: &str) {
    if let Err(err) = client.close().await {
        warn!(session = %session_id, error = %err, "Failed to close milvus client for session");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Periodic expiry sweep and session-count telemetry
async fn monitor(inner: Weak<Inner>, shutdown: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                let manager = SessionManager { inner };
                let expired = manager.purge_expired().await;
                debug!(active_sessions = manager.size(), expired, "Session manager stats");
            }
        }
    }
    debug!("Session monitor stopped");
}
