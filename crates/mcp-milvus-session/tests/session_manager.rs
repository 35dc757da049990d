//! Session manager behaviour against the in-memory connector

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_milvus_client::testing::FakeConnector;
use mcp_milvus_client::{ClientOptions, ClientResult, Connector, MilvusClient};
use mcp_milvus_session::{
    CLIENT_CONNECTED_AT, CLIENT_TYPE, ConnConfig, SessionError, SessionEvent, SessionHooks,
    SessionManager, SessionManagerConfig,
};
use serde_json::json;
use tokio::sync::mpsc;

fn conn() -> ConnConfig {
    ConnConfig::new("http://localhost:19530").with_token("root:Milvus")
}

fn manager_with(config: SessionManagerConfig) -> (SessionManager, Arc<FakeConnector>) {
    let connector = Arc::new(FakeConnector::new());
    let manager = SessionManager::new(config, connector.clone());
    (manager, connector)
}

/// Delays every handshake so concurrent `set` calls overlap
struct SlowConnector {
    inner: Arc<FakeConnector>,
    delay: Duration,
}

#[async_trait]
impl Connector for SlowConnector {
    async fn connect(&self, options: ClientOptions) -> ClientResult<Arc<dyn MilvusClient>> {
        tokio::time::sleep(self.delay).await;
        self.inner.connect(options).await
    }
}

fn manager() -> (SessionManager, Arc<FakeConnector>) {
    manager_with(SessionManagerConfig::default())
}

async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<(SessionEvent, String, u64)>,
) -> (SessionEvent, String, u64) {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn test_set_then_get_counts_access() {
    let (manager, connector) = manager();
    manager.set("s1", &conn()).await.unwrap();
    assert_eq!(manager.size(), 1);
    assert_eq!(manager.get_state("s1").await.unwrap().access_count, 0);

    let client = manager.get("s1").await.unwrap();
    assert_eq!(client.database(), "default");
    assert_eq!(manager.get_state("s1").await.unwrap().access_count, 1);

    let options = connector.clients()[0].options().clone();
    assert_eq!(options.username.as_deref(), Some("root"));
    assert_eq!(options.password.as_deref(), Some("Milvus"));
}

#[tokio::test]
async fn test_concurrent_gets_are_all_counted() {
    let (manager, _) = manager();
    manager.set("s1", &conn()).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get("s1").await.map(|_| ()) })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(manager.get_state("s1").await.unwrap().access_count, 20);
}

#[tokio::test]
async fn test_get_unknown_or_removed_session() {
    let (manager, _) = manager();
    let err = manager.get("missing").await.err().unwrap();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "session not found: missing");

    manager.set("s1", &conn()).await.unwrap();
    manager.remove("s1").await.unwrap();
    assert!(manager.get("s1").await.err().unwrap().is_not_found());
    assert!(manager.remove("s1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_empty_session_id_rejected() {
    let (manager, connector) = manager();
    assert!(matches!(
        manager.set("", &conn()).await,
        Err(SessionError::EmptySessionId)
    ));
    assert!(matches!(manager.get("").await, Err(SessionError::EmptySessionId)));
    assert!(matches!(manager.remove("").await, Err(SessionError::EmptySessionId)));
    assert_eq!(connector.connect_count(), 0);
}

#[tokio::test]
async fn test_capacity_limit() {
    let (manager, connector) = manager_with(SessionManagerConfig::default().with_max_sessions(3));
    for id in ["a", "b", "c"] {
        manager.set(id, &conn()).await.unwrap();
    }

    let err = manager.set("d", &conn()).await.unwrap_err();
    assert!(matches!(err, SessionError::MaxSessionsReached(3)));
    assert_eq!(err.to_string(), "maximum number of sessions (3) reached");
    assert_eq!(manager.size(), 3);
    assert_eq!(connector.connect_count(), 3);

    // Replacing a live session does not need a free slot
    manager.set("a", &conn().with_database("analytics")).await.unwrap();
    assert_eq!(manager.size(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sets_respect_capacity() {
    let fake = Arc::new(FakeConnector::new());
    let connector = Arc::new(SlowConnector {
        inner: fake.clone(),
        delay: Duration::from_millis(50),
    });
    let manager = SessionManager::new(SessionManagerConfig::default().with_max_sessions(2), connector);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.set(&format!("s{i}"), &conn()).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(err) => assert!(matches!(err, SessionError::MaxSessionsReached(2)), "{err}"),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(manager.size(), 2);
    assert_eq!(manager.session_ids().await.len(), 2);
    // Connections opened for rejected sessions are closed again
    assert_eq!(fake.open_clients(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_expired_session_frees_its_slot_for_same_id() {
    let config = SessionManagerConfig::default()
        .with_max_sessions(1)
        .with_default_ttl(Duration::from_secs(10))
        .with_monitor_interval(Duration::ZERO);
    let (manager, connector) = manager_with(config);
    manager.set("s1", &conn()).await.unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    manager.set("s1", &conn()).await.unwrap();

    assert_eq!(manager.size(), 1);
    assert_eq!(connector.connect_count(), 2);
    assert!(connector.clients()[0].is_closed());
    assert!(!connector.clients()[1].is_closed());
}

#[tokio::test]
async fn test_remove_decrements_size_and_closes() {
    let (manager, connector) = manager();
    manager.set("s1", &conn()).await.unwrap();
    manager.set("s2", &conn()).await.unwrap();
    assert_eq!(manager.size(), 2);

    manager.remove("s1").await.unwrap();
    assert_eq!(manager.size(), 1);
    assert_eq!(manager.session_ids().await, vec!["s2"]);
    assert!(connector.clients()[0].is_closed());
    assert!(!connector.clients()[1].is_closed());
}

#[tokio::test]
async fn test_replacement_closes_previous_connection() {
    let (manager, connector) = manager();
    manager.set("s1", &conn()).await.unwrap();
    manager.get("s1").await.unwrap();
    manager.set("s1", &conn().with_database("analytics")).await.unwrap();

    assert_eq!(manager.size(), 1);
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(connector.open_clients(), 1);

    let clients = connector.clients();
    assert!(clients[0].is_closed());
    assert!(!clients[1].is_closed());

    let state = manager.get_state("s1").await.unwrap();
    assert_eq!(state.access_count, 0);
    assert_eq!(state.config.db_name, "analytics");
}

#[tokio::test]
async fn test_close_failure_does_not_fail_teardown() {
    let (manager, connector) = manager();
    connector.fail_closes(true);
    manager.set("s1", &conn()).await.unwrap();
    manager.set("s1", &conn()).await.unwrap();
    manager.remove("s1").await.unwrap();
    assert_eq!(manager.size(), 0);
    assert_eq!(connector.open_clients(), 0);
}

#[tokio::test]
async fn test_failed_connect_keeps_existing_session() {
    let (manager, connector) = manager();
    manager.set("s1", &conn()).await.unwrap();

    connector.fail_connects("connection refused");
    let err = manager.set("s1", &conn()).await.unwrap_err();
    assert!(matches!(err, SessionError::Connect(_)));
    assert!(err.to_string().starts_with("failed to create milvus client"));

    assert!(manager.get("s1").await.is_ok());
    assert!(!connector.clients()[0].is_closed());
}

#[tokio::test]
async fn test_bad_token_fails_before_connecting() {
    let (manager, connector) = manager();
    let config = ConnConfig::new("x").with_token("bad-token-format");
    let err = manager.set("s1", &config).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidConfig(_)));
    assert_eq!(
        err.to_string(),
        "failed to parse milvus config: invalid token format, e.g. username:password"
    );
    assert_eq!(connector.connect_count(), 0);
    assert_eq!(manager.size(), 0);
}

#[tokio::test]
async fn test_metadata_round_trip_and_isolation() {
    let (manager, _) = manager();
    manager.set("s1", &conn()).await.unwrap();
    manager
        .set_session_metadata("s1", "purpose", "analytics")
        .await
        .unwrap();
    manager.set_session_metadata("s1", "retries", 3).await.unwrap();

    let mut metadata = manager.get_session_metadata("s1").await.unwrap();
    assert_eq!(metadata["purpose"], json!("analytics"));
    assert_eq!(metadata["retries"], json!(3));

    metadata.insert("purpose".to_string(), json!("tampered"));
    metadata.clear();

    let stored = manager.get_session_metadata("s1").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored["purpose"], json!("analytics"));

    assert!(
        manager
            .set_session_metadata("missing", "k", "v")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_clear_closes_every_connection() {
    let (manager, connector) = manager();
    for id in ["a", "b", "c"] {
        manager.set(id, &conn()).await.unwrap();
    }

    manager.clear().await.unwrap();
    assert_eq!(manager.size(), 0);
    assert_eq!(connector.open_clients(), 0);
    assert!(manager.session_ids().await.is_empty());
    assert!(manager.get("a").await.is_err());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (manager, connector) = manager();
    manager.set("s1", &conn()).await.unwrap();

    manager.close().await.unwrap();
    manager.close().await.unwrap();

    assert!(manager.is_closed());
    assert_eq!(manager.size(), 0);
    assert_eq!(connector.clients()[0].close_calls(), 1);
    assert!(matches!(
        manager.set("s2", &conn()).await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn test_lifecycle_events_delivered() {
    let (manager, _) = manager();
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_callback(move |event, session_id, state| {
        let _ = tx.send((event, session_id.to_string(), state.access_count));
    });

    manager.set("s1", &conn()).await.unwrap();
    assert_eq!(next_event(&mut rx).await, (SessionEvent::Created, "s1".to_string(), 0));

    manager.get("s1").await.unwrap();
    assert_eq!(next_event(&mut rx).await, (SessionEvent::Accessed, "s1".to_string(), 1));

    manager.remove("s1").await.unwrap();
    assert_eq!(next_event(&mut rx).await, (SessionEvent::Removed, "s1".to_string(), 1));
}

#[tokio::test]
async fn test_panicking_callback_is_isolated() {
    let (manager, _) = manager();
    manager.add_event_callback(|_, _, _| panic!("callback exploded"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_callback(move |event, session_id, state| {
        let _ = tx.send((event, session_id.to_string(), state.access_count));
    });

    manager.set("s1", &conn()).await.unwrap();
    assert_eq!(next_event(&mut rx).await.0, SessionEvent::Created);

    manager.get("s1").await.unwrap();
    assert_eq!(next_event(&mut rx).await.0, SessionEvent::Accessed);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_on_lookup() {
    let config = SessionManagerConfig::default()
        .with_default_ttl(Duration::from_secs(60))
        .with_monitor_interval(Duration::from_secs(3600));
    let (manager, connector) = manager_with(config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.add_event_callback(move |event, session_id, state| {
        let _ = tx.send((event, session_id.to_string(), state.access_count));
    });

    manager.set("s1", &conn()).await.unwrap();
    assert_eq!(next_event(&mut rx).await.0, SessionEvent::Created);

    // Each access re-arms the TTL
    tokio::time::advance(Duration::from_secs(45)).await;
    manager.get("s1").await.unwrap();
    assert_eq!(next_event(&mut rx).await.0, SessionEvent::Accessed);
    tokio::time::advance(Duration::from_secs(45)).await;
    assert!(manager.get_state("s1").await.is_ok());

    tokio::time::advance(Duration::from_secs(16)).await;
    assert!(manager.get("s1").await.err().unwrap().is_not_found());
    assert_eq!(next_event(&mut rx).await.0, SessionEvent::Expired);
    assert_eq!(manager.size(), 0);
    assert!(connector.clients()[0].is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_sweeps_expired_sessions() {
    let config = SessionManagerConfig::default()
        .with_default_ttl(Duration::from_secs(10))
        .with_monitor_interval(Duration::from_secs(30));
    let (manager, connector) = manager_with(config);
    manager.set("s1", &conn()).await.unwrap();
    manager.set("s2", &conn()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(manager.size(), 0);
    assert_eq!(connector.open_clients(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_purge_only_expired() {
    let config = SessionManagerConfig::default()
        .with_default_ttl(Duration::from_secs(10))
        .with_monitor_interval(Duration::ZERO);
    let (manager, _) = manager_with(config);
    manager.set("old", &conn()).await.unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;
    manager.set("new", &conn()).await.unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;

    assert_eq!(manager.size(), 2);
    assert_eq!(manager.session_ids().await, vec!["new"]);
    assert_eq!(manager.purge_expired().await, 1);
    assert_eq!(manager.size(), 1);
}

#[tokio::test]
async fn test_hooks_annotate_and_cleanup() {
    let (manager, connector) = manager();
    let hooks = SessionHooks::new(manager.clone());

    // No backend session yet: nothing to annotate
    hooks.on_register("s1").await;
    assert!(manager.get_state("s1").await.is_err());

    manager.set("s1", &conn()).await.unwrap();
    hooks.on_register("s1").await;
    let metadata = manager.get_session_metadata("s1").await.unwrap();
    assert_eq!(metadata[CLIENT_TYPE], json!("mcp_client"));
    assert!(metadata.contains_key(CLIENT_CONNECTED_AT));

    hooks.on_unregister("s1").await;
    assert_eq!(manager.size(), 0);
    assert_eq!(connector.open_clients(), 0);

    // Unregistering an unknown session only logs
    hooks.on_unregister("s1").await;
}
