// crates/consumers-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Harness
// Description: In-process consumer server over the in-memory store.
// Purpose: Drive the HTTP surface with reqwest on an ephemeral port.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use consumers_config::ConsumersConfig;
use consumers_core::ConsumerStore;
use consumers_core::InMemoryConsumerStore;
use consumers_core::SharedConsumerStore;
use consumers_server::ConsumerAuditSink;
use consumers_server::ConsumerServer;
use consumers_server::ConsumerServerError;
use consumers_server::audit::ConsumerRequestEvent;
use consumers_server::audit::LifecycleAuditEvent;
use consumers_server::audit::ScopeAuditEvent;
use reqwest::RequestBuilder;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Scope required by the test server.
pub const SCOPE: &str = "water-usage:consumers";
/// Header carrying the caller's scopes.
pub const SCOPE_HEADER: &str = "X-Authenticated-Scope";

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub requests: Mutex<Vec<ConsumerRequestEvent>>,
    pub scopes: Mutex<Vec<ScopeAuditEvent>>,
    pub lifecycle: Mutex<Vec<LifecycleAuditEvent>>,
}

impl ConsumerAuditSink for RecordingAuditSink {
    fn record(&self, event: &ConsumerRequestEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_scope(&self, event: &ScopeAuditEvent) {
        self.scopes.lock().unwrap().push(event.clone());
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        self.lifecycle.lock().unwrap().push(event.clone());
    }
}

impl RecordingAuditSink {
    pub fn requests(&self) -> Vec<ConsumerRequestEvent> {
        self.requests.lock().unwrap().clone()
    }

    pub fn scopes(&self) -> Vec<ScopeAuditEvent> {
        self.scopes.lock().unwrap().clone()
    }

    pub fn lifecycle(&self) -> Vec<LifecycleAuditEvent> {
        self.lifecycle.lock().unwrap().clone()
    }
}

/// Running server plus handles into its store and audit log.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: InMemoryConsumerStore,
    pub audit: Arc<RecordingAuditSink>,
    client: reqwest::Client,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), ConsumerServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Request without scope header.
    pub fn anonymous(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Request carrying the required scope.
    pub fn scoped(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.anonymous(method, path).header(SCOPE_HEADER, format!("openid,{SCOPE}"))
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap().unwrap();
    }
}

/// Default config with the scope check satisfied.
pub fn scoped_config() -> ConsumersConfig {
    let mut config = ConsumersConfig::default();
    config.service.name = "water-usage".to_string();
    config.server.auth.scope = Some(SCOPE.to_string());
    config
}

/// Starts a server over a fresh in-memory store seeded with usage types.
pub async fn spawn_server(config: ConsumersConfig) -> TestServer {
    let store = InMemoryConsumerStore::new();
    store.add_usage_type("household").unwrap();
    store.add_usage_type("industry").unwrap();
    spawn_server_with_store(config, store.clone(), SharedConsumerStore::from_store(store)).await
}

/// Starts a server over an arbitrary store.
pub async fn spawn_server_over(
    config: ConsumersConfig,
    store: impl ConsumerStore + Send + Sync + 'static,
) -> TestServer {
    spawn_server_with_store(
        config,
        InMemoryConsumerStore::new(),
        SharedConsumerStore::from_store(store),
    )
    .await
}

async fn spawn_server_with_store(
    config: ConsumersConfig,
    memory: InMemoryConsumerStore,
    shared: SharedConsumerStore,
) -> TestServer {
    let audit = Arc::new(RecordingAuditSink::default());
    let sink: Arc<dyn ConsumerAuditSink> = audit.clone();
    let server = ConsumerServer::with_store(config, shared, sink).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, signal) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_listener(listener, async move {
        let _ = signal.await;
    }));
    TestServer {
        addr,
        store: memory,
        audit,
        client: reqwest::Client::new(),
        shutdown,
        handle,
    }
}
