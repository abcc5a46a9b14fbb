// crates/consumers-server/src/server.rs
// ============================================================================
// Module: Consumer HTTP Server
// Description: axum routes for listing, reading, creating, updating, and
//              deleting consumers.
// Purpose: Translate HTTP requests into consumer service calls.
// Dependencies: consumers-core, consumers-store-postgres, axum, tokio
// ============================================================================

//! ## Overview
//! The server owns one [`ConsumerService`] for its lifetime and hands it to
//! handlers through axum state. Store work is synchronous, so every service
//! call runs on the blocking pool. Every route except `/ping` passes the scope
//! check first, and every handled request emits exactly one audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::http::header::WARNING;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use consumers_config::ConsumersConfig;
use consumers_config::ServerAuditConfig;
use consumers_config::ServerAuthMode;
use consumers_core::ConsumerError;
use consumers_core::ConsumerFilter;
use consumers_core::ConsumerId;
use consumers_core::ConsumerService;
use consumers_core::IncomingConsumer;
use consumers_core::MergeOutcome;
use consumers_core::SharedConsumerStore;
use consumers_core::ValidationError;
use consumers_core::is_single_identifier_selection;
use consumers_core::query::predicate::active_predicate_names;
use consumers_store_postgres::shared_postgres_store;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use url::form_urlencoded;

use crate::audit::ConsumerAuditSink;
use crate::audit::ConsumerRequestEvent;
use crate::audit::ConsumerRequestEventParams;
use crate::audit::FileAuditSink;
use crate::audit::LifecycleAuditEvent;
use crate::audit::LifecycleKind;
use crate::audit::NoopAuditSink;
use crate::audit::ScopeAuditEvent;
use crate::audit::StderrAuditSink;
use crate::auth::ScopeGrant;
use crate::auth::ScopePolicy;
use crate::error::ApiError;

// ============================================================================
// SECTION: Consumer Server
// ============================================================================

/// Consumer registry HTTP server.
pub struct ConsumerServer {
    /// Validated configuration.
    config: ConsumersConfig,
    /// State shared with every handler.
    state: Arc<ServerState>,
}

impl ConsumerServer {
    /// Builds the server over a pooled Postgres store.
    ///
    /// Pool construction connects eagerly, so call this from a blocking
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerServerError`] when the config is invalid, the pool
    /// cannot be built, or the audit log cannot be opened.
    pub fn from_config(config: ConsumersConfig) -> Result<Self, ConsumerServerError> {
        config.validate().map_err(|err| ConsumerServerError::Config(err.to_string()))?;
        let store = shared_postgres_store(&config.store)
            .map_err(|err| ConsumerServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        Self::with_store(config, store, audit)
    }

    /// Builds the server over an existing store and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerServerError::Config`] when the config is invalid.
    pub fn with_store(
        config: ConsumersConfig,
        store: SharedConsumerStore,
        audit: Arc<dyn ConsumerAuditSink>,
    ) -> Result<Self, ConsumerServerError> {
        config.validate().map_err(|err| ConsumerServerError::Config(err.to_string()))?;
        let policy = ScopePolicy::from_config(&config.server.auth)
            .map_err(ConsumerServerError::Config)?;
        let state = Arc::new(ServerState {
            service: ConsumerService::new(store),
            service_name: config.service.name.trim().to_string(),
            policy,
            audit,
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the route table bound to this server's state.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(list_consumers).post(create_consumer).put(create_consumer_legacy))
            .route("/ping", get(ping))
            .route(
                "/{consumer_id}",
                get(get_consumer).patch(update_consumer).delete(delete_consumer),
            )
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Serves on the configured bind address until the process ends.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ConsumerServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serves on the configured bind address until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerServerError`] when binding or serving fails.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), ConsumerServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| ConsumerServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ConsumerServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerServerError::Transport`] when serving fails.
    pub async fn serve_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ConsumerServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bind = listener.local_addr().ok().map(|addr| addr.to_string());
        emit_disabled_auth_warning(&self.state, bind.clone());
        self.state.audit.record_lifecycle(&LifecycleAuditEvent::new(
            LifecycleKind::Startup,
            bind.clone(),
            Some(format!("{} accepting requests", self.state.service_name)),
        ));
        let app = self.router();
        let result =
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|_| ConsumerServerError::Transport("http server failed".to_string()));
        self.state.audit.record_lifecycle(&LifecycleAuditEvent::new(
            LifecycleKind::Shutdown,
            bind,
            None,
        ));
        result
    }
}

/// Selects the audit sink named by `[server.audit]`.
///
/// # Errors
///
/// Returns [`ConsumerServerError::Init`] when the audit file cannot be opened.
pub fn build_audit_sink(
    config: &ServerAuditConfig,
) -> Result<Arc<dyn ConsumerAuditSink>, ConsumerServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(std::path::Path::new(path.trim()))
                .map_err(|err| ConsumerServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Records a security warning when scope checking is off.
fn emit_disabled_auth_warning(state: &ServerState, bind: Option<String>) {
    if state.policy.mode() == ServerAuthMode::Disabled {
        state.audit.record_lifecycle(&LifecycleAuditEvent::new(
            LifecycleKind::SecurityWarning,
            bind,
            Some("scope checking disabled; every request is accepted".to_string()),
        ));
    }
}

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// Shared server state for handlers.
struct ServerState {
    /// Consumer operations.
    service: ConsumerService,
    /// Prefix for wire error codes.
    service_name: String,
    /// Scope check.
    policy: ScopePolicy,
    /// Audit sink.
    audit: Arc<dyn ConsumerAuditSink>,
    /// Maximum request body size.
    max_body_bytes: usize,
}

impl ServerState {
    /// Runs the scope check and audits its decision.
    fn authorize(&self, context: &RequestContext, headers: &HeaderMap) -> Result<(), ApiError> {
        match self.policy.authorize(headers) {
            Ok(ScopeGrant::Unchecked) => Ok(()),
            Ok(ScopeGrant::Granted) => {
                self.audit.record_scope(&ScopeAuditEvent::new(
                    Some(context.peer_ip.clone()),
                    context.path.clone(),
                    true,
                    "scope_granted",
                ));
                Ok(())
            }
            Err(error) => {
                self.audit.record_scope(&ScopeAuditEvent::new(
                    Some(context.peer_ip.clone()),
                    context.path.clone(),
                    false,
                    error.reason(),
                ));
                Err(error.into())
            }
        }
    }

    /// Runs a service call on the blocking pool.
    async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&ConsumerService) -> Result<T, ConsumerError> + Send + 'static,
    {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || work(&service))
            .await
            .map_err(|err| ApiError::internal(format!("blocking task failed: {err}")))?
            .map_err(|err| ApiError::from_consumer_error(&err))
    }

    /// Decodes a request body into a sparse consumer payload.
    fn decode_payload(
        &self,
        body: Result<Bytes, BytesRejection>,
    ) -> Result<IncomingConsumer, ApiError> {
        let bytes = body.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::body_too_large(self.max_body_bytes)
            } else {
                ApiError::from_validation(&ValidationError::InvalidPayload(rejection.body_text()))
            }
        })?;
        if bytes.len() > self.max_body_bytes {
            return Err(ApiError::body_too_large(self.max_body_bytes));
        }
        IncomingConsumer::from_json_slice(&bytes).map_err(|err| ApiError::from_validation(&err))
    }

    /// Renders the handler result and records the request audit event.
    fn finish(&self, context: RequestContext, result: Result<Reply, ApiError>) -> Response {
        let (status, error_code, detail, response) = match result {
            Ok(reply) => (reply.status, None, None, reply.into_response()),
            Err(error) => (
                error.status(),
                Some(error.code()),
                error.detail().map(str::to_string),
                (error.status(), Json(error.to_wire(&self.service_name))).into_response(),
            ),
        };
        self.audit.record(&ConsumerRequestEvent::new(ConsumerRequestEventParams {
            peer_ip: Some(context.peer_ip),
            method: context.method,
            path: context.path,
            operation: context.operation,
            status: status.as_u16(),
            error_code,
            filters: context.filters,
            consumer_id: context.consumer_id.map(|id| id.to_string()),
            detail,
        }));
        response
    }
}

/// Per-request facts collected for the audit event.
struct RequestContext {
    /// Peer IP address.
    peer_ip: String,
    /// HTTP method.
    method: &'static str,
    /// Request path.
    path: String,
    /// Operation label.
    operation: &'static str,
    /// Active filter predicate names.
    filters: Vec<&'static str>,
    /// Addressed or created consumer.
    consumer_id: Option<ConsumerId>,
}

impl RequestContext {
    /// Starts a context for one request.
    fn new(peer: SocketAddr, method: &'static str, path: String, operation: &'static str) -> Self {
        Self {
            peer_ip: peer.ip().to_string(),
            method,
            path,
            operation,
            filters: Vec::new(),
            consumer_id: None,
        }
    }

    /// Parses the path identifier and remembers it for auditing.
    fn consumer_id(&mut self, raw: &str) -> Result<ConsumerId, ApiError> {
        let id = ConsumerId::parse(raw).map_err(|err| ApiError::from_validation(&err))?;
        self.consumer_id = Some(id);
        Ok(id)
    }
}

/// Successful handler output.
struct Reply {
    /// Response status.
    status: StatusCode,
    /// Optional JSON body.
    body: Option<Value>,
    /// Extra response headers.
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Reply {
    /// Reply without a body.
    const fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Reply with a JSON body.
    fn json(status: StatusCode, value: &impl Serialize) -> Result<Self, ApiError> {
        let body = serde_json::to_value(value)
            .map_err(|err| ApiError::internal(format!("response serialization failed: {err}")))?;
        Ok(Self {
            status,
            body: Some(body),
            headers: Vec::new(),
        })
    }

    /// Adds a header when its value could be built.
    fn with_header(mut self, name: HeaderName, value: Option<HeaderValue>) -> Self {
        if let Some(value) = value {
            self.headers.push((name, value));
        }
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        for (name, value) in self.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}

/// Warning header value for the deprecated single-id listing.
fn deprecation_warning(service: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "299 {service} \"Selecting a single consumer using the id filter is deprecated. Please \
         use the /{{consumer-id}} endpoint\""
    ))
    .ok()
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Health probe; never checks scopes.
async fn ping() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /`
async fn list_consumers(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let mut context = RequestContext::new(peer, "GET", "/".to_string(), "list");
    let result = list_reply(&state, &mut context, &headers, query).await;
    state.finish(context, result)
}

/// Parses filters, lists matching consumers, and flags single-id selection.
async fn list_reply(
    state: &ServerState,
    context: &mut RequestContext,
    headers: &HeaderMap,
    query: Option<String>,
) -> Result<Reply, ApiError> {
    state.authorize(context, headers)?;
    let query = query.unwrap_or_default();
    let pairs = form_urlencoded::parse(query.as_bytes());
    let filter =
        ConsumerFilter::from_query_pairs(pairs).map_err(|err| ApiError::from_validation(&err))?;
    context.filters = active_predicate_names(&filter);
    let warning = is_single_identifier_selection(pairs)
        .then(|| deprecation_warning(&state.service_name))
        .flatten();
    let consumers = state.run(move |service| service.list(&filter)).await?;
    let reply = if consumers.is_empty() {
        Reply::empty(StatusCode::NO_CONTENT)
    } else {
        Reply::json(StatusCode::OK, &consumers)?
    };
    Ok(reply.with_header(WARNING, warning))
}

/// `GET /{consumer_id}`
async fn get_consumer(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let mut context = RequestContext::new(peer, "GET", format!("/{raw_id}"), "get");
    let result = async {
        state.authorize(&context, &headers)?;
        let id = context.consumer_id(&raw_id)?;
        let consumer = state.run(move |service| service.get(id)).await?;
        Reply::json(StatusCode::OK, &consumer)
    }
    .await;
    state.finish(context, result)
}

/// `POST /`
async fn create_consumer(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut context = RequestContext::new(peer, "POST", "/".to_string(), "create");
    let result = create_reply(&state, &mut context, &headers, body).await;
    state.finish(context, result)
}

/// `PUT /`, kept for clients of the original create route.
async fn create_consumer_legacy(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut context = RequestContext::new(peer, "PUT", "/".to_string(), "create");
    let result = create_reply(&state, &mut context, &headers, body).await;
    state.finish(context, result)
}

/// Creates a consumer and points `Location` at it.
async fn create_reply(
    state: &ServerState,
    context: &mut RequestContext,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Reply, ApiError> {
    state.authorize(context, headers)?;
    let payload = state.decode_payload(body)?;
    let consumer = state.run(move |service| service.create(&payload)).await?;
    context.consumer_id = Some(consumer.id);
    let location = HeaderValue::from_str(&format!("./{}", consumer.id)).ok();
    Ok(Reply::json(StatusCode::CREATED, &consumer)?.with_header(LOCATION, location))
}

/// `PATCH /{consumer_id}`
async fn update_consumer(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut context = RequestContext::new(peer, "PATCH", format!("/{raw_id}"), "update");
    let result = async {
        state.authorize(&context, &headers)?;
        let id = context.consumer_id(&raw_id)?;
        let payload = state.decode_payload(body)?;
        match state.run(move |service| service.update(id, &payload)).await? {
            MergeOutcome::Updated(consumer) => Reply::json(StatusCode::OK, &consumer),
            MergeOutcome::NotModified => Ok(Reply::empty(StatusCode::NOT_MODIFIED)),
        }
    }
    .await;
    state.finish(context, result)
}

/// `DELETE /{consumer_id}`
async fn delete_consumer(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let mut context = RequestContext::new(peer, "DELETE", format!("/{raw_id}"), "delete");
    let result = async {
        state.authorize(&context, &headers)?;
        let id = context.consumer_id(&raw_id)?;
        state.run(move |service| service.delete(id)).await?;
        Ok::<_, ApiError>(Reply::empty(StatusCode::NO_CONTENT))
    }
    .await;
    state.finish(context, result)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Consumer server errors.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
