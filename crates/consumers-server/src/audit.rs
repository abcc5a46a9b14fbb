// crates/consumers-server/src/audit.rs
// ============================================================================
// Module: Consumer Audit Logging
// Description: Structured audit events for consumer request handling.
// Purpose: Emit JSON-lines audit records without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are the only place internal failure detail is written. The
//! HTTP layer returns generic error bodies and records the underlying cause
//! here so operators can correlate a 500 with the store failure behind it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Classification of a handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The request completed with a 2xx or 3xx status.
    Success,
    /// The request was refused because of a client fault.
    Rejected,
    /// The request failed on the server side.
    Failed,
}

/// Consumer request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerRequestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: &'static str,
    /// Request path.
    pub path: String,
    /// Operation label (`list`, `get`, `create`, `update`, `delete`).
    pub operation: &'static str,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Wire error code when the request failed.
    pub error_code: Option<&'static str>,
    /// Names of the filter predicates that were active.
    pub filters: Vec<&'static str>,
    /// Addressed or created consumer id.
    pub consumer_id: Option<String>,
    /// Internal failure detail; never sent to the client.
    pub detail: Option<String>,
}

/// Scope check audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Request path.
    pub path: String,
    /// Whether the request was allowed through.
    pub allowed: bool,
    /// Decision reason label.
    pub reason: &'static str,
}

/// Server lifecycle audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle event kind.
    pub kind: LifecycleKind,
    /// Listener address when known.
    pub bind: Option<String>,
    /// Optional message.
    pub message: Option<String>,
}

/// Lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Listener bound and accepting requests.
    Startup,
    /// Listener stopped.
    Shutdown,
    /// Security posture warning.
    SecurityWarning,
}

/// Inputs required to construct a consumer request event.
pub struct ConsumerRequestEventParams {
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: &'static str,
    /// Request path.
    pub path: String,
    /// Operation label.
    pub operation: &'static str,
    /// HTTP status code returned.
    pub status: u16,
    /// Wire error code when the request failed.
    pub error_code: Option<&'static str>,
    /// Names of the active filter predicates.
    pub filters: Vec<&'static str>,
    /// Addressed or created consumer id.
    pub consumer_id: Option<String>,
    /// Internal failure detail.
    pub detail: Option<String>,
}

// ============================================================================
// SECTION: Constructors
// ============================================================================

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl ConsumerRequestEvent {
    /// Creates a new request event; the outcome is derived from the status.
    #[must_use]
    pub fn new(params: ConsumerRequestEventParams) -> Self {
        let outcome = match params.status {
            500 .. => RequestOutcome::Failed,
            400 .. => RequestOutcome::Rejected,
            _ => RequestOutcome::Success,
        };
        Self {
            event: "consumer_request",
            timestamp_ms: now_ms(),
            peer_ip: params.peer_ip,
            method: params.method,
            path: params.path,
            operation: params.operation,
            outcome,
            status: params.status,
            error_code: params.error_code,
            filters: params.filters,
            consumer_id: params.consumer_id,
            detail: params.detail,
        }
    }
}

impl ScopeAuditEvent {
    /// Creates a new scope check event.
    #[must_use]
    pub fn new(peer_ip: Option<String>, path: String, allowed: bool, reason: &'static str) -> Self {
        Self {
            event: "scope_check",
            timestamp_ms: now_ms(),
            peer_ip,
            path,
            allowed,
            reason,
        }
    }
}

impl LifecycleAuditEvent {
    /// Creates a new lifecycle event.
    #[must_use]
    pub fn new(kind: LifecycleKind, bind: Option<String>, message: Option<String>) -> Self {
        Self {
            event: "server_lifecycle",
            timestamp_ms: now_ms(),
            kind,
            bind,
            message,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for consumer registry events.
pub trait ConsumerAuditSink: Send + Sync {
    /// Record a request event.
    fn record(&self, event: &ConsumerRequestEvent);

    /// Record a scope check event.
    fn record_scope(&self, _event: &ScopeAuditEvent) {}

    /// Record a lifecycle event.
    fn record_lifecycle(&self, _event: &LifecycleAuditEvent) {}
}

/// Serializes an event and writes it as one line.
fn write_line(writer: &mut impl Write, event: &impl Serialize) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
        let _ = writer.flush();
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ConsumerAuditSink for StderrAuditSink {
    fn record(&self, event: &ConsumerRequestEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_scope(&self, event: &ScopeAuditEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        write_line(&mut io::stderr(), event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one event while holding the file lock.
    fn append(&self, event: &impl Serialize) {
        if let Ok(mut file) = self.file.lock() {
            write_line(&mut *file, event);
        }
    }
}

impl ConsumerAuditSink for FileAuditSink {
    fn record(&self, event: &ConsumerRequestEvent) {
        self.append(event);
    }

    fn record_scope(&self, event: &ScopeAuditEvent) {
        self.append(event);
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl ConsumerAuditSink for NoopAuditSink {
    fn record(&self, _event: &ConsumerRequestEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
