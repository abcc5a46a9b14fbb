// crates/consumers-server/src/lib.rs
// ============================================================================
// Module: Consumer Registry Server Library
// Description: HTTP surface for the consumer registry.
// Purpose: Expose the axum server, scope check, audit sinks, and wire errors.
// Dependencies: axum, consumers-config, consumers-core, tokio
// ============================================================================

//! ## Overview
//! `consumers-server` serves the consumer registry over HTTP. Requests are
//! scope-checked, translated into [`consumers_core::ConsumerService`] calls on
//! the blocking pool, and answered with JSON consumers or structured error
//! bodies. Each request is recorded on the configured audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod error;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::ConsumerAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::ScopePolicy;
pub use error::ApiError;
pub use error::WireError;
pub use server::ConsumerServer;
pub use server::ConsumerServerError;
pub use server::build_audit_sink;
