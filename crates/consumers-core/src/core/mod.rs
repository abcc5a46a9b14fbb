// crates/consumers-core/src/core/mod.rs
// ============================================================================
// Module: Consumer Registry Core Types
// Description: Canonical consumer entity, payload, filter, and error types.
// Purpose: Provide stable, serializable types shared by every layer.
// Dependencies: serde, serde_json, uuid
// ============================================================================

//! ## Overview
//! Core types define the consumer record, the sparse incoming payload, the
//! request-scoped filter parameters, and the error taxonomy. These types are
//! the canonical source of truth for the HTTP surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod consumer;
pub mod error;
pub mod filter;
pub mod identifiers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consumer::Consumer;
pub use consumer::Coordinates;
pub use consumer::IncomingConsumer;
pub use consumer::Location;
pub use error::ConsumerError;
pub use error::ValidationError;
pub use filter::ConsumerFilter;
pub use filter::is_single_identifier_selection;
pub use identifiers::ConsumerId;
