// crates/consumers-config/src/lib.rs
// ============================================================================
// Module: Consumer Registry Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for consumers.toml semantics.
// Dependencies: consumers-store-postgres, serde, toml
// ============================================================================

//! ## Overview
//! `consumers-config` defines the configuration model for the consumer
//! registry service and validates it fail-closed before the server starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use consumers_store_postgres::PostgresStoreConfig;
