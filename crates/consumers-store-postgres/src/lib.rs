// crates/consumers-store-postgres/src/lib.rs
// ============================================================================
// Module: Consumer Registry Postgres Store
// Description: PostgreSQL/PostGIS backend for the consumer store interfaces.
// Purpose: Provide durable consumer storage for deployed services.
// ============================================================================

//! Postgres-backed consumer storage.
//!
//! Implements [`consumers_core::ConsumerStore`] over an r2d2 pool of
//! synchronous `postgres` clients. The schema is owned externally; this crate
//! never creates or migrates tables.

/// Postgres consumer store and its configuration.
pub mod postgres_store;

pub use postgres_store::PostgresConsumerStore;
pub use postgres_store::PostgresStoreConfig;
pub use postgres_store::PostgresStoreError;
pub use postgres_store::shared_postgres_store;
