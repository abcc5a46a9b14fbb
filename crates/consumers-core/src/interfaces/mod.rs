// crates/consumers-core/src/interfaces/mod.rs
// ============================================================================
// Module: Consumer Store Interfaces
// Description: Backend-agnostic store, session, and lookup contracts.
// Purpose: Isolate the core from any particular relational backend.
// Dependencies: serde_json, thiserror, uuid
// ============================================================================

//! ## Overview
//! A [`ConsumerStore`] runs a unit of work inside one transaction and hands it
//! a [`ConsumerSession`]. Sessions execute parameterized [`Statement`]s and
//! resolve usage-type references through [`UsageTypeLookup`]. Backends must
//! report unique-constraint violations as [`StoreError::UniqueViolation`] so
//! the core can surface them as conflicts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::ConsumerError;
use crate::core::ConsumerId;
use crate::query::Statement;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw consumer row as returned by the base projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerRow {
    /// Consumer identifier.
    pub id: Uuid,
    /// Consumer name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional address.
    pub address: Option<String>,
    /// Location rendered as a GeoJSON geometry document.
    pub location: String,
    /// Internal usage-type reference.
    pub usage_type: Option<Uuid>,
    /// Raw additional-properties blob.
    pub additional_properties: Option<Value>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Store access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The statement failed.
    #[error("statement failed: {0}")]
    Execution(String),
    /// The store returned data that cannot be decoded.
    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Resolves usage types between external identifiers and internal ids.
pub trait UsageTypeLookup {
    /// Returns the internal id for an external usage-type identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup cannot be performed.
    fn usage_type_id(&mut self, external_identifier: &str) -> Result<Option<Uuid>, StoreError>;

    /// Returns the external identifier for an internal usage-type id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup cannot be performed.
    fn usage_type_identifier(&mut self, id: Uuid) -> Result<Option<String>, StoreError>;
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Transaction-scoped statement execution.
pub trait ConsumerSession: UsageTypeLookup {
    /// Executes a select statement and decodes every consumer row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when execution or decoding fails.
    fn query_consumers(&mut self, statement: &Statement) -> Result<Vec<ConsumerRow>, StoreError>;

    /// Executes a statement returning at most one consumer id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when execution fails.
    fn query_consumer_id(&mut self, statement: &Statement)
    -> Result<Option<ConsumerId>, StoreError>;

    /// Executes a write statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when execution fails.
    fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Unit of work run against a session.
pub type TransactionWork<'a> =
    dyn FnMut(&mut dyn ConsumerSession) -> Result<(), ConsumerError> + 'a;

/// Transactional consumer store.
pub trait ConsumerStore {
    /// Runs `work` in one transaction, committing on success and rolling back
    /// on error.
    ///
    /// # Errors
    ///
    /// Returns the work error, or [`ConsumerError`] when the transaction
    /// cannot be opened or committed.
    fn run_in_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), ConsumerError>;
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared consumer store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedConsumerStore {
    /// Inner store implementation.
    inner: Arc<dyn ConsumerStore + Send + Sync>,
}

impl SharedConsumerStore {
    /// Wraps a consumer store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ConsumerStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn ConsumerStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl ConsumerStore for SharedConsumerStore {
    fn run_in_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), ConsumerError> {
        self.inner.run_in_transaction(work)
    }
}
