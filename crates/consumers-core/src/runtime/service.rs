// crates/consumers-core/src/runtime/service.rs
// ============================================================================
// Module: Consumer Service
// Description: Transaction-per-operation entry points for consumer requests.
// Purpose: Give the HTTP layer one explicit context object for all operations.
// Dependencies: crate::{core, interfaces, query, runtime}
// ============================================================================

//! ## Overview
//! [`ConsumerService`] owns the shared store handle and runs every operation
//! in exactly one transaction. Payload validation happens before the
//! transaction opens, so malformed requests never reach the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Consumer;
use crate::core::ConsumerError;
use crate::core::ConsumerFilter;
use crate::core::ConsumerId;
use crate::core::IncomingConsumer;
use crate::interfaces::ConsumerSession;
use crate::interfaces::ConsumerStore;
use crate::interfaces::SharedConsumerStore;
use crate::query::SqlValue;
use crate::query::Statement;
use crate::query::StatementKind;
use crate::query::compose;
use crate::runtime::merge::MergeOutcome;
use crate::runtime::merge::create_consumer;
use crate::runtime::merge::fetch_consumer;
use crate::runtime::merge::merge_consumer;
use crate::runtime::projector::project_rows;

// ============================================================================
// SECTION: Transactions
// ============================================================================

/// Runs `work` in one store transaction and returns its output.
///
/// # Errors
///
/// Returns the work error or the store's transaction error.
pub fn within_transaction<S, T, F>(store: &S, work: F) -> Result<T, ConsumerError>
where
    S: ConsumerStore + ?Sized,
    F: FnOnce(&mut dyn ConsumerSession) -> Result<T, ConsumerError>,
{
    let mut work = Some(work);
    let mut output = None;
    store.run_in_transaction(&mut |session: &mut dyn ConsumerSession| {
        let work = work
            .take()
            .ok_or_else(|| ConsumerError::Execution("transaction work already ran".to_string()))?;
        output = Some(work(session)?);
        Ok(())
    })?;
    output.ok_or_else(|| ConsumerError::Execution("transaction produced no output".to_string()))
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Consumer operations over a shared store.
#[derive(Clone)]
pub struct ConsumerService {
    /// Store used for every operation.
    store: SharedConsumerStore,
}

impl ConsumerService {
    /// Creates a service over a store.
    #[must_use]
    pub const fn new(store: SharedConsumerStore) -> Self {
        Self {
            store,
        }
    }

    /// Lists consumers matching a filter; an inactive filter lists all.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError`] when the query or projection fails.
    pub fn list(&self, filter: &ConsumerFilter) -> Result<Vec<Consumer>, ConsumerError> {
        let statement = compose(filter);
        within_transaction(&self.store, |session| {
            let rows = session.query_consumers(&statement)?;
            project_rows(rows, session)
        })
    }

    /// Returns one consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::NotFound`] when the consumer does not exist.
    pub fn get(&self, id: ConsumerId) -> Result<Consumer, ConsumerError> {
        within_transaction(&self.store, |session| fetch_consumer(session, id))
    }

    /// Creates a consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError`] for invalid payloads, conflicts, and store
    /// failures.
    pub fn create(&self, payload: &IncomingConsumer) -> Result<Consumer, ConsumerError> {
        payload.validate_create()?;
        within_transaction(&self.store, |session| create_consumer(session, payload))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError`] for invalid payloads, unknown consumers,
    /// conflicts, and store failures.
    pub fn update(
        &self,
        id: ConsumerId,
        payload: &IncomingConsumer,
    ) -> Result<MergeOutcome, ConsumerError> {
        payload.validate_update()?;
        within_transaction(&self.store, |session| merge_consumer(session, id, payload))
    }

    /// Deletes a consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::NotFound`] when the consumer does not exist.
    pub fn delete(&self, id: ConsumerId) -> Result<(), ConsumerError> {
        let statement = Statement {
            kind: StatementKind::DeleteConsumer,
            sql: "DELETE FROM water_usage.consumers WHERE id = $1".to_string(),
            args: vec![SqlValue::Uuid(id.as_uuid())],
        };
        within_transaction(&self.store, |session| match session.execute(&statement)? {
            0 => Err(ConsumerError::NotFound(id)),
            _ => Ok(()),
        })
    }
}
