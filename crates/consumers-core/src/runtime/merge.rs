// crates/consumers-core/src/runtime/merge.rs
// ============================================================================
// Module: Consumer Writes
// Description: Create and partial-update flows over a store session.
// Purpose: Touch only supplied columns and return the authoritative state.
// Dependencies: crate::{core, interfaces, query}
// ============================================================================

//! ## Overview
//! Both flows run inside the caller's transaction. A partial update locks the
//! addressed row, writes one statement per supplied column group, and re-reads
//! the row through the projector. An empty payload is reported as
//! [`MergeOutcome::NotModified`] without any write or re-read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Consumer;
use crate::core::ConsumerError;
use crate::core::ConsumerFilter;
use crate::core::ConsumerId;
use crate::core::IncomingConsumer;
use crate::interfaces::ConsumerRow;
use crate::interfaces::ConsumerSession;
use crate::query::compose;
use crate::runtime::columns::ResolvedConsumer;
use crate::runtime::columns::insert_statement;
use crate::runtime::columns::update_statements;
use crate::runtime::projector::project_row;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// At least one column changed; carries the post-update state.
    Updated(Consumer),
    /// The payload carried no field.
    NotModified,
}

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Fetches one consumer row by id.
///
/// # Errors
///
/// Returns [`ConsumerError`] when the statement fails.
pub fn fetch_row(
    session: &mut dyn ConsumerSession,
    id: ConsumerId,
    lock: bool,
) -> Result<Option<ConsumerRow>, ConsumerError> {
    let mut statement = compose(&ConsumerFilter::by_id(id));
    if lock {
        statement = statement.for_update();
    }
    Ok(session.query_consumers(&statement)?.into_iter().next())
}

/// Fetches and projects one consumer by id.
///
/// # Errors
///
/// Returns [`ConsumerError::NotFound`] when the consumer does not exist.
pub fn fetch_consumer(
    session: &mut dyn ConsumerSession,
    id: ConsumerId,
) -> Result<Consumer, ConsumerError> {
    let row = fetch_row(session, id, false)?.ok_or(ConsumerError::NotFound(id))?;
    project_row(row, session)
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Applies a sparse payload to an existing consumer.
///
/// # Errors
///
/// Returns [`ConsumerError::NotFound`] for an unknown id,
/// [`ConsumerError::Validation`] for an unknown usage type, and
/// [`ConsumerError::Conflict`] when the new name and location collide.
pub fn merge_consumer(
    session: &mut dyn ConsumerSession,
    id: ConsumerId,
    payload: &IncomingConsumer,
) -> Result<MergeOutcome, ConsumerError> {
    if fetch_row(session, id, true)?.is_none() {
        return Err(ConsumerError::NotFound(id));
    }
    if payload.is_empty() {
        return Ok(MergeOutcome::NotModified);
    }
    let resolved = ResolvedConsumer::resolve(payload, session)?;
    for statement in update_statements(id, &resolved) {
        if session.execute(&statement)? == 0 {
            return Err(ConsumerError::NotFound(id));
        }
    }
    fetch_consumer(session, id).map(MergeOutcome::Updated)
}

/// Creates a consumer and returns its stored state.
///
/// # Errors
///
/// Returns [`ConsumerError::Validation`] for missing fields or an unknown
/// usage type and [`ConsumerError::Conflict`] for a duplicate name and
/// location.
pub fn create_consumer(
    session: &mut dyn ConsumerSession,
    payload: &IncomingConsumer,
) -> Result<Consumer, ConsumerError> {
    let resolved = ResolvedConsumer::resolve(payload, session)?;
    let insert = insert_statement(&resolved)?;
    let id = session
        .query_consumer_id(&insert)?
        .ok_or_else(|| ConsumerError::Execution("insert returned no id".to_string()))?;
    let remaining = ResolvedConsumer {
        name: None,
        coordinates: None,
        ..resolved
    };
    for statement in update_statements(id, &remaining) {
        session.execute(&statement)?;
    }
    fetch_consumer(session, id)
}
