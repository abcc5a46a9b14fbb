// crates/consumers-core/src/core/error.rs
// ============================================================================
// Module: Consumer Errors
// Description: Error taxonomy for consumer operations.
// Purpose: Separate client faults from store and lookup failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ValidationError`] covers malformed filters and payloads and is always
//! raised before the store is touched. [`ConsumerError`] wraps it alongside
//! the not-found, conflict, lookup, and execution conditions. Store failures
//! only become [`ConsumerError::Conflict`] when the store reports a unique
//! violation; every other store failure is an execution failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::ConsumerId;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A consumer identifier is not a canonical UUID.
    #[error("invalid consumer identifier: {0}")]
    InvalidIdentifier(String),
    /// A filter identifier is not a canonical UUID.
    #[error("invalid consumer identifier in filter: {0}")]
    InvalidFilterIdentifier(String),
    /// The usage threshold is not a finite number.
    #[error("usage threshold is not a number: {0}")]
    UsageNotNumeric(String),
    /// Coordinates are not a valid latitude/longitude pair.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
    /// A field required on create is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// A supplied name is empty or whitespace.
    #[error("consumer name must not be blank")]
    BlankName,
    /// A supplied usage type matches no known usage type.
    #[error("unknown usage type: {0}")]
    UnknownUsageType(String),
    /// The payload could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// SECTION: Consumer Errors
// ============================================================================

/// Consumer operation errors.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Malformed filter value or payload.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Addressed consumer does not exist.
    #[error("no consumer found with id {0}")]
    NotFound(ConsumerId),
    /// Uniqueness violation on create or update.
    #[error("consumer conflict: {0}")]
    Conflict(String),
    /// A stored reference does not resolve.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// Store unreachable, statement failure, or corrupt row data.
    #[error("store execution failed: {0}")]
    Execution(String),
}

impl From<StoreError> for ConsumerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(message) => Self::Conflict(message),
            other => Self::Execution(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let error =
            ConsumerError::from(StoreError::UniqueViolation("consumers_name_location".into()));
        assert!(matches!(
            error,
            ConsumerError::Conflict(ref constraint) if constraint == "consumers_name_location"
        ));
    }

    #[test]
    fn other_store_errors_map_to_execution() {
        for store_error in [
            StoreError::Unavailable("pool timed out".into()),
            StoreError::Execution("syntax error".into()),
            StoreError::Corrupt("bad geometry".into()),
        ] {
            assert!(matches!(ConsumerError::from(store_error), ConsumerError::Execution(_)));
        }
    }
}
