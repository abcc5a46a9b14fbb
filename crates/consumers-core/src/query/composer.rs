// crates/consumers-core/src/query/composer.rs
// ============================================================================
// Module: Query Composer
// Description: Folds active filter predicates into one select statement.
// Purpose: Produce deterministic statements with aligned arguments.
// Dependencies: crate::query
// ============================================================================

//! ## Overview
//! [`compose`] walks [`CANONICAL_PREDICATES`] in order, renders each active
//! predicate at the current argument offset, and joins them with `WHERE` and
//! `AND`. The statement text therefore depends only on which predicates are
//! active, and the argument list always lines up with the placeholders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ConsumerFilter;
use crate::query::predicate::CANONICAL_PREDICATES;
use crate::query::statement::Statement;
use crate::query::statement::StatementKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Unfiltered consumer projection. Column order matches [`crate::ConsumerRow`].
pub const BASE_QUERY: &str = "SELECT id, name, description, address, ST_AsGeoJSON(location) AS \
                              location, usage_type, additional_properties FROM \
                              water_usage.consumers";

// ============================================================================
// SECTION: Composer
// ============================================================================

/// Composes the select statement for a filter.
#[must_use]
pub fn compose(filter: &ConsumerFilter) -> Statement {
    let mut sql = String::from(BASE_QUERY);
    let mut args = Vec::new();
    let mut active = Vec::new();
    for predicate in &CANONICAL_PREDICATES {
        let Some(values) = predicate.arguments(filter) else {
            continue;
        };
        debug_assert_eq!(values.len(), predicate.arity, "{} arity", predicate.name);
        sql.push_str(if active.is_empty() { " WHERE " } else { " AND " });
        sql.push_str(&predicate.render(args.len()));
        args.extend(values);
        active.push(predicate.kind);
    }
    Statement {
        kind: StatementKind::SelectConsumers(active),
        sql,
        args,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
