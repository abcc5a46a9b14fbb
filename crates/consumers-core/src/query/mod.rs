// crates/consumers-core/src/query/mod.rs
// ============================================================================
// Module: Consumer Query Construction
// Description: Statements, filter predicates, and the query composer.
// Purpose: Build injection-safe, deterministic parameterized statements.
// Dependencies: serde_json, uuid
// ============================================================================

//! ## Overview
//! Every statement the core issues is assembled here. Predicates carry
//! fragments written against local placeholders (`$1 ..= $arity`), and
//! [`placeholders::renumber`] shifts them to their final position, so
//! fragments compose at any offset without hard-coded indices.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod composer;
pub mod placeholders;
pub mod predicate;
pub mod statement;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use composer::BASE_QUERY;
pub use composer::compose;
pub use predicate::CANONICAL_PREDICATES;
pub use predicate::FilterPredicate;
pub use predicate::PredicateKind;
pub use statement::ConsumerColumn;
pub use statement::SqlValue;
pub use statement::Statement;
pub use statement::StatementKind;
