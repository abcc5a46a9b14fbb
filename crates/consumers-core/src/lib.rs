// crates/consumers-core/src/lib.rs
// ============================================================================
// Module: Consumer Registry Core Library
// Description: Public API surface for the consumer registry core.
// Purpose: Expose entity types, query composition, and runtime operations.
// Dependencies: crate::{core, interfaces, query, runtime}
// ============================================================================

//! ## Overview
//! The consumer registry core turns filter parameters into parameterized
//! statements, merges sparse update payloads into column writes, and projects
//! raw store rows into wire-shaped consumers. It is backend-agnostic: storage
//! is reached only through the [`ConsumerStore`] and [`ConsumerSession`]
//! interfaces, and every user-supplied value travels as a bound argument.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod query;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ConsumerRow;
pub use interfaces::ConsumerSession;
pub use interfaces::ConsumerStore;
pub use interfaces::SharedConsumerStore;
pub use interfaces::StoreError;
pub use interfaces::UsageTypeLookup;
pub use query::ConsumerColumn;
pub use query::FilterPredicate;
pub use query::PredicateKind;
pub use query::SqlValue;
pub use query::Statement;
pub use query::StatementKind;
pub use query::compose;
pub use runtime::ConsumerService;
pub use runtime::InMemoryConsumerStore;
pub use runtime::MergeOutcome;
