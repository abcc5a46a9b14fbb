// crates/consumers-core/src/runtime/mod.rs
// ============================================================================
// Module: Consumer Runtime
// Description: Column-write planning, merging, projection, and the service.
// Purpose: Execute consumer operations against a transactional store.
// Dependencies: crate::{core, interfaces, query}
// ============================================================================

//! ## Overview
//! The runtime turns validated requests into statements, executes them inside
//! a single store transaction per operation, and projects the resulting rows.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod columns;
pub mod memory;
pub mod merge;
pub mod projector;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::InMemoryConsumerStore;
pub use merge::MergeOutcome;
pub use projector::project_row;
pub use projector::project_rows;
pub use service::ConsumerService;
pub use service::within_transaction;
