// crates/consumers-core/src/query/statement.rs
// ============================================================================
// Module: Statements
// Description: Parameterized statements and their bound argument values.
// Purpose: Carry SQL text and arguments separately to the store.
// Dependencies: serde_json, uuid
// ============================================================================

//! ## Overview
//! A [`Statement`] pairs SQL text with an ordered argument list. Arguments
//! are only ever bound by the store, never spliced into the text. The
//! [`StatementKind`] tells a backend what the statement does without parsing
//! SQL and gives logs a stable label.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use uuid::Uuid;

use crate::query::predicate::PredicateKind;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Typed argument bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Double-precision number.
    Float(f64),
    /// Text value.
    Text(String),
    /// Single UUID.
    Uuid(Uuid),
    /// UUID array (`uuid[]`).
    UuidArray(Vec<Uuid>),
    /// Text array (`text[]`).
    TextArray(Vec<String>),
    /// JSON document (`jsonb`).
    Json(Value),
}

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Mutable consumer columns (or column groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsumerColumn {
    /// `name`.
    Name,
    /// `description`.
    Description,
    /// `address`.
    Address,
    /// `location`, written from a latitude/longitude pair.
    Location,
    /// `usage_type`.
    UsageType,
    /// `additional_properties`.
    AdditionalProperties,
}

impl ConsumerColumn {
    /// Returns the column name in the consumers table.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Address => "address",
            Self::Location => "location",
            Self::UsageType => "usage_type",
            Self::AdditionalProperties => "additional_properties",
        }
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// What a statement does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Base projection filtered by the listed predicates, in argument order.
    SelectConsumers(Vec<PredicateKind>),
    /// Insert of the required columns, returning the new id.
    InsertConsumer,
    /// Update of a single column group for one consumer.
    UpdateColumn(ConsumerColumn),
    /// Delete of one consumer.
    DeleteConsumer,
}

impl StatementKind {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SelectConsumers(_) => "select-consumers",
            Self::InsertConsumer => "insert-consumer",
            Self::UpdateColumn(column) => match column {
                ConsumerColumn::Name => "update-consumer-name",
                ConsumerColumn::Description => "update-consumer-description",
                ConsumerColumn::Address => "update-consumer-address",
                ConsumerColumn::Location => "update-consumer-location",
                ConsumerColumn::UsageType => "update-consumer-usage-type",
                ConsumerColumn::AdditionalProperties => "update-consumer-additional-properties",
            },
            Self::DeleteConsumer => "delete-consumer",
        }
    }

    /// Returns true for statements that modify rows.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        !matches!(self, Self::SelectConsumers(_))
    }
}

/// Parameterized statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement purpose.
    pub kind: StatementKind,
    /// SQL text with positional placeholders.
    pub sql: String,
    /// Arguments in placeholder order.
    pub args: Vec<SqlValue>,
}

impl Statement {
    /// Appends a row lock so concurrent writers wait for this transaction.
    #[must_use]
    pub fn for_update(mut self) -> Self {
        self.sql.push_str(" FOR UPDATE");
        self
    }
}
