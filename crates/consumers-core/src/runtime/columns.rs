// crates/consumers-core/src/runtime/columns.rs
// ============================================================================
// Module: Column Writes
// Description: Table of mutable consumer columns and their write statements.
// Purpose: Derive create and update statements from one field table.
// Dependencies: crate::{core, interfaces, query}, serde_json, uuid
// ============================================================================

//! ## Overview
//! [`COLUMN_WRITES`] lists every mutable column group once: the column, the
//! value expression (local placeholders), and how to pull its arguments from
//! a [`ResolvedConsumer`]. Updates emit one statement per present entry; the
//! insert reuses the name and location entries, so create and update cannot
//! drift apart. The location pair is a single expression, so both
//! coordinates are always written together.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::core::ConsumerError;
use crate::core::ConsumerId;
use crate::core::Coordinates;
use crate::core::IncomingConsumer;
use crate::core::ValidationError;
use crate::interfaces::UsageTypeLookup;
use crate::query::ConsumerColumn;
use crate::query::SqlValue;
use crate::query::Statement;
use crate::query::StatementKind;
use crate::query::placeholders::renumber;

// ============================================================================
// SECTION: Resolved Payload
// ============================================================================

/// Incoming payload with validated coordinates and a resolved usage type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConsumer {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New location.
    pub coordinates: Option<Coordinates>,
    /// Internal id of the new usage type.
    pub usage_type: Option<Uuid>,
    /// Replacement attribute map.
    pub additional_properties: Option<Map<String, Value>>,
}

impl ResolvedConsumer {
    /// Validates coordinates and resolves the usage type through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownUsageType`] when the usage type does
    /// not resolve, or [`ConsumerError`] when the lookup itself fails.
    pub fn resolve<L>(payload: &IncomingConsumer, lookup: &mut L) -> Result<Self, ConsumerError>
    where
        L: UsageTypeLookup + ?Sized,
    {
        let coordinates = payload.coordinates()?;
        let usage_type = match payload.usage_type.as_deref() {
            None => None,
            Some(external) => Some(
                lookup
                    .usage_type_id(external.trim())?
                    .ok_or_else(|| ValidationError::UnknownUsageType(external.to_string()))?,
            ),
        };
        Ok(Self {
            name: payload.name.clone(),
            description: payload.description.clone(),
            address: payload.address.clone(),
            coordinates,
            usage_type,
            additional_properties: payload.additional_properties.clone(),
        })
    }
}

// ============================================================================
// SECTION: Column Table
// ============================================================================

/// One mutable column group.
#[derive(Debug, Clone, Copy)]
pub struct ColumnWrite {
    /// Column written.
    pub column: ConsumerColumn,
    /// Value expression with local placeholders.
    pub expression: &'static str,
    /// Arguments for the expression when the field is present.
    pub values: fn(&ResolvedConsumer) -> Option<Vec<SqlValue>>,
}

/// Name column.
const NAME: ColumnWrite = ColumnWrite {
    column: ConsumerColumn::Name,
    expression: "$1",
    values: name_values,
};

/// Location column, written from `[latitude, longitude]`.
const LOCATION: ColumnWrite = ColumnWrite {
    column: ConsumerColumn::Location,
    expression: "ST_SetSRID(ST_MakePoint($2, $1), 4326)",
    values: location_values,
};

/// Every mutable column group in update order.
pub const COLUMN_WRITES: [ColumnWrite; 6] = [
    NAME,
    ColumnWrite {
        column: ConsumerColumn::Description,
        expression: "$1",
        values: description_values,
    },
    ColumnWrite {
        column: ConsumerColumn::Address,
        expression: "$1",
        values: address_values,
    },
    LOCATION,
    ColumnWrite {
        column: ConsumerColumn::UsageType,
        expression: "$1",
        values: usage_type_values,
    },
    ColumnWrite {
        column: ConsumerColumn::AdditionalProperties,
        expression: "$1",
        values: additional_properties_values,
    },
];

/// Arguments for the name column.
fn name_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer.name.clone().map(|name| vec![SqlValue::Text(name)])
}

/// Arguments for the description column.
fn description_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer.description.clone().map(|description| vec![SqlValue::Text(description)])
}

/// Arguments for the address column.
fn address_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer.address.clone().map(|address| vec![SqlValue::Text(address)])
}

/// Arguments for the location pair, latitude first.
fn location_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer.coordinates.map(|coordinates| {
        vec![SqlValue::Float(coordinates.latitude), SqlValue::Float(coordinates.longitude)]
    })
}

/// Arguments for the usage-type reference.
fn usage_type_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer.usage_type.map(|id| vec![SqlValue::Uuid(id)])
}

/// Arguments for the attribute map, serialized as one JSON object.
fn additional_properties_values(consumer: &ResolvedConsumer) -> Option<Vec<SqlValue>> {
    consumer
        .additional_properties
        .clone()
        .map(|properties| vec![SqlValue::Json(Value::Object(properties))])
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// Builds one update statement per present column group.
#[must_use]
pub fn update_statements(id: ConsumerId, consumer: &ResolvedConsumer) -> Vec<Statement> {
    COLUMN_WRITES
        .iter()
        .filter_map(|write| {
            let mut args = (write.values)(consumer)?;
            let sql = format!(
                "UPDATE water_usage.consumers SET {} = {} WHERE id = ${}",
                write.column.column_name(),
                write.expression,
                args.len() + 1
            );
            args.push(SqlValue::Uuid(id.as_uuid()));
            Some(Statement {
                kind: StatementKind::UpdateColumn(write.column),
                sql,
                args,
            })
        })
        .collect()
}

/// Builds the insert for the required columns, returning the new id.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] when the name or location is
/// absent.
pub fn insert_statement(consumer: &ResolvedConsumer) -> Result<Statement, ValidationError> {
    let mut columns = Vec::with_capacity(2);
    let mut expressions = Vec::with_capacity(2);
    let mut args = Vec::new();
    for (write, field) in [(NAME, "name"), (LOCATION, "coordinates")] {
        let values = (write.values)(consumer).ok_or(ValidationError::MissingField(field))?;
        columns.push(write.column.column_name());
        expressions.push(renumber(write.expression, args.len()));
        args.extend(values);
    }
    Ok(Statement {
        kind: StatementKind::InsertConsumer,
        sql: format!(
            "INSERT INTO water_usage.consumers ({}) VALUES ({}) RETURNING id",
            columns.join(", "),
            expressions.join(", ")
        ),
        args,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;
    use crate::query::placeholders::placeholder_indices;

    fn id() -> ConsumerId {
        ConsumerId::new(Uuid::from_u128(7))
    }

    #[test]
    fn empty_payload_yields_no_updates() {
        assert!(update_statements(id(), &ResolvedConsumer::default()).is_empty());
    }

    #[test]
    fn name_only_yields_one_update() {
        let consumer = ResolvedConsumer {
            name: Some("Well 7".to_string()),
            ..ResolvedConsumer::default()
        };
        let statements = update_statements(id(), &consumer);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "UPDATE water_usage.consumers SET name = $1 WHERE id = $2");
        assert_eq!(
            statements[0].args,
            vec![SqlValue::Text("Well 7".to_string()), SqlValue::Uuid(id().as_uuid())]
        );
    }

    #[test]
    fn location_pair_is_one_statement() {
        let consumer = ResolvedConsumer {
            coordinates: Some(Coordinates {
                latitude: 51.2,
                longitude: 7.1,
            }),
            ..ResolvedConsumer::default()
        };
        let statements = update_statements(id(), &consumer);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].kind, StatementKind::UpdateColumn(ConsumerColumn::Location));
        assert_eq!(
            statements[0].sql,
            "UPDATE water_usage.consumers SET location = ST_SetSRID(ST_MakePoint($2, $1), 4326) \
             WHERE id = $3"
        );
        assert_eq!(placeholder_indices(&statements[0].sql).len(), statements[0].args.len());
    }

    #[test]
    fn insert_renumbers_location_after_name() {
        let consumer = ResolvedConsumer {
            name: Some("Well 7".to_string()),
            coordinates: Some(Coordinates {
                latitude: 51.2,
                longitude: 7.1,
            }),
            ..ResolvedConsumer::default()
        };
        let statement = insert_statement(&consumer).unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO water_usage.consumers (name, location) VALUES ($1, \
             ST_SetSRID(ST_MakePoint($3, $2), 4326)) RETURNING id"
        );
        assert_eq!(
            statement.args,
            vec![
                SqlValue::Text("Well 7".to_string()),
                SqlValue::Float(51.2),
                SqlValue::Float(7.1),
            ]
        );
    }

    #[test]
    fn insert_requires_location() {
        let consumer = ResolvedConsumer {
            name: Some("Well 7".to_string()),
            ..ResolvedConsumer::default()
        };
        assert_eq!(insert_statement(&consumer), Err(ValidationError::MissingField("coordinates")));
    }
}
