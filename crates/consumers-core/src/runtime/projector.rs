// crates/consumers-core/src/runtime/projector.rs
// ============================================================================
// Module: Result Projector
// Description: Maps raw consumer rows to wire consumers.
// Purpose: Resolve usage-type references and decode stored blobs.
// Dependencies: crate::{core, interfaces}, serde_json, uuid
// ============================================================================

//! ## Overview
//! Projection is all-or-nothing: a row whose usage-type reference does not
//! resolve fails with [`ConsumerError::Lookup`] and a list containing such a
//! row fails as a whole. A missing reference projects to `None`, and a
//! missing properties blob stays `None` rather than becoming an empty map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

use crate::core::Consumer;
use crate::core::ConsumerError;
use crate::core::ConsumerId;
use crate::core::Location;
use crate::interfaces::ConsumerRow;
use crate::interfaces::UsageTypeLookup;

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projects one row.
///
/// # Errors
///
/// Returns [`ConsumerError::Lookup`] for an unresolvable usage-type reference
/// and [`ConsumerError::Execution`] for undecodable row data.
pub fn project_row<L>(row: ConsumerRow, lookup: &mut L) -> Result<Consumer, ConsumerError>
where
    L: UsageTypeLookup + ?Sized,
{
    let usage_type = row.usage_type.map(|id| resolve_usage_type(id, lookup)).transpose()?;
    assemble(row, usage_type)
}

/// Projects every row, resolving each distinct usage type once.
///
/// # Errors
///
/// Returns the first projection error; no partial list is returned.
pub fn project_rows<L>(
    rows: Vec<ConsumerRow>,
    lookup: &mut L,
) -> Result<Vec<Consumer>, ConsumerError>
where
    L: UsageTypeLookup + ?Sized,
{
    let mut resolved: BTreeMap<Uuid, String> = BTreeMap::new();
    let mut consumers = Vec::with_capacity(rows.len());
    for row in rows {
        let usage_type = match row.usage_type {
            None => None,
            Some(id) => {
                if let Some(identifier) = resolved.get(&id) {
                    Some(identifier.clone())
                } else {
                    let identifier = resolve_usage_type(id, lookup)?;
                    resolved.insert(id, identifier.clone());
                    Some(identifier)
                }
            }
        };
        consumers.push(assemble(row, usage_type)?);
    }
    Ok(consumers)
}

/// Resolves an internal usage-type id to its external identifier.
fn resolve_usage_type<L>(id: Uuid, lookup: &mut L) -> Result<String, ConsumerError>
where
    L: UsageTypeLookup + ?Sized,
{
    lookup
        .usage_type_identifier(id)?
        .ok_or_else(|| ConsumerError::Lookup(format!("usage type {id} does not resolve")))
}

/// Builds the wire consumer from a row and its resolved usage type.
fn assemble(row: ConsumerRow, usage_type: Option<String>) -> Result<Consumer, ConsumerError> {
    let location = Location::from_geojson(&row.location).map_err(|err| {
        ConsumerError::Execution(format!("consumer {} has an invalid location: {err}", row.id))
    })?;
    let additional_properties = match row.additional_properties {
        None | Some(Value::Null) => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(_) => {
            return Err(ConsumerError::Execution(format!(
                "consumer {} has non-object additional properties",
                row.id
            )));
        }
    };
    Ok(Consumer {
        id: ConsumerId::new(row.id),
        name: row.name,
        description: row.description,
        address: row.address,
        location,
        usage_type,
        additional_properties,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
