// crates/consumers-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Consumer Store
// Description: Transactional consumer store held in process memory.
// Purpose: Back tests and local runs without a relational database.
// Dependencies: crate::{core, interfaces, query}, serde_json, uuid
// ============================================================================

//! ## Overview
//! [`InMemoryConsumerStore`] interprets statements by their
//! [`StatementKind`] instead of parsing SQL. Each transaction works on a copy
//! of the state and publishes it only when the work succeeds, so failed
//! operations leave no partial writes. The `(name, location)` pair is unique,
//! matching the relational schema. Every executed statement is recorded in a
//! log for inspection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;
use uuid::Uuid;

use crate::core::ConsumerError;
use crate::core::ConsumerId;
use crate::core::Coordinates;
use crate::core::Location;
use crate::interfaces::ConsumerRow;
use crate::interfaces::ConsumerSession;
use crate::interfaces::ConsumerStore;
use crate::interfaces::StoreError;
use crate::interfaces::TransactionWork;
use crate::interfaces::UsageTypeLookup;
use crate::query::ConsumerColumn;
use crate::query::PredicateKind;
use crate::query::SqlValue;
use crate::query::Statement;
use crate::query::StatementKind;

// ============================================================================
// SECTION: State
// ============================================================================

/// Offset separating usage-type ids from consumer ids.
const USAGE_TYPE_ID_BASE: u128 = 0x7570_0000_0000_0000_0000_0000_0000_0000;

/// Stored consumer columns.
#[derive(Debug, Clone)]
struct StoredConsumer {
    /// Consumer name.
    name: String,
    /// Optional description.
    description: Option<String>,
    /// Optional address.
    address: Option<String>,
    /// Point location.
    coordinates: Coordinates,
    /// Internal usage-type reference.
    usage_type: Option<Uuid>,
    /// Attribute blob.
    additional_properties: Option<Value>,
}

/// Complete store contents.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Consumers by id.
    consumers: BTreeMap<Uuid, StoredConsumer>,
    /// External usage-type identifiers by internal id.
    usage_types: BTreeMap<Uuid, String>,
    /// Recorded usage amounts per consumer.
    usages: BTreeMap<Uuid, Vec<f64>>,
    /// Consumers contained in each area key.
    areas: BTreeMap<String, BTreeSet<Uuid>>,
    /// Last issued consumer id.
    last_id: u128,
    /// Last issued usage-type id.
    last_usage_type_id: u128,
}

impl MemoryState {
    /// Returns true when another consumer already holds the name and location.
    fn collides(&self, id: Option<Uuid>, name: &str, coordinates: Coordinates) -> bool {
        self.consumers.iter().any(|(existing, consumer)| {
            Some(*existing) != id && consumer.name == name && consumer.coordinates == coordinates
        })
    }

    /// Returns true when the consumer satisfies a predicate argument.
    fn matches(
        &self,
        id: Uuid,
        kind: PredicateKind,
        argument: &SqlValue,
    ) -> Result<bool, StoreError> {
        match (kind, argument) {
            (PredicateKind::UsageThreshold, SqlValue::Float(threshold)) => Ok(self
                .usages
                .get(&id)
                .is_some_and(|values| values.iter().any(|value| value > threshold))),
            (PredicateKind::IdentifierMembership, SqlValue::UuidArray(ids)) => {
                Ok(ids.contains(&id))
            }
            (PredicateKind::AreaContainment, SqlValue::TextArray(keys)) => Ok(keys
                .iter()
                .any(|key| self.areas.get(key).is_some_and(|members| members.contains(&id)))),
            _ => Err(StoreError::Execution("filter argument has the wrong type".to_string())),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory consumer store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConsumerStore {
    /// Store contents protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
    /// Kinds of every executed statement, committed or not.
    log: Arc<Mutex<Vec<StatementKind>>>,
}

impl InMemoryConsumerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a usage type and returns its internal id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when the identifier exists.
    pub fn add_usage_type(&self, external_identifier: &str) -> Result<Uuid, StoreError> {
        let mut guard = self.lock_state()?;
        if guard.usage_types.values().any(|existing| existing == external_identifier) {
            return Err(StoreError::UniqueViolation(format!(
                "usage type {external_identifier} already exists"
            )));
        }
        guard.last_usage_type_id += 1;
        let id = Uuid::from_u128(USAGE_TYPE_ID_BASE + guard.last_usage_type_id);
        guard.usage_types.insert(id, external_identifier.to_string());
        drop(guard);
        Ok(id)
    }

    /// Records a usage amount for a consumer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Execution`] when the consumer does not exist.
    pub fn record_usage(&self, consumer: ConsumerId, value: f64) -> Result<(), StoreError> {
        let mut guard = self.lock_state()?;
        let id = consumer.as_uuid();
        if !guard.consumers.contains_key(&id) {
            return Err(StoreError::Execution(format!("consumer {consumer} does not exist")));
        }
        guard.usages.entry(id).or_default().push(value);
        drop(guard);
        Ok(())
    }

    /// Marks a consumer as lying within the area identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Execution`] when the consumer does not exist.
    pub fn assign_area(&self, key: &str, consumer: ConsumerId) -> Result<(), StoreError> {
        let mut guard = self.lock_state()?;
        let id = consumer.as_uuid();
        if !guard.consumers.contains_key(&id) {
            return Err(StoreError::Execution(format!("consumer {consumer} does not exist")));
        }
        guard.areas.entry(key.to_string()).or_default().insert(id);
        drop(guard);
        Ok(())
    }

    /// Returns the kinds of all statements executed so far.
    #[must_use]
    pub fn statement_log(&self) -> Vec<StatementKind> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the number of write statements executed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|kind| kind.is_write())
            .count()
    }

    /// Returns the number of stored consumers.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).consumers.len()
    }

    /// Locks the store contents.
    fn lock_state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Execution("consumer store mutex poisoned".to_string()))
    }
}

impl ConsumerStore for InMemoryConsumerStore {
    fn run_in_transaction(&self, work: &mut TransactionWork<'_>) -> Result<(), ConsumerError> {
        let mut guard = self.lock_state()?;
        let mut session = MemorySession {
            state: guard.clone(),
            executed: Vec::new(),
        };
        let result = work(&mut session);
        if result.is_ok() {
            *guard = session.state;
        }
        drop(guard);
        self.log.lock().unwrap_or_else(PoisonError::into_inner).extend(session.executed);
        result
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Transaction-local view of the store.
struct MemorySession {
    /// Working copy of the store contents.
    state: MemoryState,
    /// Kinds of statements executed in this transaction.
    executed: Vec<StatementKind>,
}

impl MemorySession {
    /// Builds the projected row for a stored consumer.
    fn row(id: Uuid, consumer: &StoredConsumer) -> ConsumerRow {
        ConsumerRow {
            id,
            name: consumer.name.clone(),
            description: consumer.description.clone(),
            address: consumer.address.clone(),
            location: Location::from_coordinates(consumer.coordinates).to_geojson(),
            usage_type: consumer.usage_type,
            additional_properties: consumer.additional_properties.clone(),
        }
    }

    /// Inserts a consumer from `[name, latitude, longitude]`.
    fn insert(&mut self, args: &[SqlValue]) -> Result<ConsumerId, StoreError> {
        let [SqlValue::Text(name), SqlValue::Float(latitude), SqlValue::Float(longitude)] = args
        else {
            return Err(StoreError::Execution("insert expects name and location".to_string()));
        };
        let coordinates = Coordinates {
            latitude: *latitude,
            longitude: *longitude,
        };
        if self.state.collides(None, name, coordinates) {
            return Err(StoreError::UniqueViolation(format!(
                "consumer {name} already exists at this location"
            )));
        }
        self.state.last_id += 1;
        let id = Uuid::from_u128(self.state.last_id);
        self.state.consumers.insert(
            id,
            StoredConsumer {
                name: name.clone(),
                description: None,
                address: None,
                coordinates,
                usage_type: None,
                additional_properties: None,
            },
        );
        Ok(ConsumerId::new(id))
    }

    /// Updates one column group; the final argument is the consumer id.
    fn update(&mut self, column: ConsumerColumn, args: &[SqlValue]) -> Result<u64, StoreError> {
        let Some((SqlValue::Uuid(id), values)) = args.split_last() else {
            return Err(StoreError::Execution("update expects a trailing id".to_string()));
        };
        let Some(mut consumer) = self.state.consumers.get(id).cloned() else {
            return Ok(0);
        };
        match (column, values) {
            (ConsumerColumn::Name, [SqlValue::Text(name)]) => consumer.name = name.clone(),
            (ConsumerColumn::Description, [SqlValue::Text(text)]) => {
                consumer.description = Some(text.clone());
            }
            (ConsumerColumn::Address, [SqlValue::Text(text)]) => {
                consumer.address = Some(text.clone());
            }
            (ConsumerColumn::Location, [SqlValue::Float(latitude), SqlValue::Float(longitude)]) => {
                consumer.coordinates = Coordinates {
                    latitude: *latitude,
                    longitude: *longitude,
                };
            }
            (ConsumerColumn::UsageType, [SqlValue::Uuid(usage_type)]) => {
                if !self.state.usage_types.contains_key(usage_type) {
                    return Err(StoreError::Execution(format!(
                        "usage type {usage_type} does not exist"
                    )));
                }
                consumer.usage_type = Some(*usage_type);
            }
            (ConsumerColumn::AdditionalProperties, [SqlValue::Json(value)]) => {
                consumer.additional_properties = Some(value.clone());
            }
            _ => {
                return Err(StoreError::Execution(format!(
                    "unexpected arguments for column {}",
                    column.column_name()
                )));
            }
        }
        if self.state.collides(Some(*id), &consumer.name, consumer.coordinates) {
            return Err(StoreError::UniqueViolation(format!(
                "consumer {} already exists at this location",
                consumer.name
            )));
        }
        self.state.consumers.insert(*id, consumer);
        Ok(1)
    }

    /// Deletes one consumer with its usages and area memberships.
    fn delete(&mut self, args: &[SqlValue]) -> Result<u64, StoreError> {
        let [SqlValue::Uuid(id)] = args else {
            return Err(StoreError::Execution("delete expects an id".to_string()));
        };
        if self.state.consumers.remove(id).is_none() {
            return Ok(0);
        }
        self.state.usages.remove(id);
        for members in self.state.areas.values_mut() {
            members.remove(id);
        }
        Ok(1)
    }
}

impl UsageTypeLookup for MemorySession {
    fn usage_type_id(&mut self, external_identifier: &str) -> Result<Option<Uuid>, StoreError> {
        Ok(self
            .state
            .usage_types
            .iter()
            .find(|(_, identifier)| identifier.as_str() == external_identifier)
            .map(|(id, _)| *id))
    }

    fn usage_type_identifier(&mut self, id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.state.usage_types.get(&id).cloned())
    }
}

impl ConsumerSession for MemorySession {
    fn query_consumers(&mut self, statement: &Statement) -> Result<Vec<ConsumerRow>, StoreError> {
        self.executed.push(statement.kind.clone());
        let StatementKind::SelectConsumers(predicates) = &statement.kind else {
            return Err(StoreError::Execution(format!(
                "{} does not return consumers",
                statement.kind.label()
            )));
        };
        if predicates.len() != statement.args.len() {
            return Err(StoreError::Execution("predicate and argument counts differ".to_string()));
        }
        let mut rows = Vec::new();
        for (id, consumer) in &self.state.consumers {
            let mut selected = true;
            for (kind, argument) in predicates.iter().zip(&statement.args) {
                if !self.state.matches(*id, *kind, argument)? {
                    selected = false;
                    break;
                }
            }
            if selected {
                rows.push(Self::row(*id, consumer));
            }
        }
        Ok(rows)
    }

    fn query_consumer_id(
        &mut self,
        statement: &Statement,
    ) -> Result<Option<ConsumerId>, StoreError> {
        self.executed.push(statement.kind.clone());
        match statement.kind {
            StatementKind::InsertConsumer => self.insert(&statement.args).map(Some),
            _ => Err(StoreError::Execution(format!(
                "{} does not return an id",
                statement.kind.label()
            ))),
        }
    }

    fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        self.executed.push(statement.kind.clone());
        match statement.kind {
            StatementKind::UpdateColumn(column) => self.update(column, &statement.args),
            StatementKind::DeleteConsumer => self.delete(&statement.args),
            StatementKind::InsertConsumer => self.insert(&statement.args).map(|_| 1),
            StatementKind::SelectConsumers(_) => Err(StoreError::Execution(
                "select statements must be run as queries".to_string(),
            )),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
