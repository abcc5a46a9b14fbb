// crates/consumers-core/src/query/predicate.rs
// ============================================================================
// Module: Filter Predicates
// Description: Named, composable filter fragments with declared arity.
// Purpose: Describe each optional filter once so the composer can fold them.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each [`FilterPredicate`] is a declarative descriptor: a fragment written
//! against local placeholders, its arity, and how to extract arguments from
//! a [`ConsumerFilter`]. A predicate whose value set is empty is inactive.
//! Area containment is evaluated by the store against `geodata.shapes`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ConsumerFilter;
use crate::query::placeholders::renumber;
use crate::query::statement::SqlValue;

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Identity of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateKind {
    /// At least one usage measurement strictly above a threshold.
    UsageThreshold,
    /// Identifier is a member of a set.
    IdentifierMembership,
    /// Location lies within one of the referenced areas.
    AreaContainment,
}

/// Composable filter fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPredicate {
    /// Predicate identity.
    pub kind: PredicateKind,
    /// Stable name used in logs.
    pub name: &'static str,
    /// SQL fragment written with local placeholders `$1 ..= $arity`.
    pub fragment: &'static str,
    /// Number of positional parameters.
    pub arity: usize,
}

/// Usage threshold predicate.
pub const USAGE_THRESHOLD: FilterPredicate = FilterPredicate {
    kind: PredicateKind::UsageThreshold,
    name: "usage_above",
    fragment: "id IN (SELECT consumer FROM water_usage.usages WHERE value > $1::double \
               precision)",
    arity: 1,
};

/// Identifier membership predicate.
pub const IDENTIFIER_MEMBERSHIP: FilterPredicate = FilterPredicate {
    kind: PredicateKind::IdentifierMembership,
    name: "ids",
    fragment: "id = ANY($1)",
    arity: 1,
};

/// Area containment predicate.
pub const AREA_CONTAINMENT: FilterPredicate = FilterPredicate {
    kind: PredicateKind::AreaContainment,
    name: "area_keys",
    fragment: "EXISTS (SELECT 1 FROM geodata.shapes AS shape WHERE shape.key = ANY($1) AND \
               ST_Contains(shape.geom, location))",
    arity: 1,
};

/// Predicates in canonical composition order.
pub const CANONICAL_PREDICATES: [FilterPredicate; 3] =
    [USAGE_THRESHOLD, IDENTIFIER_MEMBERSHIP, AREA_CONTAINMENT];

impl FilterPredicate {
    /// Returns the bound arguments when the predicate is active.
    #[must_use]
    pub fn arguments(&self, filter: &ConsumerFilter) -> Option<Vec<SqlValue>> {
        match self.kind {
            PredicateKind::UsageThreshold => {
                filter.usage_above.map(|threshold| vec![SqlValue::Float(threshold)])
            }
            PredicateKind::IdentifierMembership => (!filter.ids.is_empty()).then(|| {
                vec![SqlValue::UuidArray(filter.ids.iter().map(|id| id.as_uuid()).collect())]
            }),
            PredicateKind::AreaContainment => (!filter.area_keys.is_empty())
                .then(|| vec![SqlValue::TextArray(filter.area_keys.iter().cloned().collect())]),
        }
    }

    /// Renders the fragment with placeholders starting after `offset`.
    #[must_use]
    pub fn render(&self, offset: usize) -> String {
        renumber(self.fragment, offset)
    }
}

/// Returns the names of the predicates a filter activates, in canonical order.
#[must_use]
pub fn active_predicate_names(filter: &ConsumerFilter) -> Vec<&'static str> {
    CANONICAL_PREDICATES
        .iter()
        .filter(|predicate| predicate.arguments(filter).is_some())
        .map(|predicate| predicate.name)
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
