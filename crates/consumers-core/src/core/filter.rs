// crates/consumers-core/src/core/filter.rs
// ============================================================================
// Module: Consumer Filter Parameters
// Description: Request-scoped filter values for consumer listing.
// Purpose: Parse and validate raw query pairs before any statement is built.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A [`ConsumerFilter`] holds the typed, validated filter values. Empty values
//! are ignored and a filter whose value set is empty is inactive. Sets are
//! ordered so the same request always yields the same argument values,
//! regardless of the order in which query parameters arrived.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::error::ValidationError;
use crate::core::identifiers::ConsumerId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Query key carrying the usage threshold.
pub const USAGE_ABOVE_KEY: &str = "usageAbove";
/// Query key carrying consumer identifiers.
pub const IDENTIFIER_KEY: &str = "id";
/// Query key carrying area keys.
pub const AREA_KEY: &str = "in";

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Validated filter parameters for consumer listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerFilter {
    /// Select consumers with a usage measurement strictly above this value.
    pub usage_above: Option<f64>,
    /// Select consumers whose identifier is in this set.
    pub ids: BTreeSet<ConsumerId>,
    /// Select consumers located in any area with one of these keys.
    pub area_keys: BTreeSet<String>,
}

impl ConsumerFilter {
    /// Returns a filter selecting exactly one consumer.
    #[must_use]
    pub fn by_id(id: ConsumerId) -> Self {
        Self {
            ids: BTreeSet::from([id]),
            ..Self::default()
        }
    }

    /// Parses raw query pairs. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when an identifier is not canonical or the
    /// usage threshold is not a finite number.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                USAGE_ABOVE_KEY => {
                    if filter.usage_above.is_none() {
                        filter.usage_above = Some(parse_threshold(value)?);
                    }
                }
                IDENTIFIER_KEY => {
                    let id = ConsumerId::parse(value)
                        .map_err(|_| ValidationError::InvalidFilterIdentifier(value.to_string()))?;
                    filter.ids.insert(id);
                }
                AREA_KEY => {
                    filter.area_keys.insert(value.to_string());
                }
                _ => {}
            }
        }
        Ok(filter)
    }
}

/// Returns true when exactly one non-blank `id` value was supplied, which is
/// the deprecated way of addressing a single consumer. Repeated values count
/// individually even though the filter collapses them.
pub fn is_single_identifier_selection<I, K, V>(pairs: I) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .filter(|(key, value)| key.as_ref() == IDENTIFIER_KEY && !value.as_ref().trim().is_empty())
        .take(2)
        .count()
        == 1
}

/// Parses a usage threshold, rejecting non-finite values.
fn parse_threshold(value: &str) -> Result<f64, ValidationError> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ValidationError::UsageNotNumeric(value.to_string())),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
