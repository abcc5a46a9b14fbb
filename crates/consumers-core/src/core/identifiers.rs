// crates/consumers-core/src/core/identifiers.rs
// ============================================================================
// Module: Consumer Identifiers
// Description: Strongly typed consumer identifier.
// Purpose: Enforce the canonical 128-bit textual grammar at the boundary.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Consumers are identified by store-assigned UUIDs. Parsing accepts only the
//! canonical hyphenated form (`8-4-4-4-12` hex digits) so braced, URN, and
//! unhyphenated spellings are rejected as client errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::ValidationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the canonical hyphenated textual form.
const CANONICAL_LENGTH: usize = 36;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Consumer identifier assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    /// Wraps a store-assigned UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Parses the canonical hyphenated textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] when the text is not a
    /// canonical UUID.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if text.len() != CANONICAL_LENGTH {
            return Err(ValidationError::InvalidIdentifier(text.to_string()));
        }
        Uuid::try_parse(text)
            .map(Self)
            .map_err(|_| ValidationError::InvalidIdentifier(text.to_string()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for ConsumerId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for ConsumerId {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
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

    #[test]
    fn parse_accepts_canonical_form() {
        let id = ConsumerId::parse("6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7b64").unwrap();
        assert_eq!(id.to_string(), "6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7b64");
    }

    #[test]
    fn parse_normalizes_uppercase_hex() {
        let id = ConsumerId::parse("6F1B2A4E-0C7D-4A3E-9B5F-2D8C1E0A7B64").unwrap();
        assert_eq!(id.to_string(), "6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7b64");
    }

    #[test]
    fn parse_rejects_non_canonical_spellings() {
        for text in [
            "6f1b2a4e0c7d4a3e9b5f2d8c1e0a7b64",
            "{6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7b64}",
            "urn:uuid:6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7b64",
            "6f1b2a4e-0c7d-4a3e-9b5f-2d8c1e0a7bzz",
            "",
        ] {
            assert!(
                matches!(ConsumerId::parse(text), Err(ValidationError::InvalidIdentifier(_))),
                "{text} should be rejected"
            );
        }
    }
}
