// crates/consumers-core/src/core/consumer.rs
// ============================================================================
// Module: Consumer Entity
// Description: Wire consumer record, location geometry, and incoming payload.
// Purpose: Define the shapes exchanged with clients and their validation.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`Consumer`] is the projected, wire-facing record. [`IncomingConsumer`] is
//! the sparse payload used by both create and partial update: a missing field
//! means "do not touch" on update and "absent" on create, except for the name
//! and coordinates which a create requires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::error::ValidationError;
use crate::core::identifiers::ConsumerId;

// ============================================================================
// SECTION: Location
// ============================================================================

/// Consumer location as a GeoJSON geometry in WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Location {
    /// Single point, `[longitude, latitude]` per GeoJSON axis order.
    Point {
        /// Longitude and latitude in degrees.
        coordinates: [f64; 2],
    },
}

impl Location {
    /// Builds a point location from a latitude/longitude pair.
    #[must_use]
    pub const fn from_coordinates(coordinates: Coordinates) -> Self {
        Self::Point {
            coordinates: [coordinates.longitude, coordinates.latitude],
        }
    }

    /// Parses a GeoJSON geometry document as produced by the store.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the text is not a GeoJSON point.
    pub fn from_geojson(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Renders the location as a GeoJSON geometry document.
    #[must_use]
    pub fn to_geojson(&self) -> String {
        let Self::Point {
            coordinates: [longitude, latitude],
        } = self;
        format!("{{\"type\":\"Point\",\"coordinates\":[{longitude},{latitude}]}}")
    }
}

/// Validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees, within `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, within `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Validates an ordered `[latitude, longitude]` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinates`] when the slice does not
    /// hold exactly two finite, in-range values.
    pub fn from_pair(pair: &[f64]) -> Result<Self, ValidationError> {
        let [latitude, longitude] = pair else {
            return Err(ValidationError::InvalidCoordinates(format!(
                "expected [latitude, longitude], got {} values",
                pair.len()
            )));
        };
        if !latitude.is_finite() || !(-90.0 ..= 90.0).contains(latitude) {
            return Err(ValidationError::InvalidCoordinates(format!(
                "latitude {latitude} out of range"
            )));
        }
        if !longitude.is_finite() || !(-180.0 ..= 180.0).contains(longitude) {
            return Err(ValidationError::InvalidCoordinates(format!(
                "longitude {longitude} out of range"
            )));
        }
        Ok(Self {
            latitude: *latitude,
            longitude: *longitude,
        })
    }
}

// ============================================================================
// SECTION: Consumer
// ============================================================================

/// Projected consumer record returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    /// Store-assigned identifier.
    pub id: ConsumerId,
    /// Consumer name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Optional postal address.
    pub address: Option<String>,
    /// Consumer location.
    pub location: Location,
    /// External identifier of the usage type, when assigned.
    pub usage_type: Option<String>,
    /// Open attribute map; `None` and an empty map are distinct.
    pub additional_properties: Option<Map<String, Value>>,
}

// ============================================================================
// SECTION: Incoming Consumer
// ============================================================================

/// Sparse consumer payload for create and partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IncomingConsumer {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New address.
    #[serde(default)]
    pub address: Option<String>,
    /// New location as `[latitude, longitude]`.
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
    /// External identifier of the new usage type.
    #[serde(default)]
    pub usage_type: Option<String>,
    /// Replacement attribute map, written wholesale.
    #[serde(default)]
    pub additional_properties: Option<Map<String, Value>>,
}

impl IncomingConsumer {
    /// Decodes a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinates`] when `coordinates` is
    /// not an array of numbers and [`ValidationError::InvalidPayload`] for any
    /// other decode failure.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let document: Value = serde_json::from_slice(body)
            .map_err(|err| ValidationError::InvalidPayload(err.to_string()))?;
        if let Some(coordinates) = document.get("coordinates") {
            check_coordinate_values(coordinates)?;
        }
        serde_json::from_value(document)
            .map_err(|err| ValidationError::InvalidPayload(err.to_string()))
    }

    /// Returns true when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.coordinates.is_none()
            && self.usage_type.is_none()
            && self.additional_properties.is_none()
    }

    /// Returns the validated coordinates, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinates`] for a malformed pair.
    pub fn coordinates(&self) -> Result<Option<Coordinates>, ValidationError> {
        self.coordinates.as_deref().map(Coordinates::from_pair).transpose()
    }

    /// Validates the fields present in a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank name or malformed coordinates.
    pub fn validate_update(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::BlankName);
        }
        self.coordinates()?;
        Ok(())
    }

    /// Validates a create payload, which additionally requires a name and
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a required field is absent or a
    /// present field is malformed.
    pub fn validate_create(&self) -> Result<(), ValidationError> {
        if self.name.is_none() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.coordinates.is_none() {
            return Err(ValidationError::MissingField("coordinates"));
        }
        self.validate_update()
    }
}

/// Rejects a present coordinates value that is not a list of numbers.
fn check_coordinate_values(coordinates: &Value) -> Result<(), ValidationError> {
    match coordinates {
        Value::Null => Ok(()),
        Value::Array(values) => match values.iter().position(|value| !value.is_number()) {
            Some(index) => Err(ValidationError::InvalidCoordinates(format!(
                "coordinate {index} is not a number"
            ))),
            None => Ok(()),
        },
        _ => Err(ValidationError::InvalidCoordinates(
            "expected [latitude, longitude]".to_string(),
        )),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
