// crates/consumers-server/src/error.rs
// ============================================================================
// Module: Wire Errors
// Description: Mapping from consumer errors to HTTP error bodies.
// Purpose: Keep status codes and error codes stable at the wire boundary.
// Dependencies: axum, consumers-core, serde
// ============================================================================

//! ## Overview
//! Every failed request is answered with the same body shape:
//! `httpCode`, `httpError`, `error` (`<service>.<CODE>`), `errorName`, and
//! `errorDescription`. Internal failures carry their cause in
//! [`ApiError::detail`] for the audit log; the body only ever says that an
//! internal error occurred.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::StatusCode;
use consumers_core::ConsumerError;
use consumers_core::ValidationError;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Malformed identifier in the `id` filter.
pub const INVALID_UUID_IN_FILTER: &str = "INVALID_UUID_IN_FILTER";
/// Malformed consumer identifier in the path.
pub const INVALID_CONSUMER_ID: &str = "INVALID_CONSUMER_ID";
/// Non-numeric `usageAbove` value.
pub const USAGE_AMOUNT_NAN: &str = "USAGE_AMOUNT_NAN";
/// Malformed coordinate pair.
pub const INVALID_COORDINATES: &str = "INVALID_COORDINATES";
/// Required field absent on create.
pub const MISSING_FIELD: &str = "MISSING_FIELD";
/// Blank consumer name.
pub const BLANK_NAME: &str = "BLANK_NAME";
/// Usage type that matches no known usage type.
pub const UNKNOWN_USAGE_TYPE: &str = "UNKNOWN_USAGE_TYPE";
/// Undecodable request body.
pub const INVALID_REQUEST_BODY: &str = "INVALID_REQUEST_BODY";
/// Request body over the configured limit.
pub const REQUEST_BODY_TOO_LARGE: &str = "REQUEST_BODY_TOO_LARGE";
/// Unknown consumer.
pub const NO_CONSUMER_FOUND: &str = "NO_CONSUMER_FOUND";
/// Duplicate `(name, location)` pair.
pub const DUPLICATE_CONSUMER: &str = "DUPLICATE_CONSUMER";
/// Scope header absent or blank.
pub const MISSING_AUTHORIZATION_INFORMATION: &str = "MISSING_AUTHORIZATION_INFORMATION";
/// Scope header lacks the configured scope.
pub const INSUFFICIENT_SCOPE: &str = "INSUFFICIENT_SCOPE";
/// Unexpected server-side failure.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireError {
    /// Numeric HTTP status.
    pub http_code: u16,
    /// Canonical reason phrase of the status.
    pub http_error: String,
    /// Service-prefixed error code.
    pub error: String,
    /// Short human-readable title.
    pub error_name: String,
    /// Longer human-readable description.
    pub error_description: String,
}

/// A failed request, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status.
    status: StatusCode,
    /// Unprefixed error code.
    code: &'static str,
    /// Short title.
    name: &'static str,
    /// Client-facing description.
    description: String,
    /// Internal cause for the audit log.
    detail: Option<String>,
}

impl ApiError {
    /// Builds an error without internal detail.
    const fn new(
        status: StatusCode,
        code: &'static str,
        name: &'static str,
        description: String,
    ) -> Self {
        Self {
            status,
            code,
            name,
            description,
            detail: None,
        }
    }

    /// Maps a validation failure to a 400 response.
    #[must_use]
    pub fn from_validation(error: &ValidationError) -> Self {
        let (code, name) = match error {
            ValidationError::InvalidFilterIdentifier(_) => {
                (INVALID_UUID_IN_FILTER, "Invalid UUID in Filter")
            }
            ValidationError::InvalidIdentifier(_) => (INVALID_CONSUMER_ID, "Invalid Consumer ID"),
            ValidationError::UsageNotNumeric(_) => (USAGE_AMOUNT_NAN, "Usage Amount Not a Number"),
            ValidationError::InvalidCoordinates(_) => (INVALID_COORDINATES, "Invalid Coordinates"),
            ValidationError::MissingField(_) => (MISSING_FIELD, "Missing Field"),
            ValidationError::BlankName => (BLANK_NAME, "Blank Name"),
            ValidationError::UnknownUsageType(_) => (UNKNOWN_USAGE_TYPE, "Unknown Usage Type"),
            ValidationError::InvalidPayload(_) => (INVALID_REQUEST_BODY, "Invalid Request Body"),
        };
        Self::new(StatusCode::BAD_REQUEST, code, name, error.to_string())
    }

    /// Maps a consumer operation failure to its response.
    #[must_use]
    pub fn from_consumer_error(error: &ConsumerError) -> Self {
        match error {
            ConsumerError::Validation(validation) => Self::from_validation(validation),
            ConsumerError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                NO_CONSUMER_FOUND,
                "No Consumer Found",
                format!("the consumer id {id} is not associated to any consumer"),
            ),
            ConsumerError::Conflict(constraint) => Self {
                detail: Some(constraint.clone()),
                ..Self::new(
                    StatusCode::CONFLICT,
                    DUPLICATE_CONSUMER,
                    "Duplicate Consumer",
                    "a consumer with the same name and location already exists".to_string(),
                )
            },
            ConsumerError::Lookup(detail) | ConsumerError::Execution(detail) => {
                Self::internal(detail.clone())
            }
        }
    }

    /// Internal failure with a cause that stays server-side.
    #[must_use]
    pub fn internal(detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
                "Internal Error",
                "an unexpected error occurred while handling the request".to_string(),
            )
        }
    }

    /// Request body over the configured limit.
    #[must_use]
    pub fn body_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            REQUEST_BODY_TOO_LARGE,
            "Request Body Too Large",
            format!("the request body exceeds the limit of {limit} bytes"),
        )
    }

    /// Scope header absent or blank.
    #[must_use]
    pub fn missing_authorization() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            MISSING_AUTHORIZATION_INFORMATION,
            "Unauthorized",
            "the accessed resource requires authorization, but the request did not contain \
             authorization information"
                .to_string(),
        )
    }

    /// Scope header present without the configured scope.
    #[must_use]
    pub fn insufficient_scope() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            INSUFFICIENT_SCOPE,
            "Insufficient Scope",
            "the resource is protected by a scope which was not included in the authorization \
             information"
                .to_string(),
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Unprefixed error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Internal cause, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Renders the client-facing body for the named service.
    #[must_use]
    pub fn to_wire(&self, service: &str) -> WireError {
        WireError {
            http_code: self.status.as_u16(),
            http_error: self.status.canonical_reason().unwrap_or_default().to_string(),
            error: format!("{service}.{}", self.code),
            error_name: self.name.to_string(),
            error_description: self.description.clone(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
