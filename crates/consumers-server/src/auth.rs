// crates/consumers-server/src/auth.rs
// ============================================================================
// Module: Scope Check
// Description: Scope enforcement for consumer registry requests.
// Purpose: Fail closed when the caller's scopes do not include ours.
// Dependencies: axum, consumers-config, thiserror
// ============================================================================

//! ## Overview
//! An upstream gateway authenticates callers and forwards their granted
//! scopes as a comma-separated header. This module only checks that the
//! configured scope is among them. A missing or blank header is
//! unauthenticated; a header without the scope is unauthorized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::HeaderName;
use consumers_config::ServerAuthConfig;
use consumers_config::ServerAuthMode;
use thiserror::Error;

use crate::error::ApiError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Scope headers longer than this are treated as absent.
const MAX_SCOPE_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Scope check failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Scope header missing, blank, or unreadable.
    #[error("missing authorization information")]
    MissingAuthorization,
    /// Scope header present without the required scope.
    #[error("insufficient scope")]
    InsufficientScope,
}

impl AuthError {
    /// Audit reason label.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingAuthorization => "missing_scope_header",
            Self::InsufficientScope => "scope_not_granted",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingAuthorization => Self::missing_authorization(),
            AuthError::InsufficientScope => Self::insufficient_scope(),
        }
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Successful scope check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeGrant {
    /// The required scope was present.
    Granted,
    /// Scope checking is disabled.
    Unchecked,
}

/// Scope policy derived from `[server.auth]`.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    /// Auth mode.
    mode: ServerAuthMode,
    /// Required scope (scope mode only).
    scope: String,
    /// Header carrying the caller's scopes.
    header: HeaderName,
}

impl ScopePolicy {
    /// Builds the policy from validated auth configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message when the header name is not a valid HTTP
    /// header name.
    pub fn from_config(config: &ServerAuthConfig) -> Result<Self, String> {
        let header = HeaderName::from_bytes(config.header.trim().as_bytes())
            .map_err(|_| format!("invalid scope header: {}", config.header))?;
        Ok(Self {
            mode: config.mode,
            scope: config.scope.as_deref().map(str::trim).unwrap_or_default().to_string(),
            header,
        })
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }

    /// Checks the request headers against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the header is missing or lacks the scope.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<ScopeGrant, AuthError> {
        if self.mode == ServerAuthMode::Disabled {
            return Ok(ScopeGrant::Unchecked);
        }
        let granted = headers
            .get(&self.header)
            .filter(|value| value.len() <= MAX_SCOPE_HEADER_BYTES)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingAuthorization)?;
        if granted.split(',').map(str::trim).any(|scope| scope == self.scope) {
            Ok(ScopeGrant::Granted)
        } else {
            Err(AuthError::InsufficientScope)
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
