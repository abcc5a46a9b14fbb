// crates/consumers-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Defaults and validation rules for the consumer registry config.
// Purpose: Ensure invalid configurations fail closed.
// =============================================================================

//! Config validation tests for consumers-config.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use consumers_config::ServerAuthMode;

mod common;

type TestResult = Result<(), String>;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn defaults_are_applied() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    if config.service.name != "consumers" {
        return Err(format!("unexpected service name {}", config.service.name));
    }
    if config.server.bind != "127.0.0.1:8000" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.server.auth.mode != ServerAuthMode::Scope {
        return Err("scope mode must be the default".to_string());
    }
    if config.server.auth.header != "X-Authenticated-Scope" {
        return Err(format!("unexpected scope header {}", config.server.auth.header));
    }
    if !config.server.audit.enabled {
        return Err("audit must be enabled by default".to_string());
    }
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    match common::config_from_toml("[server]\nport = 8000\n") {
        Ok(_) => Err("unknown server field accepted".to_string()),
        Err(_) => Ok(()),
    }
}

#[test]
fn unknown_store_fields_are_rejected() -> TestResult {
    match common::config_from_toml("[store]\npool = 8\n") {
        Ok(_) => Err("unknown store field accepted".to_string()),
        Err(_) => Ok(()),
    }
}

// ============================================================================
// SECTION: Auth
// ============================================================================

#[test]
fn scope_mode_requires_scope() -> TestResult {
    let config = common::config_from_toml("").map_err(|err| err.to_string())?;
    common::assert_invalid(config.validate(), "server.auth.scope must be set")
}

#[test]
fn blank_scope_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.auth.scope = Some("   ".to_string());
    common::assert_invalid(config.validate(), "server.auth.scope must be set")
}

#[test]
fn scope_with_comma_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.auth.scope = Some("a,b".to_string());
    common::assert_invalid(config.validate(), "must not contain commas")
}

#[test]
fn invalid_scope_header_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.auth.header = "X Scope".to_string();
    common::assert_invalid(config.validate(), "valid header name")
}

#[test]
fn disabled_auth_allows_loopback_bind() -> TestResult {
    let config = common::config_from_toml("[server.auth]\nmode = \"disabled\"\n")
        .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn disabled_auth_rejects_non_loopback_bind() -> TestResult {
    let config = common::config_from_toml(
        "[server]\nbind = \"0.0.0.0:8000\"\n[server.auth]\nmode = \"disabled\"\n",
    )
    .map_err(|err| err.to_string())?;
    common::assert_invalid(config.validate(), "non-loopback bind disallowed")
}

#[test]
fn scope_auth_allows_non_loopback_bind() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "0.0.0.0:8000".to_string();
    config.validate().map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Server Limits
// ============================================================================

#[test]
fn invalid_bind_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "localhost".to_string();
    common::assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    common::assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn blank_audit_path_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.audit.path = Some(" ".to_string());
    common::assert_invalid(config.validate(), "audit.path must be non-empty")
}

#[test]
fn invalid_service_name_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.service.name = "water usage".to_string();
    common::assert_invalid(config.validate(), "service.name")
}

// ============================================================================
// SECTION: Store
// ============================================================================

#[test]
fn blank_connection_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.connection = String::new();
    common::assert_invalid(config.validate(), "store.connection must be non-empty")
}

#[test]
fn zero_pool_size_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.max_connections = 0;
    common::assert_invalid(config.validate(), "store.max_connections")
}

#[test]
fn zero_statement_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.statement_timeout_ms = 0;
    common::assert_invalid(config.validate(), "store.statement_timeout_ms")
}

#[test]
fn database_url_override_replaces_connection() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.apply_database_url(Some("postgres://app@db/consumers".to_string()));
    if config.store.connection != "postgres://app@db/consumers" {
        return Err(format!("override not applied: {}", config.store.connection));
    }
    let before = config.store.connection.clone();
    config.apply_database_url(Some("  ".to_string()));
    config.apply_database_url(None);
    if config.store.connection != before {
        return Err("blank override must be ignored".to_string());
    }
    Ok(())
}
