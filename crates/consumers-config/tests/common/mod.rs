// crates/consumers-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for consumers-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use consumers_config::ConfigError;
use consumers_config::ConsumersConfig;

/// Parses a TOML string into a `ConsumersConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<ConsumersConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a config with defaults applied and the scope check satisfied.
pub fn minimal_config() -> Result<ConsumersConfig, toml::de::Error> {
    config_from_toml("[server.auth]\nscope = \"water-usage:consumers\"\n")
}

/// Asserts that a validation result is an error containing a specific substring.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
