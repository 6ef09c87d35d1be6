// ABOUTME: Configuration and environment variable access for tplcheck
// ABOUTME: Exposes variable names plus helpers that treat empty values as unset

pub mod constants;

use std::env;
use tracing::debug;

/// Read an environment variable, treating unset and blank values the same.
pub fn non_empty_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => {
            debug!("{} is set but empty, ignoring", name);
            None
        }
        Err(_) => None,
    }
}

/// Read an environment variable or fall back to `default`.
pub fn var_or(name: &str, default: &str) -> String {
    non_empty_var(name).unwrap_or_else(|| default.to_string())
}
