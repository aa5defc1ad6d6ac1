// =============================================================================
// Environment helpers
// =============================================================================

use anyhow::{Context, Result};
use tracing::warn;

/// Value of `key`, or `fallback` when unset.
pub fn get_string(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Value of `key`; an error when unset or not valid unicode.
pub fn get_string_required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("environment variable {key} is not set"))
}

/// Value of `key` parsed as an integer, or `fallback` when unset or unparseable.
pub fn get_int(key: &str, fallback: i64) -> i64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, fallback, "ignoring non-integer environment value");
            fallback
        }),
        Err(_) => fallback,
    }
}

/// Value of `key` when set and non-empty.
pub fn get_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
