//! Environment variable helpers.

use std::str::FromStr;
use std::time::Duration;

pub(crate) fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

pub(crate) fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    var(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

pub(crate) fn secs_or(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(parse_or(name, default_secs))
}

/// Comma-separated list, falling back to `default` when unset or empty.
pub(crate) fn list_or(name: &str, default: &[&str]) -> Vec<String> {
    let parsed: Vec<String> = var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    if parsed.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}
