// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-interval durations such as `5m`, `90 seconds` or `hourly`.

use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

#[allow(clippy::expect_used)]
static INTERVAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*([a-zA-Z]+)\s*$").expect("constant regex pattern is valid")
});

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3600),
        "d" | "day" | "days" => Some(86_400),
        _ => None,
    }
}

/// Parse an interval. Zero-length intervals are rejected.
pub fn parse_interval(source: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidInterval(source.to_string());
    if source.trim() == "hourly" {
        return Ok(Duration::from_secs(3600));
    }
    let caps = INTERVAL_PATTERN.captures(source).ok_or_else(invalid)?;
    let value: u64 = caps[1].parse().map_err(|_| invalid())?;
    let unit = unit_seconds(&caps[2]).ok_or_else(invalid)?;
    match value.checked_mul(unit) {
        Some(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(invalid()),
    }
}

/// Render a duration in the largest whole unit, e.g. `90s` or `5m`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        s if s > 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s > 0 && s % 3600 == 0 => format!("{}h", s / 3600),
        s if s > 0 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
