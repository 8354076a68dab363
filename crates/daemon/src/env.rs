// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Daemon version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timer resolution
pub const DEFAULT_TIMER_CHECK: Duration = Duration::from_secs(1);

/// Resolve state directory: TEMPO_STATE_DIR > XDG_STATE_HOME/tempo > ~/.local/state/tempo
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("TEMPO_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("tempo"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/tempo"))
}

/// Job config file override (default `<state_dir>/jobs.toml`)
pub fn config_path() -> Option<PathBuf> {
    std::env::var("TEMPO_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Timer check interval (default 1s, configurable via `TEMPO_TIMER_CHECK_MS`)
pub fn timer_check() -> Duration {
    std::env::var("TEMPO_TIMER_CHECK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMER_CHECK)
}

/// Default zone for calendar schedules that name none
pub fn time_zone() -> Option<String> {
    std::env::var("TEMPO_TIME_ZONE").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
