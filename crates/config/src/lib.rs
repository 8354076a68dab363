// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tempo-config: job configuration records, schedule parsing, and
//! calendar evaluation

pub mod error;
pub mod job;
pub mod schedule;
pub mod template;

pub use error::{ConfigError, ScheduleError};
pub use job::{
    check_name, duplicate_jobs, parse_time_zone, ActionConfig, CleanupActionConfig, ConfigFile, JobConfig,
    NodeConfig, NodePoolConfig, DEFAULT_RUN_LIMIT,
};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobConfigBuilder;
pub use schedule::{CalendarKind, CalendarSpec, MonthDay, Schedule, ScheduleConfig};
pub use template::{interpolate, interpolate_with};
