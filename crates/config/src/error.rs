// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration and schedule parsing errors

use thiserror::Error;

/// Errors from parsing a crontab-style schedule expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("{field} value out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
    #[error("unknown {field} expression: {expr}")]
    InvalidExpression { field: &'static str, expr: String },
    #[error("\"*\" must be alone in the {0} field")]
    WildcardNotAlone(&'static str),
    #[error("unknown predefined schedule: {0}")]
    UnknownPredefined(String),
    #[error("expected 5 crontab fields, found {0}")]
    FieldCount(usize),
}

/// Errors from loading job and schedule configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown scheduler: {0}")]
    UnknownScheduler(String),
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
    #[error("unknown day: {0}")]
    UnknownDay(String),
    #[error("schedule is not a valid expression: {0}")]
    InvalidGroc(String),
    #[error("invalid cron schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),
    #[error("invalid name '{0}': expected letters, digits, '_' or '-'")]
    InvalidName(String),
    #[error("job '{job}': {message}")]
    Invalid { job: String, message: String },
    #[error("node pool '{pool}' references unknown node '{node}'")]
    UnknownNode { pool: String, node: String },
    #[error("node pool '{0}' has no nodes")]
    EmptyPool(String),
    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
