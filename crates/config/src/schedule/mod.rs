// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule definitions and their parsers.
//!
//! Configuration accepts schedules as free text (`"cron 0 * * * *"`) or as
//! a table; both resolve once, at load time, into a [`Schedule`].

mod crontab;
mod daily;
mod groc;
mod interval;
mod timespec;

pub use crontab::{expand_range, parse_crontab, parse_field, Field};
pub use daily::{parse_daily, parse_time_of_day};
pub use groc::parse_groc;
pub use interval::{format_interval, parse_interval};
pub use timespec::{days_in_month, CalendarSpec, MonthDay, MAX_SEARCH_YEARS};

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which parser produced a calendar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    Cron,
    Groc,
    Daily,
}

tempo_core::simple_display! {
    CalendarKind {
        Cron => "cron",
        Groc => "groc daily",
        Daily => "daily",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSchedule {
    pub interval: Duration,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSchedule {
    pub kind: CalendarKind,
    pub spec: CalendarSpec,
    pub original: String,
}

/// Resolved recurrence rule for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed delay between run times.
    Interval(IntervalSchedule),
    /// Start the next run as soon as the previous one completes.
    Constant,
    Calendar(CalendarSchedule),
}

impl Schedule {
    /// Parse the text form: a scheduler keyword followed by its expression.
    ///
    /// Text without a known keyword is tried as a groc expression.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let source = source.trim();
        let (keyword, rest) = source.split_once(char::is_whitespace).unwrap_or((source, ""));
        let rest = rest.trim();
        match keyword {
            "interval" => Ok(Self::interval(parse_interval(rest)?, rest)),
            "constant" => Ok(Self::Constant),
            "daily" => Ok(Self::calendar(CalendarKind::Daily, parse_daily(rest)?, rest)),
            "cron" => Ok(Self::calendar(CalendarKind::Cron, parse_crontab(rest)?, rest)),
            "groc" => {
                let expr = rest.strip_prefix("daily").map(str::trim).unwrap_or(rest);
                Ok(Self::calendar(CalendarKind::Groc, parse_groc(expr)?, expr))
            }
            _ => parse_groc(source)
                .map(|spec| Self::calendar(CalendarKind::Groc, spec, source))
                .map_err(|_| ConfigError::UnknownScheduler(keyword.to_string())),
        }
    }

    /// Resolve a configuration value, in either text or table form.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        match config {
            ScheduleConfig::Text(text) => Self::parse(text),
            ScheduleConfig::Interval(IntervalConfig { interval }) => {
                Ok(Self::interval(parse_interval(interval)?, interval))
            }
            ScheduleConfig::Typed(TypedConfig { kind, value }) => {
                Self::parse(&format!("{kind} {}", value.as_deref().unwrap_or_default()))
            }
            ScheduleConfig::Daily(DailyConfig { start_time, days }) => {
                let original = format!(
                    "{} {}",
                    start_time.as_deref().unwrap_or("00:00:00"),
                    days.as_deref().unwrap_or_default()
                );
                let original = original.trim();
                Ok(Self::calendar(CalendarKind::Daily, parse_daily(original)?, original))
            }
        }
    }

    fn interval(interval: Duration, original: &str) -> Self {
        Self::Interval(IntervalSchedule { interval, original: original.to_string() })
    }

    fn calendar(kind: CalendarKind, spec: CalendarSpec, original: &str) -> Self {
        Self::Calendar(CalendarSchedule { kind, spec, original: original.to_string() })
    }

    /// Evaluate calendar rules in `tz` (UTC when `None`).
    pub fn with_timezone(self, tz: Option<Tz>) -> Self {
        match self {
            Self::Calendar(mut cal) => {
                cal.spec = cal.spec.with_timezone(tz);
                Self::Calendar(cal)
            }
            other => other,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Interval(_) => "interval",
            Self::Constant => "constant",
            Self::Calendar(cal) => match cal.kind {
                CalendarKind::Cron => "cron",
                CalendarKind::Groc => "groc daily",
                CalendarKind::Daily => "daily",
            },
        }
    }

    pub fn is_calendar(&self) -> bool {
        matches!(self, Self::Calendar(_))
    }

    /// Calendar schedules queue overdue runs; the others drop them.
    pub fn default_queueing(&self) -> bool {
        self.is_calendar()
    }

    /// Whether the next run is only scheduled once the current one ends.
    pub fn schedule_on_complete(&self) -> bool {
        matches!(self, Self::Constant)
    }

    /// Run time of the occurrence following `last` (the previous scheduled
    /// run time, if any).
    ///
    /// Intervals never return a time before `now`, so a long pause does not
    /// produce a burst of catch-up runs.
    pub fn next_run_time(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            Self::Interval(iv) => {
                let step = chrono::Duration::from_std(iv.interval).ok()?;
                match last {
                    Some(last) => Some((last + step).max(now)),
                    None => Some(now + step),
                }
            }
            Self::Constant => Some(now),
            Self::Calendar(cal) => cal.spec.next_occurrence(last.unwrap_or(now)),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(iv) => write!(f, "interval {}", format_interval(iv.interval)),
            Self::Constant => write!(f, "constant"),
            Self::Calendar(cal) => write!(f, "{} {}", cal.kind, cal.original),
        }
    }
}

/// Schedule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleConfig {
    /// `"interval 5m"`, `"cron 0 4 * * *"`, `"every monday at 09:00"`
    Text(String),
    /// `{ interval = "5m" }`
    Interval(IntervalConfig),
    /// `{ type = "cron", value = "0 4 * * *" }`
    Typed(TypedConfig),
    /// `{ start_time = "04:00:00", days = "MWF" }`
    Daily(DailyConfig),
}

impl From<&str> for ScheduleConfig {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalConfig {
    pub interval: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypedConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyConfig {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub days: Option<String>,
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
