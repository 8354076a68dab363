// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variables available to command and trigger templates.
//!
//! Date variables accept a signed offset in their natural unit:
//! `${shortdate-1}` is the previous day, `${month+1}` the next calendar
//! month, `${unixtime-60}` one minute earlier. Dates are rendered in the
//! job's time zone.

use chrono::{DateTime, Datelike, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tempo_config::interpolate_with;
use tempo_core::{JobName, JobRunId, Node};

/// Rendering context for one action of one job run.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub job: &'a JobName,
    pub run_id: &'a JobRunId,
    pub run_num: u32,
    pub run_time: DateTime<Utc>,
    pub time_zone: Option<Tz>,
    pub manual: bool,
    pub action: &'a str,
    pub node: &'a Node,
    /// Outcome of the other actions, set only when rendering the cleanup action
    pub cleanup_status: Option<&'static str>,
}

impl CommandContext<'_> {
    /// Substitute every known `${var}`; unknown placeholders are kept.
    pub fn render(&self, template: &str) -> String {
        interpolate_with(template, |name, offset| self.resolve(name, offset))
    }

    pub fn resolve(&self, name: &str, offset: i64) -> Option<String> {
        let plain = |value: String| (offset == 0).then_some(value);
        match name {
            "name" => plain(self.job.to_string()),
            "runid" => plain(self.run_id.to_string()),
            "run_num" => plain(self.run_num.to_string()),
            "actionname" => plain(self.action.to_string()),
            "node" => plain(self.node.hostname.clone()),
            "manual" => plain(self.manual.to_string()),
            "cleanup_job_status" => self.cleanup_status.and_then(|s| plain(s.to_string())),
            "unixtime" => Some((self.run_time.timestamp() + offset).to_string()),
            _ => date_value(name, self.local_time(), offset),
        }
    }

    fn local_time(&self) -> NaiveDateTime {
        match self.time_zone {
            Some(tz) => self.run_time.with_timezone(&tz).naive_local(),
            None => self.run_time.naive_utc(),
        }
    }
}

/// Format a calendar variable of `at`, shifted by `offset` units.
pub fn date_value(name: &str, at: NaiveDateTime, offset: i64) -> Option<String> {
    let (shifted, format) = match name {
        "shortdate" => (shift_days(at, offset)?, "%Y-%m-%d"),
        "day" => (shift_days(at, offset)?, "%d"),
        "hour" => (at.checked_add_signed(chrono::Duration::try_hours(offset)?)?, "%H"),
        "month" => (shift_months(at, offset)?, "%m"),
        "year" => (shift_months(at, offset.checked_mul(12)?)?, "%Y"),
        "daynumber" => {
            let day = shift_days(at, offset)?;
            return Some(day.date().num_days_from_ce().to_string());
        }
        _ => return None,
    };
    Some(shifted.format(format).to_string())
}

fn shift_days(at: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    at.checked_add_signed(chrono::Duration::try_days(days)?)
}

/// Calendar-month shift; the day is clamped to the target month's length.
fn shift_months(at: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        at.checked_add_months(n)
    } else {
        at.checked_sub_months(n)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
