// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field crontab expressions (`min hour dom month dow`).

use super::timespec::{CalendarSpec, MonthDay};
use crate::error::ScheduleError;
use regex::Regex;
use std::sync::LazyLock;

/// Matches one comma-separated group: `N`, `*`, `N-M`, with optional `/STEP`.
#[allow(clippy::expect_used)]
static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|\*)(?:-(\d+))?(?:/(\d+))?$").expect("constant regex pattern is valid")
});

const PREDEFINED: &[(&str, &str)] = &[
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@midnight", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
];

const MONTH_NAMES: [&str; 12] =
    ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Stands in for `L` in the day-of-month field until conversion.
const LAST_DAY: u32 = u32::MAX;

/// Value domain of one crontab field, upper bound exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub min: u32,
    pub max: u32,
}

pub const MINUTES: Field = Field { name: "minutes", min: 0, max: 60 };
pub const HOURS: Field = Field { name: "hours", min: 0, max: 24 };
pub const MONTHDAYS: Field = Field { name: "monthdays", min: 1, max: 32 };
pub const MONTHS: Field = Field { name: "months", min: 1, max: 13 };
/// Accepts 7 as a second spelling of Sunday.
pub const WEEKDAYS: Field = Field { name: "weekdays", min: 0, max: 8 };

/// Parse a crontab line (or `@predefined` alias) into a calendar rule.
///
/// Fields left as `*` become `None` (every value); seconds are pinned to 0.
pub fn parse_crontab(line: &str) -> Result<CalendarSpec, ScheduleError> {
    let line = convert_predefined(line.trim())?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [minutes, hours, monthdays, months, weekdays] = fields.as_slice() else {
        return Err(ScheduleError::FieldCount(fields.len()));
    };

    let monthdays = parse_field(&normalize_monthdays(monthdays), MONTHDAYS)?.map(|days| {
        days.into_iter()
            .map(|d| if d == LAST_DAY { MonthDay::Last } else { MonthDay::Day(d) })
            .collect::<Vec<_>>()
    });
    let weekdays = parse_field(&replace_names(weekdays, &DAY_NAMES, 0), WEEKDAYS)?.map(|days| {
        let mut days: Vec<u32> = days.into_iter().map(|d| d % 7).collect();
        days.sort_unstable();
        days.dedup();
        days
    });

    Ok(CalendarSpec {
        months: parse_field(&replace_names(months, &MONTH_NAMES, 1), MONTHS)?,
        monthdays,
        weekdays,
        ordinals: None,
        hours: parse_field(hours, HOURS)?,
        minutes: parse_field(minutes, MINUTES)?,
        seconds: Some(vec![0]),
        timezone: None,
    })
}

fn convert_predefined(line: &str) -> Result<&str, ScheduleError> {
    if !line.starts_with('@') {
        return Ok(line);
    }
    PREDEFINED
        .iter()
        .find(|(alias, _)| *alias == line)
        .map(|(_, expansion)| *expansion)
        .ok_or_else(|| ScheduleError::UnknownPredefined(line.to_string()))
}

fn normalize_monthdays(source: &str) -> String {
    source.trim().replace('?', "*")
}

fn replace_names(source: &str, names: &[&str], first: usize) -> String {
    let mut normalized = source.trim().to_lowercase().replace('?', "*");
    for (i, name) in names.iter().enumerate() {
        normalized = normalized.replace(name, &(i + first).to_string());
    }
    normalized
}

/// Parse one field into its sorted, de-duplicated values, or `None` for `*`.
pub fn parse_field(source: &str, field: Field) -> Result<Option<Vec<u32>>, ScheduleError> {
    let groups: Vec<&str> = source.split(',').map(str::trim).collect();
    if groups.contains(&"*") {
        if groups.len() > 1 {
            return Err(ScheduleError::WildcardNotAlone(field.name));
        }
        return Ok(None);
    }

    let mut values = Vec::new();
    for group in groups {
        if field == MONTHDAYS && group.eq_ignore_ascii_case("l") {
            values.push(LAST_DAY);
            continue;
        }
        values.extend(group_values(group, field)?);
    }
    values.sort_unstable();
    values.dedup();
    Ok(Some(values))
}

fn group_values(group: &str, field: Field) -> Result<Vec<u32>, ScheduleError> {
    let caps = RANGE_PATTERN.captures(group).ok_or_else(|| ScheduleError::InvalidExpression {
        field: field.name,
        expr: group.to_string(),
    })?;

    let (lo, hi) = match caps.get(1).map(|m| m.as_str()) {
        Some("*") | None => (field.min, field.max),
        Some(start) => {
            let lo = validate(start, field)?;
            let hi = match caps.get(2) {
                Some(end) => validate(end.as_str(), field)? + 1,
                None => lo + 1,
            };
            (lo, hi)
        }
    };
    let step = match caps.get(3) {
        Some(step) => validate_step(step.as_str(), field)?,
        None => 1,
    };
    Ok(expand_range(lo, hi, step, field))
}

/// Values from `lo` to `hi` (exclusive) by `step`, in visiting order.
///
/// A range whose end precedes its start wraps past the field maximum, so
/// `30-0/10` over minutes visits 30, 40, 50, 0.
pub fn expand_range(lo: u32, hi: u32, step: u32, field: Field) -> Vec<u32> {
    let step = step.max(1) as usize;
    if lo < hi {
        return (lo..hi).step_by(step).collect();
    }
    let span = (field.max - lo) + (hi - field.min);
    (0..span)
        .step_by(step)
        .map(|i| {
            let v = lo + i;
            if v >= field.max {
                v - field.max + field.min
            } else {
                v
            }
        })
        .collect()
}

fn validate(value: &str, field: Field) -> Result<u32, ScheduleError> {
    let out_of_range =
        || ScheduleError::OutOfRange { field: field.name, value: value.to_string() };
    let parsed: u32 = value.parse().map_err(|_| out_of_range())?;
    if (field.min..field.max).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(out_of_range())
    }
}

fn validate_step(value: &str, field: Field) -> Result<u32, ScheduleError> {
    match value.parse::<u32>() {
        Ok(step) if step >= 1 && step < field.max => Ok(step),
        _ => Err(ScheduleError::OutOfRange { field: field.name, value: value.to_string() }),
    }
}

#[cfg(test)]
#[path = "crontab_tests.rs"]
mod tests;
