// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `daily [HH:MM[:SS]] [days]` schedules, e.g. `04:00:00 MWF`.

use super::timespec::CalendarSpec;
use crate::error::ConfigError;

/// Single-letter weekday codes (Sunday = `U`).
const DAY_LETTERS: [char; 7] = ['u', 'm', 't', 'w', 'r', 'f', 's'];

/// Parse a daily schedule. A missing time means midnight; missing days
/// means every day.
pub fn parse_daily(source: &str) -> Result<CalendarSpec, ConfigError> {
    let mut parts = source.split_whitespace();
    let (hour, minute, second) = match parts.next() {
        Some(time) => parse_time_of_day(time)?,
        None => (0, 0, 0),
    };

    let weekdays = match parts.next() {
        Some(days) => {
            let mut weekdays = days.chars().map(parse_day_letter).collect::<Result<Vec<_>, _>>()?;
            weekdays.sort_unstable();
            weekdays.dedup();
            Some(weekdays)
        }
        None => None,
    };

    Ok(CalendarSpec {
        weekdays,
        hours: Some(vec![hour]),
        minutes: Some(vec![minute]),
        seconds: Some(vec![second]),
        ..CalendarSpec::default()
    })
}

/// Parse `HH:MM` or `HH:MM:SS` (24-hour clock).
pub fn parse_time_of_day(time: &str) -> Result<(u32, u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidTime(time.to_string());
    let fields = time
        .split(':')
        .map(|f| if f.is_empty() || f.len() > 2 { None } else { f.parse::<u32>().ok() })
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(invalid)?;
    let (h, m, s) = match fields.as_slice() {
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(invalid()),
    };
    if h < 24 && m < 60 && s < 60 {
        Ok((h, m, s))
    } else {
        Err(invalid())
    }
}

fn parse_day_letter(letter: char) -> Result<u32, ConfigError> {
    let lower = letter.to_ascii_lowercase();
    DAY_LETTERS
        .iter()
        .position(|c| *c == lower)
        .map(|i| i as u32)
        .ok_or_else(|| ConfigError::UnknownDay(letter.to_string()))
}

#[cfg(test)]
#[path = "daily_tests.rs"]
mod tests;
