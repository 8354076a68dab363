// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! English-like calendar expressions.
//!
//! Grammar: `("every" | ordinals) [days] [("in" | "of") months] [["at"] HH:MM]`,
//! e.g. `1st,3rd monday of jan,jul at 09:30` or `every day 00:00`.

use super::timespec::{CalendarSpec, MonthDay};
use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// Weekday spellings and their index (Sunday = 0).
const DAY_SYNONYMS: &[(&str, u32)] = &[
    ("sunday", 0), ("monday", 1), ("tuesday", 2), ("wednesday", 3),
    ("thursday", 4), ("friday", 5), ("saturday", 6),
    ("sun", 0), ("mon", 1), ("tue", 2), ("wed", 3), ("thu", 4), ("fri", 5), ("sat", 6),
    ("su", 0), ("mo", 1), ("tu", 2), ("we", 3), ("th", 4), ("fr", 5), ("sa", 6),
    ("u", 0), ("m", 1), ("t", 2), ("w", 3), ("r", 4), ("f", 5), ("s", 6),
];

const MONTH_SYNONYMS: &[(&str, u32)] = &[
    ("january", 1), ("february", 2), ("march", 3), ("april", 4), ("may", 5), ("june", 6),
    ("july", 7), ("august", 8), ("september", 9), ("october", 10), ("november", 11),
    ("december", 12),
    ("jan", 1), ("feb", 2), ("mar", 3), ("apr", 4), ("jun", 6), ("jul", 7), ("aug", 8),
    ("sep", 9), ("oct", 10), ("nov", 11), ("dec", 12),
];

/// Regex alternation with longer spellings first so `monday` wins over `mon`.
fn alternation(words: impl Iterator<Item = &'static str>, extra: &'static str) -> String {
    let mut words: Vec<&str> = words.chain(std::iter::once(extra)).collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    words.join("|")
}

#[allow(clippy::expect_used)]
static GROC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let days = alternation(DAY_SYNONYMS.iter().map(|(name, _)| *name), "day");
    let months = alternation(MONTH_SYNONYMS.iter().map(|(name, _)| *name), "month");
    let pattern = format!(
        r"^(?P<month_days>every|(?:\d+(?:st|nd|rd|th),?)+)?\s*(?P<days>(?:(?:{days}),?)+)?\s*(?:(?:in|of)\s+(?P<months>(?:(?:{months}),?)+))?\s*(?:(?:at\s+)?(?P<time>\d\d:\d\d))?\s*$"
    );
    Regex::new(&pattern).expect("constant regex pattern is valid")
});

/// Parse an expression such as `2nd,4th tue,thu of march at 18:00`.
pub fn parse_groc(expression: &str) -> Result<CalendarSpec, ConfigError> {
    let lowered = expression.trim().to_lowercase();
    let invalid = || ConfigError::InvalidGroc(expression.to_string());
    if lowered.is_empty() {
        return Err(invalid());
    }
    let caps = GROC_PATTERN.captures(&lowered).ok_or_else(invalid)?;

    let weekdays = match caps.name("days").map(|m| m.as_str()) {
        None | Some("day") => None,
        Some(days) => Some(lookup_all(days, DAY_SYNONYMS).ok_or_else(invalid)?),
    };

    let (mut monthdays, mut ordinals) = (None, None);
    if let Some(numbers) = caps.name("month_days").map(|m| m.as_str()).filter(|s| *s != "every") {
        let values = parse_ordinals(numbers).ok_or_else(invalid)?;
        if weekdays.is_none() {
            if values.iter().any(|d| !(1..=31).contains(d)) {
                return Err(invalid());
            }
            monthdays = Some(values.into_iter().map(MonthDay::Day).collect());
        } else {
            if values.iter().any(|d| !(1..=5).contains(d)) {
                return Err(invalid());
            }
            ordinals = Some(values);
        }
    }

    let months = match caps.name("months").map(|m| m.as_str()) {
        None | Some("month") => None,
        Some(months) => Some(lookup_all(months, MONTH_SYNONYMS).ok_or_else(invalid)?),
    };

    let (hour, minute) = match caps.name("time") {
        Some(time) => parse_hh_mm(time.as_str()).ok_or_else(invalid)?,
        None => (0, 0),
    };

    Ok(CalendarSpec {
        months,
        monthdays,
        weekdays,
        ordinals,
        hours: Some(vec![hour]),
        minutes: Some(vec![minute]),
        seconds: Some(vec![0]),
        timezone: None,
    })
}

fn lookup_all(list: &str, synonyms: &[(&str, u32)]) -> Option<Vec<u32>> {
    let mut values = list
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|name| synonyms.iter().find(|(syn, _)| *syn == name).map(|(_, v)| *v))
        .collect::<Option<Vec<u32>>>()?;
    values.sort_unstable();
    values.dedup();
    Some(values)
}

fn parse_ordinals(list: &str) -> Option<Vec<u32>> {
    let mut values = list
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|n| n.trim_end_matches(|c: char| c.is_ascii_alphabetic()).parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    values.sort_unstable();
    values.dedup();
    Some(values)
}

fn parse_hh_mm(time: &str) -> Option<(u32, u32)> {
    let (h, m) = time.split_once(':')?;
    let (h, m) = (h.parse().ok()?, m.parse().ok()?);
    (h < 24 && m < 60).then_some((h, m))
}

#[cfg(test)]
#[path = "groc_tests.rs"]
mod tests;
