// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar rule evaluation: the next instant matching a [`CalendarSpec`].
//!
//! The search runs over naive local time in the rule's zone, most
//! significant unit first. Each unit is a restartable [`UnitCursor`]; when a
//! child unit runs out of candidates for the current parent, the parent
//! advances and the child restarts from its minimum. Only the reference
//! day lets the time-of-day cursors start later than their minimum.
//!
//! Local results are mapped back to absolute instants with these rules:
//! - a local time inside a spring-forward gap is shifted forward by the
//!   length of the gap;
//! - an ambiguous local time resolves to its first occurrence, and any
//!   candidate at or before the reference instant is skipped, so the
//!   repeated wall-clock hour after a fall-back is never offered again.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use std::collections::BTreeSet;

/// Years past the reference after which a rule is declared unsatisfiable.
///
/// 28 years is one full cycle of the Gregorian weekday/leap-year pattern,
/// so any satisfiable combination of month-day and weekday appears in it.
pub const MAX_SEARCH_YEARS: i32 = 28;

/// Upper bound on candidates skipped inside a fall-back window.
const MAX_SKIPPED_CANDIDATES: usize = 86_400;

/// Day-of-month selector. `Last` sorts after every numeric day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MonthDay {
    Day(u32),
    Last,
}

/// Calendar recurrence rule.
///
/// `None` in any field means every value of that unit. Weekdays count from
/// Sunday = 0. Ordinals (1..=5) select the nth weekday of the month and
/// default to all five when only weekdays are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarSpec {
    pub months: Option<Vec<u32>>,
    pub monthdays: Option<Vec<MonthDay>>,
    pub weekdays: Option<Vec<u32>>,
    pub ordinals: Option<Vec<u32>>,
    pub hours: Option<Vec<u32>>,
    pub minutes: Option<Vec<u32>>,
    pub seconds: Option<Vec<u32>>,
    pub timezone: Option<Tz>,
}

/// Restartable cursor over the sorted allowed values of one unit.
#[derive(Debug)]
struct UnitCursor {
    values: Vec<u32>,
    pos: usize,
}

impl UnitCursor {
    fn new(allowed: Option<&[u32]>, all: std::ops::Range<u32>) -> Self {
        let mut values: Vec<u32> = match allowed {
            Some(values) => values.iter().copied().filter(|v| all.contains(v)).collect(),
            None => all.collect(),
        };
        values.sort_unstable();
        values.dedup();
        Self { values, pos: 0 }
    }

    fn from_sorted(values: Vec<u32>) -> Self {
        Self { values, pos: 0 }
    }

    /// Restart at the first value `>= floor`.
    fn reset(&mut self, floor: u32) -> Option<u32> {
        self.pos = self.values.partition_point(|v| *v < floor);
        self.values.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u32> {
        self.pos += 1;
        self.values.get(self.pos).copied()
    }
}

impl CalendarSpec {
    pub fn with_timezone(mut self, tz: Option<Tz>) -> Self {
        self.timezone = tz;
        self
    }

    /// Earliest matching instant strictly after `reference`.
    pub fn next_occurrence(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.search(reference, false)
    }

    /// Earliest matching instant at or after `reference`.
    pub fn next_occurrence_inclusive(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.search(reference, true)
    }

    fn search(&self, reference: DateTime<Utc>, inclusive: bool) -> Option<DateTime<Utc>> {
        let local = self.to_local(reference);
        let whole = local.with_nanosecond(0)?;
        let mut floor = if inclusive && whole == local { whole } else { whole + Duration::seconds(1) };

        for _ in 0..MAX_SKIPPED_CANDIDATES {
            let candidate = self.next_local(floor)?;
            let instant = self.localize(candidate)?;
            if instant > reference || (inclusive && instant == reference) {
                return Some(instant);
            }
            floor = candidate + Duration::seconds(1);
        }
        None
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => instant.with_timezone(&tz).naive_local(),
            None => instant.naive_utc(),
        }
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        let Some(tz) = self.timezone else {
            return Some(Utc.from_utc_datetime(&naive));
        };
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(first, _) => Some(first.with_timezone(&Utc)),
            LocalResult::None => shift_past_gap(&tz, naive),
        }
    }

    /// First matching naive local time at or after `start`.
    fn next_local(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let limit = start.year() + MAX_SEARCH_YEARS;
        let mut months = UnitCursor::new(self.months.as_deref(), 1..13);
        let mut year = start.year();
        let mut month = months.reset(start.month());

        loop {
            let m = match month {
                Some(m) => m,
                None => {
                    year += 1;
                    if year > limit {
                        return None;
                    }
                    month = Some(months.reset(1)?);
                    continue;
                }
            };

            let first_month = (year, m) == (start.year(), start.month());
            let mut days = UnitCursor::from_sorted(self.matching_days(year, m));
            let mut day = days.reset(if first_month { start.day() } else { 1 });
            while let Some(d) = day {
                if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
                    let floor = if date == start.date() { start.time() } else { NaiveTime::MIN };
                    if let Some(time) = self.first_time(floor) {
                        return Some(date.and_time(time));
                    }
                }
                day = days.advance();
            }
            month = months.advance();
        }
    }

    /// First matching time of day at or after `floor`, carrying from
    /// seconds into minutes into hours.
    fn first_time(&self, floor: NaiveTime) -> Option<NaiveTime> {
        let (fh, fm, fs) = (floor.hour(), floor.minute(), floor.second());
        let mut hours = UnitCursor::new(self.hours.as_deref(), 0..24);
        let mut minutes = UnitCursor::new(self.minutes.as_deref(), 0..60);
        let mut seconds = UnitCursor::new(self.seconds.as_deref(), 0..60);

        let mut hour = hours.reset(fh);
        while let Some(h) = hour {
            let mut minute = minutes.reset(if h == fh { fm } else { 0 });
            while let Some(m) = minute {
                let second = seconds.reset(if h == fh && m == fm { fs } else { 0 });
                if let Some(s) = second {
                    return NaiveTime::from_hms_opt(h, m, s);
                }
                minute = minutes.advance();
            }
            hour = hours.advance();
        }
        None
    }

    /// Days of `year`/`month` selected by the day rules, ascending.
    ///
    /// Month-days and weekday/ordinal selections combine as a union, the
    /// crontab convention when both day fields are restricted.
    pub fn matching_days(&self, year: i32, month: u32) -> Vec<u32> {
        let last = days_in_month(year, month);
        let by_monthday = self.monthdays.as_ref().map(|days| {
            days.iter()
                .filter_map(|md| match *md {
                    MonthDay::Day(d) if (1..=last).contains(&d) => Some(d),
                    MonthDay::Day(_) => None,
                    MonthDay::Last => Some(last),
                })
                .collect::<BTreeSet<u32>>()
        });

        let by_weekday = if self.weekdays.is_some() || self.ordinals.is_some() {
            let first_weekday = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.weekday().num_days_from_sunday())
                .unwrap_or(0);
            let weekdays = self.weekdays.clone().unwrap_or_else(|| (0..7).collect());
            let ordinals = self.ordinals.clone().unwrap_or_else(|| (1..=5).collect());
            let mut days = BTreeSet::new();
            for ordinal in ordinals.iter().filter(|o| (1..=5).contains(*o)) {
                for weekday in weekdays.iter().filter(|w| **w < 7) {
                    let day = (weekday + 7 - first_weekday) % 7 + 1 + 7 * (ordinal - 1);
                    if day <= last {
                        days.insert(day);
                    }
                }
            }
            Some(days)
        } else {
            None
        };

        match (by_monthday, by_weekday) {
            (Some(a), Some(b)) => a.union(&b).copied().collect(),
            (Some(days), None) | (None, Some(days)) => days.into_iter().collect(),
            (None, None) => (1..=last).collect(),
        }
    }
}

/// Map a local time that falls in a DST gap to the instant it would have
/// had under the offset in force just before the gap.
fn shift_past_gap(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let mut earlier = naive;
    for _ in 0..(4 * 24) {
        earlier -= Duration::minutes(15);
        if let Some(before) = tz.from_local_datetime(&earlier).earliest() {
            let offset = i64::from(before.offset().fix().local_minus_utc());
            return Some(Utc.from_utc_datetime(&(naive - Duration::seconds(offset))));
        }
    }
    None
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
#[path = "timespec_tests.rs"]
mod tests;
