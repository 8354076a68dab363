// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer and scheduling management

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tempo_core::{Event, TimerId};

/// Timer entry
#[derive(Debug, Clone)]
struct Timer {
    fires_at: DateTime<Utc>,
}

/// One-shot delayed callbacks, keyed by timer id.
///
/// Setting a timer that already exists re-arms it.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<TimerId, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(&mut self, id: TimerId, delay: Duration, now: DateTime<Utc>) {
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let fires_at = now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.timers.insert(id, Timer { fires_at });
    }

    pub fn cancel_timer(&mut self, id: &TimerId) {
        self.timers.remove(id);
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn fired_timers(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut due: Vec<(DateTime<Utc>, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.fires_at <= now)
            .map(|(id, timer)| (timer.fires_at, id.clone()))
            .collect();
        due.sort();

        due.into_iter()
            .map(|(_, id)| {
                self.timers.remove(&id);
                Event::TimerFired { id }
            })
            .collect()
    }

    /// Get the next timer fire time
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.values().map(|t| t.fires_at).min()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn is_armed(&self, id: &TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
