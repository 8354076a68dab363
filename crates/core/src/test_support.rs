// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ActionRunId, Event, JobName, JobRunId, TimerId};
use chrono::{DateTime, TimeZone, Utc};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core types.
pub mod strategies {
    use crate::state::RunState;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    pub fn arb_run_state() -> impl Strategy<Value = RunState> {
        prop_oneof![
            Just(RunState::Scheduled),
            Just(RunState::Queued),
            Just(RunState::Running),
            Just(RunState::Succeeded),
            Just(RunState::Failed),
            Just(RunState::Cancelled),
            Just(RunState::Unknown),
        ]
    }

    /// Instants between 1990 and 2060, second resolution.
    pub fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
        (631_152_000i64..2_840_140_800i64)
            .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

// ── Time helpers ────────────────────────────────────────────────────────

/// UTC instant from calendar fields; panics on invalid input (tests only).
#[allow(clippy::unwrap_used)]
pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

// ── Event factory functions ─────────────────────────────────────────────

pub fn job_run_id(job: &str, num: u32) -> JobRunId {
    JobRunId::for_run(&JobName::new(job), num)
}

pub fn action_run_id(job: &str, num: u32, action: &str) -> ActionRunId {
    ActionRunId::for_action(&job_run_id(job, num), action)
}

pub fn run_timer_event(job: &str, num: u32) -> Event {
    Event::TimerFired { id: TimerId::run(&job_run_id(job, num)) }
}

pub fn timeout_event(job: &str, num: u32) -> Event {
    Event::TimerFired { id: TimerId::timeout(&job_run_id(job, num)) }
}

pub fn action_exited_event(
    job: &str,
    num: u32,
    action: &str,
    exit_status: i32,
    at: DateTime<Utc>,
) -> Event {
    Event::ActionExited {
        id: action_run_id(job, num, action),
        exit_status,
        started_at: at,
        ended_at: at,
    }
}
