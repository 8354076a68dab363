// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for tracking scheduled timers.
//!
//! Every delayed callback the scheduler arms is keyed by a `TimerId`, so a
//! later `CancelTimer` can find it and a fired timer can be routed back to
//! the job run it belongs to.

use crate::id::JobRunId;

crate::define_id! {
    /// Unique identifier for a timer instance.
    pub struct TimerId;
}

impl TimerId {
    /// Timer that starts a scheduled job run when its run time arrives.
    pub fn run(job_run: &JobRunId) -> Self {
        TimerKind::Run(job_run.clone()).to_timer_id()
    }

    /// Timer that stops a job run once its maximum runtime elapses.
    pub fn timeout(job_run: &JobRunId) -> Self {
        TimerKind::Timeout(job_run.clone()).to_timer_id()
    }

    /// Parse this timer ID into a typed `TimerKind`.
    pub fn kind(&self) -> Option<TimerKind> {
        TimerKind::parse(self.as_str())
    }
}

/// Parsed representation of a timer ID for type-safe routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    Run(JobRunId),
    Timeout(JobRunId),
}

impl TimerKind {
    /// Parse a timer ID string into a typed `TimerKind`.
    ///
    /// Returns `None` for unrecognized timer ID formats.
    pub fn parse(id: &str) -> Option<TimerKind> {
        if let Some(rest) = id.strip_prefix("run:") {
            return Some(TimerKind::Run(parse_run(rest)?));
        }
        if let Some(rest) = id.strip_prefix("timeout:") {
            return Some(TimerKind::Timeout(parse_run(rest)?));
        }
        None
    }

    /// Format this `TimerKind` back into a canonical `TimerId`.
    pub fn to_timer_id(&self) -> TimerId {
        match self {
            TimerKind::Run(run) => TimerId::new(format!("run:{run}")),
            TimerKind::Timeout(run) => TimerId::new(format!("timeout:{run}")),
        }
    }

    pub fn job_run_id(&self) -> &JobRunId {
        match self {
            TimerKind::Run(run) | TimerKind::Timeout(run) => run,
        }
    }
}

fn parse_run(s: &str) -> Option<JobRunId> {
    let id = JobRunId::new(s);
    id.parts().map(|_| id)
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
