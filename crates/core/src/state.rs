// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle states shared by job runs and action runs.

use serde::{Deserialize, Serialize};

/// State of a job run or action run.
///
/// `scheduled → queued → running → {succeeded, failed, cancelled, unknown}`
///
/// `skipped` is only reached by an operator skipping a failed or cancelled
/// action; dependents treat it like success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Scheduled,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Skipped,
    Unknown,
}

crate::simple_display! {
    RunState {
        Scheduled => "scheduled",
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
        Skipped => "skipped",
        Unknown => "unknown",
    }
}

impl RunState {
    /// Not yet started: scheduled or queued.
    pub fn is_pending(self) -> bool {
        matches!(self, RunState::Scheduled | RunState::Queued)
    }

    pub fn is_active(self) -> bool {
        self == RunState::Running
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded
                | RunState::Failed
                | RunState::Cancelled
                | RunState::Skipped
                | RunState::Unknown
        )
    }

    /// Succeeded or skipped: dependents may start.
    pub fn is_complete(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Skipped)
    }

    /// Terminal without completing; dependents of a broken run can never start.
    pub fn is_broken(self) -> bool {
        self.is_terminal() && !self.is_complete()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
