// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the scheduler loop

mod methods;

use crate::id::{ActionRunId, JobName, JobRunId};
use crate::state::RunState;
use crate::timer::TimerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator override applied to a single action run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOp {
    /// Let dependents of a failed or cancelled action proceed
    Skip,
    /// Force success on an action that is not running
    Success,
    /// Force failure on an action that is not running
    Fail,
    /// Run the action again; a running command is killed first
    Retry,
}

crate::simple_display! {
    ActionOp {
        Skip => "skip",
        Success => "success",
        Fail => "fail",
        Retry => "retry",
    }
}

/// Events that trigger state transitions in the system.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
/// Inbound events (timers, node results, operator commands) drive the
/// runtime; `*:changed` records are outbound notifications for the
/// pub/sub sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "system:shutdown")]
    Shutdown,

    #[serde(rename = "timer:fired")]
    TimerFired { id: TimerId },

    // -- node results --
    #[serde(rename = "action:exited")]
    ActionExited {
        id: ActionRunId,
        exit_status: i32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },

    /// The node could not be reached after bounded retries.
    #[serde(rename = "action:lost")]
    ActionLost { id: ActionRunId, reason: String },

    #[serde(rename = "trigger:published")]
    TriggerPublished { trigger: String },

    // -- operator commands --
    #[serde(rename = "job:enable")]
    JobEnable { job: JobName },

    #[serde(rename = "job:disable")]
    JobDisable { job: JobName },

    #[serde(rename = "job:start")]
    JobStart {
        job: JobName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_time: Option<DateTime<Utc>>,
    },

    #[serde(rename = "action:control")]
    ActionControl { id: ActionRunId, op: ActionOp },

    // -- outbound notifications --
    #[serde(rename = "job_run:changed")]
    JobRunChanged {
        id: JobRunId,
        state: RunState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_time: Option<DateTime<Utc>>,
    },

    #[serde(rename = "action_run:changed")]
    ActionRunChanged {
        id: ActionRunId,
        state: RunState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_time: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_status: Option<i32>,
    },
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
