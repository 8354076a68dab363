// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event methods: name, log summary, owning job

use super::Event;
use crate::id::JobName;

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Shutdown => "system:shutdown",
            Event::TimerFired { .. } => "timer:fired",
            Event::ActionExited { .. } => "action:exited",
            Event::ActionLost { .. } => "action:lost",
            Event::TriggerPublished { .. } => "trigger:published",
            Event::JobEnable { .. } => "job:enable",
            Event::JobDisable { .. } => "job:disable",
            Event::JobStart { .. } => "job:start",
            Event::ActionControl { .. } => "action:control",
            Event::JobRunChanged { .. } => "job_run:changed",
            Event::ActionRunChanged { .. } => "action_run:changed",
        }
    }

    /// One-line summary for log output.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::Shutdown => t.to_string(),
            Event::TimerFired { id } => format!("{t} id={id}"),
            Event::ActionExited { id, exit_status, .. } => {
                format!("{t} id={id} exit_status={exit_status}")
            }
            Event::ActionLost { id, reason } => format!("{t} id={id} reason={reason}"),
            Event::TriggerPublished { trigger } => format!("{t} trigger={trigger}"),
            Event::JobEnable { job } | Event::JobDisable { job } => format!("{t} job={job}"),
            Event::JobStart { job, run_time } => match run_time {
                Some(at) => format!("{t} job={job} run_time={}", at.to_rfc3339()),
                None => format!("{t} job={job}"),
            },
            Event::ActionControl { id, op } => format!("{t} id={id} op={op}"),
            Event::JobRunChanged { id, state, .. } => format!("{t} id={id} state={state}"),
            Event::ActionRunChanged { id, state, .. } => format!("{t} id={id} state={state}"),
        }
    }

    /// Job this event is routed to, if any.
    pub fn job_name(&self) -> Option<JobName> {
        match self {
            Event::TimerFired { id } => id.kind()?.job_run_id().job_name(),
            Event::ActionExited { id, .. }
            | Event::ActionLost { id, .. }
            | Event::ActionControl { id, .. }
            | Event::ActionRunChanged { id, .. } => id.parts()?.0.job_name(),
            Event::JobRunChanged { id, .. } => id.job_name(),
            Event::JobEnable { job } | Event::JobDisable { job } | Event::JobStart { job, .. } => {
                Some(job.clone())
            }
            Event::Shutdown | Event::TriggerPublished { .. } => None,
        }
    }
}
