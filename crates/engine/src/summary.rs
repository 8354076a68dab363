// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only views of jobs and runs for status displays.

use crate::action_run::ActionRun;
use crate::job_run::JobRun;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempo_core::{ActionRunId, JobName, JobRunId, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Enabled,
    Disabled,
    Running,
}

tempo_core::simple_display! {
    JobStatus {
        Enabled => "enabled",
        Disabled => "disabled",
        Running => "running",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: JobName,
    pub status: JobStatus,
    /// Human-readable schedule, e.g. `cron 0 4 * * *`
    pub schedule: String,
    pub next_run: Option<DateTime<Utc>>,
    /// Newest first
    pub runs: Vec<JobRunSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunSummary {
    pub id: JobRunId,
    pub state: RunState,
    pub run_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub node: String,
    pub manual: bool,
    pub actions: Vec<ActionRunSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRunSummary {
    pub id: ActionRunId,
    pub name: String,
    pub state: RunState,
    pub node: String,
    pub command: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_status: Option<i32>,
    pub error: Option<String>,
}

impl From<&JobRun> for JobRunSummary {
    fn from(run: &JobRun) -> Self {
        Self {
            id: run.id.clone(),
            state: run.state(),
            run_time: run.run_time,
            start_time: run.start_time,
            end_time: run.end_time,
            node: run.node.hostname.clone(),
            manual: run.manual,
            actions: run.actions.iter().chain(run.cleanup.iter()).map(Into::into).collect(),
        }
    }
}

impl From<&ActionRun> for ActionRunSummary {
    fn from(action: &ActionRun) -> Self {
        Self {
            id: action.id.clone(),
            name: action.name.clone(),
            state: action.state,
            node: action.node.hostname.clone(),
            command: action.command.clone(),
            start_time: action.start_time,
            end_time: action.end_time,
            exit_status: action.exit_status(),
            error: action.error.clone(),
        }
    }
}
