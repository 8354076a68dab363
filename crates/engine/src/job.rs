// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A job definition and its bounded run history.

use crate::job_run::JobRun;
use crate::summary::{JobStatus, JobSummary};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tempo_config::Schedule;
use tempo_core::{ActionGraph, JobName, JobRunId, Node, NodePool, RunState};

/// Resolved, immutable definition of a job, built from one config load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: JobName,
    pub schedule: Schedule,
    pub graph: ActionGraph,
    pub pool: NodePool,
    /// Node or pool overrides by action name (cleanup included)
    pub action_pools: IndexMap<String, NodePool>,
    pub run_limit: usize,
    pub all_nodes: bool,
    pub enabled: bool,
    pub queueing: bool,
    pub allow_overlap: bool,
    pub schedule_on_complete: bool,
    pub max_runtime: Option<Duration>,
    pub time_zone: Option<Tz>,
}

/// Persisted portion of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pub enabled: bool,
    /// Newest first
    pub runs: Vec<JobRun>,
    #[serde(default)]
    pub next_run_num: u32,
}

/// A job: its current definition, enabled flag, and run history.
///
/// Reconfiguration swaps the definition in place; the history and run
/// numbering carry over.
#[derive(Debug, Clone)]
pub struct Job {
    spec: JobSpec,
    enabled: bool,
    /// Newest first
    runs: VecDeque<JobRun>,
    next_run_num: u32,
}

impl Job {
    pub fn new(spec: JobSpec) -> Self {
        Self { enabled: spec.enabled, spec, runs: VecDeque::new(), next_run_num: 0 }
    }

    pub fn name(&self) -> &JobName {
        &self.spec.name
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the definition, keeping history. Runs already built keep
    /// the actions they were built with.
    pub fn update_from(&mut self, spec: JobSpec) {
        self.spec = spec;
        self.remove_old_runs();
    }

    // -- history --

    /// Runs, newest first.
    pub fn runs(&self) -> impl Iterator<Item = &JobRun> {
        self.runs.iter()
    }

    pub fn run(&self, id: &JobRunId) -> Option<&JobRun> {
        self.runs.iter().find(|r| &r.id == id)
    }

    pub fn run_mut(&mut self, id: &JobRunId) -> Option<&mut JobRun> {
        self.runs.iter_mut().find(|r| &r.id == id)
    }

    pub(crate) fn runs_mut(&mut self) -> impl Iterator<Item = &mut JobRun> {
        self.runs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Create the run(s) for one occurrence at `run_time`: one run, or one
    /// per pool node when the job runs on all nodes.
    pub fn build_new_runs(&mut self, run_time: DateTime<Utc>, manual: bool) -> Vec<JobRunId> {
        let nodes: Vec<Node> = if self.spec.all_nodes {
            self.spec.pool.nodes().to_vec()
        } else {
            vec![self.spec.pool.select(self.next_run_num).clone()]
        };

        let mut ids = Vec::with_capacity(nodes.len());
        for node in nodes {
            let run_num = self.next_run_num;
            self.next_run_num += 1;
            let run = JobRun::build(&self.spec, run_num, run_time, node, manual);
            tracing::debug!(run = %run.id, %run_time, manual, "built job run");
            ids.push(run.id.clone());
            self.runs.push_front(run);
        }
        self.remove_old_runs();
        ids
    }

    /// Evict the oldest finished runs beyond the run limit. Pending and
    /// running runs are never evicted.
    pub fn remove_old_runs(&mut self) {
        while self.runs.len() > self.spec.run_limit {
            let Some(pos) = self.runs.iter().rposition(JobRun::is_done) else {
                break;
            };
            self.runs.remove(pos);
        }
    }

    /// Drop every run that has not started, returning their ids.
    pub fn remove_pending_runs(&mut self) -> Vec<JobRunId> {
        let pending: Vec<JobRunId> =
            self.runs.iter().filter(|r| r.is_pending()).map(|r| r.id.clone()).collect();
        self.runs.retain(|r| !r.is_pending());
        pending
    }

    pub fn pending_runs(&self) -> Vec<JobRunId> {
        self.runs.iter().filter(|r| r.is_pending()).map(|r| r.id.clone()).collect()
    }

    pub fn has_pending(&self) -> bool {
        self.runs.iter().any(JobRun::is_pending)
    }

    pub fn has_active(&self) -> bool {
        self.runs.iter().any(JobRun::is_active)
    }

    /// Whether a run would overlap an active one. With `all_nodes` only
    /// runs on the same node count.
    pub fn has_active_for(&self, node: &Node) -> bool {
        self.runs
            .iter()
            .filter(|r| !self.spec.all_nodes || &r.node == node)
            .any(JobRun::is_active)
    }

    /// Queued runs, oldest first.
    pub fn queued_runs(&self) -> Vec<JobRunId> {
        self.runs
            .iter()
            .rev()
            .filter(|r| r.state() == RunState::Queued)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Scheduled time of the newest non-manual run.
    pub fn last_run_time(&self) -> Option<DateTime<Utc>> {
        self.runs.iter().find(|r| !r.manual).map(|r| r.run_time)
    }

    /// Earliest run time among scheduled runs.
    pub fn next_run_time(&self) -> Option<DateTime<Utc>> {
        self.runs
            .iter()
            .filter(|r| r.state() == RunState::Scheduled)
            .map(|r| r.run_time)
            .min()
    }

    pub fn status(&self) -> JobStatus {
        if self.has_active() {
            JobStatus::Running
        } else if self.enabled {
            JobStatus::Enabled
        } else {
            JobStatus::Disabled
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            name: self.spec.name.clone(),
            status: self.status(),
            schedule: self.spec.schedule.to_string(),
            next_run: self.next_run_time(),
            runs: self.runs.iter().map(JobRun::summary).collect(),
        }
    }

    // -- persistence --

    pub fn state(&self) -> JobState {
        JobState {
            enabled: self.enabled,
            runs: self.runs.iter().cloned().collect(),
            next_run_num: self.next_run_num,
        }
    }

    /// Replace history and enabled flag from a saved state.
    pub fn restore(&mut self, state: JobState) {
        let highest = state.runs.iter().map(|r| r.run_num + 1).max().unwrap_or(0);
        self.enabled = state.enabled;
        self.next_run_num = state.next_run_num.max(highest);
        self.runs = state.runs.into();
        self.remove_old_runs();
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
