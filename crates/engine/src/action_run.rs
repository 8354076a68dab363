// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One action executed as part of a job run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempo_core::{ActionRunId, Event, Node, RunState, CLEANUP_ACTION};

/// Result of recording a command exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Succeeded,
    Failed,
    /// Failed with retries left; the command must be dispatched again
    Retry,
}

/// State of one action within a job run.
///
/// Dependencies are held by sibling name, never by reference; the owning
/// [`JobRun`](crate::JobRun) resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRun {
    pub id: ActionRunId,
    pub name: String,
    /// Unrendered command, rendered again on every dispatch
    pub command_template: String,
    /// Command as last dispatched
    #[serde(default)]
    pub command: Option<String>,
    pub node: Node,
    #[serde(default)]
    pub requires: Vec<String>,
    /// Rendered trigger identifiers that must be published first
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub trigger_downstreams: bool,
    pub state: RunState,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Exit status of every attempt, oldest first
    #[serde(default)]
    pub exit_statuses: Vec<i32>,
    #[serde(default)]
    pub retries_remaining: u32,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionRun {
    pub fn new(id: ActionRunId, name: impl Into<String>, command: impl Into<String>, node: Node) -> Self {
        Self {
            id,
            name: name.into(),
            command_template: command.into(),
            command: None,
            node,
            requires: Vec::new(),
            triggers: Vec::new(),
            trigger_downstreams: false,
            state: RunState::Scheduled,
            start_time: None,
            end_time: None,
            exit_statuses: Vec::new(),
            retries_remaining: 0,
            error: None,
        }
    }

    tempo_core::setters! {
        set {
            requires: Vec<String>,
            triggers: Vec<String>,
            trigger_downstreams: bool,
            retries_remaining: u32,
        }
    }

    pub fn is_cleanup(&self) -> bool {
        self.name == CLEANUP_ACTION
    }

    pub fn exit_status(&self) -> Option<i32> {
        self.exit_statuses.last().copied()
    }

    pub fn queue(&mut self) -> bool {
        if self.state != RunState::Scheduled {
            return false;
        }
        self.state = RunState::Queued;
        true
    }

    /// Move a pending action to running with its rendered command.
    pub fn start(&mut self, command: String, now: DateTime<Utc>) -> bool {
        if !self.state.is_pending() {
            return false;
        }
        self.state = RunState::Running;
        self.command = Some(command);
        self.start_time = Some(now);
        self.end_time = None;
        true
    }

    /// Record a command exit. Stale exits for actions that are not running
    /// are ignored.
    pub fn exited(&mut self, exit_status: i32, ended_at: DateTime<Utc>) -> Option<ExitOutcome> {
        if self.state != RunState::Running {
            return None;
        }
        self.exit_statuses.push(exit_status);
        if exit_status == 0 {
            self.finish(RunState::Succeeded, ended_at);
            return Some(ExitOutcome::Succeeded);
        }
        if self.retries_remaining > 0 {
            self.retries_remaining -= 1;
            return Some(ExitOutcome::Retry);
        }
        self.finish(RunState::Failed, ended_at);
        Some(ExitOutcome::Failed)
    }

    /// The node lost track of the command; its outcome is unknown.
    pub fn lost(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.error = Some(reason.into());
        self.finish(RunState::Unknown, now);
        true
    }

    /// Cancel an action that has not started.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        if !self.state.is_pending() {
            return false;
        }
        self.finish(RunState::Cancelled, now);
        true
    }

    /// Skip a failed or cancelled action so its dependents may start.
    pub fn skip(&mut self, now: DateTime<Utc>) -> bool {
        if !matches!(self.state, RunState::Failed | RunState::Cancelled) {
            return false;
        }
        self.finish(RunState::Skipped, now);
        true
    }

    /// Force success on an action that is pending or whose outcome was lost.
    pub fn mark_success(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_overridable() {
            return false;
        }
        self.finish(RunState::Succeeded, now);
        true
    }

    /// Force failure on an action that is pending or whose outcome was lost.
    pub fn fail(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_overridable() {
            return false;
        }
        self.finish(RunState::Failed, now);
        true
    }

    fn is_overridable(&self) -> bool {
        self.state.is_pending() || self.state == RunState::Unknown
    }

    /// Return a finished action, success excepted, to scheduled so it is
    /// dispatched again.
    pub fn reset(&mut self) -> bool {
        if !self.state.is_broken() && self.state != RunState::Skipped {
            return false;
        }
        self.state = RunState::Scheduled;
        self.end_time = None;
        self.error = None;
        true
    }

    fn finish(&mut self, state: RunState, at: DateTime<Utc>) {
        self.state = state;
        self.end_time = Some(at);
    }

    pub fn changed_event(&self) -> Event {
        Event::ActionRunChanged {
            id: self.id.clone(),
            state: self.state,
            start_time: self.start_time,
            end_time: self.end_time,
            exit_status: self.exit_status(),
        }
    }
}

#[cfg(test)]
#[path = "action_run_tests.rs"]
mod tests;
