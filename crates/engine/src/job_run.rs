// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One scheduled firing of a job and the actions it owns.
//!
//! A job run's state is never stored: it is derived from its action runs
//! every time it is asked for. Every mutating method compares the derived
//! state before and after and reports a change through the [`Outbox`].

use crate::action_run::{ActionRun, ExitOutcome};
use crate::context::CommandContext;
use crate::job::JobSpec;
use crate::outbox::{Outbox, RunEnv, RunNotice};
use crate::summary::JobRunSummary;
use crate::triggers::{downstream_trigger, TriggerRegistry};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tempo_core::{
    ActionCommand, ActionOp, ActionRunId, Effect, Event, JobName, JobRunId, Node, RunState,
    CLEANUP_ACTION,
};

/// Reason recorded on actions whose outcome was lost across a restart.
pub const RESTART_LOST_REASON: &str = "exit status missed across restart";

/// Reason recorded on actions cancelled because a dependency broke.
pub const BLOCKED_REASON: &str = "dependency did not complete";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: JobRunId,
    pub job: JobName,
    pub run_num: u32,
    pub run_time: DateTime<Utc>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub node: Node,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub time_zone: Option<Tz>,
    /// Regular actions in declaration order
    pub actions: Vec<ActionRun>,
    #[serde(default)]
    pub cleanup: Option<ActionRun>,
}

impl JobRun {
    /// Instantiate a run of `spec` with one action run per graph entry.
    pub fn build(
        spec: &JobSpec,
        run_num: u32,
        run_time: DateTime<Utc>,
        node: Node,
        manual: bool,
    ) -> Self {
        let id = JobRunId::for_run(&spec.name, run_num);
        let mut run = Self {
            id,
            job: spec.name.clone(),
            run_num,
            run_time,
            start_time: None,
            end_time: None,
            node,
            manual,
            time_zone: spec.time_zone,
            actions: Vec::new(),
            cleanup: None,
        };

        let actions = spec
            .graph
            .actions()
            .map(|action| {
                let node = run.action_node(spec, &action.name);
                let triggers = spec
                    .graph
                    .required_triggers(&action.name)
                    .map(|template| run.context(&action.name, &node, None).render(template))
                    .collect();
                ActionRun::new(
                    ActionRunId::for_action(&run.id, &action.name),
                    action.name.as_str(),
                    action.command.as_str(),
                    node,
                )
                .requires(spec.graph.required(&action.name).map(str::to_string).collect())
                .triggers(triggers)
                .trigger_downstreams(action.trigger_downstreams)
                .retries_remaining(action.retries)
            })
            .collect();
        run.actions = actions;

        run.cleanup = spec.graph.cleanup().map(|cleanup| {
            let node = run.action_node(spec, CLEANUP_ACTION);
            ActionRun::new(
                ActionRunId::for_action(&run.id, CLEANUP_ACTION),
                CLEANUP_ACTION,
                cleanup.command.as_str(),
                node,
            )
            .retries_remaining(cleanup.retries)
        });
        run
    }

    fn action_node(&self, spec: &JobSpec, action: &str) -> Node {
        spec.action_pools
            .get(action)
            .map(|pool| pool.select(self.run_num).clone())
            .unwrap_or_else(|| self.node.clone())
    }

    fn context<'a>(
        &'a self,
        action: &'a str,
        node: &'a Node,
        cleanup_status: Option<&'static str>,
    ) -> CommandContext<'a> {
        CommandContext {
            job: &self.job,
            run_id: &self.id,
            run_num: self.run_num,
            run_time: self.run_time,
            time_zone: self.time_zone,
            manual: self.manual,
            action,
            node,
            cleanup_status,
        }
    }

    // -- read accessors --

    pub fn state(&self) -> RunState {
        let all = || self.actions.iter().chain(self.cleanup.iter());
        if all().all(|a| a.state.is_complete()) {
            return RunState::Succeeded;
        }
        if all().any(|a| a.state == RunState::Running) {
            return RunState::Running;
        }
        if all().all(|a| a.state.is_terminal()) {
            return [RunState::Failed, RunState::Unknown, RunState::Cancelled]
                .into_iter()
                .find(|s| all().any(|a| a.state == *s))
                .unwrap_or(RunState::Succeeded);
        }
        if all().any(|a| a.state == RunState::Queued) {
            return RunState::Queued;
        }
        if self.start_time.is_some() {
            // Waiting for triggers, or between actions
            return RunState::Running;
        }
        RunState::Scheduled
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Look up an action run by name, the cleanup action included.
    pub fn action(&self, name: &str) -> Option<&ActionRun> {
        self.actions
            .iter()
            .chain(self.cleanup.iter())
            .find(|a| a.name == name)
    }

    fn action_mut(&mut self, name: &str) -> Option<&mut ActionRun> {
        self.actions
            .iter_mut()
            .chain(self.cleanup.iter_mut())
            .find(|a| a.name == name)
    }

    fn sibling(&self, name: &str) -> Option<&ActionRun> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Whether a pending action can never start because a dependency,
    /// direct or transitive, ended without success.
    pub fn is_blocked(&self, action: &ActionRun) -> bool {
        action.requires.iter().any(|dep| match self.sibling(dep) {
            Some(dep) => dep.state.is_broken() || (dep.state.is_pending() && self.is_blocked(dep)),
            None => false,
        })
    }

    fn is_ready(&self, action: &ActionRun, triggers: &TriggerRegistry) -> bool {
        action.state.is_pending()
            && action
                .requires
                .iter()
                .all(|dep| self.sibling(dep).map_or(true, |d| d.state.is_complete()))
            && action.triggers.iter().all(|t| triggers.is_published(t))
    }

    /// `SUCCESS`, `FAILURE` or `UNKNOWN`, from the regular actions.
    pub fn cleanup_status(&self) -> &'static str {
        if self.actions.iter().all(|a| a.state.is_complete()) {
            "SUCCESS"
        } else if self.actions.iter().any(|a| a.state == RunState::Failed) {
            "FAILURE"
        } else {
            "UNKNOWN"
        }
    }

    pub fn changed_event(&self) -> Event {
        Event::JobRunChanged {
            id: self.id.clone(),
            state: self.state(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn summary(&self) -> JobRunSummary {
        JobRunSummary::from(self)
    }

    // -- transitions --

    /// Run `step` and report a derived state change, if any.
    fn track<F>(&mut self, now: DateTime<Utc>, out: &mut Outbox, step: F)
    where
        F: FnOnce(&mut Self, &mut Outbox),
    {
        let before = self.state();
        step(self, out);
        let after = self.state();
        if before == after {
            return;
        }
        if after.is_terminal() {
            self.end_time.get_or_insert(now);
        } else {
            self.end_time = None;
        }
        out.emit(self.changed_event());
        out.notify(RunNotice::StateChanged(self.id.clone()));
        if after.is_terminal() && self.start_time.is_some() {
            out.notify(RunNotice::Done(self.id.clone()));
        }
    }

    /// Hold a scheduled run until a slot frees up.
    pub fn queue(&mut self, now: DateTime<Utc>, out: &mut Outbox) -> bool {
        if self.state() != RunState::Scheduled {
            return false;
        }
        self.track(now, out, |run, _| {
            for action in run.actions.iter_mut().chain(run.cleanup.iter_mut()) {
                action.queue();
            }
        });
        true
    }

    /// Start a pending run and dispatch every action that is ready.
    pub fn start(&mut self, env: RunEnv<'_>, out: &mut Outbox) -> bool {
        if !self.is_pending() {
            return false;
        }
        tracing::info!(run = %self.id, node = %self.node, "starting job run");
        self.track(env.now, out, |run, out| {
            run.start_time = Some(env.now);
            out.notify(RunNotice::Started(run.id.clone()));
            run.advance(env, out);
        });
        true
    }

    /// Cancel a run that has not started. Started runs are left alone.
    pub fn cancel(&mut self, now: DateTime<Utc>, out: &mut Outbox) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.track(now, out, |run, out| {
            for action in run.actions.iter_mut().chain(run.cleanup.iter_mut()) {
                if action.cancel(now) {
                    out.emit(action.changed_event());
                }
            }
        });
        true
    }

    /// Stop a started run: running actions are asked to terminate and
    /// pending ones are cancelled. The cleanup action still runs.
    pub fn stop(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if self.start_time.is_none() || self.is_done() {
            return;
        }
        tracing::warn!(run = %self.id, "stopping job run");
        self.track(env.now, out, |run, out| {
            for action in run.actions.iter_mut() {
                match action.state {
                    RunState::Running => {
                        action.retries_remaining = 0;
                        out.push(Effect::CancelAction {
                            id: action.id.clone(),
                            node: action.node.clone(),
                        });
                    }
                    state if state.is_pending() => {
                        action.cancel(env.now);
                        out.emit(action.changed_event());
                    }
                    _ => {}
                }
            }
            run.advance(env, out);
        });
    }

    pub fn action_exited(
        &mut self,
        name: &str,
        exit_status: i32,
        ended_at: DateTime<Utc>,
        env: RunEnv<'_>,
        out: &mut Outbox,
    ) {
        self.track(env.now, out, |run, out| {
            let Some(action) = run.action_mut(name) else {
                tracing::warn!(run = %run.id, action = name, "exit for unknown action");
                return;
            };
            let Some(outcome) = action.exited(exit_status, ended_at) else {
                tracing::debug!(action_run = %action.id, state = %action.state, "ignoring stale exit");
                return;
            };
            match outcome {
                ExitOutcome::Retry => {
                    tracing::info!(
                        action_run = %action.id,
                        exit_status,
                        retries_remaining = action.retries_remaining,
                        "retrying action"
                    );
                    let command = action.command.clone().unwrap_or_default();
                    let (id, node) = (action.id.clone(), action.node.clone());
                    out.push(Effect::StartAction { command: ActionCommand { id, command, node } });
                    return;
                }
                ExitOutcome::Succeeded => {
                    let trigger_downstreams = action.trigger_downstreams;
                    out.emit(action.changed_event());
                    if trigger_downstreams {
                        let shortdate = run.context(name, &run.node, None).resolve("shortdate", 0);
                        if let Some(shortdate) = shortdate {
                            out.publish(downstream_trigger(&run.job, name, &shortdate));
                        }
                    }
                }
                ExitOutcome::Failed => {
                    tracing::info!(action_run = %action.id, exit_status, "action failed");
                    out.emit(action.changed_event());
                }
            }
            run.advance(env, out);
        });
    }

    pub fn action_lost(&mut self, name: &str, reason: &str, env: RunEnv<'_>, out: &mut Outbox) {
        self.track(env.now, out, |run, out| {
            let Some(action) = run.action_mut(name) else {
                return;
            };
            if action.lost(reason, env.now) {
                tracing::warn!(action_run = %action.id, reason, "action lost");
                out.emit(action.changed_event());
                run.advance(env, out);
            }
        });
    }

    /// Re-check actions waiting for triggers.
    pub fn triggers_published(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if self.start_time.is_none() || self.is_done() {
            return;
        }
        self.track(env.now, out, |run, out| run.advance(env, out));
    }

    /// Apply an operator override to one action, then let the run move on.
    ///
    /// Skip, success and retry reopen actions that were cancelled only
    /// because a dependency broke. Retrying a running action kills the
    /// command and dispatches it again when the kill is reported. Returns
    /// false when the action's state does not allow `op`.
    pub fn control(&mut self, name: &str, op: ActionOp, env: RunEnv<'_>, out: &mut Outbox) -> bool {
        let mut applied = false;
        self.track(env.now, out, |run, out| {
            let Some(action) = run.action_mut(name) else {
                return;
            };
            applied = match op {
                ActionOp::Skip => action.skip(env.now),
                ActionOp::Success => action.mark_success(env.now),
                ActionOp::Fail => action.fail(env.now),
                ActionOp::Retry if action.state == RunState::Running => {
                    action.retries_remaining = action.retries_remaining.max(1);
                    out.push(Effect::CancelAction { id: action.id.clone(), node: action.node.clone() });
                    true
                }
                ActionOp::Retry => action.reset(),
            };
            if !applied {
                return;
            }
            tracing::info!(action_run = %action.id, %op, state = %action.state, "operator override");
            out.emit(action.changed_event());
            if op != ActionOp::Fail {
                run.reopen_blocked(out);
            }
            run.advance(env, out);
        });
        applied
    }

    /// Reset actions cancelled by a broken dependency. Those still blocked
    /// are cancelled again by the next advance.
    fn reopen_blocked(&mut self, out: &mut Outbox) {
        for action in self.actions.iter_mut() {
            if action.state == RunState::Cancelled
                && action.error.as_deref() == Some(BLOCKED_REASON)
                && action.reset()
            {
                out.emit(action.changed_event());
            }
        }
    }

    /// After a restart nothing is known about commands that were running;
    /// mark them unknown and let the run move on.
    pub fn recover(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if self.start_time.is_none() || self.is_done() {
            return;
        }
        self.track(env.now, out, |run, out| {
            for action in run.actions.iter_mut().chain(run.cleanup.iter_mut()) {
                if action.state == RunState::Running && action.lost(RESTART_LOST_REASON, env.now) {
                    out.emit(action.changed_event());
                }
            }
            run.advance(env, out);
        });
    }

    /// Dispatch ready actions; once nothing else can run, start the cleanup
    /// action, then cancel whatever is blocked.
    fn advance(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if self.start_time.is_none() {
            return;
        }
        let ready: Vec<usize> = (0..self.actions.len())
            .filter(|&i| self.is_ready(&self.actions[i], env.triggers))
            .collect();
        for i in ready {
            self.dispatch(i, env.now, out);
        }

        if self.actions.iter().any(|a| a.state == RunState::Running) {
            return;
        }
        if self.actions.iter().any(|a| a.state.is_pending() && !self.is_blocked(a)) {
            // Waiting on triggers
            return;
        }

        match self.cleanup.as_ref().map(|c| c.state) {
            Some(state) if state.is_pending() => {
                self.dispatch_cleanup(env.now, out);
                return;
            }
            Some(RunState::Running) => return,
            _ => {}
        }

        for action in self.actions.iter_mut() {
            if action.cancel(env.now) {
                action.error = Some(BLOCKED_REASON.to_string());
                tracing::info!(action_run = %action.id, "cancelling blocked action");
                out.emit(action.changed_event());
            }
        }
    }

    fn dispatch(&mut self, index: usize, now: DateTime<Utc>, out: &mut Outbox) {
        let action = &self.actions[index];
        let command = self.context(&action.name, &action.node, None).render(&action.command_template);
        let action = &mut self.actions[index];
        Self::dispatch_action(action, command, now, out);
    }

    fn dispatch_cleanup(&mut self, now: DateTime<Utc>, out: &mut Outbox) {
        let status = self.cleanup_status();
        let Some(cleanup) = &self.cleanup else {
            return;
        };
        let command =
            self.context(&cleanup.name, &cleanup.node, Some(status)).render(&cleanup.command_template);
        if let Some(cleanup) = self.cleanup.as_mut() {
            Self::dispatch_action(cleanup, command, now, out);
        }
    }

    fn dispatch_action(action: &mut ActionRun, command: String, now: DateTime<Utc>, out: &mut Outbox) {
        if !action.start(command.clone(), now) {
            return;
        }
        out.emit(action.changed_event());
        out.push(Effect::StartAction {
            command: ActionCommand { id: action.id.clone(), command, node: action.node.clone() },
        });
    }
}

#[cfg(test)]
#[path = "job_run_tests.rs"]
mod tests;
