// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job scheduling loop.
//!
//! Each armed occurrence is a scheduled run plus a `run:<id>` timer. When
//! the timer fires, [`JobScheduler::run_job`] starts the run (or queues or
//! drops it, per the overlap policy) and arms exactly one next occurrence.
//! Every public operation ends by draining run notices and persisting the
//! job state.

use crate::job::{Job, JobSpec, JobState};
use crate::outbox::{Outbox, RunEnv, RunNotice};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tempo_core::{ActionOp, ActionRunId, Effect, JobName, JobRunId, RunState, TimerId};
use tempo_storage::StateKey;

pub struct JobScheduler {
    job: Job,
}

impl JobScheduler {
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn name(&self) -> &JobName {
        self.job.name()
    }

    pub fn state_key(&self) -> StateKey {
        StateKey::job_state(self.name().as_str())
    }

    /// Arm the next occurrence unless one is already pending.
    pub fn schedule(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        self.arm(env.now, false, out);
        self.settle(env, out);
    }

    /// Handle the `run:` timer of a scheduled run.
    pub fn run_job(&mut self, id: &JobRunId, env: RunEnv<'_>, out: &mut Outbox) {
        self.run_due(id, env, out);
        self.settle(env, out);
    }

    /// Start queued runs whose slot is free, then arm the next occurrence.
    pub fn run_queue_schedule(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        self.start_queued(env, out);
        self.arm(env.now, false, out);
        self.settle(env, out);
    }

    /// Enable the job; a no-op when already enabled. Calendar schedules
    /// restart from now instead of the last run.
    pub fn enable(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if self.job.is_enabled() {
            return;
        }
        tracing::info!(job = %self.name(), "enabling job");
        self.job.set_enabled(true);
        let ignore_last = self.job.spec().schedule.is_calendar();
        self.arm(env.now, ignore_last, out);
        self.settle(env, out);
    }

    /// Disable the job and cancel every run that has not started.
    pub fn disable(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        tracing::info!(job = %self.name(), "disabling job");
        self.job.set_enabled(false);
        for id in self.job.pending_runs() {
            out.push(Effect::CancelTimer { id: TimerId::run(&id) });
            if let Some(run) = self.job.run_mut(&id) {
                run.cancel(env.now, out);
            }
        }
        self.settle(env, out);
    }

    /// Swap in a new definition, keeping history.
    pub fn update_from(&mut self, spec: JobSpec, env: RunEnv<'_>, out: &mut Outbox) {
        let was = self.job.spec().enabled;
        let now_enabled = spec.enabled;
        self.job.update_from(spec);
        if was != now_enabled {
            if now_enabled {
                self.enable(env, out);
            } else {
                self.disable(env, out);
            }
        }
        self.schedule_reconfigured(env, out);
    }

    /// Drop pending runs built from the old definition and re-arm from now.
    pub fn schedule_reconfigured(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        for id in self.job.remove_pending_runs() {
            tracing::debug!(run = %id, "removing pending run after reconfiguration");
            out.push(Effect::CancelTimer { id: TimerId::run(&id) });
        }
        self.arm(env.now, true, out);
        self.settle(env, out);
    }

    /// Build and immediately start runs, bypassing the overlap check.
    pub fn manual_start(
        &mut self,
        run_time: Option<DateTime<Utc>>,
        env: RunEnv<'_>,
        out: &mut Outbox,
    ) -> Vec<JobRunId> {
        let run_time = run_time.unwrap_or(env.now);
        let ids = self.job.build_new_runs(run_time, true);
        tracing::info!(job = %self.name(), runs = ids.len(), "manual start");
        for id in &ids {
            self.start_run(id, env, out);
        }
        self.settle(env, out);
        ids
    }

    /// Handle the `timeout:` timer of a started run.
    pub fn handle_timeout(&mut self, id: &JobRunId, env: RunEnv<'_>, out: &mut Outbox) {
        if let Some(run) = self.job.run_mut(id) {
            tracing::warn!(run = %id, "job run exceeded max runtime");
            run.stop(env, out);
        }
        self.settle(env, out);
    }

    pub fn action_exited(
        &mut self,
        id: &ActionRunId,
        exit_status: i32,
        ended_at: DateTime<Utc>,
        env: RunEnv<'_>,
        out: &mut Outbox,
    ) {
        let Some((run_id, action)) = id.parts() else {
            return;
        };
        match self.job.run_mut(&run_id) {
            Some(run) => run.action_exited(action, exit_status, ended_at, env, out),
            None => tracing::warn!(action_run = %id, "exit for run no longer in history"),
        }
        self.settle(env, out);
    }

    pub fn action_lost(&mut self, id: &ActionRunId, reason: &str, env: RunEnv<'_>, out: &mut Outbox) {
        let Some((run_id, action)) = id.parts() else {
            return;
        };
        if let Some(run) = self.job.run_mut(&run_id) {
            run.action_lost(action, reason, env, out);
        }
        self.settle(env, out);
    }

    /// Apply an operator override to one action run. Nothing is emitted
    /// when the override does not apply.
    pub fn control_action(&mut self, id: &ActionRunId, op: ActionOp, env: RunEnv<'_>, out: &mut Outbox) -> bool {
        let Some((run_id, action)) = id.parts() else {
            return false;
        };
        let applied = self.job.run_mut(&run_id).is_some_and(|run| run.control(action, op, env, out));
        if applied {
            self.settle(env, out);
        }
        applied
    }

    /// Let started runs pick up newly published triggers.
    pub fn triggers_published(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if !self.job.has_active() {
            return;
        }
        for run in self.job.runs_mut() {
            run.triggers_published(env, out);
        }
        self.settle(env, out);
    }

    /// Load saved history: runs that were running become unknown, scheduled
    /// runs get their timers back, and queued runs are given a chance.
    ///
    /// Runs armed before the restore are replaced by the saved ones.
    pub fn restore_state(&mut self, state: JobState, env: RunEnv<'_>, out: &mut Outbox) {
        for id in self.job.remove_pending_runs() {
            out.push(Effect::CancelTimer { id: TimerId::run(&id) });
        }
        self.job.restore(state);
        for run in self.job.runs_mut() {
            run.recover(env, out);
        }
        let scheduled: Vec<(JobRunId, DateTime<Utc>)> = self
            .job
            .runs()
            .filter(|r| r.state() == RunState::Scheduled)
            .map(|r| (r.id.clone(), r.run_time))
            .collect();
        for (id, run_time) in scheduled {
            out.push(Effect::SetTimer { id: TimerId::run(&id), duration: delay(run_time, env.now) });
        }
        if let Some(limit) = self.job.spec().max_runtime {
            let started: Vec<(JobRunId, DateTime<Utc>)> = self
                .job
                .runs()
                .filter(|r| !r.is_done())
                .filter_map(|r| r.start_time.map(|t| (r.id.clone(), t)))
                .collect();
            for (id, start_time) in started {
                let deadline = chrono::Duration::from_std(limit)
                    .ok()
                    .and_then(|limit| start_time.checked_add_signed(limit))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                out.push(Effect::SetTimer { id: TimerId::timeout(&id), duration: delay(deadline, env.now) });
            }
        }
        self.run_queue_schedule(env, out);
    }

    // -- internals --

    fn arm(&mut self, now: DateTime<Utc>, ignore_last: bool, out: &mut Outbox) {
        if !self.job.is_enabled() || self.job.has_pending() {
            return;
        }
        let spec = self.job.spec();
        if spec.schedule_on_complete && self.job.has_active() {
            return;
        }
        let last = if ignore_last { None } else { self.job.last_run_time() };
        let Some(run_time) = spec.schedule.next_run_time(last, now) else {
            tracing::warn!(job = %self.name(), schedule = %spec.schedule, "no further occurrences");
            return;
        };

        let duration = delay(run_time, now);
        for id in self.job.build_new_runs(run_time, false) {
            tracing::debug!(run = %id, %run_time, delay_ms = duration.as_millis() as u64, "scheduled");
            if let Some(run) = self.job.run(&id) {
                out.emit(run.changed_event());
            }
            out.push(Effect::SetTimer { id: TimerId::run(&id), duration });
        }
    }

    fn run_due(&mut self, id: &JobRunId, env: RunEnv<'_>, out: &mut Outbox) {
        let Some(run) = self.job.run(id) else {
            tracing::debug!(run = %id, "timer for run no longer in history");
            return;
        };
        let node = run.node.clone();
        let state = run.state();

        if !self.job.is_enabled() {
            if let Some(run) = self.job.run_mut(id) {
                run.cancel(env.now, out);
            }
            return;
        }
        if state != RunState::Scheduled {
            tracing::debug!(run = %id, %state, "run is not scheduled");
            self.arm(env.now, false, out);
            return;
        }

        let spec = self.job.spec();
        let (queueing, schedule_on_complete) = (spec.queueing, spec.schedule_on_complete);
        if !spec.allow_overlap && self.job.has_active_for(&node) {
            let Some(run) = self.job.run_mut(id) else {
                return;
            };
            if queueing {
                tracing::info!(run = %id, "previous run still active, queueing");
                run.queue(env.now, out);
            } else {
                tracing::info!(run = %id, "previous run still active, dropping");
                run.cancel(env.now, out);
                self.arm(env.now, false, out);
            }
            return;
        }

        self.start_run(id, env, out);
        if !schedule_on_complete {
            self.arm(env.now, false, out);
        }
    }

    fn start_run(&mut self, id: &JobRunId, env: RunEnv<'_>, out: &mut Outbox) {
        let max_runtime = self.job.spec().max_runtime;
        let Some(run) = self.job.run_mut(id) else {
            return;
        };
        if run.start(env, out) {
            if let Some(limit) = max_runtime {
                out.push(Effect::SetTimer { id: TimerId::timeout(id), duration: limit });
            }
        }
    }

    fn start_queued(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        if !self.job.is_enabled() {
            return;
        }
        for id in self.job.queued_runs() {
            let Some(node) = self.job.run(&id).map(|r| r.node.clone()) else {
                continue;
            };
            if !self.job.spec().allow_overlap && self.job.has_active_for(&node) {
                continue;
            }
            tracing::info!(run = %id, "starting queued run");
            self.start_run(&id, env, out);
        }
    }

    /// Drain run notices, then persist.
    fn settle(&mut self, env: RunEnv<'_>, out: &mut Outbox) {
        while let Some(notice) = out.next_notice() {
            match notice {
                RunNotice::Done(id) => {
                    tracing::info!(run = %id, state = ?self.job.run(&id).map(|r| r.state()), "job run done");
                    out.push(Effect::CancelTimer { id: TimerId::timeout(&id) });
                    self.start_queued(env, out);
                    self.arm(env.now, false, out);
                }
                RunNotice::Started(_) | RunNotice::StateChanged(_) => {}
            }
        }
        self.job.remove_old_runs();
        match serde_json::to_value(self.job.state()) {
            Ok(value) => out.push(Effect::Persist {
                key: self.state_key().to_string(),
                value: Some(value),
            }),
            Err(e) => tracing::error!(job = %self.name(), error = %e, "failed to serialize job state"),
        }
    }
}

/// Time until `run_time`, zero when it has passed.
fn delay(run_time: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (run_time - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
#[path = "job_scheduler_tests.rs"]
mod tests;
