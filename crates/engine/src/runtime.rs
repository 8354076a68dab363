// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single dispatch point for the scheduling core.
//!
//! The runtime owns the job collection and the trigger registry. Every
//! inbound event is handled to completion here, producing effects for the
//! executor; nothing in this module performs I/O.

use crate::collection::{JobCollection, JobFactory, ReconcileReport};
use crate::error::RuntimeError;
use crate::job::JobState;
use crate::job_scheduler::JobScheduler;
use crate::outbox::{Outbox, RunEnv};
use crate::summary::JobSummary;
use crate::triggers::{TriggerRegistry, TriggerState};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use tempo_config::{ConfigFile, JobConfig};
use tempo_core::{ActionOp, ActionRunId, Clock, Effect, Event, JobName, JobRunId, TimerKind};
use tempo_storage::StateKey;

pub struct Runtime<C: Clock> {
    clock: C,
    jobs: JobCollection,
    triggers: TriggerRegistry,
    factory: JobFactory,
    default_tz: Option<Tz>,
}

impl<C: Clock> Runtime<C> {
    pub fn new(clock: C, default_tz: Option<Tz>) -> Self {
        Self {
            clock,
            jobs: JobCollection::new(),
            triggers: TriggerRegistry::new(),
            factory: JobFactory::default(),
            default_tz,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn jobs(&self) -> &JobCollection {
        &self.jobs
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    pub fn job_names(&self) -> Vec<JobName> {
        self.jobs.names().cloned().collect()
    }

    pub fn summaries(&self) -> Vec<JobSummary> {
        self.jobs.iter().map(|s| s.job().summary()).collect()
    }

    pub fn summary(&self, name: &str) -> Option<JobSummary> {
        self.jobs.get(name).map(|s| s.job().summary())
    }

    /// Reconcile against a whole configuration document.
    ///
    /// Node errors reject the document; per-job errors are collected in
    /// the report and leave the other jobs loaded.
    pub fn load_config(
        &mut self,
        file: &ConfigFile,
    ) -> Result<(ReconcileReport, Vec<Effect>), RuntimeError> {
        let factory = JobFactory::from_file(file, self.default_tz)?;
        Ok(self.load_jobs(&file.jobs, factory))
    }

    pub fn load_jobs(
        &mut self,
        configs: &[JobConfig],
        factory: JobFactory,
    ) -> (ReconcileReport, Vec<Effect>) {
        self.factory = factory;
        let now = self.clock.now();
        let mut out = Outbox::new();
        let env = RunEnv::new(now, &self.triggers);
        let report = self.jobs.load_from_config(configs, &self.factory, env, &mut out);
        tracing::info!(
            added = report.added.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            rejected = report.rejected.len(),
            errors = report.errors.len(),
            "configuration loaded"
        );
        self.propagate_triggers(now, &mut out);
        (report, out.into_effects())
    }

    /// Apply saved job states to loaded jobs. States for jobs that are no
    /// longer configured are ignored.
    pub fn restore(&mut self, states: HashMap<JobName, JobState>) -> Vec<Effect> {
        let now = self.clock.now();
        let mut out = Outbox::new();
        for (name, state) in states {
            let Some(scheduler) = self.jobs.get_mut(&name) else {
                tracing::debug!(job = %name, "saved state for unconfigured job");
                continue;
            };
            tracing::info!(job = %name, runs = state.runs.len(), "restoring job state");
            scheduler.restore_state(state, RunEnv::new(now, &self.triggers), &mut out);
        }
        self.propagate_triggers(now, &mut out);
        out.into_effects()
    }

    /// Load saved triggers. Call before [`Runtime::restore`] so restored
    /// runs waiting on them can proceed.
    pub fn restore_triggers(&mut self, state: TriggerState) {
        tracing::info!(triggers = state.published.len(), "restoring published triggers");
        self.triggers.restore(state);
    }

    // -- operator commands --

    pub fn enable(&mut self, job: &JobName) -> Result<Vec<Effect>, RuntimeError> {
        self.handle_event(Event::JobEnable { job: job.clone() })
    }

    pub fn disable(&mut self, job: &JobName) -> Result<Vec<Effect>, RuntimeError> {
        self.handle_event(Event::JobDisable { job: job.clone() })
    }

    /// Build and start runs of `job` now, bypassing the overlap check.
    pub fn manual_start(
        &mut self,
        job: &JobName,
        run_time: Option<DateTime<Utc>>,
    ) -> Result<(Vec<JobRunId>, Vec<Effect>), RuntimeError> {
        let now = self.clock.now();
        let mut out = Outbox::new();
        let scheduler = scheduler_mut(&mut self.jobs, job)?;
        let ids = scheduler.manual_start(run_time, RunEnv::new(now, &self.triggers), &mut out);
        self.propagate_triggers(now, &mut out);
        Ok((ids, out.into_effects()))
    }

    /// Skip, force, or retry one action run.
    pub fn control_action(&mut self, id: &ActionRunId, op: ActionOp) -> Result<Vec<Effect>, RuntimeError> {
        self.handle_event(Event::ActionControl { id: id.clone(), op })
    }

    /// Handle one event to completion.
    ///
    /// Results for jobs or runs that no longer exist are dropped. Operator
    /// commands naming an unknown job fail with [`RuntimeError::JobNotFound`].
    pub fn handle_event(&mut self, event: Event) -> Result<Vec<Effect>, RuntimeError> {
        let now = self.clock.now();
        let mut out = Outbox::new();
        let env = RunEnv::new(now, &self.triggers);

        match event {
            Event::TimerFired { id } => match id.kind() {
                Some(TimerKind::Run(run)) => {
                    if let Some(scheduler) = owning_scheduler(&mut self.jobs, &run) {
                        scheduler.run_job(&run, env, &mut out);
                    }
                }
                Some(TimerKind::Timeout(run)) => {
                    if let Some(scheduler) = owning_scheduler(&mut self.jobs, &run) {
                        scheduler.handle_timeout(&run, env, &mut out);
                    }
                }
                None => tracing::warn!(timer = %id, "unrecognized timer"),
            },

            Event::ActionExited { id, exit_status, ended_at, .. } => {
                if let Some(scheduler) = id.parts().and_then(|(run, _)| owning_scheduler(&mut self.jobs, &run)) {
                    scheduler.action_exited(&id, exit_status, ended_at, env, &mut out);
                }
            }

            Event::ActionLost { id, reason } => {
                if let Some(scheduler) = id.parts().and_then(|(run, _)| owning_scheduler(&mut self.jobs, &run)) {
                    scheduler.action_lost(&id, &reason, env, &mut out);
                }
            }

            Event::TriggerPublished { trigger } => out.publish(trigger),

            Event::JobEnable { job } => scheduler_mut(&mut self.jobs, &job)?.enable(env, &mut out),
            Event::JobDisable { job } => scheduler_mut(&mut self.jobs, &job)?.disable(env, &mut out),
            Event::JobStart { job, run_time } => {
                scheduler_mut(&mut self.jobs, &job)?.manual_start(run_time, env, &mut out);
            }
            Event::ActionControl { id, op } => {
                let not_found = || RuntimeError::ActionNotFound(id.clone());
                let (run, action) = id.parts().ok_or_else(not_found)?;
                let job = run.job_name().ok_or_else(not_found)?;
                let scheduler = scheduler_mut(&mut self.jobs, &job)?;
                let state = scheduler
                    .job()
                    .run(&run)
                    .and_then(|r| r.action(action))
                    .map(|a| a.state)
                    .ok_or_else(not_found)?;
                if !scheduler.control_action(&id, op, env, &mut out) {
                    return Err(RuntimeError::InvalidTransition { id, op, state });
                }
            }

            // Outbound records and loop control
            Event::JobRunChanged { .. } | Event::ActionRunChanged { .. } | Event::Shutdown => {}
        }

        self.propagate_triggers(now, &mut out);
        Ok(out.into_effects())
    }

    /// Move triggers published during a step into the registry, letting
    /// every job re-check its waiting actions until nothing new appears.
    fn propagate_triggers(&mut self, now: DateTime<Utc>, out: &mut Outbox) {
        let mut published = false;
        loop {
            for trigger in out.take_published() {
                if self.triggers.publish(trigger.as_str(), now) {
                    tracing::info!(%trigger, "trigger published");
                    published = true;
                }
            }
            if self.triggers.take_fresh().is_empty() {
                break;
            }
            let env = RunEnv::new(now, &self.triggers);
            for scheduler in self.jobs.iter_mut() {
                scheduler.triggers_published(env, out);
            }
        }
        if published {
            self.persist_triggers(out);
        }
    }

    /// Prune triggers older than every retained run, then save the rest.
    fn persist_triggers(&mut self, out: &mut Outbox) {
        let horizon = self.jobs.iter().flat_map(|s| s.job().runs().map(|r| r.run_time)).min();
        if let Some(horizon) = horizon {
            let pruned = self.triggers.prune_before(horizon);
            if pruned > 0 {
                tracing::debug!(pruned, %horizon, "pruned old triggers");
            }
        }
        match serde_json::to_value(self.triggers.state()) {
            Ok(value) => out.push(Effect::Persist {
                key: StateKey::trigger_state().to_string(),
                value: Some(value),
            }),
            Err(e) => tracing::error!(error = %e, "failed to serialize trigger state"),
        }
    }
}

fn scheduler_mut<'a>(
    jobs: &'a mut JobCollection,
    name: &JobName,
) -> Result<&'a mut JobScheduler, RuntimeError> {
    jobs.get_mut(name).ok_or_else(|| RuntimeError::JobNotFound(name.clone()))
}

fn owning_scheduler<'a>(jobs: &'a mut JobCollection, run: &JobRunId) -> Option<&'a mut JobScheduler> {
    let name = run.job_name()?;
    let scheduler = jobs.get_mut(&name);
    if scheduler.is_none() {
        tracing::debug!(run = %run, "event for job no longer configured");
    }
    scheduler
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
