// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of job schedulers and reconciliation against new configuration.

use crate::error::BuildError;
use crate::job::{Job, JobSpec};
use crate::job_scheduler::JobScheduler;
use crate::outbox::{Outbox, RunEnv};
use chrono_tz::Tz;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use tempo_config::{duplicate_jobs, ConfigError, ConfigFile, JobConfig};
use tempo_core::{Action, ActionGraph, Effect, JobName, NodePool, CLEANUP_ACTION};

/// Resolves job configuration into job definitions.
#[derive(Debug, Clone, Default)]
pub struct JobFactory {
    pools: IndexMap<String, NodePool>,
    default_tz: Option<Tz>,
}

impl JobFactory {
    pub fn new(pools: IndexMap<String, NodePool>, default_tz: Option<Tz>) -> Self {
        Self { pools, default_tz }
    }

    /// Factory for a whole config document: its nodes and pools.
    pub fn from_file(file: &ConfigFile, default_tz: Option<Tz>) -> Result<Self, ConfigError> {
        Ok(Self::new(file.node_pools()?, default_tz))
    }

    pub fn build(&self, config: &JobConfig) -> Result<JobSpec, BuildError> {
        config.validate()?;
        let schedule = config.schedule(self.default_tz)?;

        let mut actions = IndexMap::new();
        let mut required = IndexMap::new();
        let mut required_triggers = IndexMap::new();
        let mut action_pools = IndexMap::new();
        for action in &config.actions {
            let mut def = Action::new(action.name.as_str(), action.command.as_str())
                .retries(action.retries)
                .trigger_downstreams(action.trigger_downstreams);
            if let Some(node) = &action.node {
                action_pools.insert(action.name.clone(), self.pool(&config.name, node)?);
                def = def.node(node.as_str());
            }
            if !action.requires.is_empty() {
                required.insert(action.name.clone(), action.requires.iter().cloned().collect::<BTreeSet<_>>());
            }
            if !action.triggered_by.is_empty() {
                required_triggers
                    .insert(action.name.clone(), action.triggered_by.iter().cloned().collect::<BTreeSet<_>>());
            }
            actions.insert(action.name.clone(), def);
        }

        let mut graph = ActionGraph::new(actions, required, required_triggers)?;
        if let Some(cleanup) = &config.cleanup_action {
            let mut def = Action::new(CLEANUP_ACTION, cleanup.command.as_str());
            if let Some(node) = &cleanup.node {
                action_pools.insert(CLEANUP_ACTION.to_string(), self.pool(&config.name, node)?);
                def = def.node(node.as_str());
            }
            graph = graph.with_cleanup(def);
        }

        Ok(JobSpec {
            name: JobName::new(config.name.as_str()),
            queueing: config.queueing(&schedule),
            schedule_on_complete: config.schedule_on_complete || schedule.schedule_on_complete(),
            schedule,
            graph,
            pool: self.pool(&config.name, &config.node)?,
            action_pools,
            run_limit: config.run_limit,
            all_nodes: config.all_nodes,
            enabled: config.enabled,
            allow_overlap: config.allow_overlap,
            max_runtime: config.max_runtime()?,
            time_zone: config.time_zone(self.default_tz)?,
        })
    }

    fn pool(&self, job: &str, name: &str) -> Result<NodePool, BuildError> {
        self.pools.get(name).cloned().ok_or_else(|| BuildError::UnknownNode {
            job: job.to_string(),
            node: name.to_string(),
        })
    }
}

/// Outcome of reconciling a configuration against the running jobs.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub added: Vec<JobName>,
    pub updated: Vec<JobName>,
    pub unchanged: Vec<JobName>,
    pub removed: Vec<JobName>,
    /// Jobs missing from the new config that were kept because a run is
    /// still active
    pub rejected: Vec<(JobName, String)>,
    /// Jobs whose new definition failed to build; any previous definition
    /// stays in place
    pub errors: Vec<(String, BuildError)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.errors.is_empty()
    }
}

#[derive(Default)]
pub struct JobCollection {
    schedulers: IndexMap<JobName, JobScheduler>,
}

impl JobCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&JobScheduler> {
        self.schedulers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut JobScheduler> {
        self.schedulers.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &JobName> {
        self.schedulers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobScheduler> {
        self.schedulers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut JobScheduler> {
        self.schedulers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.schedulers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedulers.is_empty()
    }

    /// Register a new scheduler without arming it.
    pub fn insert(&mut self, scheduler: JobScheduler) {
        self.schedulers.insert(scheduler.name().clone(), scheduler);
    }

    /// Reconcile against a new set of job definitions.
    ///
    /// New jobs are added and armed, changed jobs are updated in place,
    /// and jobs no longer configured are disabled and removed unless a run
    /// is still active. A job that fails to build, or whose name is defined
    /// more than once, is reported and leaves the rest of the load
    /// unaffected; a loaded job of that name keeps its current definition.
    pub fn load_from_config(
        &mut self,
        configs: &[JobConfig],
        factory: &JobFactory,
        env: RunEnv<'_>,
        out: &mut Outbox,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::new();
        let duplicates = duplicate_jobs(configs);

        for config in configs {
            let first = seen.insert(config.name.clone());
            if duplicates.contains(config.name.as_str()) {
                if first {
                    tracing::error!(job = %config.name, "job defined more than once");
                    report.errors.push((config.name.clone(), duplicate_job(&config.name)));
                }
                continue;
            }
            let spec = match factory.build(config) {
                Ok(spec) => spec,
                Err(e) => {
                    tracing::error!(job = %config.name, error = %e, "invalid job definition");
                    report.errors.push((config.name.clone(), e));
                    continue;
                }
            };

            match self.schedulers.get_mut(config.name.as_str()) {
                Some(scheduler) if scheduler.job().spec() == &spec => {
                    report.unchanged.push(spec.name);
                }
                Some(scheduler) => {
                    tracing::info!(job = %spec.name, "updating job");
                    report.updated.push(spec.name.clone());
                    scheduler.update_from(spec, env, out);
                }
                None => {
                    tracing::info!(job = %spec.name, schedule = %spec.schedule, "adding job");
                    report.added.push(spec.name.clone());
                    let mut scheduler = JobScheduler::new(Job::new(spec));
                    scheduler.schedule(env, out);
                    self.insert(scheduler);
                }
            }
        }

        let stale: Vec<JobName> =
            self.schedulers.keys().filter(|name| !seen.contains(name.as_str())).cloned().collect();
        for name in stale {
            if let Some(message) = self.remove(&name, env, out) {
                report.rejected.push((name, message));
            } else {
                report.removed.push(name);
            }
        }
        report
    }

    /// Disable and unlink a job. Returns a message instead when a run is
    /// still active; the caller must wait for it.
    pub fn remove(&mut self, name: &JobName, env: RunEnv<'_>, out: &mut Outbox) -> Option<String> {
        let scheduler = self.schedulers.get_mut(name.as_str())?;
        if scheduler.job().has_active() {
            let message = format!("job '{name}' is still running; not removed");
            tracing::warn!(job = %name, "{message}");
            return Some(message);
        }
        tracing::info!(job = %name, "removing job");
        scheduler.disable(env, out);
        let key = scheduler.state_key().to_string();
        self.schedulers.shift_remove(name.as_str());
        out.push(Effect::Persist { key, value: None });
        None
    }
}

/// Error reported against a job whose name is defined more than once.
pub fn duplicate_job(name: &str) -> BuildError {
    BuildError::Config(ConfigError::Duplicate { kind: "job", name: name.to_string() })
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
