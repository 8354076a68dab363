// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job, action, and node configuration records.
//!
//! A config file is a TOML document:
//!
//! ```toml
//! [[nodes]]
//! name = "local"
//! hostname = "localhost"
//!
//! [[jobs]]
//! name = "nightly"
//! node = "local"
//! schedule = "cron 0 4 * * *"
//!
//! [[jobs.actions]]
//! name = "extract"
//! command = "extract --date ${shortdate}"
//! ```

use crate::error::ConfigError;
use crate::schedule::{parse_interval, Schedule, ScheduleConfig};
use chrono_tz::Tz;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tempo_core::{Node, NodePool};

#[allow(clippy::expect_used)]
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("constant regex pattern is valid")
});

pub const DEFAULT_RUN_LIMIT: usize = 50;

fn default_run_limit() -> usize {
    DEFAULT_RUN_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    22
}

/// One action of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    pub name: String,
    pub command: String,
    /// Names of sibling actions that must succeed first
    #[serde(default)]
    pub requires: Vec<String>,
    /// Node or pool override for this action
    #[serde(default)]
    pub node: Option<String>,
    /// Restart the command this many times after a failing exit
    #[serde(default)]
    pub retries: u32,
    /// Publish `<job>.<action>.shortdate.<date>` on success
    #[serde(default)]
    pub trigger_downstreams: bool,
    /// Trigger templates that must be published before this action starts
    #[serde(default)]
    pub triggered_by: Vec<String>,
}

impl ActionConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            requires: Vec::new(),
            node: None,
            retries: 0,
            trigger_downstreams: false,
            triggered_by: Vec::new(),
        }
    }

    tempo_core::setters! {
        set { retries: u32, trigger_downstreams: bool }
        option { node: String }
    }

    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn triggered_by<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggered_by = triggers.into_iter().map(Into::into).collect();
        self
    }
}

/// The action that runs last, after every other action is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupActionConfig {
    pub command: String,
    #[serde(default)]
    pub node: Option<String>,
}

impl CleanupActionConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), node: None }
    }
}

/// A scheduled job definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub name: String,
    /// Node or pool the job's actions run on
    pub node: String,
    pub schedule: ScheduleConfig,
    pub actions: Vec<ActionConfig>,
    #[serde(default)]
    pub cleanup_action: Option<CleanupActionConfig>,
    #[serde(default = "default_run_limit")]
    pub run_limit: usize,
    /// Run on every node of the pool instead of one
    #[serde(default)]
    pub all_nodes: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Queue overdue runs instead of dropping them. Defaults by schedule type.
    #[serde(default)]
    pub queueing: Option<bool>,
    #[serde(default)]
    pub allow_overlap: bool,
    /// Schedule the next run only after the current one ends
    #[serde(default)]
    pub schedule_on_complete: bool,
    /// Interval after which a running job run is stopped, e.g. `"2h"`
    #[serde(default)]
    pub max_runtime: Option<String>,
    /// IANA zone for calendar schedules and command dates
    #[serde(default)]
    pub time_zone: Option<String>,
}

tempo_core::builder! {
    pub struct JobConfigBuilder => JobConfig {
        into {
            name: String = "nightly",
            node: String = "local",
            schedule: ScheduleConfig = "interval 5m",
        }
        set {
            actions: Vec<ActionConfig> = vec![ActionConfig::new("run", "true")],
            run_limit: usize = DEFAULT_RUN_LIMIT,
            all_nodes: bool = false,
            enabled: bool = true,
            allow_overlap: bool = false,
            schedule_on_complete: bool = false,
        }
        option {
            cleanup_action: CleanupActionConfig = None,
            queueing: bool = None,
            max_runtime: String = None,
            time_zone: String = None,
        }
    }
}

impl JobConfig {
    /// Resolve the schedule, evaluated in the job's zone or `default_tz`.
    pub fn schedule(&self, default_tz: Option<Tz>) -> Result<Schedule, ConfigError> {
        let tz = self.time_zone(default_tz)?;
        Ok(Schedule::from_config(&self.schedule)?.with_timezone(tz))
    }

    pub fn time_zone(&self, default_tz: Option<Tz>) -> Result<Option<Tz>, ConfigError> {
        match &self.time_zone {
            Some(name) => parse_time_zone(name).map(Some),
            None => Ok(default_tz),
        }
    }

    pub fn max_runtime(&self) -> Result<Option<Duration>, ConfigError> {
        self.max_runtime.as_deref().map(parse_interval).transpose()
    }

    /// Effective queueing flag given the resolved schedule.
    pub fn queueing(&self, schedule: &Schedule) -> bool {
        self.queueing.unwrap_or_else(|| schedule.default_queueing())
    }

    /// Check names and limits. Schedule and graph errors surface when the
    /// job is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name(&self.name)?;
        if self.actions.is_empty() {
            return Err(ConfigError::Invalid {
                job: self.name.clone(),
                message: "at least one action is required".to_string(),
            });
        }
        if self.run_limit == 0 {
            return Err(ConfigError::Invalid {
                job: self.name.clone(),
                message: "run_limit must be at least 1".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for action in &self.actions {
            check_name(&action.name)?;
            if !seen.insert(action.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "action",
                    name: format!("{}.{}", self.name, action.name),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_time_zone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>().map_err(|_| ConfigError::UnknownTimeZone(name.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub name: String,
    pub hostname: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl NodeConfig {
    pub fn to_node(&self) -> Node {
        let node = Node::new(self.name.as_str(), self.hostname.as_str()).port(self.port);
        match &self.username {
            Some(user) => node.username(user.as_str()),
            None => node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodePoolConfig {
    pub name: String,
    pub nodes: Vec<String>,
}

/// A whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub node_pools: Vec<NodePoolConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Names shared by more than one job. Every copy of such a job is
/// rejected on its own; the other jobs still load.
pub fn duplicate_jobs(jobs: &[JobConfig]) -> HashSet<&str> {
    let mut seen = HashSet::new();
    jobs.iter().map(|j| j.name.as_str()).filter(|name| !seen.insert(*name)).collect()
}

impl ConfigFile {
    /// Parse and structurally validate a TOML document.
    ///
    /// Schedules, action graphs and duplicate job names are resolved per
    /// job later, so one bad job does not reject the rest of the file.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let file: Self = toml::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    /// Job names defined more than once.
    pub fn duplicate_jobs(&self) -> HashSet<&str> {
        duplicate_jobs(&self.jobs)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for name in self.nodes.iter().map(|n| &n.name).chain(self.node_pools.iter().map(|p| &p.name)) {
            check_name(name)?;
            if !names.insert(name.as_str()) {
                return Err(ConfigError::Duplicate { kind: "node", name: name.clone() });
            }
        }
        Ok(())
    }

    /// Every node as a single-member pool, plus the declared pools.
    pub fn node_pools(&self) -> Result<IndexMap<String, NodePool>, ConfigError> {
        let mut pools: IndexMap<String, NodePool> = self
            .nodes
            .iter()
            .map(|n| (n.name.clone(), NodePool::single(n.to_node())))
            .collect();
        for pool in &self.node_pools {
            let members = pool
                .nodes
                .iter()
                .map(|name| {
                    self.nodes.iter().find(|n| &n.name == name).map(NodeConfig::to_node).ok_or_else(
                        || ConfigError::UnknownNode { pool: pool.name.clone(), node: name.clone() },
                    )
                })
                .collect::<Result<Vec<Node>, _>>()?;
            let resolved = NodePool::new(pool.name.as_str(), members)
                .ok_or_else(|| ConfigError::EmptyPool(pool.name.clone()))?;
            pools.insert(pool.name.clone(), resolved);
        }
        Ok(pools)
    }
}

/// Names are identifiers: letters, digits, `_` and `-`. Dots separate
/// the parts of run ids, so they are not allowed.
pub fn check_name(name: &str) -> Result<(), ConfigError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
