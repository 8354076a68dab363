// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated dependency structure over a job's actions.
//!
//! An [`ActionGraph`] is built once per job configuration and is immutable
//! afterwards. It holds three mappings: action definitions by name, the
//! intra-job actions each one requires, and the external trigger
//! identifiers each one waits for. The cleanup action is kept apart from
//! the graph and can never be a dependency.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Reserved name of the per-job cleanup action.
pub const CLEANUP_ACTION: &str = "cleanup";

/// Errors raised while building an action graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("action '{action}' requires missing action '{missing}'")]
    MissingDependency { action: String, missing: String },
    #[error("circular dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
    #[error("action '{action}' depends on the cleanup action")]
    DependsOnCleanup { action: String },
    #[error("action name '{0}' is reserved")]
    ReservedName(String),
    #[error("dependencies declared for undefined action '{0}'")]
    UndefinedAction(String),
    #[error("action '{0}' not found")]
    NotFound(String),
}

/// Definition of a single action within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    /// Command template; `${var}` placeholders are rendered per run.
    pub command: String,
    /// Node or pool override for this action.
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub retries: u32,
    /// Publish a trigger for downstream jobs when this action succeeds.
    #[serde(default)]
    pub trigger_downstreams: bool,
}

impl Action {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            node: None,
            retries: 0,
            trigger_downstreams: false,
        }
    }

    crate::setters! {
        set { retries: u32, trigger_downstreams: bool }
        option { node: String }
    }
}

/// A direct dependency of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency<'a> {
    Action(&'a Action),
    Trigger(&'a str),
}

/// Acyclic graph of actions plus their external trigger requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionGraph {
    actions: IndexMap<String, Action>,
    required: IndexMap<String, BTreeSet<String>>,
    required_triggers: IndexMap<String, BTreeSet<String>>,
    cleanup: Option<Action>,
}

impl ActionGraph {
    /// Validate and build a graph.
    ///
    /// Fails if a required name is not defined, if any action depends on
    /// the cleanup action, or if the requires-relation has a cycle.
    pub fn new(
        actions: IndexMap<String, Action>,
        required: IndexMap<String, BTreeSet<String>>,
        required_triggers: IndexMap<String, BTreeSet<String>>,
    ) -> Result<Self, GraphError> {
        if actions.contains_key(CLEANUP_ACTION) {
            return Err(GraphError::ReservedName(CLEANUP_ACTION.to_string()));
        }
        for name in required.keys().chain(required_triggers.keys()) {
            if !actions.contains_key(name) {
                return Err(GraphError::UndefinedAction(name.clone()));
            }
        }
        for (action, deps) in &required {
            for dep in deps {
                if dep == CLEANUP_ACTION {
                    return Err(GraphError::DependsOnCleanup { action: action.clone() });
                }
                if !actions.contains_key(dep) {
                    return Err(GraphError::MissingDependency {
                        action: action.clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        let graph = Self { actions, required, required_triggers, cleanup: None };
        graph.check_cycles()?;
        Ok(graph)
    }

    /// Attach the cleanup action. It always runs last and is never part of
    /// the dependency relation.
    pub fn with_cleanup(mut self, mut cleanup: Action) -> Self {
        cleanup.name = CLEANUP_ACTION.to_string();
        self.cleanup = Some(cleanup);
        self
    }

    fn check_cycles(&self) -> Result<(), GraphError> {
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        for name in self.actions.keys() {
            self.visit(name, &mut stack, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<(), GraphError> {
        if let Some(pos) = stack.iter().position(|n| *n == name) {
            let mut path: Vec<String> = stack[pos..].iter().map(|n| n.to_string()).collect();
            path.push(name.to_string());
            return Err(GraphError::Cycle { path });
        }
        if done.contains(name) {
            return Ok(());
        }
        stack.push(name);
        for dep in self.required(name) {
            self.visit(dep, stack, done)?;
        }
        stack.pop();
        done.insert(name);
        Ok(())
    }

    /// Direct dependencies of `name`; empty for unknown names.
    pub fn get_dependencies(&self, name: &str, include_triggers: bool) -> Vec<Dependency<'_>> {
        let mut deps: Vec<Dependency<'_>> = self
            .required(name)
            .filter_map(|dep| self.actions.get(dep))
            .map(Dependency::Action)
            .collect();
        if include_triggers {
            deps.extend(self.required_triggers(name).map(Dependency::Trigger));
        }
        deps
    }

    /// All action names in declaration order, optionally followed by every
    /// distinct trigger identifier.
    pub fn names(&self, include_triggers: bool) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        if include_triggers {
            let mut seen = HashSet::new();
            for trigger in self.required_triggers.values().flatten() {
                if seen.insert(trigger.as_str()) {
                    names.push(trigger);
                }
            }
        }
        names
    }

    /// Look up an action by name, including the cleanup action.
    pub fn action(&self, name: &str) -> Result<&Action, GraphError> {
        self.get(name).ok_or_else(|| GraphError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        match self.actions.get(name) {
            Some(action) => Some(action),
            None if name == CLEANUP_ACTION => self.cleanup.as_ref(),
            None => None,
        }
    }

    pub fn required(&self, name: &str) -> impl Iterator<Item = &str> {
        self.required.get(name).into_iter().flatten().map(String::as_str)
    }

    pub fn required_triggers(&self, name: &str) -> impl Iterator<Item = &str> {
        self.required_triggers.get(name).into_iter().flatten().map(String::as_str)
    }

    /// Actions that directly require `name`.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.required
            .iter()
            .filter(|(_, deps)| deps.contains(name))
            .map(|(action, _)| action.as_str())
            .collect()
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn cleanup(&self) -> Option<&Action> {
        self.cleanup.as_ref()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
