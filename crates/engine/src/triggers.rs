// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-job trigger registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Saved form of the registry: each trigger with its publish time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerState {
    #[serde(default)]
    pub published: BTreeMap<String, DateTime<Utc>>,
}

/// Trigger identifiers published so far.
///
/// Newly published identifiers are also kept in a fresh list until the
/// runtime takes them, so it knows to re-check waiting runs.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    published: BTreeMap<String, DateTime<Utc>>,
    fresh: Vec<String>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger published at `at`. Returns false if it was already
    /// published.
    pub fn publish(&mut self, trigger: impl Into<String>, at: DateTime<Utc>) -> bool {
        let trigger = trigger.into();
        if self.published.contains_key(&trigger) {
            return false;
        }
        self.published.insert(trigger.clone(), at);
        self.fresh.push(trigger);
        true
    }

    pub fn is_published(&self, trigger: &str) -> bool {
        self.published.contains_key(trigger)
    }

    /// Drain the identifiers published since the last call.
    pub fn take_fresh(&mut self) -> Vec<String> {
        std::mem::take(&mut self.fresh)
    }

    /// Forget triggers published before `horizon`. Returns how many were
    /// dropped.
    pub fn prune_before(&mut self, horizon: DateTime<Utc>) -> usize {
        let before = self.published.len();
        self.published.retain(|_, at| *at >= horizon);
        before - self.published.len()
    }

    pub fn state(&self) -> TriggerState {
        TriggerState { published: self.published.clone() }
    }

    /// Merge saved triggers into the registry. Restored triggers count as
    /// fresh so waiting runs re-check them.
    pub fn restore(&mut self, state: TriggerState) {
        for (trigger, at) in state.published {
            self.publish(trigger, at);
        }
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}

/// Identifier published when `action` of `job` succeeds for `shortdate`.
pub fn downstream_trigger(job: &str, action: &str, shortdate: &str) -> String {
    format!("{job}.{action}.shortdate.{shortdate}")
}

#[cfg(test)]
#[path = "triggers_tests.rs"]
mod tests;
