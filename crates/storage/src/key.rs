// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::StoreError;
use std::fmt;
use std::str::FromStr;

/// Key of one stored value, rendered as `"{kind} {identifier}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub kind: String,
    pub identifier: String,
}

impl StateKey {
    pub const JOB_STATE: &'static str = "job_state";
    pub const TRIGGER_STATE: &'static str = "trigger_state";

    pub fn new(kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self { kind: kind.into(), identifier: identifier.into() }
    }

    pub fn job_state(job: impl Into<String>) -> Self {
        Self::new(Self::JOB_STATE, job)
    }

    /// The single record holding published triggers.
    pub fn trigger_state() -> Self {
        Self::new(Self::TRIGGER_STATE, "published")
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.identifier)
    }
}

impl FromStr for StateKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(' ') {
            Some((kind, identifier)) if !kind.is_empty() && !identifier.is_empty() => {
                Ok(Self::new(kind, identifier))
            }
            _ => Err(StoreError::InvalidKey(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
