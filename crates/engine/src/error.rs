// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use tempo_config::ConfigError;
use tempo_core::{ActionOp, ActionRunId, GraphError, JobName, RunState};
use tempo_storage::StoreError;
use thiserror::Error;

/// A job definition that could not be turned into a job.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("job '{job}' references unknown node or pool '{node}'")]
    UnknownNode { job: String, node: String },
}

/// Errors surfaced by runtime operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("job not found: {0}")]
    JobNotFound(JobName),
    #[error("action run not found: {0}")]
    ActionNotFound(ActionRunId),
    #[error("cannot {op} action run {id} while {state}")]
    InvalidTransition { id: ActionRunId, op: ActionOp, state: RunState },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("state error: {0}")]
    State(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
