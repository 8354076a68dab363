// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node execution: running action commands and cancelling them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tempo_core::{ActionCommand, ActionRunId, Clock, Node, SystemClock};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::oneshot;

/// Errors from node operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The node could not be reached; the dispatch may be retried.
    #[error("node {node} unreachable: {reason}")]
    Unreachable { node: String, reason: String },
    #[error("lost track of {id}: {reason}")]
    Lost { id: ActionRunId, reason: String },
}

/// Outcome of one command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub exit_status: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Adapter for running action commands on nodes
#[async_trait]
pub trait NodeAdapter: Clone + Send + Sync + 'static {
    /// Run the command to completion.
    async fn start(&self, command: &ActionCommand) -> Result<ExitReport, NodeError>;

    /// Ask the node to terminate a running command. Best effort: unknown
    /// ids are ignored.
    async fn cancel(&self, id: &ActionRunId, node: &Node) -> Result<(), NodeError>;
}

/// Runs every command on this host with `sh -c`, whatever node it names.
#[derive(Clone)]
pub struct LocalNodeAdapter<C: Clock = SystemClock> {
    clock: C,
    running: Arc<Mutex<HashMap<ActionRunId, oneshot::Sender<()>>>>,
}

impl LocalNodeAdapter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for LocalNodeAdapter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> LocalNodeAdapter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, running: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of commands currently running.
    pub fn running(&self) -> usize {
        self.running.lock().len()
    }
}

#[async_trait]
impl<C: Clock + 'static> NodeAdapter for LocalNodeAdapter<C> {
    async fn start(&self, command: &ActionCommand) -> Result<ExitReport, NodeError> {
        let started_at = self.clock.now();
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command.command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NodeError::Unreachable {
                node: command.node.to_string(),
                reason: e.to_string(),
            })?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.running.lock().insert(command.id.clone(), cancel_tx);

        let finished = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel_rx => None,
        };
        let status = match finished {
            Some(status) => status,
            None => {
                tracing::info!(action_run = %command.id, "killing cancelled command");
                let _ = child.start_kill();
                child.wait().await
            }
        };
        self.running.lock().remove(&command.id);

        let status = status
            .map_err(|e| NodeError::Lost { id: command.id.clone(), reason: e.to_string() })?;
        Ok(ExitReport {
            // Killed by a signal
            exit_status: status.code().unwrap_or(-1),
            started_at,
            ended_at: self.clock.now(),
        })
    }

    async fn cancel(&self, id: &ActionRunId, _node: &Node) -> Result<(), NodeError> {
        if let Some(tx) = self.running.lock().remove(id) {
            let _ = tx.send(());
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExitReport, NodeAdapter, NodeError};
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempo_core::{ActionCommand, ActionRunId, Node};

    /// Recorded node call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NodeCall {
        Start { command: ActionCommand },
        Cancel { id: ActionRunId, node: Node },
    }

    #[derive(Default)]
    struct FakeNodeState {
        calls: Vec<NodeCall>,
        /// Exit status by command text
        exits: HashMap<String, i32>,
        unreachable: u32,
    }

    /// Fake node adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeNodeAdapter {
        inner: Arc<Mutex<FakeNodeState>>,
    }

    impl FakeNodeAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Commands matching `command` exit with `status` (default 0).
        pub fn set_exit(&self, command: &str, status: i32) {
            self.inner.lock().exits.insert(command.to_string(), status);
        }

        /// Fail the next `n` starts as unreachable.
        pub fn fail_next(&self, n: u32) {
            self.inner.lock().unreachable = n;
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<NodeCall> {
            self.inner.lock().calls.clone()
        }

        pub fn started(&self) -> Vec<ActionCommand> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    NodeCall::Start { command } => Some(command),
                    NodeCall::Cancel { .. } => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl NodeAdapter for FakeNodeAdapter {
        async fn start(&self, command: &ActionCommand) -> Result<ExitReport, NodeError> {
            let mut state = self.inner.lock();
            state.calls.push(NodeCall::Start { command: command.clone() });
            if state.unreachable > 0 {
                state.unreachable -= 1;
                return Err(NodeError::Unreachable {
                    node: command.node.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            let exit_status = state.exits.get(&command.command).copied().unwrap_or(0);
            let now = Utc::now();
            Ok(ExitReport { exit_status, started_at: now, ended_at: now })
        }

        async fn cancel(&self, id: &ActionRunId, node: &Node) -> Result<(), NodeError> {
            self.inner.lock().calls.push(NodeCall::Cancel { id: id.clone(), node: node.clone() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNodeAdapter, NodeCall};

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
