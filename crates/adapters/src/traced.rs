// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::node::{ExitReport, NodeAdapter, NodeError};
use async_trait::async_trait;
use tempo_core::{ActionCommand, ActionRunId, Node};
use tracing::Instrument;

/// Wrapper that adds tracing to any NodeAdapter
#[derive(Clone)]
pub struct TracedNode<N> {
    inner: N,
}

impl<N> TracedNode<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: NodeAdapter> NodeAdapter for TracedNode<N> {
    async fn start(&self, command: &ActionCommand) -> Result<ExitReport, NodeError> {
        async {
            tracing::info!(command = %command.command, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.start(command).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(report) => {
                    tracing::info!(exit_status = report.exit_status, elapsed_ms, "action exited")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "start failed"),
            }
            result
        }
        .instrument(tracing::info_span!(
            "node.start",
            action_run = %command.id,
            node = %command.node
        ))
        .await
    }

    async fn cancel(&self, id: &ActionRunId, node: &Node) -> Result<(), NodeError> {
        tracing::info_span!("node.cancel", action_run = %id, node = %node)
            .in_scope(|| tracing::debug!("cancelling"));
        let result = self.inner.cancel(id, node).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "cancel failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
