// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use crate::persist::PersistRequest;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempo_adapters::{EventSink, NodeAdapter, NodeError};
use tempo_core::{ActionCommand, Clock, Effect, Event};
use tempo_storage::{StateKey, StoreError};
use thiserror::Error;
use tokio::sync::mpsc;

/// Starts per command before an unreachable node is reported lost
pub const DISPATCH_ATTEMPTS: u32 = 3;

/// Default pause between dispatch attempts
pub const DISPATCH_BACKOFF: Duration = Duration::from_secs(2);

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("persistence task is gone")]
    PersistClosed,
}

/// Collaborators the executor talks to
pub struct ExecutorDeps<N, K> {
    pub nodes: N,
    pub sink: K,
    /// Writes for the persistence task. Unbounded so a slow store never
    /// stalls the event loop.
    pub persist_tx: mpsc::UnboundedSender<PersistRequest>,
}

/// Executes effects using the configured adapters
pub struct Executor<N, K, C: Clock> {
    nodes: N,
    sink: K,
    persist_tx: mpsc::UnboundedSender<PersistRequest>,
    scheduler: Arc<Mutex<Scheduler>>,
    clock: C,
    /// Channel for posting action results back to the loop
    event_tx: mpsc::Sender<Event>,
    dispatch_backoff: Duration,
}

impl<N, K, C> Executor<N, K, C>
where
    N: NodeAdapter,
    K: EventSink,
    C: Clock,
{
    pub fn new(
        deps: ExecutorDeps<N, K>,
        scheduler: Arc<Mutex<Scheduler>>,
        clock: C,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            nodes: deps.nodes,
            sink: deps.sink,
            persist_tx: deps.persist_tx,
            scheduler,
            clock,
            event_tx,
            dispatch_backoff: DISPATCH_BACKOFF,
        }
    }

    pub fn with_dispatch_backoff(mut self, backoff: Duration) -> Self {
        self.dispatch_backoff = backoff;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &Arc<Mutex<Scheduler>> {
        &self.scheduler
    }

    /// Execute effects in order. Failures are logged and do not stop the
    /// remaining effects.
    pub async fn execute_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            // Logged by execute
            let _ = self.execute(effect).await;
        }
    }

    /// Execute a single effect with tracing
    pub async fn execute(&self, effect: Effect) -> Result<(), ExecuteError> {
        // Format the fields as `key=val`
        let info = {
            let fields = effect.fields();
            let cap = fields.iter().map(|(a, b)| a.len() + b.len() + 2).sum();
            let mut fmt = String::with_capacity(cap);
            for (key, val) in fields {
                fmt.push_str(key);
                fmt.push('=');
                fmt.push_str(&val);
                fmt.push(' ');
            }
            fmt.pop();
            fmt
        };

        let op = effect.name();
        let verbose = effect.verbose();
        if verbose {
            tracing::info!("executing effect={} {}", op, info);
        }

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match (&result, verbose) {
            (Ok(()), true) => tracing::info!(elapsed_ms, "completed"),
            (Ok(()), false) => tracing::debug!(elapsed_ms, "executed effect={} {}", op, info),
            (Err(e), _) => tracing::error!(error = %e, elapsed_ms, "error effect={} {}", op, info),
        }
        result
    }

    async fn execute_inner(&self, effect: Effect) -> Result<(), ExecuteError> {
        match effect {
            // === Event emission ===
            Effect::Emit { event } => {
                if let Err(e) = self.sink.publish(&event).await {
                    tracing::warn!(event = event.name(), error = %e, "event not delivered");
                }
                Ok(())
            }

            // === Timer effects ===
            Effect::SetTimer { id, duration } => {
                let now = self.clock.now();
                self.scheduler.lock().set_timer(id, duration, now);
                Ok(())
            }

            Effect::CancelTimer { id } => {
                self.scheduler.lock().cancel_timer(&id);
                Ok(())
            }

            // === Node effects ===
            Effect::StartAction { command } => {
                let nodes = self.nodes.clone();
                let event_tx = self.event_tx.clone();
                let backoff = self.dispatch_backoff;
                tokio::spawn(async move {
                    let event = dispatch(&nodes, &command, backoff).await;
                    if let Err(e) = event_tx.send(event).await {
                        tracing::error!("failed to send action event: {}", e);
                    }
                });
                Ok(())
            }

            Effect::CancelAction { id, node } => {
                let nodes = self.nodes.clone();
                tokio::spawn(async move {
                    if let Err(e) = nodes.cancel(&id, &node).await {
                        tracing::warn!(action_run = %id, error = %e, "cancel not delivered");
                    }
                });
                Ok(())
            }

            // === Persistence ===
            Effect::Persist { key, value } => {
                let key: StateKey = key.parse()?;
                self.persist_tx.send((key, value)).map_err(|_| ExecuteError::PersistClosed)
            }
        }
    }
}

/// Run a command, retrying while its node is unreachable. Always yields
/// the event that reports the outcome.
async fn dispatch<N: NodeAdapter>(nodes: &N, command: &ActionCommand, backoff: Duration) -> Event {
    let mut attempt = 1;
    loop {
        match nodes.start(command).await {
            Ok(report) => {
                return Event::ActionExited {
                    id: command.id.clone(),
                    exit_status: report.exit_status,
                    started_at: report.started_at,
                    ended_at: report.ended_at,
                }
            }
            Err(NodeError::Unreachable { node, reason }) if attempt < DISPATCH_ATTEMPTS => {
                tracing::warn!(action_run = %command.id, %node, attempt, %reason, "node unreachable, retrying");
                attempt += 1;
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(action_run = %command.id, error = %e, "action lost");
                return Event::ActionLost { id: command.id.clone(), reason: e.to_string() };
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
