// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state persistence with bounded retry.

use crate::job::JobState;
use crate::triggers::TriggerState;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tempo_core::JobName;
use tempo_storage::{StateKey, StateStore, StoreError, StoreWrites};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Attempts per save or restore before giving up
pub const PERSIST_ATTEMPTS: u32 = 3;

/// One write for the persistence task. `None` deletes the key.
pub type PersistRequest = (StateKey, Option<Value>);

/// Wraps a [`StateStore`], retrying failed calls.
pub struct StatePersister<S> {
    store: S,
    attempts: u32,
}

impl<S: StateStore> StatePersister<S> {
    pub fn new(store: S) -> Self {
        Self { store, attempts: PERSIST_ATTEMPTS }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&self, writes: &StoreWrites) -> Result<(), StoreError> {
        self.retry("save", || self.store.save(writes))
    }

    pub fn restore(&self, keys: &[StateKey]) -> Result<HashMap<StateKey, Value>, StoreError> {
        self.retry("restore", || self.store.restore(keys))
    }

    /// Saved state for each named job that has any. Records that no longer
    /// parse are skipped with a warning.
    pub fn restore_jobs<'a>(
        &self,
        names: impl IntoIterator<Item = &'a JobName>,
    ) -> Result<HashMap<JobName, JobState>, StoreError> {
        let keys: Vec<StateKey> = names.into_iter().map(|n| StateKey::job_state(n.as_str())).collect();
        let values = self.restore(&keys)?;
        let mut states = HashMap::new();
        for (key, value) in values {
            match serde_json::from_value::<JobState>(value) {
                Ok(state) => {
                    states.insert(JobName::new(key.identifier.as_str()), state);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable job state"),
            }
        }
        Ok(states)
    }

    /// Saved trigger registry, empty when none was saved or it no longer
    /// parses.
    pub fn restore_triggers(&self) -> Result<TriggerState, StoreError> {
        let key = StateKey::trigger_state();
        let Some(value) = self.restore(std::slice::from_ref(&key))?.remove(&key) else {
            return Ok(TriggerState::default());
        };
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "skipping unreadable trigger state");
            TriggerState::default()
        }))
    }

    fn retry<T>(
        &self,
        op: &str,
        mut call: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    tracing::warn!(op, attempt, error = %e, "state store call failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(op, attempts = self.attempts, error = %e, "state store call failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Spawn the task that applies persistence writes off the event loop.
///
/// Writes that arrive together are batched, keeping only the last value
/// per key. A failed batch is logged and dropped, except for its deletes,
/// which are carried into the next batch unless a newer write of the same
/// key replaces them. Dropped writes are covered by the next write of the
/// same key, which carries the full state again.
pub fn spawn_persist_task<S: StateStore>(
    persister: Arc<StatePersister<S>>,
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut carried: Vec<StateKey> = Vec::new();
        while let Some((key, value)) = rx.recv().await {
            let mut batch: IndexMap<StateKey, Option<Value>> =
                carried.drain(..).map(|key| (key, None)).collect();
            batch.insert(key, value);
            while let Ok((key, value)) = rx.try_recv() {
                batch.insert(key, value);
            }
            let writes: Vec<PersistRequest> = batch.into_iter().collect();
            let count = writes.len();
            let deletes: Vec<StateKey> =
                writes.iter().filter(|(_, value)| value.is_none()).map(|(key, _)| key.clone()).collect();
            let persister = Arc::clone(&persister);
            match tokio::task::spawn_blocking(move || persister.save(&writes)).await {
                Ok(Ok(())) => tracing::debug!(count, "persisted state"),
                Ok(Err(e)) => {
                    tracing::error!(count, carried = deletes.len(), error = %e, "failed to persist state");
                    carried = deletes;
                }
                Err(e) => {
                    tracing::error!(error = %e, "persist task panicked");
                    carried = deletes;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
