// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory state store with failure injection for tests.

use crate::{StateKey, StateStore, StoreError, StoreWrites};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct State {
    entries: HashMap<StateKey, Value>,
    failures: u32,
    save_calls: u32,
}

/// Cloneable handle; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` save calls fail without applying.
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().failures = n;
    }

    /// Number of save calls, including failed ones.
    pub fn save_calls(&self) -> u32 {
        self.inner.lock().save_calls
    }

    pub fn get(&self, key: &StateKey) -> Option<Value> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, writes: &StoreWrites) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        state.save_calls += 1;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        for (key, value) in writes {
            match value {
                Some(value) => {
                    state.entries.insert(key.clone(), value.clone());
                }
                None => {
                    state.entries.remove(key);
                }
            }
        }
        Ok(())
    }

    fn restore(&self, keys: &[StateKey]) -> Result<HashMap<StateKey, Value>, StoreError> {
        let state = self.inner.lock();
        Ok(keys
            .iter()
            .filter_map(|key| state.entries.get(key).map(|v| (key.clone(), v.clone())))
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
