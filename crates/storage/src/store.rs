// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{StateKey, StoreError};
use serde_json::Value;
use std::collections::HashMap;

/// A batch of writes. `None` deletes the key.
pub type StoreWrites = [(StateKey, Option<Value>)];

/// Key/value persistence for scheduler state.
///
/// Implementations must apply a `save` batch atomically: either every
/// write lands or none does.
pub trait StateStore: Send + Sync + 'static {
    fn save(&self, writes: &StoreWrites) -> Result<(), StoreError>;

    /// Values for the requested keys. Missing keys are absent from the map.
    fn restore(&self, keys: &[StateKey]) -> Result<HashMap<StateKey, Value>, StoreError>;
}
