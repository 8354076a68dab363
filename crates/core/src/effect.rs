// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent side effects the system needs to perform

use crate::event::Event;
use crate::id::ActionRunId;
use crate::node::Node;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A rendered command bound for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub id: ActionRunId,
    /// Command to execute (already interpolated)
    pub command: String,
    pub node: Node,
}

/// Effects that need to be executed by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    // === Event emission ===
    /// Publish an event to the pub/sub sink
    Emit { event: Event },

    // === Timer effects ===
    /// Arm a one-shot delayed callback
    SetTimer {
        id: TimerId,
        #[serde(with = "duration_serde")]
        duration: Duration,
    },

    /// Cancel a timer
    CancelTimer { id: TimerId },

    // === Node effects ===
    /// Dispatch an action command to its node
    StartAction { command: ActionCommand },

    /// Ask a node to terminate a running action (best effort)
    CancelAction { id: ActionRunId, node: Node },

    // === Persistence ===
    /// Save (or delete, when `value` is `None`) a state record
    Persist {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::StartAction { .. } => "start_action",
            Effect::CancelAction { .. } => "cancel_action",
            Effect::Persist { .. } => "persist",
        }
    }

    /// Key/value fields for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit { event } => vec![("event", event.log_summary())],
            Effect::SetTimer { id, duration } => {
                vec![("timer_id", id.to_string()), ("duration_ms", duration.as_millis().to_string())]
            }
            Effect::CancelTimer { id } => vec![("timer_id", id.to_string())],
            Effect::StartAction { command } => vec![
                ("action_run", command.id.to_string()),
                ("node", command.node.to_string()),
                ("command", command.command.clone()),
            ],
            Effect::CancelAction { id, node } => {
                vec![("action_run", id.to_string()), ("node", node.to_string())]
            }
            Effect::Persist { key, value } => {
                vec![("key", key.clone()), ("delete", value.is_none().to_string())]
            }
        }
    }

    /// Whether the effect is worth logging at info level.
    pub fn verbose(&self) -> bool {
        match self {
            // Frequent bookkeeping effects
            Effect::Emit { .. } => false,
            Effect::SetTimer { .. } => false,
            Effect::CancelTimer { .. } => false,
            Effect::Persist { .. } => false,
            _ => true,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
