// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::{JobName, JobRunId};

fn action_id() -> ActionRunId {
    ActionRunId::for_action(&JobRunId::for_run(&JobName::new("nightly"), 1), "load")
}

#[test]
fn effect_serialization_roundtrip() {
    let effects = vec![
        Effect::Emit { event: Event::TriggerPublished { trigger: "t".into() } },
        Effect::SetTimer { id: TimerId::new("timer-1"), duration: Duration::from_secs(60) },
        Effect::CancelTimer { id: TimerId::new("timer-1") },
        Effect::StartAction {
            command: ActionCommand {
                id: action_id(),
                command: "echo hi".into(),
                node: Node::localhost(),
            },
        },
        Effect::CancelAction { id: action_id(), node: Node::localhost() },
        Effect::Persist { key: "job_state nightly".into(), value: Some(serde_json::json!({"a": 1})) },
        Effect::Persist { key: "job_state nightly".into(), value: None },
    ];

    for effect in effects {
        let json = serde_json::to_string(&effect).unwrap();
        let parsed: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, effect);
    }
}

#[test]
fn set_timer_duration_serializes_as_millis() {
    let effect = Effect::SetTimer { id: TimerId::new("t"), duration: Duration::from_millis(1500) };
    let json = serde_json::to_value(&effect).unwrap();
    assert_eq!(json["SetTimer"]["duration"], 1500);
}

#[test]
fn fields_describe_start_action() {
    let effect = Effect::StartAction {
        command: ActionCommand { id: action_id(), command: "make".into(), node: Node::localhost() },
    };
    assert_eq!(effect.name(), "start_action");
    assert!(effect.verbose());
    assert!(effect.fields().contains(&("action_run", "nightly.1.load".to_string())));
}

#[test]
fn bookkeeping_effects_are_quiet() {
    assert!(!Effect::CancelTimer { id: TimerId::new("t") }.verbose());
    assert!(!Effect::Persist { key: "k".into(), value: None }.verbose());
}
