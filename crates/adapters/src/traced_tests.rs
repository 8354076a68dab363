// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{FakeNodeAdapter, NodeCall};
use tempo_core::test_support::action_run_id;

#[tokio::test]
async fn delegates_to_inner_adapter() {
    let fake = FakeNodeAdapter::new();
    fake.set_exit("false", 1);
    let traced = TracedNode::new(fake.clone());
    let command = ActionCommand {
        id: action_run_id("job", 1, "act"),
        command: "false".to_string(),
        node: Node::localhost(),
    };

    assert_eq!(traced.start(&command).await.unwrap().exit_status, 1);
    traced.cancel(&command.id, &command.node).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            NodeCall::Start { command: command.clone() },
            NodeCall::Cancel { id: command.id.clone(), node: command.node.clone() },
        ]
    );
}

#[tokio::test]
async fn propagates_errors() {
    let fake = FakeNodeAdapter::new();
    fake.fail_next(1);
    let traced = TracedNode::new(fake);
    let command = ActionCommand {
        id: action_run_id("job", 1, "act"),
        command: "true".to_string(),
        node: Node::localhost(),
    };
    assert!(matches!(traced.start(&command).await, Err(NodeError::Unreachable { .. })));
}
