// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn pool() -> NodePool {
    NodePool::new("batch", vec![Node::new("a", "a.internal"), Node::new("b", "b.internal")]).unwrap()
}

#[test]
fn empty_pool_is_rejected() {
    assert!(NodePool::new("empty", vec![]).is_none());
}

#[test]
fn select_rotates_by_run_number() {
    let pool = pool();
    assert_eq!(pool.select(0).name, "a");
    assert_eq!(pool.select(1).name, "b");
    assert_eq!(pool.select(2).name, "a");
}

#[test]
fn node_display_includes_user_when_set() {
    let node = Node::new("a", "a.internal").username("batch").port(2222);
    assert_eq!(node.to_string(), "batch@a.internal:2222");
    assert_eq!(Node::localhost().to_string(), "localhost:22");
}

#[test]
fn get_by_name() {
    assert_eq!(pool().get("b").map(|n| n.hostname.as_str()), Some("b.internal"));
    assert!(pool().get("c").is_none());
}
