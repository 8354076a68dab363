// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution nodes and node pools.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A host that action commands are dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub hostname: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    22
}

impl Node {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self { name: name.into(), hostname: hostname.into(), username: None, port: default_port() }
    }

    /// The implicit node used when a job names no pool.
    pub fn localhost() -> Self {
        Self::new("localhost", "localhost")
    }

    crate::setters! {
        set { port: u16 }
        option { username: String }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(user) => write!(f, "{}@{}:{}", user, self.hostname, self.port),
            None => write!(f, "{}:{}", self.hostname, self.port),
        }
    }
}

/// An ordered, non-empty group of nodes a job may run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    pub name: String,
    nodes: Vec<Node>,
}

impl NodePool {
    /// Build a pool; returns `None` when `nodes` is empty.
    pub fn new(name: impl Into<String>, nodes: Vec<Node>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        Some(Self { name: name.into(), nodes })
    }

    /// A pool holding exactly one node, named after it.
    pub fn single(node: Node) -> Self {
        Self { name: node.name.clone(), nodes: vec![node] }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Round-robin choice keyed by run number.
    pub fn select(&self, run_num: u32) -> &Node {
        let idx = run_num as usize % self.nodes.len();
        &self.nodes[idx]
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
