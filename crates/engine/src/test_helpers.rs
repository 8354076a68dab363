// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and effect filters shared by the engine tests.

use crate::collection::JobFactory;
use crate::job::{Job, JobSpec};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tempo_config::JobConfig;
use tempo_core::test_support::utc;
use tempo_core::{Effect, Event, Node, NodePool, RunState, TimerId};

/// 2024-03-01 04:00:00 UTC
pub fn t0() -> DateTime<Utc> {
    utc(2024, 3, 1, 4, 0, 0)
}

pub fn minutes(n: i64) -> chrono::Duration {
    chrono::Duration::minutes(n)
}

/// Nodes `local`, `a` and `b`, plus the pool `pool = [a, b]`.
pub fn factory() -> JobFactory {
    let a = Node::new("a", "a.example.com");
    let b = Node::new("b", "b.example.com");
    let mut pools = IndexMap::new();
    pools.insert("local".to_string(), NodePool::single(Node::localhost()));
    pools.insert("a".to_string(), NodePool::single(a.clone()));
    pools.insert("b".to_string(), NodePool::single(b.clone()));
    pools.insert("pool".to_string(), NodePool::new("pool", vec![a, b]).unwrap());
    JobFactory::new(pools, None)
}

pub fn spec(config: JobConfig) -> JobSpec {
    factory().build(&config).unwrap()
}

pub fn job(config: JobConfig) -> Job {
    Job::new(spec(config))
}

/// Action run ids of every `StartAction`, in order.
pub fn started(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::StartAction { command } => Some(command.id.to_string()),
            _ => None,
        })
        .collect()
}

/// Rendered commands of every `StartAction`, in order.
pub fn commands(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::StartAction { command } => Some(command.command.clone()),
            _ => None,
        })
        .collect()
}

pub fn timers_set(effects: &[Effect]) -> Vec<TimerId> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::SetTimer { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

pub fn timers_cancelled(effects: &[Effect]) -> Vec<TimerId> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::CancelTimer { id } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

pub fn cancelled_actions(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::CancelAction { id, .. } => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

/// Job run states announced through `Emit`, in order.
pub fn run_states(effects: &[Effect]) -> Vec<(String, RunState)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Emit { event: Event::JobRunChanged { id, state, .. } } => {
                Some((id.to_string(), *state))
            }
            _ => None,
        })
        .collect()
}

pub fn persisted_keys(effects: &[Effect]) -> Vec<(String, bool)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Persist { key, value } => Some((key.clone(), value.is_some())),
            _ => None,
        })
        .collect()
}
