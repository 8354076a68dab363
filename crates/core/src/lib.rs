// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tempo-core: shared types for the tempo job scheduler

pub mod macros;

pub mod clock;
pub mod effect;
pub mod event;
pub mod graph;
pub mod id;
pub mod node;
pub mod state;
pub mod timer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use effect::{ActionCommand, Effect};
pub use event::{ActionOp, Event};
pub use graph::{Action, ActionGraph, Dependency, GraphError, CLEANUP_ACTION};
pub use id::{short, ActionRunId, JobName, JobRunId};
pub use node::{Node, NodePool};
pub use state::RunState;
pub use timer::{TimerId, TimerKind};
