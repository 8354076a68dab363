// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tempo daemon library
//!
//! Startup, the event loop body, and shutdown for `tempod`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod check;
pub mod env;
pub mod lifecycle;

pub use check::{check_config, CheckReport};
pub use lifecycle::{startup, Config, Daemon, LifecycleError};
