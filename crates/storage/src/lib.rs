// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for tempo: a key/value state store for job state

mod error;
mod file;
mod key;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod store;

pub use error::StoreError;
pub use file::FileStore;
pub use key::StateKey;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use store::{StateStore, StoreWrites};
