// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tempo-engine: the job run state machine, per-job scheduling loop,
//! runtime dispatch, and effect execution

pub mod action_run;
pub mod collection;
pub mod context;
mod error;
pub mod executor;
pub mod job;
pub mod job_run;
pub mod job_scheduler;
pub mod outbox;
pub mod persist;
pub mod runtime;
pub mod scheduler;
pub mod summary;
pub mod triggers;

#[cfg(test)]
mod test_helpers;

pub use action_run::{ActionRun, ExitOutcome};
pub use collection::{duplicate_job, JobCollection, JobFactory, ReconcileReport};
pub use context::CommandContext;
pub use error::{BuildError, RuntimeError};
pub use executor::{ExecuteError, Executor, ExecutorDeps, DISPATCH_ATTEMPTS};
pub use job::{Job, JobSpec, JobState};
pub use job_run::JobRun;
pub use job_scheduler::JobScheduler;
pub use outbox::{Outbox, RunEnv, RunNotice};
pub use persist::{spawn_persist_task, PersistRequest, StatePersister, PERSIST_ATTEMPTS};
pub use runtime::Runtime;
pub use scheduler::Scheduler;
pub use summary::{ActionRunSummary, JobRunSummary, JobStatus, JobSummary};
pub use triggers::{downstream_trigger, TriggerRegistry, TriggerState};
