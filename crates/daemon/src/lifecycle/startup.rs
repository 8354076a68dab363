// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;
use tempo_adapters::{LocalNodeAdapter, LogEventSink, TracedNode};
use tempo_config::ConfigFile;
use tempo_core::SystemClock;
use tempo_engine::{spawn_persist_task, Executor, ExecutorDeps, Runtime, Scheduler, StatePersister};
use tempo_storage::FileStore;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{Config, Daemon, LifecycleError};

/// Capacity of the action result and persistence channels
const CHANNEL_CAPACITY: usize = 256;

/// Start the daemon: lock the state directory, load jobs, restore their
/// saved state, and arm their timers.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    match startup_inner(config).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The PID file belongs to the running daemon when the lock was taken
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<Daemon, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing state.
    // Open without truncating so a running daemon's PID survives a failed attempt.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Parse the job configuration
    let file = ConfigFile::load(&config.config_path)?;
    info!(path = %config.config_path.display(), jobs = file.jobs.len(), "loaded job config");

    // 4. Wire the executor
    let persister = Arc::new(StatePersister::new(FileStore::new(&config.state_path)));
    let (persist_tx, persist_rx) = mpsc::unbounded_channel();
    let persist_task = spawn_persist_task(Arc::clone(&persister), persist_rx);

    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let deps = ExecutorDeps {
        nodes: TracedNode::new(LocalNodeAdapter::new()),
        sink: LogEventSink,
        persist_tx,
    };
    let executor = Executor::new(deps, Arc::new(Mutex::new(Scheduler::new())), SystemClock, event_tx);

    // 5. Load jobs, then replace their fresh state with what was saved
    let mut runtime = Runtime::new(SystemClock, config.time_zone);
    let (report, effects) = runtime.load_config(&file)?;
    for (job, error) in &report.errors {
        warn!(%job, %error, "job not loaded");
    }
    executor.execute_all(effects).await;

    let names = runtime.job_names();
    let states = match persister.restore_jobs(&names) {
        Ok(states) => states,
        Err(e) => {
            warn!(error = %e, "could not read saved state, starting fresh");
            Default::default()
        }
    };
    info!(restored = states.len(), "recovered job state");
    match persister.restore_triggers() {
        Ok(triggers) => runtime.restore_triggers(triggers),
        Err(e) => warn!(error = %e, "could not read saved triggers"),
    }
    let effects = runtime.restore(states);
    executor.execute_all(effects).await;

    info!(jobs = names.len(), "daemon started");
    Ok(Daemon { config: config.clone(), lock_file, runtime, executor, event_rx, persist_task })
}

fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!(error = %e, "failed to remove PID file");
        }
    }
}
