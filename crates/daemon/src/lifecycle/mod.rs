// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, event processing, shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use tempo_adapters::{LocalNodeAdapter, LogEventSink, TracedNode};
use tempo_config::{ConfigError, ConfigFile};
use tempo_core::{Clock, Event, SystemClock};
use tempo_engine::{Executor, ReconcileReport, Runtime, RuntimeError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Executor with the daemon's concrete adapters
pub type DaemonExecutor = Executor<TracedNode<LocalNodeAdapter>, LogEventSink, SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/tempo)
    pub state_dir: PathBuf,
    /// Job configuration document
    pub config_path: PathBuf,
    /// Saved job state
    pub state_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// How often the timer wheel is checked
    pub timer_check: Duration,
    /// Zone for calendar schedules that name none
    pub time_zone: Option<Tz>,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::for_state_dir(crate::env::state_dir()?);
        if let Some(path) = crate::env::config_path() {
            config.config_path = path;
        }
        config.timer_check = crate::env::timer_check();
        config.time_zone = crate::env::time_zone().map(|name| tempo_config::parse_time_zone(&name)).transpose()?;
        Ok(config)
    }

    /// Fixed layout under `state_dir` with default settings.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            config_path: state_dir.join("jobs.toml"),
            state_path: state_dir.join("state.json"),
            lock_path: state_dir.join("tempod.pid"),
            log_path: state_dir.join("tempod.log"),
            timer_check: crate::env::DEFAULT_TIMER_CHECK,
            time_zone: None,
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: Runtime<SystemClock>,
    pub executor: DaemonExecutor,
    /// Action results posted back by the executor
    pub event_rx: mpsc::Receiver<Event>,
    persist_task: JoinHandle<()>,
}

impl Daemon {
    /// Handle one event and apply its effects.
    pub async fn process_event(&mut self, event: Event) -> Result<(), LifecycleError> {
        debug!(job = ?event.job_name(), event = %event.log_summary(), "processing event");
        let effects = self.runtime.handle_event(event)?;
        self.executor.execute_all(effects).await;
        Ok(())
    }

    /// Fire every due timer. Returns the number fired.
    pub async fn fire_timers(&mut self) -> usize {
        let now = self.executor.clock().now();
        let fired = self.executor.scheduler().lock().fired_timers(now);
        let count = fired.len();
        for event in fired {
            if let Err(e) = self.process_event(event).await {
                warn!(error = %e, "failed to handle timer");
            }
        }
        count
    }

    /// Re-read the job config and reconcile the running jobs against it.
    ///
    /// A document that fails to parse or names unknown nodes is rejected
    /// and the running jobs are left as they were.
    pub async fn reload_config(&mut self) -> Result<ReconcileReport, LifecycleError> {
        let file = ConfigFile::load(&self.config.config_path)?;
        let (report, effects) = self.runtime.load_config(&file)?;
        for (job, error) in &report.errors {
            error!(%job, %error, "job not reloaded");
        }
        for (job, reason) in &report.rejected {
            warn!(%job, %reason, "job kept");
        }
        self.executor.execute_all(effects).await;
        info!(path = %self.config.config_path.display(), "configuration reloaded");
        Ok(report)
    }

    /// Shut down gracefully: drain pending state writes, then release the
    /// lock. Running commands are not waited for.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        let Daemon { config, lock_file, executor, persist_task, .. } = self;

        // Closing the persist channel lets the task finish its last batch
        drop(executor);
        if let Err(e) = persist_task.await {
            warn!(error = %e, "persist task ended abnormally");
        }

        if config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&config.lock_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }
        drop(lock_file);

        info!("daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
