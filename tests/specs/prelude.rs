// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs: a temp state directory and a `tempod` runner.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub use assert_cmd::Command;

/// Upper bound for polling in specs
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

/// Temporary state directory for one daemon
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to a path relative to the project root.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `tempod` with its state directory pointed at this project.
    pub fn tempod(&self) -> Command {
        let mut cmd = tempod();
        cmd.env("TEMPO_STATE_DIR", self.path()).env("TEMPO_TIMER_CHECK_MS", "50");
        cmd
    }
}

pub fn tempod() -> Command {
    let mut cmd = Command::cargo_bin("tempod").unwrap();
    cmd.env_remove("TEMPO_STATE_DIR").env_remove("TEMPO_CONFIG").env_remove("TEMPO_TIME_ZONE");
    cmd
}

/// Poll `check` until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    check()
}
