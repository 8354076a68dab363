// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Start a real daemon, let a job run, reload or stop it with signals,
//! and check what was left on disk.

use crate::prelude::*;
use std::process::{Child, Stdio};

fn ticker_config(marker: &std::path::Path) -> String {
    format!(
        r#"
[[nodes]]
name = "local"
hostname = "localhost"

[[jobs]]
name = "ticker"
node = "local"
schedule = "interval 1s"

[[jobs.actions]]
name = "touch"
command = "touch {}"
"#,
        marker.display()
    )
}

fn spawn(project: &Project) -> Child {
    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("tempod"));
    cmd.env("TEMPO_STATE_DIR", project.path())
        .env("TEMPO_TIMER_CHECK_MS", "50")
        .env_remove("TEMPO_CONFIG")
        .env_remove("TEMPO_TIME_ZONE")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn().unwrap()
}

fn signal(child: &Child, name: &str) {
    let status = std::process::Command::new("kill").arg(format!("-{name}")).arg(child.id().to_string()).status().unwrap();
    assert!(status.success());
}

fn terminate(child: &mut Child) {
    signal(child, "TERM");
    let exited = wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
    assert!(exited, "daemon should exit after SIGTERM");
}

fn saved_state(project: &Project) -> serde_json::Value {
    let text = std::fs::read_to_string(project.path().join("state.json")).unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
}

fn succeeded_runs(state: &serde_json::Value) -> usize {
    state["entries"]["job_state ticker"]["runs"]
        .as_array()
        .map(|runs| {
            runs.iter()
                .filter(|r| r["actions"].as_array().is_some_and(|a| !a.is_empty() && a.iter().all(|a| a["state"] == "succeeded")))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn daemon_runs_job_and_saves_state() {
    let project = Project::empty();
    let marker = project.path().join("ticked");
    project.file("jobs.toml", &ticker_config(&marker));

    let mut child = spawn(&project);
    let ran = wait_for(SPEC_WAIT_MAX_MS, || marker.exists() && succeeded_runs(&saved_state(&project)) > 0);
    terminate(&mut child);

    assert!(ran, "job should run and its success should be saved");
    assert!(!project.path().join("tempod.pid").exists());
    assert!(project.path().join("tempod.log").exists());
}

#[test]
fn history_is_restored_after_restart() {
    let project = Project::empty();
    let marker = project.path().join("ticked");
    project.file("jobs.toml", &ticker_config(&marker));

    let mut first = spawn(&project);
    let ran = wait_for(SPEC_WAIT_MAX_MS, || succeeded_runs(&saved_state(&project)) > 0);
    terminate(&mut first);
    assert!(ran);
    let before = succeeded_runs(&saved_state(&project));

    let mut second = spawn(&project);
    let more = wait_for(SPEC_WAIT_MAX_MS, || succeeded_runs(&saved_state(&project)) > before);
    terminate(&mut second);

    assert!(more, "restarted daemon should keep history and keep running");
}

#[test]
fn sighup_loads_new_jobs() {
    let project = Project::empty();
    let marker = project.path().join("ticked");
    project.file("jobs.toml", &ticker_config(&marker));

    let mut child = spawn(&project);
    let ran = wait_for(SPEC_WAIT_MAX_MS, || succeeded_runs(&saved_state(&project)) > 0);
    assert!(ran);

    let tocked = project.path().join("tocked");
    let extra = format!(
        r#"
[[jobs]]
name = "tock"
node = "local"
schedule = "interval 1s"

[[jobs.actions]]
name = "touch"
command = "touch {}"
"#,
        tocked.display()
    );
    project.file("jobs.toml", &(ticker_config(&marker) + &extra));
    signal(&child, "HUP");

    let reloaded = wait_for(SPEC_WAIT_MAX_MS, || {
        tocked.exists() && saved_state(&project)["entries"]["job_state tock"].is_object()
    });
    let alive = matches!(child.try_wait(), Ok(None));
    terminate(&mut child);

    assert!(alive, "daemon should survive SIGHUP");
    assert!(reloaded, "job added to the config should be scheduled after SIGHUP");
}

#[test]
fn missing_config_fails_startup() {
    let project = Project::empty();

    project.tempod().assert().failure();

    // The lock is released so a fixed config can be started
    assert!(!project.path().join("tempod.pid").exists());
}
