// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tempod --check` specs

use crate::prelude::*;

const JOBS: &str = r#"
[[nodes]]
name = "batch"
hostname = "batch.internal"

[[node_pools]]
name = "workers"
nodes = ["batch"]

[[jobs]]
name = "nightly"
node = "workers"
schedule = "cron 0 4 * * *"
time_zone = "Europe/Berlin"

[[jobs.actions]]
name = "extract"
command = "extract.sh ${shortdate}"

[[jobs.actions]]
name = "load"
command = "load.sh"
requires = ["extract"]

[jobs.cleanup_action]
command = "notify ${cleanup_job_status}"

[[jobs]]
name = "poller"
node = "batch"
schedule = "interval 5m"

[[jobs.actions]]
name = "poll"
command = "poll.sh"
"#;

#[test]
fn valid_config_passes() {
    let project = Project::empty();
    let path = project.file("jobs.toml", JOBS);

    let output = tempod().arg("--check").arg(&path).assert().success().get_output().stdout.clone();

    assert_eq!(String::from_utf8(output).unwrap().trim(), "ok: 2 jobs");
}

#[test]
fn cyclic_actions_fail_the_job() {
    let project = Project::empty();
    let broken = JOBS.replace("command = \"extract.sh ${shortdate}\"", "command = \"extract.sh\"\nrequires = [\"load\"]");
    let path = project.file("jobs.toml", &broken);

    let output = tempod().arg("--check").arg(&path).assert().code(1).get_output().stderr.clone();

    assert!(String::from_utf8_lossy(&output).starts_with("job 'nightly':"));
}

#[test]
fn duplicate_job_is_reported_against_that_job() {
    let project = Project::empty();
    let doubled = format!("{JOBS}\n{}", &JOBS[JOBS.find("[[jobs]]\nname = \"poller\"").unwrap()..]);
    let path = project.file("jobs.toml", &doubled);

    let output = tempod().arg("--check").arg(&path).assert().code(1).get_output().stderr.clone();

    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("job 'poller': duplicate job 'poller'"));
    assert!(!stderr.contains("job 'nightly'"));
}

#[test]
fn missing_path_is_a_usage_error() {
    tempod().arg("--check").assert().code(2);
}
