// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const SAMPLE: &str = r#"
[[nodes]]
name = "a"
hostname = "a.internal"
username = "batch"

[[nodes]]
name = "b"
hostname = "b.internal"
port = 2222

[[node_pools]]
name = "workers"
nodes = ["a", "b"]

[[jobs]]
name = "nightly"
node = "workers"
schedule = "cron 0 4 * * *"
time_zone = "America/New_York"
max_runtime = "2h"
all_nodes = true

[[jobs.actions]]
name = "extract"
command = "extract --date ${shortdate}"

[[jobs.actions]]
name = "load"
command = "load"
requires = ["extract"]
retries = 2
trigger_downstreams = true

[jobs.cleanup_action]
command = "rm -rf /tmp/nightly"

[[jobs]]
name = "poll"
node = "a"
schedule = { interval = "30s" }

[[jobs.actions]]
name = "check"
command = "true"
"#;

#[test]
fn parses_sample_document() {
    let file = ConfigFile::parse(SAMPLE).unwrap();
    assert_eq!(file.nodes.len(), 2);
    assert_eq!(file.jobs.len(), 2);

    let nightly = &file.jobs[0];
    assert_eq!(nightly.run_limit, DEFAULT_RUN_LIMIT);
    assert!(nightly.enabled);
    assert!(nightly.all_nodes);
    assert_eq!(nightly.actions[1].requires, vec!["extract".to_string()]);
    assert_eq!(nightly.actions[1].retries, 2);
    assert_eq!(nightly.cleanup_action, Some(CleanupActionConfig::new("rm -rf /tmp/nightly")));
    assert_eq!(nightly.max_runtime().unwrap(), Some(Duration::from_secs(7200)));
    assert_eq!(nightly.time_zone(None).unwrap(), Some(chrono_tz::America::New_York));

    let poll = &file.jobs[1];
    let schedule = poll.schedule(None).unwrap();
    assert_eq!(schedule.kind(), "interval");
    assert!(!poll.queueing(&schedule));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    assert_eq!(ConfigFile::load(&path).unwrap(), ConfigFile::parse(SAMPLE).unwrap());
    assert!(matches!(ConfigFile::load(&dir.path().join("nope.toml")), Err(ConfigError::Io(_))));
}

#[test]
fn node_pools_include_single_nodes() {
    let file = ConfigFile::parse(SAMPLE).unwrap();
    let pools = file.node_pools().unwrap();
    assert_eq!(pools.keys().collect::<Vec<_>>(), vec!["a", "b", "workers"]);
    assert_eq!(pools["workers"].nodes().len(), 2);
    assert_eq!(pools["a"].nodes()[0].to_string(), "batch@a.internal:22");
    assert_eq!(pools["b"].nodes()[0].port, 2222);
}

#[test]
fn pool_with_unknown_node() {
    let file = ConfigFile::parse(
        r#"
        [[node_pools]]
        name = "workers"
        nodes = ["ghost"]
        "#,
    )
    .unwrap();
    assert!(matches!(
        file.node_pools(),
        Err(ConfigError::UnknownNode { pool, node }) if pool == "workers" && node == "ghost"
    ));
}

#[test]
fn duplicate_job_names_are_listed() {
    let text = r#"
        [[jobs]]
        name = "x"
        node = "a"
        schedule = "constant"
        actions = [{ name = "a", command = "true" }]

        [[jobs]]
        name = "x"
        node = "a"
        schedule = "constant"
        actions = [{ name = "a", command = "true" }]
    "#;
    let file = ConfigFile::parse(text).unwrap();
    assert_eq!(file.duplicate_jobs(), HashSet::from(["x"]));
}

#[test]
fn unknown_fields_rejected() {
    let text = r#"
        [[jobs]]
        name = "x"
        node = "a"
        schedule = "constant"
        colour = "blue"
        actions = [{ name = "a", command = "true" }]
    "#;
    assert!(matches!(ConfigFile::parse(text), Err(ConfigError::Toml(_))));
}

#[test]
fn queueing_override_beats_schedule_default() {
    let config = JobConfig::builder().schedule("cron 0 4 * * *").queueing(false).build();
    let schedule = config.schedule(None).unwrap();
    assert!(schedule.default_queueing());
    assert!(!config.queueing(&schedule));
}

#[test]
fn default_time_zone_applies_without_override() {
    let config = JobConfig::builder().schedule("daily 04:00").build();
    let tz = Some(chrono_tz::Europe::Berlin);
    assert_eq!(config.time_zone(tz).unwrap(), tz);
    assert!(matches!(
        JobConfig::builder().time_zone("Mars/Olympus").build().time_zone(None),
        Err(ConfigError::UnknownTimeZone(_))
    ));
}

#[parameterized(
    no_actions = { JobConfig::builder().actions(vec![]).build() },
    zero_run_limit = { JobConfig::builder().run_limit(0).build() },
)]
fn invalid_jobs(config: JobConfig) {
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn duplicate_action_names() {
    let config = JobConfig::builder()
        .actions(vec![ActionConfig::new("a", "true"), ActionConfig::new("a", "false")])
        .build();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Duplicate { kind: "action", name }) if name == "nightly.a"
    ));
}

#[parameterized(
    plain = { "nightly", true },
    dashes = { "batch-load_2", true },
    dotted = { "a.b", false },
    space = { "a b", false },
    empty = { "", false },
)]
fn name_rules(name: &str, ok: bool) {
    assert_eq!(check_name(name).is_ok(), ok);
}
