// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{cancelled_actions, commands, minutes, run_states, spec, started, t0};
use tempo_config::{ActionConfig, CleanupActionConfig, JobConfig};

/// extract -> load, plus a cleanup action reporting the outcome
fn etl() -> JobConfig {
    JobConfig::builder()
        .name("etl")
        .actions(vec![
            ActionConfig::new("extract", "extract.sh ${shortdate}"),
            ActionConfig::new("load", "load.sh ${runid}").requires(["extract"]),
        ])
        .cleanup_action(CleanupActionConfig::new("notify ${cleanup_job_status}"))
        .build()
}

fn build(config: JobConfig) -> JobRun {
    JobRun::build(&spec(config), 0, t0(), Node::localhost(), false)
}

fn started_run(config: JobConfig, triggers: &TriggerRegistry) -> (JobRun, Outbox) {
    let mut run = build(config);
    let mut out = Outbox::new();
    assert!(run.start(RunEnv::new(t0(), triggers), &mut out));
    (run, out)
}

fn control(run: &mut JobRun, action: &str, op: ActionOp, triggers: &TriggerRegistry) -> (bool, Outbox) {
    let mut out = Outbox::new();
    let at = t0() + minutes(2);
    let applied = run.control(action, op, RunEnv::new(at, triggers), &mut out);
    (applied, out)
}

fn exit(run: &mut JobRun, action: &str, status: i32, triggers: &TriggerRegistry) -> Outbox {
    let mut out = Outbox::new();
    let at = t0() + minutes(1);
    run.action_exited(action, status, at, RunEnv::new(at, triggers), &mut out);
    out
}

#[test]
fn build_creates_one_action_run_per_graph_entry() {
    let run = build(etl());

    assert_eq!(run.id, "etl.0");
    assert_eq!(run.state(), RunState::Scheduled);
    let names: Vec<&str> = run.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["extract", "load"]);
    assert_eq!(run.actions[1].requires, vec!["extract".to_string()]);
    assert_eq!(run.actions[1].id, "etl.0.load");

    let cleanup = run.cleanup.as_ref().unwrap();
    assert!(cleanup.is_cleanup());
    assert_eq!(run.action("cleanup").map(|a| a.id.to_string()), Some("etl.0.cleanup".to_string()));
}

#[test]
fn action_node_override_selects_from_its_pool() {
    let config = JobConfig::builder()
        .actions(vec![ActionConfig::new("run", "true").node("pool")])
        .build();
    let spec = spec(config);

    let first = JobRun::build(&spec, 0, t0(), Node::localhost(), false);
    let second = JobRun::build(&spec, 1, t0(), Node::localhost(), false);

    assert_eq!(first.node, Node::localhost());
    assert_eq!(first.actions[0].node.name, "a");
    assert_eq!(second.actions[0].node.name, "b");
}

#[test]
fn start_dispatches_only_ready_actions() {
    let triggers = TriggerRegistry::new();
    let (run, mut out) = started_run(etl(), &triggers);

    assert_eq!(run.state(), RunState::Running);
    assert_eq!(run.start_time, Some(t0()));
    assert_eq!(out.next_notice(), Some(RunNotice::Started(run.id.clone())));
    assert_eq!(out.next_notice(), Some(RunNotice::StateChanged(run.id.clone())));
    assert_eq!(out.next_notice(), None);

    let effects = out.into_effects();
    assert_eq!(started(&effects), vec!["etl.0.extract"]);
    assert_eq!(commands(&effects), vec!["extract.sh 2024-03-01"]);
    assert_eq!(run_states(&effects), vec![("etl.0".to_string(), RunState::Running)]);
}

#[test]
fn start_is_a_no_op_once_started() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    let mut out = Outbox::new();

    assert!(!run.start(RunEnv::new(t0(), &triggers), &mut out));
    assert!(out.effects.is_empty());
}

#[test]
fn successful_chain_runs_cleanup_last() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    let effects = exit(&mut run, "extract", 0, &triggers).into_effects();
    assert_eq!(commands(&effects), vec!["load.sh etl.0"]);

    let effects = exit(&mut run, "load", 0, &triggers).into_effects();
    assert_eq!(commands(&effects), vec!["notify SUCCESS"]);
    assert_eq!(run.state(), RunState::Running);

    let mut out = exit(&mut run, "cleanup", 0, &triggers);
    assert_eq!(run.state(), RunState::Succeeded);
    assert_eq!(run.end_time, Some(t0() + minutes(1)));
    assert_eq!(out.next_notice(), Some(RunNotice::StateChanged(run.id.clone())));
    assert_eq!(out.next_notice(), Some(RunNotice::Done(run.id.clone())));
}

#[test]
fn failed_dependency_blocks_dependents_but_cleanup_runs() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    let effects = exit(&mut run, "extract", 2, &triggers).into_effects();
    assert_eq!(commands(&effects), vec!["notify FAILURE"]);
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Scheduled));
    assert!(run.is_blocked(&run.actions[1]));

    exit(&mut run, "cleanup", 0, &triggers);
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Cancelled));
    assert_eq!(run.state(), RunState::Failed);
}

#[test]
fn cleanup_failure_alone_fails_the_run() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    exit(&mut run, "extract", 0, &triggers);
    exit(&mut run, "load", 0, &triggers);
    exit(&mut run, "cleanup", 1, &triggers);

    assert_eq!(run.state(), RunState::Failed);
}

#[test]
fn run_without_cleanup_ends_when_last_action_exits() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder().actions(vec![ActionConfig::new("run", "true")]).build();
    let (mut run, _) = started_run(config, &triggers);

    exit(&mut run, "run", 0, &triggers);

    assert_eq!(run.state(), RunState::Succeeded);
    assert!(run.is_done());
}

#[test]
fn failing_exit_with_retries_redispatches() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder()
        .actions(vec![ActionConfig::new("flaky", "flaky.sh ${run_num}").retries(1)])
        .build();
    let (mut run, _) = started_run(config, &triggers);

    let effects = exit(&mut run, "flaky", 1, &triggers).into_effects();
    assert_eq!(commands(&effects), vec!["flaky.sh 0"]);
    assert_eq!(run.state(), RunState::Running);

    exit(&mut run, "flaky", 1, &triggers);
    assert_eq!(run.state(), RunState::Failed);
    assert_eq!(run.actions[0].exit_statuses, vec![1, 1]);
}

#[test]
fn stale_exit_is_ignored() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    let out = exit(&mut run, "load", 0, &triggers);

    assert!(out.effects.is_empty());
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Scheduled));
}

#[test]
fn actions_wait_for_triggers() {
    let mut triggers = TriggerRegistry::new();
    let config = JobConfig::builder()
        .name("report")
        .actions(vec![
            ActionConfig::new("render", "render.sh").triggered_by(["etl.load.shortdate.${shortdate}"])
        ])
        .build();
    let (mut run, out) = started_run(config, &triggers);

    assert!(started(&out.into_effects()).is_empty());
    assert_eq!(run.actions[0].triggers, vec!["etl.load.shortdate.2024-03-01".to_string()]);
    assert_eq!(run.state(), RunState::Running);

    triggers.publish("etl.load.shortdate.2024-03-01", t0());
    let mut out = Outbox::new();
    run.triggers_published(RunEnv::new(t0(), &triggers), &mut out);

    assert_eq!(started(&out.into_effects()), vec!["report.0.render"]);
}

#[test]
fn trigger_downstreams_publishes_on_success() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder()
        .name("etl")
        .actions(vec![ActionConfig::new("load", "load.sh").trigger_downstreams(true)])
        .build();
    let (mut run, _) = started_run(config, &triggers);

    let mut out = exit(&mut run, "load", 0, &triggers);

    assert_eq!(out.take_published(), vec!["etl.load.shortdate.2024-03-01".to_string()]);
}

#[test]
fn failed_action_publishes_nothing() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder()
        .actions(vec![ActionConfig::new("load", "load.sh").trigger_downstreams(true)])
        .build();
    let (mut run, _) = started_run(config, &triggers);

    let mut out = exit(&mut run, "load", 1, &triggers);

    assert!(out.take_published().is_empty());
}

#[test]
fn stop_cancels_running_and_pending_actions() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    let mut out = Outbox::new();

    run.stop(RunEnv::new(t0() + minutes(30), &triggers), &mut out);

    let effects = out.into_effects();
    assert_eq!(cancelled_actions(&effects), vec!["etl.0.extract"]);
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Cancelled));
    assert_eq!(run.actions[0].retries_remaining, 0);

    // The killed command reports in, then cleanup runs
    let effects = exit(&mut run, "extract", -1, &triggers).into_effects();
    assert_eq!(commands(&effects), vec!["notify FAILURE"]);
    exit(&mut run, "cleanup", 0, &triggers);
    assert_eq!(run.state(), RunState::Failed);
}

#[test]
fn lost_action_makes_run_unknown() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder().actions(vec![ActionConfig::new("run", "true")]).build();
    let (mut run, _) = started_run(config, &triggers);
    let mut out = Outbox::new();

    run.action_lost("run", "node unreachable", RunEnv::new(t0(), &triggers), &mut out);

    assert_eq!(run.state(), RunState::Unknown);
    assert_eq!(run.actions[0].error.as_deref(), Some("node unreachable"));
}

#[test]
fn recover_marks_running_actions_unknown() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    let mut out = Outbox::new();

    run.recover(RunEnv::new(t0(), &triggers), &mut out);

    let extract = run.action("extract").unwrap();
    assert_eq!(extract.state, RunState::Unknown);
    assert_eq!(extract.error.as_deref(), Some(RESTART_LOST_REASON));
    // load is blocked, so cleanup is next
    assert_eq!(commands(&out.into_effects()), vec!["notify UNKNOWN"]);
}

#[test]
fn queue_then_cancel() {
    let mut run = build(etl());
    let mut out = Outbox::new();

    assert!(run.queue(t0(), &mut out));
    assert_eq!(run.state(), RunState::Queued);
    assert!(!run.queue(t0(), &mut out));

    assert!(run.cancel(t0(), &mut out));
    assert_eq!(run.state(), RunState::Cancelled);
    assert_eq!(run.end_time, Some(t0()));
    // Never started, so no completion notice
    let notices: Vec<RunNotice> = std::iter::from_fn(|| out.next_notice()).collect();
    assert!(!notices.contains(&RunNotice::Done(run.id.clone())));
}

#[test]
fn cancel_leaves_started_runs_alone() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    let mut out = Outbox::new();

    assert!(!run.cancel(t0(), &mut out));
    assert_eq!(run.state(), RunState::Running);
}

#[test]
fn summary_lists_cleanup_last() {
    let run = build(etl());
    let summary = run.summary();

    let names: Vec<&str> = summary.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["extract", "load", "cleanup"]);
    assert_eq!(summary.state, RunState::Scheduled);
    assert_eq!(summary.node, "localhost");
}

#[test]
fn serde_roundtrip_preserves_run() {
    let triggers = TriggerRegistry::new();
    let (run, _) = started_run(etl(), &triggers);

    let json = serde_json::to_value(&run).unwrap();
    let back: JobRun = serde_json::from_value(json).unwrap();

    assert_eq!(back, run);
    assert_eq!(back.state(), RunState::Running);
}

#[test]
fn skipping_a_failed_dependency_releases_its_downstream() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    exit(&mut run, "extract", 2, &triggers);
    exit(&mut run, "cleanup", 0, &triggers);
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Cancelled));
    assert_eq!(run.state(), RunState::Failed);

    let (applied, out) = control(&mut run, "extract", ActionOp::Skip, &triggers);

    assert!(applied);
    assert_eq!(run.action("extract").map(|a| a.state), Some(RunState::Skipped));
    assert_eq!(started(&out.into_effects()), vec!["etl.0.load"]);
    assert_eq!(run.state(), RunState::Running);
    assert_eq!(run.end_time, None);

    exit(&mut run, "load", 0, &triggers);
    assert_eq!(run.state(), RunState::Succeeded);
}

#[test]
fn skip_while_cleanup_runs_dispatches_blocked_action() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    exit(&mut run, "extract", 2, &triggers);

    let (_, out) = control(&mut run, "extract", ActionOp::Skip, &triggers);

    assert_eq!(started(&out.into_effects()), vec!["etl.0.load"]);
}

#[test]
fn skip_is_rejected_for_running_actions() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    let (applied, out) = control(&mut run, "extract", ActionOp::Skip, &triggers);

    assert!(!applied);
    assert!(out.effects.is_empty());
}

#[test]
fn forced_success_on_lost_action_completes_the_run() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder().actions(vec![ActionConfig::new("run", "true")]).build();
    let (mut run, _) = started_run(config, &triggers);
    run.action_lost("run", "node unreachable", RunEnv::new(t0(), &triggers), &mut Outbox::new());
    assert_eq!(run.state(), RunState::Unknown);

    let (applied, mut out) = control(&mut run, "run", ActionOp::Success, &triggers);

    assert!(applied);
    assert_eq!(run.state(), RunState::Succeeded);
    assert_eq!(out.next_notice(), Some(RunNotice::StateChanged(run.id.clone())));
}

#[test]
fn forced_failure_of_waiting_action_fails_the_run() {
    let triggers = TriggerRegistry::new();
    let config = JobConfig::builder()
        .actions(vec![ActionConfig::new("render", "render.sh").triggered_by(["upstream.never"])])
        .build();
    let (mut run, _) = started_run(config, &triggers);
    assert_eq!(run.state(), RunState::Running);

    let (applied, out) = control(&mut run, "render", ActionOp::Fail, &triggers);

    assert!(applied);
    assert_eq!(run.state(), RunState::Failed);
    assert_eq!(run_states(&out.into_effects()), vec![("nightly.0".to_string(), RunState::Failed)]);
}

#[test]
fn retry_redispatches_failed_action() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);
    exit(&mut run, "extract", 2, &triggers);
    exit(&mut run, "cleanup", 0, &triggers);

    let (applied, out) = control(&mut run, "extract", ActionOp::Retry, &triggers);

    assert!(applied);
    assert_eq!(started(&out.into_effects()), vec!["etl.0.extract"]);
    // load was only cancelled for the broken dependency
    assert_eq!(run.action("load").map(|a| a.state), Some(RunState::Scheduled));
    assert_eq!(run.state(), RunState::Running);

    let effects = exit(&mut run, "extract", 0, &triggers).into_effects();
    assert_eq!(started(&effects), vec!["etl.0.load"]);
}

#[test]
fn retry_of_running_action_kills_then_redispatches() {
    let triggers = TriggerRegistry::new();
    let (mut run, _) = started_run(etl(), &triggers);

    let (applied, out) = control(&mut run, "extract", ActionOp::Retry, &triggers);

    assert!(applied);
    assert_eq!(cancelled_actions(&out.into_effects()), vec!["etl.0.extract"]);
    let effects = exit(&mut run, "extract", -1, &triggers).into_effects();
    assert_eq!(started(&effects), vec!["etl.0.extract"]);
    assert_eq!(run.action("extract").map(|a| a.state), Some(RunState::Running));
}
