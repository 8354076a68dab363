// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::JobName;
use yare::parameterized;

fn run_id(job: &str, num: u32) -> JobRunId {
    JobRunId::for_run(&JobName::new(job), num)
}

#[test]
fn timer_id_display() {
    let id = TimerId::from_string("test-timer");
    assert_eq!(id.to_string(), "test-timer");
}

#[test]
fn factory_methods_format() {
    assert_eq!(TimerId::run(&run_id("nightly", 4)).as_str(), "run:nightly.4");
    assert_eq!(TimerId::timeout(&run_id("ns.nightly", 4)).as_str(), "timeout:ns.nightly.4");
}

#[test]
fn kind_round_trips_through_timer_id() {
    let kind = TimerKind::Timeout(run_id("ns.nightly", 12));
    let id = kind.to_timer_id();
    assert_eq!(id.kind(), Some(kind));
}

#[test]
fn job_run_id_accessor() {
    let kind = TimerId::run(&run_id("a", 1)).kind().unwrap();
    assert_eq!(kind.job_run_id(), &run_id("a", 1));
}

#[parameterized(
    unknown_prefix = { "cron:nightly.1" },
    missing_run_number = { "run:nightly" },
    empty = { "" },
)]
fn unrecognized_ids_parse_to_none(raw: &str) {
    assert_eq!(TimerKind::parse(raw), None);
}
