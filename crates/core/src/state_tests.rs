// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    scheduled = { RunState::Scheduled, true, false, false },
    queued = { RunState::Queued, true, false, false },
    running = { RunState::Running, false, true, false },
    succeeded = { RunState::Succeeded, false, false, true },
    failed = { RunState::Failed, false, false, true },
    cancelled = { RunState::Cancelled, false, false, true },
    skipped = { RunState::Skipped, false, false, true },
    unknown = { RunState::Unknown, false, false, true },
)]
fn classification(state: RunState, pending: bool, active: bool, terminal: bool) {
    assert_eq!(state.is_pending(), pending);
    assert_eq!(state.is_active(), active);
    assert_eq!(state.is_terminal(), terminal);
}

#[test]
fn only_failures_are_broken() {
    assert!(!RunState::Succeeded.is_broken());
    assert!(!RunState::Skipped.is_broken());
    assert!(RunState::Skipped.is_complete());
    assert!(!RunState::Cancelled.is_complete());
    assert!(RunState::Failed.is_broken());
    assert!(RunState::Unknown.is_broken());
    assert!(!RunState::Running.is_broken());
}

#[test]
fn display_matches_serde_name() {
    for state in [RunState::Scheduled, RunState::Cancelled, RunState::Skipped, RunState::Unknown] {
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, format!("\"{state}\""));
    }
}
