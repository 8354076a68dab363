// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tempod argument handling specs

use crate::prelude::*;

#[test]
fn version_prints_package_version() {
    let output = tempod().arg("--version").assert().success().get_output().stdout.clone();

    similar_asserts::assert_eq!(
        String::from_utf8(output).unwrap().trim(),
        format!("tempod {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn help_lists_options_and_environment() {
    let output = tempod().arg("--help").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains("--check <config>"));
    assert!(stdout.contains("TEMPO_STATE_DIR"));
}

#[test]
fn unknown_argument_is_rejected() {
    let output = tempod().arg("--frobnicate").assert().code(2).get_output().stderr.clone();

    assert!(String::from_utf8_lossy(&output).contains("unexpected argument '--frobnicate'"));
}
