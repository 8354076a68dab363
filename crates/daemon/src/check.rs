// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Offline validation of a job config document (`tempod --check`).

use std::collections::HashSet;
use std::path::Path;

use chrono_tz::Tz;
use tempo_config::{ConfigError, ConfigFile};
use tempo_engine::{duplicate_job, BuildError, JobFactory};

/// Result of checking every job in a document
#[derive(Debug, Default)]
pub struct CheckReport {
    pub jobs: Vec<String>,
    pub errors: Vec<(String, BuildError)>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse `path` and build every job it defines without starting anything.
///
/// Document-level problems (syntax, duplicate node names, bad node pools)
/// fail the whole check; per-job problems, duplicate job names included,
/// are collected.
pub fn check_config(path: &Path, default_tz: Option<Tz>) -> Result<CheckReport, ConfigError> {
    let file = ConfigFile::load(path)?;
    let factory = JobFactory::from_file(&file, default_tz)?;
    let duplicates = file.duplicate_jobs();
    let mut reported = HashSet::new();
    let mut report = CheckReport::default();
    for job in &file.jobs {
        if duplicates.contains(job.name.as_str()) {
            if reported.insert(job.name.as_str()) {
                report.errors.push((job.name.clone(), duplicate_job(&job.name)));
            }
            continue;
        }
        match factory.build(job) {
            Ok(_) => report.jobs.push(job.name.clone()),
            Err(e) => report.errors.push((job.name.clone(), e)),
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
