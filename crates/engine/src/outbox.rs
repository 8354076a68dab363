// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collected output of one state-machine step.

use crate::triggers::TriggerRegistry;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tempo_core::{Effect, Event, JobRunId};

/// Run lifecycle notices, consumed by the owning job scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunNotice {
    Started(JobRunId),
    /// The run reached a terminal state after starting
    Done(JobRunId),
    StateChanged(JobRunId),
}

/// Effects and notices produced while handling one event.
#[derive(Debug, Default)]
pub struct Outbox {
    pub effects: Vec<Effect>,
    notices: VecDeque<RunNotice>,
    published: Vec<String>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn emit(&mut self, event: Event) {
        self.effects.push(Effect::Emit { event });
    }

    pub fn notify(&mut self, notice: RunNotice) {
        self.notices.push_back(notice);
    }

    pub fn next_notice(&mut self) -> Option<RunNotice> {
        self.notices.pop_front()
    }

    /// Queue a trigger for publication to the registry.
    pub fn publish(&mut self, trigger: String) {
        self.published.push(trigger);
    }

    pub fn take_published(&mut self) -> Vec<String> {
        std::mem::take(&mut self.published)
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

/// Read-only inputs shared by every step: the current time and the
/// triggers published so far.
#[derive(Debug, Clone, Copy)]
pub struct RunEnv<'a> {
    pub now: DateTime<Utc>,
    pub triggers: &'a TriggerRegistry,
}

impl<'a> RunEnv<'a> {
    pub fn new(now: DateTime<Utc>, triggers: &'a TriggerRegistry) -> Self {
        Self { now, triggers }
    }
}
