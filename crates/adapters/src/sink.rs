// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use tempo_core::Event;
use thiserror::Error;

/// Errors from event publication
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Adapter for the pub/sub surface that run state changes are sent to
#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    async fn publish(&self, event: &Event) -> Result<(), SinkError>;
}

/// Sink that writes each event to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, event: &Event) -> Result<(), SinkError> {
        tracing::info!(event = event.name(), summary = %event.log_summary(), "published");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{EventSink, SinkError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempo_core::Event;

    #[derive(Default)]
    struct FakeSinkState {
        events: Vec<Event>,
        fail: bool,
    }

    /// Fake event sink for testing
    #[derive(Clone, Default)]
    pub struct FakeEventSink {
        inner: Arc<Mutex<FakeSinkState>>,
    }

    impl FakeEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reject every publish from now on.
        pub fn set_failing(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        /// Get all published events
        pub fn events(&self) -> Vec<Event> {
            self.inner.lock().events.clone()
        }
    }

    #[async_trait]
    impl EventSink for FakeEventSink {
        async fn publish(&self, event: &Event) -> Result<(), SinkError> {
            let mut state = self.inner.lock();
            if state.fail {
                return Err(SinkError::PublishFailed("sink offline".to_string()));
            }
            state.events.push(event.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventSink;

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
