//! In-memory event source for tests.

use super::{batch_after, sort_by_position, EventSource, SourceError};
use crate::domain::{EventPosition, PoolEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock event source that serves predefined events.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    events: Vec<PoolEvent>,
    /// Number of upcoming calls that fail with a transient I/O error.
    failures_remaining: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MockEventSource {
    /// Create a new mock source with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the mock source.
    pub fn with_event(mut self, event: PoolEvent) -> Self {
        self.events.push(event);
        sort_by_position(&mut self.events);
        self
    }

    /// Add multiple events to the mock source.
    pub fn with_events(mut self, events: Vec<PoolEvent>) -> Self {
        self.events.extend(events);
        sort_by_position(&mut self.events);
        self
    }

    /// Make the next `count` calls fail with a transient error.
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `next_batch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn next_batch(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<PoolEvent>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SourceError::Io("simulated outage".to_string()));
        }
        Ok(batch_after(&self.events, after, limit))
    }
}
