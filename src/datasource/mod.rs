//! Event source abstraction for pulling decoded pool events in delivery order.

use crate::domain::{EventPosition, PoolEvent};
use async_trait::async_trait;
use std::fmt;

pub mod jsonl;
pub mod mock;

pub use jsonl::JsonlEventSource;
pub use mock::MockEventSource;

/// Ordered stream of pool events.
///
/// Delivery is at-least-once: a source may hand out an event again after a restart, and the
/// ledger is expected to absorb the repeat.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Fetch up to `limit` events strictly after `after`, ordered by (block, log index).
    ///
    /// # Arguments
    /// * `after` - Position of the last applied event, or `None` to start from the beginning
    /// * `limit` - Maximum batch size
    ///
    /// # Returns
    /// An empty vector once the source is exhausted.
    async fn next_batch(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<PoolEvent>, SourceError>;
}

/// Error type for event source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Underlying read failed; may succeed on retry
    Io(String),
    /// A line could not be decoded into a `PoolEvent`
    Parse { line: usize, message: String },
    /// Other error
    Other(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Io(_))
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(msg) => write!(f, "I/O error: {}", msg),
            SourceError::Parse { line, message } => {
                write!(f, "Parse error on line {}: {}", line, message)
            }
            SourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Slice of an ordered event list strictly after `after`, capped at `limit`.
pub(crate) fn batch_after(
    events: &[PoolEvent],
    after: Option<EventPosition>,
    limit: usize,
) -> Vec<PoolEvent> {
    let start = match after {
        Some(position) => events.partition_point(|e| e.meta.position() <= position),
        None => 0,
    };
    events.iter().skip(start).take(limit).cloned().collect()
}

/// Stable sort into delivery order; events sharing a position keep their input order.
pub(crate) fn sort_by_position(events: &mut [PoolEvent]) {
    events.sort_by_key(|e| e.meta.position());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Parse {
            line: 3,
            message: "missing field `event`".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error on line 3: missing field `event`");
        assert!(!err.is_transient());
        assert!(SourceError::Io("disk".to_string()).is_transient());
    }
}
