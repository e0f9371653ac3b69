//! Newline-delimited JSON event file.

use super::{batch_after, sort_by_position, EventSource, SourceError};
use crate::domain::{EventPosition, PoolEvent};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Event source backed by a JSONL file, one `PoolEvent` per line. Blank lines are skipped.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    events: Vec<PoolEvent>,
}

impl JsonlEventSource {
    /// Read and decode the whole file.
    ///
    /// # Errors
    /// Returns `SourceError::Io` if the file cannot be read and `SourceError::Parse` for the
    /// first malformed line.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {}", path.display(), e)))?;
        let source = Self::parse(&contents)?;
        info!(path = %path.display(), events = source.len(), "event file loaded");
        Ok(source)
    }

    /// Decode JSONL text already in memory.
    ///
    /// # Errors
    /// Returns `SourceError::Parse` for the first malformed line (1-based).
    pub fn parse(contents: &str) -> Result<Self, SourceError> {
        let mut events = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: PoolEvent =
                serde_json::from_str(trimmed).map_err(|e| SourceError::Parse {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            events.push(event);
        }
        sort_by_position(&mut events);
        debug!(events = events.len(), "parsed event lines");
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn next_batch(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<PoolEvent>, SourceError> {
        Ok(batch_after(&self.events, after, limit))
    }
}
