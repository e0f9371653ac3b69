use crate::config::Config;
use crate::datasource::{EventSource, SourceError};
use crate::db::Repository;
use crate::domain::{EventPosition, PoolEvent};
use crate::engine::ZeroSupplyReport;
use crate::ledger::{ApplyOutcome, Ledger, LedgerError};
use backoff::backoff::Backoff;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Pulls batches from an `EventSource` and feeds them to the ledger in delivery order.
pub struct Ingestor {
    source: Arc<dyn EventSource>,
    ledger: Ledger,
    batch_size: usize,
    retry_max_elapsed: Duration,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn EventSource>,
        ledger: Ledger,
        batch_size: usize,
        retry_max_elapsed: Duration,
    ) -> Self {
        Self {
            source,
            ledger,
            batch_size: batch_size.max(1),
            retry_max_elapsed,
        }
    }

    pub fn from_config(source: Arc<dyn EventSource>, repo: Arc<Repository>, config: &Config) -> Self {
        Self::new(
            source,
            Ledger::new(repo, config.zero_supply_policy),
            config.ingest_batch_size,
            config.retry_max_elapsed,
        )
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply every event the source has after the persisted watermark.
    ///
    /// Transient source and store failures are retried with exponential backoff until
    /// the configured elapsed-time budget runs out.
    ///
    /// # Errors
    /// Returns the first permanent error, or a transient one once retries are exhausted.
    /// Events applied before the failure stay committed.
    pub async fn run_to_end(&mut self) -> Result<IngestionReport, IngestionError> {
        let mut report = IngestionReport::default();
        let mut cursor = self
            .ledger
            .repo()
            .watermark()
            .await
            .map_err(LedgerError::from)?;

        info!(resume_after = ?cursor, batch_size = self.batch_size, "ingestion started");

        loop {
            let batch = self.fetch_batch(cursor).await?;
            if batch.is_empty() {
                break;
            }
            info!(events = batch.len(), after = ?cursor, "applying batch");

            for event in &batch {
                match self.apply_with_retry(event).await? {
                    ApplyOutcome::Applied(applied) => {
                        report.applied += 1;
                        report.records_inserted += applied.records_inserted;
                        report
                            .zero_supply_reports
                            .extend(applied.zero_supply_reports);
                    }
                    ApplyOutcome::Duplicate => report.duplicates += 1,
                    ApplyOutcome::Conflict => report.conflicts += 1,
                }
                let position = event.meta.position();
                cursor = Some(cursor.map_or(position, |c| c.max(position)));
            }
        }

        info!(
            applied = report.applied,
            duplicates = report.duplicates,
            conflicts = report.conflicts,
            zero_supply = report.zero_supply_reports.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        }
    }

    async fn fetch_batch(
        &self,
        after: Option<EventPosition>,
    ) -> Result<Vec<PoolEvent>, IngestionError> {
        let limit = self.batch_size;
        let source = self.source.clone();

        let batch = retry(self.backoff_policy(), || {
            let source = source.clone();
            async move {
                source.next_batch(after, limit).await.map_err(|e| {
                    if e.is_transient() {
                        warn!(error = %e, "event source failed, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await?;
        Ok(batch)
    }

    async fn apply_with_retry(&mut self, event: &PoolEvent) -> Result<ApplyOutcome, IngestionError> {
        let mut backoff = self.backoff_policy();
        loop {
            match self.ledger.apply(event).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_transient() => match backoff.next_backoff() {
                    Some(delay) => {
                        warn!(
                            error = %e,
                            position = %event.meta.position(),
                            delay_ms = delay.as_millis() as u64,
                            "store failed, retrying event"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e.into()),
                },
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub applied: usize,
    pub duplicates: usize,
    pub conflicts: usize,
    pub records_inserted: usize,
    pub zero_supply_reports: Vec<ZeroSupplyReport>,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
