use super::{AppliedEvent, ApplyOutcome, LedgerError};
use crate::db::{ProcessedMarker, Repository};
use crate::domain::{Address, PoolEvent};
use crate::engine::{process_event, MemoryStore, TxContext, ZeroSupplyPolicy};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies events one at a time against the repository.
///
/// `apply` takes `&mut self`, so a single ledger can never apply two events concurrently.
pub struct Ledger {
    repo: Arc<Repository>,
    ctx: TxContext,
    policy: ZeroSupplyPolicy,
}

impl Ledger {
    pub fn new(repo: Arc<Repository>, policy: ZeroSupplyPolicy) -> Self {
        Self {
            repo,
            ctx: TxContext::new(),
            policy,
        }
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn policy(&self) -> ZeroSupplyPolicy {
        self.policy
    }

    /// Apply one event and commit everything it produced in a single transaction.
    ///
    /// An event whose coordinates were already processed is skipped. The transaction context
    /// only advances after a successful commit, so a failed event can be retried as is.
    ///
    /// # Errors
    /// Returns `LedgerError::Store` if the database fails (nothing is committed),
    /// `LedgerError::Engine` if the zero-supply policy halts the event, and
    /// `LedgerError::Payload` if the event cannot be encoded for its digest.
    pub async fn apply(&mut self, event: &PoolEvent) -> Result<ApplyOutcome, LedgerError> {
        let meta = &event.meta;
        let position = meta.position();
        let event_id = meta.event_id();
        let digest = event.payload_digest()?;

        if let Some(stored) = self.repo.processed_digest(&event_id).await? {
            if stored != digest {
                warn!(
                    tx = %meta.transaction_hash,
                    log_index = meta.log_index,
                    event = event.kind.name(),
                    "redelivered event differs from the applied one, skipping"
                );
                return Ok(ApplyOutcome::Conflict);
            }
            debug!(tx = %meta.transaction_hash, log_index = meta.log_index, "duplicate event");
            return Ok(ApplyOutcome::Duplicate);
        }

        if let Some(watermark) = self.repo.watermark().await? {
            if position < watermark {
                warn!(
                    position = %position,
                    watermark = %watermark,
                    event = event.kind.name(),
                    "event arrived behind the watermark, applying as delivered"
                );
            }
        }

        let mut ctx = self.ctx.clone();
        ctx.enter(meta);
        let mut store = self.stage(event, &ctx).await?;
        let outcome = process_event(&mut store, &mut ctx, self.policy, event)?;

        let unit = store.take_unit_of_work();
        let marker = ProcessedMarker {
            event_id,
            digest,
            position,
        };
        let records_inserted = self.repo.commit_unit(&unit, &marker).await?;
        self.ctx = ctx;

        debug!(
            position = %position,
            event = event.kind.name(),
            records = records_inserted,
            "event applied"
        );
        Ok(ApplyOutcome::Applied(AppliedEvent {
            records_inserted,
            zero_supply_reports: outcome.zero_supply_reports,
        }))
    }

    /// Load the pool and every account the event may touch, including same-transaction
    /// LP movers that a liquidity event will refresh.
    async fn stage(&self, event: &PoolEvent, ctx: &TxContext) -> Result<MemoryStore, sqlx::Error> {
        let pool = self.repo.load_pool(&event.meta.contract_address).await?;

        let mut ids: Vec<Address> = event.kind.participants();
        ids.extend(ctx.lp_movers_in(&event.meta.contract_address).copied());
        ids.sort();
        ids.dedup();
        let accounts = self.repo.load_accounts(&ids).await?;

        Ok(MemoryStore::preloaded(pool, accounts))
    }
}
