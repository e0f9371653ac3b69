//! Handler state shared across one event: the store, the transaction context and the
//! zero-supply policy.

use super::context::TxContext;
use super::share::share_of_pool;
use super::store::EntityStore;
use super::{EngineError, ZeroSupplyPolicy, ZeroSupplyReport};
use crate::domain::{
    Account, AccountSnapshot, Address, EventMeta, HistoricalRecord, Pool, PoolSnapshot,
};
use tracing::{debug, warn};

/// Counters produced by one handler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub records_created: usize,
    pub zero_supply_reports: Vec<ZeroSupplyReport>,
}

pub struct Accountant<'a, S: EntityStore> {
    pub(crate) store: &'a mut S,
    pub(crate) ctx: &'a mut TxContext,
    policy: ZeroSupplyPolicy,
    outcome: HandlerOutcome,
}

impl<'a, S: EntityStore> Accountant<'a, S> {
    pub fn new(store: &'a mut S, ctx: &'a mut TxContext, policy: ZeroSupplyPolicy) -> Self {
        Self {
            store,
            ctx,
            policy,
            outcome: HandlerOutcome::default(),
        }
    }

    pub fn store(&self) -> &S {
        self.store
    }

    pub fn finish(self) -> HandlerOutcome {
        self.outcome
    }

    /// Set `account.share_of_pool` from its balance and the pool's current supply.
    ///
    /// # Errors
    /// Returns `EngineError::ZeroTotalSupply` when the supply is zero and the policy is `Halt`.
    pub(crate) fn refresh_share(
        &mut self,
        account: &mut Account,
        pool: &Pool,
        meta: &EventMeta,
    ) -> Result<(), EngineError> {
        let share = share_of_pool(&account.lp_balance, &pool.total_supply);
        if share.degenerate {
            match self.policy {
                ZeroSupplyPolicy::Halt => {
                    return Err(EngineError::ZeroTotalSupply {
                        pool: pool.id,
                        account: account.id,
                        position: meta.position(),
                    });
                }
                ZeroSupplyPolicy::Report => {
                    warn!(
                        pool = %pool.id,
                        account = %account.id,
                        position = %meta.position(),
                        "total supply is zero, storing zero share"
                    );
                    self.outcome.zero_supply_reports.push(ZeroSupplyReport {
                        pool: pool.id,
                        account: account.id,
                        tx_hash: meta.transaction_hash,
                        position: meta.position(),
                    });
                }
            }
        }
        account.share_of_pool = share.value;
        Ok(())
    }

    /// Write-once insert; an existing record with the same id is left untouched.
    pub(crate) fn write_record(&mut self, record: HistoricalRecord) {
        let family = record.family();
        let id = record.id().clone();
        let fetched = self.store.get_or_create_record(family, &id, || record);
        if fetched.was_created() {
            self.outcome.records_created += 1;
        } else {
            debug!(?family, id = %id, "record already present, skipping");
        }
    }

    /// Snapshot the stored state of `account`, so repeated mutations in one event collapse
    /// into their final value.
    pub(crate) fn snapshot_account(&mut self, account: &Address, meta: &EventMeta) {
        if let Some(current) = self.store.load_account(account) {
            self.write_record(HistoricalRecord::AccountSnapshot(AccountSnapshot::capture(
                &current, meta,
            )));
        }
    }

    pub(crate) fn snapshot_pool(&mut self, pool: &Pool, meta: &EventMeta) {
        self.write_record(HistoricalRecord::PoolSnapshot(PoolSnapshot::capture(
            pool, meta,
        )));
    }
}
