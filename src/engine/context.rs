//! Same-transaction context threaded through the handlers.
//!
//! A liquidity operation emits its LP `Transfer` (mint or burn) before the liquidity event
//! itself. The transfer moves balances against the stale supply; the liquidity event sets the
//! new supply and must then refresh the share of every account whose balance moved earlier in
//! the same transaction. This context remembers those accounts, keyed by the pool whose LP
//! token moved, since one transaction can touch several pools.

use crate::domain::{Address, EventMeta, TxHash};
use std::collections::BTreeSet;

/// An event already applied within the current transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenEvent {
    pub pool: Address,
    pub log_index: u32,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxContext {
    tx_hash: Option<TxHash>,
    seen: Vec<SeenEvent>,
    /// `(pool, account)` pairs.
    lp_movers: BTreeSet<(Address, Address)>,
}

impl TxContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to the event's transaction, forgetting the previous one if it differs.
    pub fn enter(&mut self, meta: &EventMeta) {
        if self.tx_hash != Some(meta.transaction_hash) {
            self.tx_hash = Some(meta.transaction_hash);
            self.seen.clear();
            self.lp_movers.clear();
        }
    }

    pub fn tx_hash(&self) -> Option<&TxHash> {
        self.tx_hash.as_ref()
    }

    pub fn observe(&mut self, meta: &EventMeta, kind: &'static str) {
        self.seen.push(SeenEvent {
            pool: meta.contract_address,
            log_index: meta.log_index,
            kind,
        });
    }

    pub fn seen(&self) -> &[SeenEvent] {
        &self.seen
    }

    /// True if an event of `kind` from `pool` was already applied in this transaction.
    pub fn has_seen(&self, pool: &Address, kind: &str) -> bool {
        self.seen.iter().any(|e| e.pool == *pool && e.kind == kind)
    }

    pub fn note_lp_movement(&mut self, pool: Address, account: Address) {
        self.lp_movers.insert((pool, account));
    }

    /// Accounts whose `pool` LP balance changed earlier in this transaction, in address order.
    pub fn lp_movers_in<'a>(&'a self, pool: &'a Address) -> impl Iterator<Item = &'a Address> + 'a {
        self.lp_movers
            .iter()
            .filter(move |(p, _)| p == pool)
            .map(|(_, account)| account)
    }
}
