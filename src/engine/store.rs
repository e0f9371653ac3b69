//! Entity store abstraction and its in-memory implementation.
//!
//! Handlers only ever see `EntityStore`. The ledger runs them against a `MemoryStore` that was
//! preloaded from SQLite and commits the resulting `UnitOfWork` in one transaction; tests run
//! them against a bare `MemoryStore`.

use crate::domain::{
    Account, Address, HistoricalRecord, Pool, RecordFamily, RecordId, Timestamp,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Outcome of a get-or-create lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Created(T),
    Existing(T),
}

impl<T> Fetched<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Fetched::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Created(v) | Fetched::Existing(v) => v,
        }
    }
}

/// Load/save primitives over accounts, pools and historical records.
pub trait EntityStore {
    fn load_account(&self, id: &Address) -> Option<Account>;
    fn save_account(&mut self, account: Account);
    fn load_pool(&self, id: &Address) -> Option<Pool>;
    fn save_pool(&mut self, pool: Pool);
    fn load_record(&self, family: RecordFamily, id: &RecordId) -> Option<HistoricalRecord>;
    fn insert_record(&mut self, record: HistoricalRecord);

    /// Load an account, creating and persisting a zeroed one on first observation.
    fn get_or_create_account(&mut self, id: Address, pool: Address, at: Timestamp) -> Account {
        if let Some(existing) = self.load_account(&id) {
            return existing;
        }
        let account = Account::new(id, pool, at);
        self.save_account(account.clone());
        account
    }

    /// Load a pool, creating and persisting a zeroed one on first observation.
    fn get_or_create_pool(&mut self, id: Address, at: Timestamp) -> Pool {
        if let Some(existing) = self.load_pool(&id) {
            return existing;
        }
        let pool = Pool::new(id, at);
        self.save_pool(pool.clone());
        pool
    }

    /// Return the stored record for `id`, or build, persist and return a new one.
    ///
    /// `build` only runs when the record is absent, so an existing record is never
    /// overwritten.
    fn get_or_create_record<F>(
        &mut self,
        family: RecordFamily,
        id: &RecordId,
        build: F,
    ) -> Fetched<HistoricalRecord>
    where
        F: FnOnce() -> HistoricalRecord,
    {
        if let Some(existing) = self.load_record(family, id) {
            return Fetched::Existing(existing);
        }
        let record = build();
        debug_assert_eq!(record.id(), id);
        debug_assert_eq!(record.family(), family);
        self.insert_record(record.clone());
        Fetched::Created(record)
    }
}

/// Everything a handler run changed, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    pub pools: Vec<Pool>,
    pub accounts: Vec<Account>,
    pub records: Vec<HistoricalRecord>,
}

impl UnitOfWork {
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty() && self.accounts.is_empty() && self.records.is_empty()
    }
}

/// HashMap-backed store that tracks what changed since it was loaded.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: BTreeMap<Address, Account>,
    pools: BTreeMap<Address, Pool>,
    records: HashMap<(RecordFamily, RecordId), HistoricalRecord>,
    dirty_accounts: BTreeSet<Address>,
    dirty_pools: BTreeSet<Address>,
    new_records: Vec<(RecordFamily, RecordId)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with already-persisted aggregates; nothing starts dirty.
    pub fn preloaded(
        pools: impl IntoIterator<Item = Pool>,
        accounts: impl IntoIterator<Item = Account>,
    ) -> Self {
        Self {
            pools: pools.into_iter().map(|p| (p.id, p)).collect(),
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            ..Self::default()
        }
    }

    pub fn account(&self, id: &Address) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn pool(&self, id: &Address) -> Option<&Pool> {
        self.pools.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoricalRecord> {
        self.records.values()
    }

    pub fn record_count(&self, family: RecordFamily) -> usize {
        self.records.keys().filter(|(f, _)| *f == family).count()
    }

    /// Drain the changes made since load (or since the last drain).
    pub fn take_unit_of_work(&mut self) -> UnitOfWork {
        let pools = std::mem::take(&mut self.dirty_pools)
            .into_iter()
            .filter_map(|id| self.pools.get(&id).cloned())
            .collect();
        let accounts = std::mem::take(&mut self.dirty_accounts)
            .into_iter()
            .filter_map(|id| self.accounts.get(&id).cloned())
            .collect();
        let records = std::mem::take(&mut self.new_records)
            .into_iter()
            .filter_map(|key| self.records.get(&key).cloned())
            .collect();
        UnitOfWork {
            pools,
            accounts,
            records,
        }
    }
}

impl EntityStore for MemoryStore {
    fn load_account(&self, id: &Address) -> Option<Account> {
        self.accounts.get(id).cloned()
    }

    fn save_account(&mut self, account: Account) {
        self.dirty_accounts.insert(account.id);
        self.accounts.insert(account.id, account);
    }

    fn load_pool(&self, id: &Address) -> Option<Pool> {
        self.pools.get(id).cloned()
    }

    fn save_pool(&mut self, pool: Pool) {
        self.dirty_pools.insert(pool.id);
        self.pools.insert(pool.id, pool);
    }

    fn load_record(&self, family: RecordFamily, id: &RecordId) -> Option<HistoricalRecord> {
        self.records.get(&(family, id.clone())).cloned()
    }

    fn insert_record(&mut self, record: HistoricalRecord) {
        let key = (record.family(), record.id().clone());
        if !self.records.contains_key(&key) {
            self.new_records.push(key.clone());
        }
        self.records.insert(key, record);
    }
}
