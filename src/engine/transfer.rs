use super::accountant::Accountant;
use super::store::EntityStore;
use super::EngineError;
use crate::domain::{EventMeta, Transfer};
use tracing::trace;

impl<S: EntityStore> Accountant<'_, S> {
    /// Move LP tokens between accounts.
    ///
    /// Mints and burns only move the counterparty's balance; the liquidity event that follows
    /// in the same transaction sets the new supply and refreshes shares. Ordinary transfers
    /// refresh both shares against the supply currently stored.
    ///
    /// # Errors
    /// Returns `EngineError::ZeroTotalSupply` under the halt policy.
    pub fn handle_transfer(&mut self, meta: &EventMeta, transfer: &Transfer) -> Result<(), EngineError> {
        let at = meta.block_timestamp;
        let pool_id = meta.contract_address;

        if transfer.sender.is_zero() && transfer.receiver.is_zero() {
            trace!(position = %meta.position(), "transfer between null addresses");
            return Ok(());
        }

        // Registers the pool on first sight; mint/burn leave its aggregates alone.
        let pool = self.store.get_or_create_pool(pool_id, at);

        if transfer.sender.is_zero() {
            let mut receiver = self.store.get_or_create_account(transfer.receiver, pool_id, at);
            receiver.lp_balance += &transfer.value;
            self.store.save_account(receiver);
            self.ctx.note_lp_movement(pool_id, transfer.receiver);
            self.snapshot_account(&transfer.receiver, meta);
            return Ok(());
        }

        if transfer.receiver.is_zero() {
            let mut sender = self.store.get_or_create_account(transfer.sender, pool_id, at);
            sender.lp_balance -= &transfer.value;
            self.store.save_account(sender);
            self.ctx.note_lp_movement(pool_id, transfer.sender);
            self.snapshot_account(&transfer.sender, meta);
            return Ok(());
        }

        // Sender is saved before the receiver is loaded so a self-transfer nets to zero.
        let mut sender = self.store.get_or_create_account(transfer.sender, pool_id, at);
        sender.lp_balance -= &transfer.value;
        self.refresh_share(&mut sender, &pool, meta)?;
        self.store.save_account(sender);

        let mut receiver = self.store.get_or_create_account(transfer.receiver, pool_id, at);
        receiver.lp_balance += &transfer.value;
        self.refresh_share(&mut receiver, &pool, meta)?;
        self.store.save_account(receiver);

        self.ctx.note_lp_movement(pool_id, transfer.sender);
        self.ctx.note_lp_movement(pool_id, transfer.receiver);
        self.snapshot_account(&transfer.sender, meta);
        self.snapshot_account(&transfer.receiver, meta);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        Address, Decimal, EventMeta, Pool, RecordFamily, Timestamp, Transfer, TxHash,
    };
    use crate::engine::{
        Accountant, EngineError, EntityStore, MemoryStore, TxContext, ZeroSupplyPolicy,
    };

    fn pool_addr() -> Address {
        Address::new([9; 20])
    }

    fn meta(log_index: u32) -> EventMeta {
        EventMeta::new(TxHash::new([1; 32]), log_index, 10, Timestamp::new(100), pool_addr())
    }

    fn transfer(sender: u8, receiver: u8, value: u64) -> Transfer {
        Transfer {
            sender: Address::new([sender; 20]),
            receiver: Address::new([receiver; 20]),
            value: Decimal::from(value),
        }
    }

    fn store_with_supply(supply: u64) -> MemoryStore {
        let mut pool = Pool::new(pool_addr(), Timestamp::new(1));
        pool.total_supply = Decimal::from(supply);
        MemoryStore::preloaded(vec![pool], vec![])
    }

    #[test]
    fn test_mint_credits_receiver_without_share() {
        let mut store = MemoryStore::new();
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Halt);
        acct.handle_transfer(&meta(0), &transfer(0, 1, 500)).unwrap();
        let outcome = acct.finish();
        assert!(outcome.zero_supply_reports.is_empty());

        let account = store.account(&Address::new([1; 20])).unwrap();
        assert_eq!(account.lp_balance, Decimal::from(500u64));
        assert!(account.share_of_pool.is_zero());
        assert_eq!(account.tx_count, 0);
        assert_eq!(store.pool(&pool_addr()).unwrap().total_supply, Decimal::zero());
        assert!(ctx.lp_movers_in(&pool_addr()).any(|a| *a == Address::new([1; 20])));
    }

    #[test]
    fn test_burn_debits_sender() {
        let mut store = store_with_supply(1_000);
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Report);
        acct.handle_transfer(&meta(0), &transfer(0, 1, 1_000)).unwrap();
        acct.handle_transfer(&meta(1), &transfer(1, 0, 400)).unwrap();
        assert_eq!(
            store.account(&Address::new([1; 20])).unwrap().lp_balance,
            Decimal::from(600u64)
        );
    }

    #[test]
    fn test_ordinary_transfer_refreshes_both_shares() {
        let mut store = store_with_supply(1_000);
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Halt);
        acct.handle_transfer(&meta(0), &transfer(0, 1, 1_000)).unwrap();
        acct.handle_transfer(&meta(1), &transfer(1, 2, 250)).unwrap();
        acct.finish();

        let sender = store.account(&Address::new([1; 20])).unwrap();
        let receiver = store.account(&Address::new([2; 20])).unwrap();
        assert_eq!(sender.lp_balance, Decimal::from(750u64));
        assert_eq!(sender.share_of_pool, "0.75".parse::<Decimal>().unwrap());
        assert_eq!(receiver.share_of_pool, "0.25".parse::<Decimal>().unwrap());
        assert_eq!(store.record_count(RecordFamily::AccountSnapshot), 3);
    }

    #[test]
    fn test_self_transfer_is_neutral() {
        let mut store = store_with_supply(1_000);
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Halt);
        acct.handle_transfer(&meta(0), &transfer(0, 1, 1_000)).unwrap();
        acct.handle_transfer(&meta(1), &transfer(1, 1, 300)).unwrap();
        acct.finish();

        let account = store.account(&Address::new([1; 20])).unwrap();
        assert_eq!(account.lp_balance, Decimal::from(1_000u64));
        assert_eq!(account.share_of_pool, Decimal::one());
    }

    #[test]
    fn test_ordinary_transfer_on_empty_pool_halts() {
        let mut store = MemoryStore::new();
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Halt);
        let err = acct.handle_transfer(&meta(0), &transfer(1, 2, 5)).unwrap_err();
        assert!(matches!(err, EngineError::ZeroTotalSupply { .. }));
    }

    #[test]
    fn test_ordinary_transfer_on_empty_pool_reports() {
        let mut store = MemoryStore::new();
        let mut ctx = TxContext::new();
        let mut acct = Accountant::new(&mut store, &mut ctx, ZeroSupplyPolicy::Report);
        acct.handle_transfer(&meta(0), &transfer(1, 2, 5)).unwrap();
        let outcome = acct.finish();
        assert_eq!(outcome.zero_supply_reports.len(), 2);

        let sender = store.load_account(&Address::new([1; 20])).unwrap();
        assert_eq!(sender.lp_balance, Decimal::from(-5i64), "negative balance is kept");
        assert!(sender.share_of_pool.is_zero());
    }
}
