use super::accountant::Accountant;
use super::store::EntityStore;
use super::EngineError;
use crate::domain::{
    Address, AssetIndex, Decimal, EventMeta, HistoricalRecord, LiquidityChange, PoolTransaction,
    RemoveLiquidityOne, TransactionKind,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Add,
    Remove,
}

impl<S: EntityStore> Accountant<'_, S> {
    /// # Errors
    /// Returns `EngineError::ZeroTotalSupply` under the halt policy.
    pub fn handle_add_liquidity(
        &mut self,
        meta: &EventMeta,
        change: &LiquidityChange,
    ) -> Result<(), EngineError> {
        self.apply_liquidity(
            meta,
            change.provider,
            change.token_amounts.clone(),
            &change.token_supply,
            Direction::Add,
            TransactionKind::AddLiquidity,
        )
    }

    /// Proportional or imbalanced withdrawal; `kind` tags the resulting transaction record.
    ///
    /// # Errors
    /// Returns `EngineError::ZeroTotalSupply` under the halt policy.
    pub fn handle_remove_liquidity(
        &mut self,
        meta: &EventMeta,
        change: &LiquidityChange,
        kind: TransactionKind,
    ) -> Result<(), EngineError> {
        self.apply_liquidity(
            meta,
            change.provider,
            change.token_amounts.clone(),
            &change.token_supply,
            Direction::Remove,
            kind,
        )
    }

    /// Single-asset withdrawal of `coin_amount` units of `token_id`.
    ///
    /// # Errors
    /// Returns `EngineError::ZeroTotalSupply` under the halt policy.
    pub fn handle_remove_liquidity_one(
        &mut self,
        meta: &EventMeta,
        removal: &RemoveLiquidityOne,
    ) -> Result<(), EngineError> {
        self.apply_liquidity(
            meta,
            removal.provider,
            removal.amounts(),
            &removal.token_supply,
            Direction::Remove,
            TransactionKind::RemoveLiquidityOne,
        )
    }

    /// Shared liquidity path. The event's supply replaces the stored one, then every account
    /// whose LP balance in this pool moved earlier in the transaction gets its share refreshed
    /// against it.
    fn apply_liquidity(
        &mut self,
        meta: &EventMeta,
        provider: Address,
        amounts: [Decimal; 2],
        new_supply: &Decimal,
        direction: Direction,
        kind: TransactionKind,
    ) -> Result<(), EngineError> {
        let at = meta.block_timestamp;
        let pool_id = meta.contract_address;

        let mut pool = self.store.get_or_create_pool(pool_id, at);
        for asset in [AssetIndex::A, AssetIndex::B] {
            let i = asset.index();
            match direction {
                Direction::Add => {
                    pool.reserves[i] += &amounts[i];
                    pool.liquidity_added[i] += &amounts[i];
                }
                Direction::Remove => {
                    pool.reserves[i] -= &amounts[i];
                    pool.liquidity_removed[i] += &amounts[i];
                }
            }
        }
        pool.total_supply = new_supply.clone();
        pool.updated_at = at;
        self.store.save_pool(pool.clone());
        self.snapshot_pool(&pool, meta);

        if !self.ctx.has_seen(&pool_id, "Transfer") {
            debug!(
                pool = %pool_id,
                position = %meta.position(),
                kind = %kind,
                "liquidity event without a preceding LP transfer in its transaction"
            );
        }

        let mut account = self.store.get_or_create_account(provider, pool_id, at);
        account.touch(at);
        self.refresh_share(&mut account, &pool, meta)?;
        self.store.save_account(account);
        self.snapshot_account(&provider, meta);

        let movers: Vec<Address> = self
            .ctx
            .lp_movers_in(&pool_id)
            .filter(|id| **id != provider)
            .copied()
            .collect();
        for id in movers {
            let mut mover = self.store.get_or_create_account(id, pool_id, at);
            self.refresh_share(&mut mover, &pool, meta)?;
            self.store.save_account(mover);
            self.snapshot_account(&id, meta);
        }

        self.write_record(HistoricalRecord::PoolTransaction(PoolTransaction {
            id: meta.event_id(),
            pool: pool_id,
            account: provider,
            kind,
            sold_asset: None,
            amounts,
            position: meta.position(),
            tx_hash: meta.transaction_hash,
            timestamp: at,
        }));
        Ok(())
    }
}
