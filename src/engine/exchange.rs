use super::accountant::Accountant;
use super::store::EntityStore;
use super::EngineError;
use crate::domain::{
    Decimal, EventMeta, HistoricalRecord, PoolTransaction, TokenExchange, TransactionKind,
};
use tracing::warn;

impl<S: EntityStore> Accountant<'_, S> {
    /// Apply a swap: the sold asset's reserve grows by `tokens_sold`, the other shrinks by
    /// `tokens_bought`, and both legs count toward cumulative volume.
    ///
    /// # Errors
    /// Never fails today; returns `Result` to keep the handler signatures uniform.
    pub fn handle_exchange(
        &mut self,
        meta: &EventMeta,
        exchange: &TokenExchange,
    ) -> Result<(), EngineError> {
        let at = meta.block_timestamp;
        let sold = exchange.sold_id;
        let bought = sold.other();
        if exchange.bought_id != bought {
            warn!(
                position = %meta.position(),
                sold_id = %exchange.sold_id,
                bought_id = %exchange.bought_id,
                "swap buys the asset it sells, treating bought leg as the other asset"
            );
        }

        let mut pool = self.store.get_or_create_pool(meta.contract_address, at);
        pool.reserves[sold.index()] += &exchange.tokens_sold;
        pool.reserves[bought.index()] -= &exchange.tokens_bought;
        pool.cumulative_volume += &exchange.tokens_sold;
        pool.cumulative_volume += &exchange.tokens_bought;
        pool.updated_at = at;
        self.store.save_pool(pool.clone());
        self.snapshot_pool(&pool, meta);

        let mut trader = self
            .store
            .get_or_create_account(exchange.buyer, meta.contract_address, at);
        trader.touch(at);
        self.store.save_account(trader);
        self.snapshot_account(&exchange.buyer, meta);

        let mut amounts = [Decimal::zero(), Decimal::zero()];
        amounts[sold.index()] = exchange.tokens_sold.clone();
        amounts[bought.index()] = exchange.tokens_bought.clone();
        self.write_record(HistoricalRecord::PoolTransaction(PoolTransaction {
            id: meta.event_id(),
            pool: pool.id,
            account: exchange.buyer,
            kind: TransactionKind::Swap,
            sold_asset: Some(sold),
            amounts,
            position: meta.position(),
            tx_hash: meta.transaction_hash,
            timestamp: at,
        }));
        Ok(())
    }
}
