//! Write-once historical records: audit entries, snapshots and pool transactions.

use super::{decimal_col, parsed_col, position_cols, u32_col, u64_col, Repository};
use crate::domain::{
    AccountSnapshot, Address, AssetIndex, AuditEntry, EventMeta, HistoricalRecord, PoolSnapshot,
    PoolTransaction, RecordFamily, Timestamp, TransactionKind, TxHash,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

pub(super) fn table_for(family: RecordFamily) -> &'static str {
    match family {
        RecordFamily::Audit => "audit_entries",
        RecordFamily::AccountSnapshot => "account_snapshots",
        RecordFamily::PoolSnapshot => "pool_snapshots",
        RecordFamily::PoolTransaction => "pool_transactions",
    }
}

/// Insert a record unless one with the same id already exists. Returns whether it was new.
pub(super) async fn insert_record(
    conn: &mut SqliteConnection,
    record: &HistoricalRecord,
) -> Result<bool, sqlx::Error> {
    let result = match record {
        HistoricalRecord::Audit(entry) => {
            sqlx::query(
                r#"
                INSERT INTO audit_entries (
                    id, event, transaction_hash, log_index, block_number,
                    block_timestamp, contract_address, params
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(entry.id.to_string())
            .bind(&entry.event)
            .bind(entry.meta.transaction_hash.to_string())
            .bind(i64::from(entry.meta.log_index))
            .bind(entry.meta.block_number as i64)
            .bind(entry.meta.block_timestamp.as_secs())
            .bind(entry.meta.contract_address.to_string())
            .bind(&entry.params)
            .execute(&mut *conn)
            .await?
        }
        HistoricalRecord::AccountSnapshot(snap) => {
            sqlx::query(
                r#"
                INSERT INTO account_snapshots (
                    id, account, pool, block_number, log_index, tx_hash, timestamp,
                    lp_balance, share_of_pool
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(snap.id.to_string())
            .bind(snap.account.to_string())
            .bind(snap.pool.to_string())
            .bind(snap.position.block_number as i64)
            .bind(i64::from(snap.position.log_index))
            .bind(snap.tx_hash.to_string())
            .bind(snap.timestamp.as_secs())
            .bind(snap.lp_balance.to_canonical_string())
            .bind(snap.share_of_pool.to_canonical_string())
            .execute(&mut *conn)
            .await?
        }
        HistoricalRecord::PoolSnapshot(snap) => {
            sqlx::query(
                r#"
                INSERT INTO pool_snapshots (
                    id, pool, block_number, log_index, tx_hash, timestamp,
                    reserve_a, reserve_b, total_supply, cumulative_volume
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(snap.id.to_string())
            .bind(snap.pool.to_string())
            .bind(snap.position.block_number as i64)
            .bind(i64::from(snap.position.log_index))
            .bind(snap.tx_hash.to_string())
            .bind(snap.timestamp.as_secs())
            .bind(snap.reserves[0].to_canonical_string())
            .bind(snap.reserves[1].to_canonical_string())
            .bind(snap.total_supply.to_canonical_string())
            .bind(snap.cumulative_volume.to_canonical_string())
            .execute(&mut *conn)
            .await?
        }
        HistoricalRecord::PoolTransaction(tx) => {
            sqlx::query(
                r#"
                INSERT INTO pool_transactions (
                    id, pool, account, kind, sold_asset, amount_a, amount_b,
                    block_number, log_index, tx_hash, timestamp
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(tx.id.to_string())
            .bind(tx.pool.to_string())
            .bind(tx.account.to_string())
            .bind(tx.kind.as_str())
            .bind(tx.sold_asset.map(|a| a.index() as i64))
            .bind(tx.amounts[0].to_canonical_string())
            .bind(tx.amounts[1].to_canonical_string())
            .bind(tx.position.block_number as i64)
            .bind(i64::from(tx.position.log_index))
            .bind(tx.tx_hash.to_string())
            .bind(tx.timestamp.as_secs())
            .execute(&mut *conn)
            .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

impl Repository {
    /// Pool snapshots in delivery order, optionally bounded by block (inclusive).
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn query_pool_snapshots(
        &self,
        pool: &Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<PoolSnapshot>, sqlx::Error> {
        let (from, to) = block_bounds(from_block, to_block);
        let rows = sqlx::query(
            r#"
            SELECT id, pool, block_number, log_index, tx_hash, timestamp,
                   reserve_a, reserve_b, total_supply, cumulative_volume
            FROM pool_snapshots
            WHERE pool = ? AND block_number >= ? AND block_number <= ?
            ORDER BY block_number ASC, log_index ASC
            "#,
        )
        .bind(pool.to_string())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pool_snapshot_from_row).collect()
    }

    /// Swaps and liquidity operations on a pool in delivery order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn query_pool_transactions(
        &self,
        pool: &Address,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<Vec<PoolTransaction>, sqlx::Error> {
        let (from, to) = block_bounds(from_block, to_block);
        let rows = sqlx::query(
            r#"
            SELECT id, pool, account, kind, sold_asset, amount_a, amount_b,
                   block_number, log_index, tx_hash, timestamp
            FROM pool_transactions
            WHERE pool = ? AND block_number >= ? AND block_number <= ?
            ORDER BY block_number ASC, log_index ASC
            "#,
        )
        .bind(pool.to_string())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pool_transaction_from_row).collect()
    }

    /// Every snapshot of an account in delivery order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn query_account_snapshots(
        &self,
        account: &Address,
    ) -> Result<Vec<AccountSnapshot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, account, pool, block_number, log_index, tx_hash, timestamp,
                   lp_balance, share_of_pool
            FROM account_snapshots
            WHERE account = ?
            ORDER BY block_number ASC, log_index ASC
            "#,
        )
        .bind(account.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_snapshot_from_row).collect()
    }

    /// Latest snapshot of an account at or before `block`.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn account_snapshot_at_or_before(
        &self,
        account: &Address,
        block: u64,
    ) -> Result<Option<AccountSnapshot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, account, pool, block_number, log_index, tx_hash, timestamp,
                   lp_balance, share_of_pool
            FROM account_snapshots
            WHERE account = ? AND block_number <= ?
            ORDER BY block_number DESC, log_index DESC
            LIMIT 1
            "#,
        )
        .bind(account.to_string())
        .bind(clamp_block(block))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| account_snapshot_from_row(&r)).transpose()
    }

    /// Audit entries of one transaction, by log index.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn query_audit_entries(&self, tx_hash: &TxHash) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, event, transaction_hash, log_index, block_number,
                   block_timestamp, contract_address, params
            FROM audit_entries
            WHERE transaction_hash = ?
            ORDER BY log_index ASC
            "#,
        )
        .bind(tx_hash.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(audit_entry_from_row).collect()
    }
}

fn clamp_block(block: u64) -> i64 {
    i64::try_from(block).unwrap_or(i64::MAX)
}

fn block_bounds(from_block: Option<u64>, to_block: Option<u64>) -> (i64, i64) {
    (
        from_block.map(clamp_block).unwrap_or(0),
        to_block.map(clamp_block).unwrap_or(i64::MAX),
    )
}

fn audit_entry_from_row(row: &SqliteRow) -> Result<AuditEntry, sqlx::Error> {
    Ok(AuditEntry {
        id: parsed_col(row, "id")?,
        event: row.try_get("event")?,
        meta: EventMeta {
            transaction_hash: parsed_col(row, "transaction_hash")?,
            log_index: u32_col(row, "log_index")?,
            block_number: u64_col(row, "block_number")?,
            block_timestamp: Timestamp::new(row.try_get("block_timestamp")?),
            contract_address: parsed_col(row, "contract_address")?,
        },
        params: row.try_get("params")?,
    })
}

fn account_snapshot_from_row(row: &SqliteRow) -> Result<AccountSnapshot, sqlx::Error> {
    Ok(AccountSnapshot {
        id: parsed_col(row, "id")?,
        account: parsed_col(row, "account")?,
        pool: parsed_col(row, "pool")?,
        position: position_cols(row)?,
        tx_hash: parsed_col(row, "tx_hash")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
        lp_balance: decimal_col(row, "lp_balance")?,
        share_of_pool: decimal_col(row, "share_of_pool")?,
    })
}

fn pool_snapshot_from_row(row: &SqliteRow) -> Result<PoolSnapshot, sqlx::Error> {
    Ok(PoolSnapshot {
        id: parsed_col(row, "id")?,
        pool: parsed_col(row, "pool")?,
        position: position_cols(row)?,
        tx_hash: parsed_col(row, "tx_hash")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
        reserves: [decimal_col(row, "reserve_a")?, decimal_col(row, "reserve_b")?],
        total_supply: decimal_col(row, "total_supply")?,
        cumulative_volume: decimal_col(row, "cumulative_volume")?,
    })
}

fn pool_transaction_from_row(row: &SqliteRow) -> Result<PoolTransaction, sqlx::Error> {
    let kind_raw: String = row.try_get("kind")?;
    let kind = kind_raw
        .parse::<TransactionKind>()
        .map_err(|message| sqlx::Error::ColumnDecode {
            index: "kind".to_string(),
            source: message.into(),
        })?;
    let sold_asset = row
        .try_get::<Option<i64>, _>("sold_asset")?
        .map(|raw| {
            u64::try_from(raw)
                .map_err(|e| sqlx::Error::ColumnDecode {
                    index: "sold_asset".to_string(),
                    source: Box::new(e),
                })
                .and_then(|v| {
                    AssetIndex::try_from(v).map_err(|e| sqlx::Error::ColumnDecode {
                        index: "sold_asset".to_string(),
                        source: Box::new(e),
                    })
                })
        })
        .transpose()?;

    Ok(PoolTransaction {
        id: parsed_col(row, "id")?,
        pool: parsed_col(row, "pool")?,
        account: parsed_col(row, "account")?,
        kind,
        sold_asset,
        amounts: [decimal_col(row, "amount_a")?, decimal_col(row, "amount_b")?],
        position: position_cols(row)?,
        tx_hash: parsed_col(row, "tx_hash")?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}
