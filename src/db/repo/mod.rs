//! Repository layer for database operations.
//!
//! `Repository` owns the connection pool. Methods are split across submodules:
//! - `aggregates.rs` - pool and account rows
//! - `history.rs` - write-once records and their queries

mod aggregates;
mod history;

use crate::domain::{Decimal, EventPosition, RecordFamily, RecordId};
use crate::engine::UnitOfWork;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

/// Delivery bookkeeping written alongside an event's effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMarker {
    pub event_id: RecordId,
    pub digest: String,
    pub position: EventPosition,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Connectivity check used by the readiness endpoint.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Delivery bookkeeping
    // =========================================================================

    /// Digest stored for an already-applied event, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn processed_digest(&self, event_id: &RecordId) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT digest FROM processed_events WHERE event_id = ?")
            .bind(event_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<String, _>("digest")).transpose()
    }

    /// Number of events applied so far.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn processed_count(&self) -> Result<u64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM processed_events")
            .fetch_one(&self.pool)
            .await?;
        u64_col(&row, "n")
    }

    /// Highest event position applied so far.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn watermark(&self) -> Result<Option<EventPosition>, sqlx::Error> {
        let row = sqlx::query("SELECT block_number, log_index FROM ingest_watermark WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| position_cols(&r)).transpose()
    }

    // =========================================================================
    // Atomic commit
    // =========================================================================

    /// Persist everything one event produced in a single transaction: aggregate upserts,
    /// write-once records, the processed marker and the watermark.
    ///
    /// Returns the number of records newly inserted. If any statement fails the whole
    /// transaction is rolled back.
    ///
    /// # Errors
    /// Returns an error if any database operation fails.
    pub async fn commit_unit(
        &self,
        unit: &UnitOfWork,
        marker: &ProcessedMarker,
    ) -> Result<usize, sqlx::Error> {
        let applied_at = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for pool in &unit.pools {
            aggregates::upsert_pool(&mut *tx, pool).await?;
        }
        for account in &unit.accounts {
            aggregates::upsert_account(&mut *tx, account).await?;
        }

        let mut inserted = 0usize;
        for record in &unit.records {
            if history::insert_record(&mut *tx, record).await? {
                inserted += 1;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, digest, block_number, log_index, applied_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(marker.event_id.to_string())
        .bind(&marker.digest)
        .bind(marker.position.block_number as i64)
        .bind(i64::from(marker.position.log_index))
        .bind(&applied_at)
        .execute(&mut *tx)
        .await?;

        // Only ever moves forward; late events leave it in place.
        sqlx::query(
            r#"
            INSERT INTO ingest_watermark (id, block_number, log_index, updated_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                block_number = excluded.block_number,
                log_index = excluded.log_index,
                updated_at = excluded.updated_at
            WHERE excluded.block_number > ingest_watermark.block_number
               OR (excluded.block_number = ingest_watermark.block_number
                   AND excluded.log_index > ingest_watermark.log_index)
            "#,
        )
        .bind(marker.position.block_number as i64)
        .bind(i64::from(marker.position.log_index))
        .bind(&applied_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            position = %marker.position,
            pools = unit.pools.len(),
            accounts = unit.accounts.len(),
            records = inserted,
            "unit committed"
        );
        Ok(inserted)
    }

    /// Row count of one record family.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn record_count(&self, family: RecordFamily) -> Result<u64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) AS n FROM {}", history::table_for(family));
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        u64_col(&row, "n")
    }
}

// =========================================================================
// Column decoding
// =========================================================================

fn decode_err<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

/// Read a TEXT column through `FromStr` (addresses, hashes, ids, decimals).
pub(crate) fn parsed_col<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| decode_err(column, e))
}

pub(crate) fn decimal_col(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    parsed_col::<Decimal>(row, column)
}

pub(crate) fn u64_col(row: &SqliteRow, column: &str) -> Result<u64, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u64::try_from(raw).map_err(|e| decode_err(column, e))
}

pub(crate) fn u32_col(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|e| decode_err(column, e))
}

pub(crate) fn position_cols(row: &SqliteRow) -> Result<EventPosition, sqlx::Error> {
    Ok(EventPosition::new(
        u64_col(row, "block_number")?,
        u32_col(row, "log_index")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::{
        Account, Address, AuditEntry, EventMeta, HistoricalRecord, Pool, Timestamp, TxHash,
    };
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn meta(block: u64, log_index: u32) -> EventMeta {
        EventMeta::new(
            TxHash::new([block as u8; 32]),
            log_index,
            block,
            Timestamp::new(1_000 + block as i64),
            Address::new([9; 20]),
        )
    }

    fn marker(meta: &EventMeta) -> ProcessedMarker {
        ProcessedMarker {
            event_id: meta.event_id(),
            digest: format!("digest-{}", meta.position()),
            position: meta.position(),
        }
    }

    fn unit_for(meta: &EventMeta) -> UnitOfWork {
        let mut pool = Pool::new(meta.contract_address, meta.block_timestamp);
        pool.total_supply = Decimal::from(1_000u64);
        let mut account = Account::new(Address::new([1; 20]), pool.id, meta.block_timestamp);
        account.lp_balance = Decimal::from(250u64);
        account.share_of_pool = "0.25".parse().unwrap();
        UnitOfWork {
            pools: vec![pool],
            accounts: vec![account],
            records: vec![HistoricalRecord::Audit(AuditEntry {
                id: meta.event_id(),
                event: "Transfer".to_string(),
                meta: meta.clone(),
                params: "{}".to_string(),
            })],
        }
    }

    #[tokio::test]
    async fn test_commit_unit_persists_everything() {
        let (repo, _temp) = setup_test_db().await;
        let m = meta(10, 2);

        let inserted = repo.commit_unit(&unit_for(&m), &marker(&m)).await.unwrap();
        assert_eq!(inserted, 1);

        assert_eq!(
            repo.processed_digest(&m.event_id()).await.unwrap(),
            Some("digest-10:2".to_string())
        );
        assert_eq!(repo.watermark().await.unwrap(), Some(EventPosition::new(10, 2)));
        assert_eq!(repo.record_count(RecordFamily::Audit).await.unwrap(), 1);

        let account = repo
            .load_account(&Address::new([1; 20]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.share_of_pool, "0.25".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_records_are_insert_once() {
        let (repo, _temp) = setup_test_db().await;
        let m = meta(10, 2);

        repo.commit_unit(&unit_for(&m), &marker(&m)).await.unwrap();
        let inserted = repo.commit_unit(&unit_for(&m), &marker(&m)).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(repo.record_count(RecordFamily::Audit).await.unwrap(), 1);
        assert_eq!(repo.processed_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_watermark_never_moves_back() {
        let (repo, _temp) = setup_test_db().await;
        let late = meta(5, 0);
        let early_ahead = meta(20, 1);

        repo.commit_unit(&unit_for(&early_ahead), &marker(&early_ahead))
            .await
            .unwrap();
        repo.commit_unit(&unit_for(&late), &marker(&late))
            .await
            .unwrap();

        assert_eq!(repo.watermark().await.unwrap(), Some(EventPosition::new(20, 1)));
        assert_eq!(repo.processed_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_database_has_no_watermark() {
        let (repo, _temp) = setup_test_db().await;
        assert_eq!(repo.watermark().await.unwrap(), None);
        assert!(repo.ping().await.is_ok());
    }
}
