//! Pool and account rows.

use super::{decimal_col, parsed_col, u64_col, Repository};
use crate::domain::{Account, Address, Pool, Timestamp};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

impl Repository {
    /// Load a pool by contract address.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn load_pool(&self, id: &Address) -> Result<Option<Pool>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, reserve_a, reserve_b, total_supply, cumulative_volume,
                   added_a, added_b, removed_a, removed_b, created_at, updated_at
            FROM pools
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| pool_from_row(&r)).transpose()
    }

    /// Load an account by address.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn load_account(&self, id: &Address) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, pool, lp_balance, share_of_pool, last_activity, tx_count
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| account_from_row(&r)).transpose()
    }

    /// Load every existing account among `ids`; unknown addresses are skipped.
    ///
    /// # Errors
    /// Returns an error if any query fails.
    pub async fn load_accounts(&self, ids: &[Address]) -> Result<Vec<Account>, sqlx::Error> {
        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(account) = self.load_account(id).await? {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    /// Accounts first observed in `pool`, largest LP balance first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored value cannot be decoded.
    pub async fn list_pool_accounts(&self, pool: &Address) -> Result<Vec<Account>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, pool, lp_balance, share_of_pool, last_activity, tx_count
            FROM accounts
            WHERE pool = ?
            ORDER BY id ASC
            "#,
        )
        .bind(pool.to_string())
        .fetch_all(&self.pool)
        .await?;

        // Balances are TEXT, so the ordering has to happen after decoding.
        let mut accounts = rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        accounts.sort_by(|a, b| b.lp_balance.cmp(&a.lp_balance).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }
}

pub(super) async fn upsert_pool(conn: &mut SqliteConnection, pool: &Pool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pools (
            id, reserve_a, reserve_b, total_supply, cumulative_volume,
            added_a, added_b, removed_a, removed_b, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            reserve_a = excluded.reserve_a,
            reserve_b = excluded.reserve_b,
            total_supply = excluded.total_supply,
            cumulative_volume = excluded.cumulative_volume,
            added_a = excluded.added_a,
            added_b = excluded.added_b,
            removed_a = excluded.removed_a,
            removed_b = excluded.removed_b,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(pool.id.to_string())
    .bind(pool.reserves[0].to_canonical_string())
    .bind(pool.reserves[1].to_canonical_string())
    .bind(pool.total_supply.to_canonical_string())
    .bind(pool.cumulative_volume.to_canonical_string())
    .bind(pool.liquidity_added[0].to_canonical_string())
    .bind(pool.liquidity_added[1].to_canonical_string())
    .bind(pool.liquidity_removed[0].to_canonical_string())
    .bind(pool.liquidity_removed[1].to_canonical_string())
    .bind(pool.created_at.as_secs())
    .bind(pool.updated_at.as_secs())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn upsert_account(
    conn: &mut SqliteConnection,
    account: &Account,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, pool, lp_balance, share_of_pool, last_activity, tx_count)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            lp_balance = excluded.lp_balance,
            share_of_pool = excluded.share_of_pool,
            last_activity = excluded.last_activity,
            tx_count = excluded.tx_count
        "#,
    )
    .bind(account.id.to_string())
    .bind(account.pool.to_string())
    .bind(account.lp_balance.to_canonical_string())
    .bind(account.share_of_pool.to_canonical_string())
    .bind(account.last_activity.as_secs())
    .bind(account.tx_count as i64)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn pool_from_row(row: &SqliteRow) -> Result<Pool, sqlx::Error> {
    Ok(Pool {
        id: parsed_col(row, "id")?,
        reserves: [decimal_col(row, "reserve_a")?, decimal_col(row, "reserve_b")?],
        total_supply: decimal_col(row, "total_supply")?,
        cumulative_volume: decimal_col(row, "cumulative_volume")?,
        liquidity_added: [decimal_col(row, "added_a")?, decimal_col(row, "added_b")?],
        liquidity_removed: [decimal_col(row, "removed_a")?, decimal_col(row, "removed_b")?],
        created_at: Timestamp::new(row.try_get("created_at")?),
        updated_at: Timestamp::new(row.try_get("updated_at")?),
    })
}

fn account_from_row(row: &SqliteRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        id: parsed_col(row, "id")?,
        pool: parsed_col(row, "pool")?,
        lp_balance: decimal_col(row, "lp_balance")?,
        share_of_pool: decimal_col(row, "share_of_pool")?,
        last_activity: Timestamp::new(row.try_get("last_activity")?),
        tx_count: u64_col(row, "tx_count")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::{init_db, Repository};
    use crate::domain::{Account, Address, Decimal, Pool, Timestamp};
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

    #[tokio::test]
    async fn test_pool_upsert_roundtrip_keeps_precision() {
        let (repo, _temp) = setup_test_db().await;
        let mut pool = Pool::new(Address::new([9; 20]), Timestamp::new(100));
        pool.reserves = [
            "123456789012345678.000000000001".parse().unwrap(),
            Decimal::from(-3i64),
        ];
        pool.total_supply = Decimal::from(10u64);

        let mut conn = repo.pool().acquire().await.unwrap();
        super::upsert_pool(&mut conn, &pool).await.unwrap();
        pool.updated_at = Timestamp::new(200);
        super::upsert_pool(&mut conn, &pool).await.unwrap();
        drop(conn);

        let loaded = repo.load_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(loaded, pool);
    }

    #[tokio::test]
    async fn test_pool_accounts_sorted_by_balance() {
        let (repo, _temp) = setup_test_db().await;
        let pool = Address::new([9; 20]);
        let mut conn = repo.pool().acquire().await.unwrap();
        for (byte, balance) in [(1u8, 5u64), (2, 50), (3, 9)] {
            let mut account = Account::new(Address::new([byte; 20]), pool, Timestamp::new(1));
            account.lp_balance = Decimal::from(balance);
            super::upsert_account(&mut conn, &account).await.unwrap();
        }
        drop(conn);

        let balances: Vec<Decimal> = repo
            .list_pool_accounts(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.lp_balance)
            .collect();
        assert_eq!(
            balances,
            vec![Decimal::from(50u64), Decimal::from(9u64), Decimal::from(5u64)]
        );

        let loaded = repo
            .load_accounts(&[Address::new([1; 20]), Address::new([7; 20])])
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
