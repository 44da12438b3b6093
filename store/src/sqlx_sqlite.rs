//! SQLite-backed `Repository`.
//!
//! Same JSONB-document-plus-CAS-columns shape as [`crate::sqlx_repo`], the
//! teacher's pattern of one concrete wrapper per backend
//! (`PgTransaction`/`MySqlTransaction`/`SqliteTransaction` in
//! `extensions/db/src/transaction.rs`) rather than a single type generic
//! over `sqlx::Database`. SQLite binds positionally with `?N` rather than
//! `$N`; everything else about the CAS `update` is identical.
//!
//! ```sql
//! CREATE TABLE tyloo_transactions (
//!     xid         TEXT NOT NULL,
//!     branch_id   TEXT NOT NULL, -- Uuid::nil() stands for "no branch" (root)
//!     version     INTEGER NOT NULL,
//!     record      TEXT NOT NULL, -- JSON
//!     PRIMARY KEY (xid, branch_id)
//! );
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use tyloo_core::error::RepositoryError;
use tyloo_core::repository::Repository;
use tyloo_core::transaction::Transaction;

fn branch_key(branch_id: Option<Uuid>) -> Uuid {
    branch_id.unwrap_or_else(Uuid::nil)
}

/// `Repository` backed by a `sqlx::SqlitePool`.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create(&self, tx: &Transaction) -> Result<(), RepositoryError> {
        let record = serde_json::to_string(tx)
            .map_err(|e| RepositoryError::Backend(format!("serialize transaction: {e}")))?;
        let result = sqlx::query(
            "INSERT INTO tyloo_transactions (xid, branch_id, version, record) \
             VALUES (?1, ?2, ?3, ?4) ON CONFLICT (xid, branch_id) DO NOTHING",
        )
        .bind(tx.xid.to_string())
        .bind(branch_key(tx.branch_id).to_string())
        .bind(tx.version as i64)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists(tx.xid));
        }
        Ok(())
    }

    async fn update(&self, tx: &mut Transaction) -> Result<(), RepositoryError> {
        let expected_version = tx.version as i64;
        tx.last_update_time = chrono::Utc::now();
        let next_version = tx.version + 1;
        let record = serde_json::to_string(&*tx)
            .map_err(|e| RepositoryError::Backend(format!("serialize transaction: {e}")))?;

        let result = sqlx::query(
            "UPDATE tyloo_transactions SET version = ?1, record = ?2 \
             WHERE xid = ?3 AND branch_id = ?4 AND version = ?5",
        )
        .bind(next_version as i64)
        .bind(record)
        .bind(tx.xid.to_string())
        .bind(branch_key(tx.branch_id).to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OptimisticLock {
                xid: tx.xid,
                expected: tx.version,
            });
        }
        tx.version = next_version;
        Ok(())
    }

    async fn find_by_xid(
        &self,
        xid: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT record FROM tyloo_transactions WHERE xid = ?1 AND branch_id = ?2",
        )
        .bind(xid.to_string())
        .bind(branch_key(branch_id).to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        row.map(|(value,)| {
            serde_json::from_str(&value)
                .map_err(|e| RepositoryError::Backend(format!("deserialize transaction: {e}")))
        })
        .transpose()
    }

    async fn delete(&self, xid: Uuid, branch_id: Option<Uuid>) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tyloo_transactions WHERE xid = ?1 AND branch_id = ?2")
            .bind(xid.to_string())
            .bind(branch_key(branch_id).to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn scan_stuck(&self) -> Result<Vec<Transaction>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT record FROM tyloo_transactions")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(|(value,)| {
                serde_json::from_str(&value)
                    .map_err(|e| RepositoryError::Backend(format!("deserialize transaction: {e}")))
            })
            .collect()
    }
}
