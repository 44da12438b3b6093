//! In-process `Repository` backed by a mutex-guarded map.
//!
//! Grounded on the teacher's `Bus` resource container: a single
//! `parking_lot::Mutex` guarding a `HashMap`, no async locking needed
//! because every operation is a short, non-blocking map mutation.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use tyloo_core::error::RepositoryError;
use tyloo_core::repository::Repository;
use tyloo_core::transaction::Transaction;

type Key = (Uuid, Option<Uuid>);

fn key_of(tx: &Transaction) -> Key {
    (tx.xid, tx.branch_id)
}

/// Repository implementation for tests and single-process deployments.
/// Not crash-safe — records live only as long as the process does.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<Key, Transaction>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create(&self, tx: &Transaction) -> Result<(), RepositoryError> {
        let mut records = self.records.lock();
        let key = key_of(tx);
        if records.contains_key(&key) {
            return Err(RepositoryError::AlreadyExists(tx.xid));
        }
        records.insert(key, tx.clone());
        Ok(())
    }

    async fn update(&self, tx: &mut Transaction) -> Result<(), RepositoryError> {
        let mut records = self.records.lock();
        let key = key_of(tx);
        let stored = records
            .get(&key)
            .ok_or_else(|| RepositoryError::Backend(format!("no transaction for xid {}", tx.xid)))?;
        if stored.version != tx.version {
            return Err(RepositoryError::OptimisticLock {
                xid: tx.xid,
                expected: tx.version,
            });
        }
        tx.version += 1;
        tx.last_update_time = chrono::Utc::now();
        records.insert(key, tx.clone());
        Ok(())
    }

    async fn find_by_xid(
        &self,
        xid: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self.records.lock().get(&(xid, branch_id)).cloned())
    }

    async fn delete(&self, xid: Uuid, branch_id: Option<Uuid>) -> Result<(), RepositoryError> {
        self.records.lock().remove(&(xid, branch_id));
        Ok(())
    }

    async fn scan_stuck(&self) -> Result<Vec<Transaction>, RepositoryError> {
        Ok(self.records.lock().values().cloned().collect())
    }
}
