//! Repository: the persistence contract. Implementations live in
//! `tyloo-store`; this crate only defines the interface every backend
//! (file, relational, key-value, cache) must satisfy.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::transaction::Transaction;

/// Persists and loads `Transaction` records with optimistic concurrency.
///
/// Implementations MUST make `update` a compare-and-set on `version`: a
/// concurrent writer racing on a stale version gets `OptimisticLock`, never
/// a silent overwrite. `delete` MUST be idempotent — deleting an
/// already-absent record is not an error, since recovery and the live path
/// can both reach the terminal delete for the same transaction.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Insert a brand-new record. Fails if `xid` (+ `branch_id`, for
    /// backends that key branches separately) already exists.
    async fn create(&self, tx: &Transaction) -> Result<(), RepositoryError>;

    /// Compare-and-set by `version`. On success the stored version is
    /// incremented and `tx.version`/`tx.last_update_time` are updated in
    /// place to match; on mismatch returns `OptimisticLock` and `tx` is
    /// left unchanged.
    async fn update(&self, tx: &mut Transaction) -> Result<(), RepositoryError>;

    async fn find_by_xid(
        &self,
        xid: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<Transaction>, RepositoryError>;

    async fn delete(&self, xid: Uuid, branch_id: Option<Uuid>) -> Result<(), RepositoryError>;

    /// Records eligible for recovery — implementation-defined scope (e.g.
    /// every record whose status has not advanced past TRYING within a
    /// threshold). The periodic trigger that calls this on a schedule is
    /// an external collaborator; this method only answers "what's stuck
    /// right now".
    async fn scan_stuck(&self) -> Result<Vec<Transaction>, RepositoryError> {
        Ok(Vec::new())
    }
}
