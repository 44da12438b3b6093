//! Error kinds for the tyloo transaction core.
//!
//! `NoExistedTransaction` is the one variant callers are expected to match
//! on and swallow (it signals an already-terminated branch, not a fault).
//! Everything else is surfaced to the caller or is fatal.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("transaction with xid {0} already exists")]
    AlreadyExists(Uuid),

    #[error("optimistic lock conflict for xid {xid}: stored version no longer matches expected version {expected}")]
    OptimisticLock { xid: Uuid, expected: u64 },

    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the transaction manager and interceptor.
#[derive(Debug, Error)]
pub enum TylooError {
    /// Expected during provider CONFIRMING/CANCELLING when the branch has
    /// already terminated (a prior call already committed or rolled it
    /// back and deleted the record). Callers match this and return the
    /// declared return type's default value instead of propagating it.
    #[error("no existing transaction for xid {xid:?}, branch {branch_id:?}")]
    NoExistedTransaction {
        xid: Uuid,
        branch_id: Option<Uuid>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A confirm phase body failed; the record is left intact for
    /// recovery to re-drive.
    #[error("confirm phase failed for xid {xid}: {detail}")]
    Confirming { xid: Uuid, detail: String },

    /// A cancel phase body failed; the record is left intact for
    /// recovery to re-drive.
    #[error("cancel phase failed for xid {xid}: {detail}")]
    Cancelling { xid: Uuid, detail: String },

    /// Programmer-facing invariant violation: mis-nested
    /// `cleanAfterCompletion`, MANDATORY propagation with no active
    /// transaction, and the like. Fatal to the current call, never
    /// swallowed.
    #[error("system error: {0}")]
    System(String),
}

impl TylooError {
    pub fn is_no_existed_transaction(&self) -> bool {
        matches!(self, TylooError::NoExistedTransaction { .. })
    }
}
