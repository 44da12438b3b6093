//! # tyloo
//!
//! A Try-Confirm-Cancel distributed transaction coordinator: the
//! transaction manager and compensable method interceptor that drive a
//! multi-party business transaction through TRY -> CONFIRM|CANCEL with
//! crash-safe persistence and at-most-once structural mutation per
//! participant-phase.
//!
//! This crate is the facade over the workspace:
//!
//! - [`tyloo_core`] — the data model (`Context`, `Participant`,
//!   `Transaction`) and the `Repository` persistence contract.
//! - [`tyloo_runtime`] — `TransactionManager`, the per-call-chain stack,
//!   the async worker pool, and one-shot recovery.
//! - [`tyloo_interceptor`] — role resolution and TRY/CONFIRM/CANCEL call
//!   orchestration.
//! - [`tyloo_store`] — concrete `Repository` backends (in-memory, sqlx).
//!
//! Re-exported here under their crate names, plus a combined
//! [`prelude`] and a [`Tyloo`] convenience builder that wires a
//! repository and a participant invoker into a ready-to-use
//! [`TransactionManager`](tyloo_runtime::manager::TransactionManager).

pub use tyloo_core as core;
pub use tyloo_interceptor as interceptor;
pub use tyloo_runtime as runtime;
pub use tyloo_store as store;

use std::sync::Arc;

use tyloo_core::repository::Repository;
use tyloo_runtime::invoker::ParticipantInvoker;
use tyloo_runtime::manager::TransactionManager;
use tyloo_runtime::pool::{WorkerPool, WorkerPoolConfig};

/// Wires a [`Repository`] and a [`ParticipantInvoker`] into a
/// [`TransactionManager`] with a bounded async worker pool, the way a
/// host application assembles the coordinator at startup.
pub struct Tyloo;

impl Tyloo {
    /// Build a `TransactionManager` with the default worker pool
    /// configuration (64 concurrent confirm/cancel dispatches).
    pub fn build(
        repository: Arc<dyn Repository>,
        invoker: Arc<dyn ParticipantInvoker>,
    ) -> TransactionManager {
        Self::build_with_pool(repository, invoker, WorkerPoolConfig::default())
    }

    /// Build a `TransactionManager` with an explicit worker pool bound.
    pub fn build_with_pool(
        repository: Arc<dyn Repository>,
        invoker: Arc<dyn ParticipantInvoker>,
        pool_config: WorkerPoolConfig,
    ) -> TransactionManager {
        TransactionManager::new(repository, invoker, WorkerPool::new(pool_config))
    }
}

pub mod prelude {
    pub use crate::Tyloo;

    pub use tyloo_core::context::{Context, ContextCodecError, TxStatus};
    pub use tyloo_core::error::{RepositoryError, TylooError};
    pub use tyloo_core::participant::{InvocationDescriptor, Participant, ParticipantStatus};
    pub use tyloo_core::repository::Repository;
    pub use tyloo_core::transaction::{Transaction, TransactionType};

    pub use tyloo_runtime::invoker::ParticipantInvoker;
    pub use tyloo_runtime::manager::TransactionManager;
    pub use tyloo_runtime::pool::{PoolRejected, WorkerPool, WorkerPoolConfig};
    pub use tyloo_runtime::recovery::{recover_one, scan_and_recover, RecoveryConfig, RecoveryOutcome};
    pub use tyloo_runtime::stack::{enter_chain, StackError};

    pub use tyloo_interceptor::annotation::{
        CompensableAnnotation, DelayCancelRule, DelayCancelSet, Propagation, UniqueIdentitySource,
    };
    pub use tyloo_interceptor::interceptor::CompensableInterceptor;
    pub use tyloo_interceptor::method_context::{
        resolve_role, resolve_unique_identity, MethodContextError, MethodRole,
    };

    #[cfg(feature = "memory")]
    pub use tyloo_store::memory::InMemoryRepository;
}
