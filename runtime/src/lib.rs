//! # tyloo-runtime
//!
//! The transaction manager: persisted status transitions, the
//! per-call-chain transaction stack, the bounded async worker pool for
//! confirm/cancel phase execution, and a one-shot recovery pass.

pub mod invoker;
pub mod manager;
pub mod pool;
pub mod recovery;
pub mod stack;

pub mod prelude {
    pub use crate::invoker::ParticipantInvoker;
    pub use crate::manager::TransactionManager;
    pub use crate::pool::{PoolRejected, WorkerPool, WorkerPoolConfig};
    pub use crate::recovery::{recover_one, scan_and_recover, RecoveryConfig, RecoveryOutcome};
    pub use crate::stack::{enter_chain, StackError};
}
