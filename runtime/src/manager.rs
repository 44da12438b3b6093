//! `TransactionManager`: the single place that persists status
//! transitions, drives confirm/cancel phases, and maintains the
//! per-call-chain transaction stack.
//!
//! Grounded on the teacher's `TxBus::finalize(outcome)` — a single
//! method that flips state based on success/failure and leaves the
//! surrounding machinery to decide sync vs. async execution — and on
//! `core`'s `tracing::info_span!`/`.instrument()` logging convention for
//! every state-changing call.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use tyloo_core::context::{Context, TxStatus};
use tyloo_core::error::TylooError;
use tyloo_core::participant::Participant;
use tyloo_core::repository::Repository;
use tyloo_core::transaction::Transaction;

use crate::invoker::ParticipantInvoker;
use crate::pool::WorkerPool;
use crate::stack;

/// Runs one phase (confirm if `confirm`, else cancel) to completion:
/// invoke every participant in enlistment order, then delete the
/// record. Stops and returns `Err` on the first participant failure,
/// leaving the record (still at its current status) for recovery to
/// re-drive — every participant invocation is expected to be
/// idempotent, so re-running the whole phase on retry is safe.
pub(crate) async fn run_phase(
    invoker: &dyn ParticipantInvoker,
    repository: &dyn Repository,
    tx: &Transaction,
    confirm: bool,
) -> Result<(), TylooError> {
    for participant in &tx.participants {
        let descriptor = if confirm {
            &participant.confirm_invocation
        } else {
            &participant.cancel_invocation
        };
        invoker.invoke(descriptor).await.map_err(|detail| {
            if confirm {
                TylooError::Confirming {
                    xid: tx.xid,
                    detail,
                }
            } else {
                TylooError::Cancelling {
                    xid: tx.xid,
                    detail,
                }
            }
        })?;
    }
    repository
        .delete(tx.xid, tx.branch_id)
        .await
        .map_err(TylooError::Repository)?;
    Ok(())
}

pub struct TransactionManager {
    repository: Arc<dyn Repository>,
    invoker: Arc<dyn ParticipantInvoker>,
    pool: WorkerPool,
}

impl TransactionManager {
    pub fn new(
        repository: Arc<dyn Repository>,
        invoker: Arc<dyn ParticipantInvoker>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            repository,
            invoker,
            pool,
        }
    }

    /// ROOT begin: mint (or accept a caller-supplied) xid, persist a new
    /// root record, and push it onto this call chain's stack.
    #[instrument(skip(self))]
    pub async fn begin(&self, unique_id: Option<Uuid>) -> Result<Transaction, TylooError> {
        let xid = unique_id.unwrap_or_else(Uuid::new_v4);
        let tx = Transaction::new_root(xid);
        self.repository
            .create(&tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::push(tx.clone()).map_err(|e| TylooError::System(e.to_string()))?;
        info!(xid = %tx.xid, "began root transaction");
        Ok(tx)
    }

    /// PROVIDER entry, REQUIRES_NEW: mint a fresh branch under the
    /// inbound `Context`'s xid, independent of whatever the caller's
    /// branch was doing.
    #[instrument(skip(self, ctx))]
    pub async fn propagation_new_begin(&self, ctx: &Context) -> Result<Transaction, TylooError> {
        let tx = Transaction::new_branch(ctx.xid, ctx.branch_id);
        self.repository
            .create(&tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::push(tx.clone()).map_err(|e| TylooError::System(e.to_string()))?;
        info!(xid = %tx.xid, branch_id = %ctx.branch_id, "began branch transaction");
        Ok(tx)
    }

    /// PROVIDER entry, REQUIRED/MANDATORY with an inbound `Context`
    /// whose branch already has a persisted record (recovery replay, a
    /// retried delivery): load it, advance its status to match the
    /// inbound phase, and push it onto the stack.
    #[instrument(skip(self, ctx))]
    pub async fn propagation_exist_begin(&self, ctx: &Context) -> Result<Transaction, TylooError> {
        let mut tx = self
            .repository
            .find_by_xid(ctx.xid, Some(ctx.branch_id))
            .await
            .map_err(TylooError::Repository)?
            .ok_or(TylooError::NoExistedTransaction {
                xid: ctx.xid,
                branch_id: Some(ctx.branch_id),
            })?;
        tx.set_status(ctx.status);
        self.repository
            .update(&mut tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::push(tx.clone()).map_err(|e| TylooError::System(e.to_string()))?;
        Ok(tx)
    }

    /// Append a participant to the current stack-top transaction and
    /// persist it immediately — enlistment must survive a crash between
    /// TRY returning and the caller's next move.
    #[instrument(skip(self, participant))]
    pub async fn enlist_participant(&self, participant: Participant) -> Result<(), TylooError> {
        let mut tx = stack::current().ok_or_else(|| {
            TylooError::System("enlistParticipant called with no active transaction".into())
        })?;
        tx.enlist(participant);
        self.repository
            .update(&mut tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::set_top(tx).map_err(|e| TylooError::System(e.to_string()))?;
        Ok(())
    }

    /// Flip the current stack-top transaction to CONFIRMING and run the
    /// confirm phase. If `run_async`, the phase body is dispatched onto
    /// the worker pool and this returns as soon as it is accepted (pool
    /// saturation surfaces as `Confirming`, not a panic or a block);
    /// otherwise the phase runs inline and its outcome is this call's
    /// result.
    #[instrument(skip(self))]
    pub async fn commit(&self, run_async: bool) -> Result<(), TylooError> {
        let mut tx = stack::current()
            .ok_or_else(|| TylooError::System("commit called with no active transaction".into()))?;
        tx.set_status(TxStatus::Confirming);
        self.repository
            .update(&mut tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::set_top(tx.clone()).map_err(|e| TylooError::System(e.to_string()))?;

        if run_async {
            let repository = self.repository.clone();
            let invoker = self.invoker.clone();
            let phase_tx = tx.clone();
            self.pool
                .try_dispatch(async move {
                    if let Err(e) = run_phase(invoker.as_ref(), repository.as_ref(), &phase_tx, true).await
                    {
                        warn!(xid = %phase_tx.xid, error = %e, "async confirm phase failed; left for recovery");
                    }
                })
                .map_err(|e| TylooError::Confirming {
                    xid: tx.xid,
                    detail: e.to_string(),
                })
        } else {
            run_phase(self.invoker.as_ref(), self.repository.as_ref(), &tx, true).await
        }
    }

    /// Flip the current stack-top transaction to CANCELLING and run the
    /// cancel phase, mirroring `commit`.
    #[instrument(skip(self))]
    pub async fn rollback(&self, run_async: bool) -> Result<(), TylooError> {
        let mut tx = stack::current().ok_or_else(|| {
            TylooError::System("rollback called with no active transaction".into())
        })?;
        tx.set_status(TxStatus::Cancelling);
        self.repository
            .update(&mut tx)
            .await
            .map_err(TylooError::Repository)?;
        stack::set_top(tx.clone()).map_err(|e| TylooError::System(e.to_string()))?;

        if run_async {
            let repository = self.repository.clone();
            let invoker = self.invoker.clone();
            let phase_tx = tx.clone();
            self.pool
                .try_dispatch(async move {
                    if let Err(e) =
                        run_phase(invoker.as_ref(), repository.as_ref(), &phase_tx, false).await
                    {
                        warn!(xid = %phase_tx.xid, error = %e, "async cancel phase failed; left for recovery");
                    }
                })
                .map_err(|e| TylooError::Cancelling {
                    xid: tx.xid,
                    detail: e.to_string(),
                })
        } else {
            run_phase(self.invoker.as_ref(), self.repository.as_ref(), &tx, false).await
        }
    }

    /// Pop `tx` off the call-chain stack. Must be called exactly once
    /// per push, after the phase (or its dispatch) has been decided —
    /// mis-nesting (the transaction is not the stack top) is a
    /// programmer error and surfaces as `TylooError::System`.
    pub fn clean_after_completion(&self, tx: &Transaction) -> Result<(), TylooError> {
        stack::pop_if_top(tx.xid, tx.branch_id)
            .map(|_| ())
            .map_err(|e| TylooError::System(e.to_string()))
    }

    pub fn current_transaction(&self) -> Option<Transaction> {
        stack::current()
    }

    pub fn is_transaction_active(&self) -> bool {
        stack::is_active()
    }
}
