//! Compensable Interceptor: wraps a business call with TRY/CONFIRM/CANCEL
//! orchestration once [`MethodContext`](crate::method_context) has picked
//! a role. ROOT opens a transaction, runs the body, and decides
//! commit/rollback; PROVIDER attaches to an inbound `Context`; NORMAL is
//! the caller's job (the business method itself makes further
//! compensable sub-calls that enlist participants).
//!
//! Modeled as a small async orchestration type handed a closure/async
//! block, the way the teacher wraps handlers with its `Traced<T>`
//! decorator: wrap, don't inject.

use std::future::Future;

use tracing::{error, warn};
use uuid::Uuid;

use tyloo_core::context::Context;
use tyloo_core::transaction::Transaction;
use tyloo_runtime::manager::TransactionManager;

use crate::annotation::CompensableAnnotation;

pub struct CompensableInterceptor<'a> {
    manager: &'a TransactionManager,
}

impl<'a> CompensableInterceptor<'a> {
    pub fn new(manager: &'a TransactionManager) -> Self {
        Self { manager }
    }

    /// ROOT role: begin a new root transaction, run `body`, then commit
    /// on success or decide compensate-now vs. defer on failure based on
    /// `annotation`'s delay-cancel set. `cleanAfterCompletion` always
    /// runs, regardless of which branch was taken.
    pub async fn root_method_proceed<T, F, Fut>(
        &self,
        annotation: &CompensableAnnotation,
        unique_id: Option<Uuid>,
        body: F,
    ) -> Result<T, anyhow::Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let tx = self.manager.begin(unique_id).await?;

        let outcome = match body().await {
            Ok(value) => match self.manager.commit(annotation.async_confirm).await {
                Ok(()) => Ok(value),
                Err(e) => Err(e.into()),
            },
            Err(err) => {
                if annotation.delay_cancel_exceptions.matches(&err) {
                    warn!(xid = %tx.xid, error = %err, "delay-cancel exception; deferring compensation to recovery");
                } else if let Err(rollback_err) = self.manager.rollback(annotation.async_cancel).await {
                    error!(xid = %tx.xid, error = %rollback_err, "rollback failed after business exception");
                }
                Err(err)
            }
        };

        if let Err(e) = self.manager.clean_after_completion(&tx) {
            error!(xid = %tx.xid, error = %e, "cleanAfterCompletion failed after root method");
        }

        outcome
    }

    /// PROVIDER role: dispatch on the inbound `Context`'s phase.
    /// CONFIRMING/CANCELLING swallow `NoExistedTransaction` (the branch
    /// already terminated from a prior delivery) and return `T::default()`
    /// rather than propagating it, per the spec's double-delivery
    /// handling.
    pub async fn provider_method_proceed<T, F, Fut>(
        &self,
        annotation: &CompensableAnnotation,
        ctx: &Context,
        body: F,
    ) -> Result<T, anyhow::Error>
    where
        T: Default,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        use tyloo_core::context::TxStatus;

        match ctx.status {
            TxStatus::Trying => self.provider_trying(ctx, body).await,
            TxStatus::Confirming => {
                self.provider_drive_existing(ctx, true, annotation.async_confirm).await
            }
            TxStatus::Cancelling => {
                self.provider_drive_existing(ctx, false, annotation.async_cancel).await
            }
        }
    }

    async fn provider_trying<T, F, Fut>(&self, ctx: &Context, body: F) -> Result<T, anyhow::Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let tx = self.manager.propagation_new_begin(ctx).await?;
        let result = body().await;
        if let Err(e) = self.manager.clean_after_completion(&tx) {
            error!(xid = %tx.xid, error = %e, "cleanAfterCompletion failed after provider TRYING");
        }
        result
    }

    async fn provider_drive_existing<T: Default>(
        &self,
        ctx: &Context,
        confirm: bool,
        run_async: bool,
    ) -> Result<T, anyhow::Error> {
        let tx: Transaction = match self.manager.propagation_exist_begin(ctx).await {
            Ok(tx) => tx,
            Err(e) if e.is_no_existed_transaction() => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        let phase_result = if confirm {
            self.manager.commit(run_async).await
        } else {
            self.manager.rollback(run_async).await
        };

        if let Err(e) = self.manager.clean_after_completion(&tx) {
            error!(xid = %tx.xid, error = %e, "cleanAfterCompletion failed after provider phase drive");
        }

        phase_result.map(|_| T::default()).map_err(Into::into)
    }
}
