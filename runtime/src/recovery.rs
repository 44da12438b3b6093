//! One-shot recovery pass over stuck transactions.
//!
//! This module is deliberately not a scheduler: it exposes a function
//! that re-drives whatever `Repository::scan_stuck` currently reports,
//! and returns. Wiring a timer around it (a `tokio::time::interval`
//! loop, a cron-style external trigger, whatever the host prefers) is
//! the host application's job.

use chrono::Duration;
use tracing::{info, warn};

use tyloo_core::context::TxStatus;
use tyloo_core::error::TylooError;
use tyloo_core::repository::Repository;
use tyloo_core::transaction::Transaction;

use crate::invoker::ParticipantInvoker;
use crate::manager::run_phase;

#[derive(Debug, Clone, Copy)]
pub struct RecoveryConfig {
    /// How long a TRYING transaction may sit untouched before recovery
    /// treats its initiator as abandoned and cancels it.
    pub trying_timeout: Duration,
    /// Transactions whose `retried_count` reaches this bound are left
    /// alone (quarantined) rather than retried forever.
    pub max_retries: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            trying_timeout: Duration::seconds(60),
            max_retries: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Confirmed,
    Cancelled,
    /// Still within its TRYING grace period; left alone this pass.
    StillTrying,
    /// Exceeded `max_retries`; left alone for an operator to inspect.
    Quarantined,
}

/// Re-drive a single stuck transaction towards a terminal state.
pub async fn recover_one(
    repository: &dyn Repository,
    invoker: &dyn ParticipantInvoker,
    config: &RecoveryConfig,
    mut tx: Transaction,
) -> Result<RecoveryOutcome, TylooError> {
    if tx.retried_count >= config.max_retries {
        warn!(
            xid = %tx.xid,
            retries = tx.retried_count,
            "quarantining transaction after exceeding the retry bound"
        );
        return Ok(RecoveryOutcome::Quarantined);
    }

    match tx.status {
        TxStatus::Trying => {
            if tx.age_since_update() < config.trying_timeout {
                return Ok(RecoveryOutcome::StillTrying);
            }
            tx.retried_count += 1;
            tx.set_status(TxStatus::Cancelling);
            repository
                .update(&mut tx)
                .await
                .map_err(TylooError::Repository)?;
            run_phase(invoker, repository, &tx, false).await?;
            info!(xid = %tx.xid, "recovery cancelled an abandoned TRYING transaction");
            Ok(RecoveryOutcome::Cancelled)
        }
        TxStatus::Confirming => {
            tx.retried_count += 1;
            repository
                .update(&mut tx)
                .await
                .map_err(TylooError::Repository)?;
            run_phase(invoker, repository, &tx, true).await?;
            Ok(RecoveryOutcome::Confirmed)
        }
        TxStatus::Cancelling => {
            tx.retried_count += 1;
            repository
                .update(&mut tx)
                .await
                .map_err(TylooError::Repository)?;
            run_phase(invoker, repository, &tx, false).await?;
            Ok(RecoveryOutcome::Cancelled)
        }
    }
}

/// Pull everything `Repository::scan_stuck` currently reports and
/// re-drive each one. Errors from individual transactions do not stop
/// the pass — a jammed participant should not block recovery of
/// everything else — so each result is reported independently.
pub async fn scan_and_recover(
    repository: &dyn Repository,
    invoker: &dyn ParticipantInvoker,
    config: &RecoveryConfig,
) -> Vec<Result<RecoveryOutcome, TylooError>> {
    let stuck = match repository.scan_stuck().await {
        Ok(list) => list,
        Err(e) => return vec![Err(TylooError::Repository(e))],
    };

    let mut results = Vec::with_capacity(stuck.len());
    for tx in stuck {
        results.push(recover_one(repository, invoker, config, tx).await);
    }
    results
}
