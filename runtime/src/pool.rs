//! Bounded worker pool for asynchronous confirm/cancel phase execution.
//!
//! Kept separate from the runtime's main task pool so that a slow or
//! wedged participant cannot starve request intake. There is no
//! existing worker-pool primitive to generalize here, so this is built
//! directly from `tokio::sync::Semaphore` + `tokio::spawn`, the same
//! pairing the ecosystem reaches for whenever "n concurrent async jobs,
//! explicit rejection past capacity" is needed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    pub capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("worker pool rejected dispatch: {capacity} permits already in use")]
pub struct PoolRejected {
    pub capacity: usize,
}

/// A bounded pool of tokio tasks. `try_dispatch` never blocks: it fails
/// immediately with [`PoolRejected`] if no slot is free, instead of
/// queuing, so a caller can fall back to leaving the record for recovery
/// rather than stalling the call chain.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.capacity)),
            capacity: config.capacity,
        }
    }

    pub fn try_dispatch<F>(&self, fut: F) -> Result<(), PoolRejected>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| PoolRejected {
                capacity: self.capacity,
            })?;

        tokio::spawn(async move {
            let _permit = permit;
            fut.await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn saturated_pool_rejects_instead_of_blocking() {
        let pool = WorkerPool::new(WorkerPoolConfig { capacity: 1 });
        let hold = Arc::new(Notify::new());
        let hold_task = hold.clone();

        pool.try_dispatch(async move {
            hold_task.notified().await;
        })
        .unwrap();

        let err = pool
            .try_dispatch(async {})
            .expect_err("second dispatch should be rejected while the first holds the only permit");
        assert_eq!(err.capacity, 1);

        hold.notify_one();
    }

    #[tokio::test]
    async fn dispatched_work_actually_runs() {
        let pool = WorkerPool::new(WorkerPoolConfig { capacity: 4 });
        let counter = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(Notify::new());

        for _ in 0..4 {
            let counter = counter.clone();
            let done = done.clone();
            pool.try_dispatch(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                done.notify_one();
            })
            .unwrap();
        }

        for _ in 0..4 {
            done.notified().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
