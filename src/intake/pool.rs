//! Bounded pool for order processing.
//!
//! `submit` waits for a free slot before spawning, so a saturated pool pushes back on
//! intake instead of queueing without limit.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    Closed,
}

#[derive(Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    tasks: TaskTracker,
    size: usize,
}

impl WorkerPool {
    /// A pool running at most `size` tasks at once (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            tasks: TaskTracker::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks currently running.
    pub fn busy(&self) -> usize {
        self.size - self.slots.available_permits()
    }

    pub async fn submit<F>(&self, task: F) -> Result<JoinHandle<F::Output>, PoolError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        Ok(self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        }))
    }

    /// Refuses new work and waits for running tasks to finish.
    pub async fn drain(&self) {
        self.slots.close();
        self.tasks.close();
        info!(running = self.tasks.len(), "Draining worker pool");
        self.tasks.wait().await;
    }
}
