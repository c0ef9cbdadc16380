//! Bounded worker pool for content fan-out
//!
//! Tasks are spawned immediately but each waits for one of `workers`
//! permits before running, so at most `workers` run at once. `drain` joins
//! everything spawned so far; the coordinator drains after every list page.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct WorkerPool<T> {
    permits: Arc<Semaphore>,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permits = self.permits.clone();
        self.tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            task.await
        });
    }

    /// Number of tasks spawned and not yet joined
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every spawned task and returns their outputs in completion order
    ///
    /// A task that panicked is logged and left out.
    pub async fn drain(&mut self) -> Vec<T> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(output) => outputs.push(output),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        outputs
    }
}
