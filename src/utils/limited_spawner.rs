use std::future::Future;
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::{JoinError, JoinHandle};

/// Spawns tasks onto the runtime while keeping at most `limit` of them
/// running, and remembers every handle so the whole batch can be joined.
///
/// `spawn` waits for a free slot before the task is started, so submitting
/// work in order also starts it in order.
pub struct LimitedSpawner<T> {
    semaphore: Arc<Semaphore>,
    limit: usize,
    handles: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> LimitedSpawner<T> {
    /// A limit of zero would never start anything, so it is raised to one.
    pub fn new(max_concurrent: usize) -> Self {
        let limit = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            handles: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn spawn<F>(&mut self, f: F) -> Result<(), AcquireError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        self.handles.push(tokio::spawn(async move {
            let _permit = permit;
            f.await
        }));
        Ok(())
    }

    /// Waits for every spawned task. Results come back in submission order,
    /// regardless of completion order.
    pub async fn join(self) -> Vec<Result<T, JoinError>> {
        let mut results = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            results.push(handle.await);
        }
        results
    }
}
