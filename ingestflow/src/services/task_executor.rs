//! Off-loop task execution for processors with heavy work.

use futures::future::BoxFuture;

/// Trait for running work off the document's sequencing task.
///
/// Synchronous processors must not block; anything long-running belongs here,
/// behind an asynchronous processor that resolves its completion when the
/// work finishes.
pub trait TaskExecutor: Send + Sync {
    /// Spawns a future onto the runtime.
    fn spawn(&self, task: BoxFuture<'static, ()>);

    /// Runs blocking work on a thread where blocking is acceptable.
    fn spawn_blocking(&self, work: Box<dyn FnOnce() + Send + 'static>);
}

/// A [`TaskExecutor`] backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTaskExecutor;

impl TokioTaskExecutor {
    /// Creates a new tokio-backed task executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TaskExecutor for TokioTaskExecutor {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }

    fn spawn_blocking(&self, work: Box<dyn FnOnce() + Send + 'static>) {
        tokio::task::spawn_blocking(work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_runs_future() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let executor = TokioTaskExecutor::new();
        executor.spawn(
            async move {
                ran_clone.store(true, Ordering::SeqCst);
            }
            .boxed(),
        );

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spawn_blocking_runs_work() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let executor = TokioTaskExecutor::new();
        executor.spawn_blocking(Box::new(move || {
            ran_clone.store(true, Ordering::SeqCst);
        }));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
