//! Cancellable background tasks.
//!
//! Timers and actuation loops run as tokio tasks; the owning state record
//! keeps the [`TaskHandle`] and cancels it explicitly. Dropping a handle does
//! not stop the task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    /// Run `future` in the background. Must be called within a tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: tokio::spawn(future),
        }
    }

    /// Run `future` once `delay` has elapsed.
    pub fn after<F>(delay: Duration, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(async move {
            tokio::time::sleep(delay).await;
            future.await;
        })
    }

    /// Stop the task at its next await point. No-op once it has finished.
    pub fn cancel(&self) {
        self.inner.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the task to end, whether it completed or was cancelled.
    pub async fn join(self) {
        let _ = self.inner.await;
    }
}
