//! Delayed background tasks.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs futures after a delay on a tokio runtime, cancelling them on shutdown.
#[derive(Debug, Clone)]
pub struct Scheduler {
    handle: Option<Handle>,
    cancel_token: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler on `handle`. Without a runtime every task is dropped.
    #[must_use]
    pub fn new(handle: Option<Handle>, cancel_token: CancellationToken) -> Self {
        Self {
            handle,
            cancel_token,
        }
    }

    /// Runs `task` once `delay` has elapsed, unless the scheduler shuts down first.
    pub fn run_after<F>(&self, delay: Duration, task: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(handle) = &self.handle else {
            log::debug!("No runtime available, dropping scheduled task");
            return None;
        };
        let cancel_token = self.cancel_token.clone();
        Some(handle.spawn(async move {
            tokio::select! {
                () = cancel_token.cancelled() => {}
                () = tokio::time::sleep(delay) => task.await,
            }
        }))
    }

    /// Cancels every pending task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) was called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
