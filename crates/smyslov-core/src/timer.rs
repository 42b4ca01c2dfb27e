//! Cancellable delayed callbacks driven by a [`Clock`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::clock::Clock;

/// A callback scheduled to run once after a delay.
///
/// Cancelling or dropping the task before the delay elapses guarantees the
/// callback never starts. A callback that already started runs to completion;
/// callers that must not observe it after cancelling guard shared state
/// themselves.
#[derive(Debug)]
pub struct DelayedTask {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Spawns `callback` to run after `delay` has elapsed on `clock`.
    pub fn schedule<F>(clock: Arc<dyn Clock>, delay: Duration, callback: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled => {}
                () = clock.sleep(delay) => callback.await,
            }
        });
        Self { cancel, handle }
    }

    /// Cancels the callback if it has not started yet.
    pub fn cancel(self) {
        // The receiver is gone once the task finished.
        let _ = self.cancel.send(());
    }

    /// Whether the task has finished, either by running or by cancellation.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
