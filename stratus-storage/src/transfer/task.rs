use std::{future::Future, sync::Arc};

use stratus_core::cross_log;

use super::control::{Controller, TransferControl, TransferState};
use crate::{errors::StorageError, util::spawn};

use TransferState::{Canceled, Paused, Pending, Rejected, Resolved};

/// States from which a transfer can still settle or be canceled.
const LIVE: [TransferState; 2] = [Pending, Paused];

/// Shared machinery of both task flavours: the control channel's write side and
/// the single-shot result channel fed by the background runner.
#[derive(Debug)]
struct TaskCore<T> {
    controller: Arc<Controller>,
    rx: flume::Receiver<Result<T, StorageError>>,
}

impl<T: Send + 'static> TaskCore<T> {
    /// Build the job with its control handle and start running it immediately.
    ///
    /// `on_settled` sees the final outcome before it is delivered to `result`.
    fn spawn<F, Fut, S>(job: F, on_settled: S) -> Self
    where
        F: FnOnce(TransferControl) -> Fut,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
        S: FnOnce(&Result<T, StorageError>) + Send + 'static,
    {
        let controller = Arc::new(Controller::new());
        let (tx, rx) = flume::bounded(1);

        let fut = job(controller.control());
        let runner = Arc::clone(&controller);
        spawn(async move {
            let outcome = fut.await;
            let settled = settle(&runner, outcome);
            cross_log!(debug, "Transfer settled as {}", runner.state());
            on_settled(&settled);
            // The handle may already be gone; nobody is waiting for the result then.
            let _ = tx.send(settled);
        });

        Self { controller, rx }
    }
}

impl<T> TaskCore<T> {
    fn cancel(&self, reason: Option<&str>) -> bool {
        let canceled = self
            .controller
            .transition(&LIVE, Canceled, reason.map(str::to_string));
        if canceled {
            cross_log!(debug, "Transfer canceled");
        }
        canceled
    }

    async fn result(&self) -> Result<T, StorageError> {
        self.rx
            .recv_async()
            .await
            .map_err(|_disconnected| StorageError::canceled(self.controller.reason()))?
    }

    fn try_result(&self) -> Option<Result<T, StorageError>> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for TaskCore<T> {
    fn drop(&mut self) {
        // An unsettled transfer nobody can observe any more is stopped.
        self.controller
            .transition(&LIVE, Canceled, Some("transfer task dropped".to_string()));
    }
}

/// Record the job's outcome. Once canceled, the outcome is always a cancellation.
fn settle<T>(controller: &Controller, outcome: Result<T, StorageError>) -> Result<T, StorageError> {
    match outcome {
        Ok(value) if controller.transition(&LIVE, Resolved, None) => Ok(value),
        Err(err) if controller.transition(&LIVE, Rejected, None) => {
            cross_log!(warn, "Transfer failed: {}", err);
            Err(err)
        }
        _ => Err(StorageError::canceled(controller.reason())),
    }
}

/// Handle to an in-flight transfer that can be canceled.
///
/// The job starts running as soon as the task is created. Await the outcome with
/// [`result`](Self::result). Dropping an unsettled task cancels it.
#[derive(Debug)]
#[must_use = "dropping a transfer task cancels the transfer"]
pub struct TransferTask<T> {
    core: TaskCore<T>,
}

impl<T: Send + 'static> TransferTask<T> {
    /// Spawn `job` with a fresh [`TransferControl`].
    ///
    /// Must be called from within an async runtime.
    pub fn spawn<F, Fut>(job: F) -> Self
    where
        F: FnOnce(TransferControl) -> Fut,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        Self::spawn_with(job, |_settled| {})
    }

    /// Like [`spawn`](Self::spawn), calling `on_settled` with the final outcome
    /// before it is delivered to [`result`](Self::result).
    pub(crate) fn spawn_with<F, Fut, S>(job: F, on_settled: S) -> Self
    where
        F: FnOnce(TransferControl) -> Fut,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
        S: FnOnce(&Result<T, StorageError>) + Send + 'static,
    {
        Self {
            core: TaskCore::spawn(job, on_settled),
        }
    }
}

impl<T> TransferTask<T> {
    /// Cancel the transfer. Returns `false` if it already settled or was canceled.
    pub fn cancel(&self, reason: Option<&str>) -> bool {
        self.core.cancel(reason)
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.core.controller.state()
    }

    /// Wait for the transfer to settle.
    ///
    /// # Errors
    /// - [`StorageError::Canceled`] if [`cancel`](Self::cancel) was called first.
    /// - Otherwise whatever validation, service or I/O error the job failed with.
    pub async fn result(self) -> Result<T, StorageError> {
        self.core.result().await
    }

    /// Take the outcome without waiting.
    ///
    /// Returns the task back while the transfer has not settled yet.
    ///
    /// # Errors
    /// - `Err(self)` if the transfer is still running or paused.
    pub fn try_result(self) -> Result<Result<T, StorageError>, Self> {
        match self.core.try_result() {
            Some(outcome) => Ok(outcome),
            None => Err(self),
        }
    }
}

/// A [`TransferTask`] that can also be paused and resumed.
///
/// Pausing parks the job at its next [`checkpoint`](TransferControl::checkpoint),
/// typically between two chunks of the body.
#[derive(Debug)]
#[must_use = "dropping a transfer task cancels the transfer"]
pub struct ResumableTransferTask<T> {
    core: TaskCore<T>,
}

impl<T: Send + 'static> ResumableTransferTask<T> {
    /// Spawn `job` with a fresh [`TransferControl`].
    ///
    /// Must be called from within an async runtime.
    pub fn spawn<F, Fut>(job: F) -> Self
    where
        F: FnOnce(TransferControl) -> Fut,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        Self::spawn_with(job, |_settled| {})
    }

    /// Like [`spawn`](Self::spawn), calling `on_settled` with the final outcome
    /// before it is delivered to [`result`](Self::result).
    pub(crate) fn spawn_with<F, Fut, S>(job: F, on_settled: S) -> Self
    where
        F: FnOnce(TransferControl) -> Fut,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
        S: FnOnce(&Result<T, StorageError>) + Send + 'static,
    {
        Self {
            core: TaskCore::spawn(job, on_settled),
        }
    }
}

impl<T> ResumableTransferTask<T> {
    /// Pause a pending transfer. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.core.controller.transition(&[Pending], Paused, None)
    }

    /// Resume a paused transfer. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        self.core.controller.transition(&[Paused], Pending, None)
    }

    /// Cancel the transfer. Returns `false` if it already settled or was canceled.
    pub fn cancel(&self, reason: Option<&str>) -> bool {
        self.core.cancel(reason)
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.core.controller.state()
    }

    /// Wait for the transfer to settle.
    ///
    /// # Errors
    /// - [`StorageError::Canceled`] if [`cancel`](Self::cancel) was called first.
    /// - Otherwise whatever validation, service or I/O error the job failed with.
    pub async fn result(self) -> Result<T, StorageError> {
        self.core.result().await
    }

    /// Take the outcome without waiting.
    ///
    /// Returns the task back while the transfer has not settled yet.
    ///
    /// # Errors
    /// - `Err(self)` if the transfer is still running or paused.
    pub fn try_result(self) -> Result<Result<T, StorageError>, Self> {
        match self.core.try_result() {
            Some(outcome) => Ok(outcome),
            None => Err(self),
        }
    }
}
