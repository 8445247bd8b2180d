use std::{
    fmt::{self, Display},
    future::Future,
    pin::pin,
};

use futures_util::future::{select, Either};
use tokio::sync::watch;

use crate::errors::StorageError;

/// Lifecycle of a transfer.
///
/// `Pending → {Resolved, Rejected, Canceled}`, `Pending ⇄ Paused` (resumable tasks
/// only) and `Paused → Canceled`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// The job is running.
    Pending,
    /// The job is parked at its next checkpoint until resumed.
    Paused,
    /// `cancel` was called before the job settled.
    Canceled,
    /// The job completed successfully.
    Resolved,
    /// The job failed.
    Rejected,
}

impl TransferState {
    /// Whether the state can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Canceled | TransferState::Resolved | TransferState::Rejected
        )
    }
}

impl Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferState::Pending => "pending",
            TransferState::Paused => "paused",
            TransferState::Canceled => "canceled",
            TransferState::Resolved => "resolved",
            TransferState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Status {
    pub(crate) state: TransferState,
    pub(crate) reason: Option<String>,
}

/// Write side of the control channel. Owned by the task handle and its runner.
#[derive(Debug)]
pub(crate) struct Controller {
    tx: watch::Sender<Status>,
}

impl Controller {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Status {
            state: TransferState::Pending,
            reason: None,
        });
        Self { tx }
    }

    /// Read-only handle for the job.
    pub(crate) fn control(&self) -> TransferControl {
        TransferControl {
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn state(&self) -> TransferState {
        self.tx.borrow().state
    }

    pub(crate) fn reason(&self) -> Option<String> {
        self.tx.borrow().reason.clone()
    }

    /// Move to `to` if the current state is one of `from`. Returns whether it moved.
    pub(crate) fn transition(
        &self,
        from: &[TransferState],
        to: TransferState,
        reason: Option<String>,
    ) -> bool {
        self.tx.send_if_modified(|status| {
            if !from.contains(&status.state) {
                return false;
            }
            status.state = to;
            status.reason = reason;
            true
        })
    }
}

/// The job's view of its task: a cancellation and pause signal.
///
/// Cancellation is cooperative. Jobs observe it with [`checkpoint`](Self::checkpoint)
/// between units of work, or race long operations against
/// [`canceled`](Self::canceled). A job that ignores the signal runs to completion,
/// but its task still reports [`StorageError::Canceled`].
///
/// Clones observe the same task; hand them to any sub-operation the job spawns.
#[derive(Debug, Clone)]
pub struct TransferControl {
    rx: watch::Receiver<Status>,
}

impl TransferControl {
    /// Current state of the owning task.
    pub fn state(&self) -> TransferState {
        self.rx.borrow().state
    }

    /// Whether the task has been canceled.
    pub fn is_canceled(&self) -> bool {
        self.state() == TransferState::Canceled
    }

    /// Non-blocking check: fails once the task is canceled.
    ///
    /// # Errors
    /// - [`StorageError::Canceled`] carrying the reason given to `cancel`.
    pub fn check(&self) -> Result<(), StorageError> {
        let status = self.rx.borrow();
        if status.state == TransferState::Canceled {
            return Err(StorageError::canceled(status.reason.clone()));
        }
        Ok(())
    }

    /// Wait while the task is paused, then fail if it was canceled.
    ///
    /// Jobs call this between chunks: a paused transfer stops at the next
    /// checkpoint and continues from there on `resume`.
    ///
    /// # Errors
    /// - [`StorageError::Canceled`] once the task is canceled.
    pub async fn checkpoint(&self) -> Result<(), StorageError> {
        let mut rx = self.rx.clone();
        let (state, reason) = match rx
            .wait_for(|status| status.state != TransferState::Paused)
            .await
        {
            Ok(status) => (status.state, status.reason.clone()),
            // The task handle and its runner are both gone: nobody can resume us.
            Err(_closed) => return Err(StorageError::canceled(None)),
        };

        if state == TransferState::Canceled {
            return Err(StorageError::canceled(reason));
        }
        Ok(())
    }

    /// Resolves once the task is canceled. Never resolves otherwise.
    pub async fn canceled(&self) {
        let mut rx = self.rx.clone();
        if rx
            .wait_for(|status| status.state == TransferState::Canceled)
            .await
            .is_err()
        {
            std::future::pending::<()>().await;
        }
    }

    /// Drive `fut` until it completes or the task is canceled, whichever comes first.
    ///
    /// # Errors
    /// - [`StorageError::Canceled`] if the task was canceled before `fut` completed.
    pub async fn or_canceled<F: Future>(&self, fut: F) -> Result<F::Output, StorageError> {
        let fut = pin!(fut);
        let canceled = pin!(self.canceled());
        match select(fut, canceled).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(((), _)) => Err(StorageError::canceled(self.rx.borrow().reason.clone())),
        }
    }
}
