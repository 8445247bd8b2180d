//! Cancelable (and optionally resumable) handles around asynchronous transfer jobs.
//!
//! A task owns the write side of a control channel; its job receives a read-only
//! [`TransferControl`] and observes pause and cancel requests cooperatively.

mod control;
mod task;

pub use control::{TransferControl, TransferState};
pub use task::{ResumableTransferTask, TransferTask};
