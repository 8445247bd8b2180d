//! Common imports for quick starts.

// Facade and errors
pub use crate::{Error, Result, Stratus};

// Configuration
pub use crate::{ConfigToml, StorageConfig};

// Events
pub use crate::{Capsule, Hub, Payload};

// Storage
pub use crate::{AccessLevel, DownloadInput, UploadInput};
// Transfers
pub use crate::{ResumableTransferTask, TransferState, TransferTask};
