//! Progress notification errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    /// The context that asked for the batch is gone.
    #[error("Progress receiver is gone")]
    ReceiverGone,

    #[error("Failed to send progress: {0}")]
    SendFailed(String),
}
