//! Report sink errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to open report: {0}")]
    OpenFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
