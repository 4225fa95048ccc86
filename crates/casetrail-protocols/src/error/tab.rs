//! Tab host errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabError {
    #[error("Failed to open tab: {0}")]
    OpenFailed(String),

    #[error("Script injection failed: {0}")]
    InjectionFailed(String),

    #[error("Failed to close tab: {0}")]
    CloseFailed(String),

    #[error("Tab not found: {0}")]
    NotFound(String),

    #[error("Browser disconnected: {0}")]
    Disconnected(String),
}
