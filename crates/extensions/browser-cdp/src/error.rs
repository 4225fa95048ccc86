//! Browser backend errors.

use thiserror::Error;

use crate::cdp::CdpError;

/// Errors raised while bringing up or talking to the browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Chrome not found. Please install Google Chrome or Chromium.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("No browser listening on {0} and launching is disabled")]
    NotRunning(String),

    #[error("Record page not available: {0}")]
    RecordPageUnavailable(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}
