//! Per-item and structural failures.

use std::time::Duration;

use casetrail_protocols::TabError;
use thiserror::Error;

/// Why a single item could not be fetched.
///
/// The display text is what ends up in the report next to the item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not open tab: {0}")]
    TabOpen(#[source] TabError),

    #[error("Tab load timed out after {}s", .0.as_secs())]
    LoadTimeout(Duration),

    #[error("Tab failed to load: {0}")]
    LoadFailed(String),

    #[error("Redirected to sign-in page ({0}); session may have expired")]
    AuthRedirect(String),

    #[error("Script injection failed: {0}")]
    Injection(#[source] TabError),

    #[error("No extraction result within {}s", .0.as_secs())]
    ResultTimeout(Duration),

    #[error("Result channel closed before a result arrived")]
    ChannelClosed,

    #[error("Malformed extraction result: {0}")]
    MalformedResult(String),

    #[error("Extraction script failed: {0}")]
    ExtractorFailed(String),
}

/// A request rejected before any tab work began.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Could not identify the requesting context")]
    MissingOrigin,

    #[error("Batch contains no items")]
    EmptyBatch,

    #[error("Batch mixes item types")]
    MixedItemTypes,

    #[error("Duplicate URL in batch: {0}")]
    DuplicateUrl(String),

    #[error("Invalid item URL: {0}")]
    InvalidUrl(String),
}
