//! Record source errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Record page unavailable: {0}")]
    Unavailable(String),

    #[error("Extraction script failed: {0}")]
    ScriptFailed(String),

    #[error("Malformed listing data: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}
