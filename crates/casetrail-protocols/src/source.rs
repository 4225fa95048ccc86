//! The record page a report is built from, and where the report goes.

use async_trait::async_trait;

use crate::error::{ReportError, SourceError};
use crate::item::{FetchRequestItem, ItemKind};
use crate::message::HeaderRecord;

/// The hosting record page.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Address of the record page.
    fn record_url(&self) -> &str;

    /// Read the header fields.
    ///
    /// `Ok(None)` means the primary details section could not be located at
    /// all, which makes the report impossible to build.
    async fn header(&self) -> Result<Option<HeaderRecord>, SourceError>;

    /// List the related items of one kind, in listing order, with absolute URLs.
    async fn list_items(&self, kind: ItemKind) -> Result<Vec<FetchRequestItem>, SourceError>;
}

/// Consumer of a rendered report document.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Open the document in a new top-level view.
    async fn open_report(&self, html: String) -> Result<(), ReportError>;
}
