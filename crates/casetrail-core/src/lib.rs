//! # Casetrail Core
//!
//! Fetches a record's related items through short-lived background tabs and
//! turns the outcomes into one chronological report.
//!
//! ## Pipeline
//!
//! - [`BatchOrchestrator`] walks a batch one item at a time: open a tab with
//!   [`TabLifecycleManager`], inject the extractor, wait for the reply through
//!   [`ResultCorrelator`], close the tab.
//! - [`Coordinator`] validates requests before any tab is opened.
//! - [`ReportJob`] runs the notes and emails batches, assembles and merges
//!   the timeline and renders the document.

pub mod correlator;
pub mod date;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod report;
pub mod tab_lifecycle;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use correlator::{PendingResult, ResultCorrelator};
pub use date::{parse_date, parse_optional_date};
pub use dispatch::Coordinator;
pub use error::{DispatchError, FetchError};
pub use job::ReportJob;
pub use orchestrator::BatchOrchestrator;
pub use report::{escape_html, render_error_document, render_report};
pub use tab_lifecycle::{EphemeralTab, TabLifecycleManager, TabState, UrlPolicy};
pub use timeline::{assemble, merge};
