//! Chrome DevTools Protocol backend for casetrail.
//!
//! Provides:
//! - [`CdpTabHost`]: ephemeral background tabs with load and result events
//! - [`CdpRecordPage`]: header and related listings of the record tab
//! - [`DataUrlReportSink`]: shows the finished report in a new tab
//! - [`BrowserLauncher`]: finds, launches and connects to Chrome

pub mod cdp;
mod error;
mod launcher;
mod record_page;
mod report_sink;
pub mod scripts;
mod tab_host;

pub use error::BrowserError;
pub use launcher::BrowserLauncher;
pub use record_page::CdpRecordPage;
pub use report_sink::{DataUrlReportSink, data_url};
pub use scripts::default_extractors;
pub use tab_host::{CdpTabHost, RESULT_BINDING, TabEvent, translate};
