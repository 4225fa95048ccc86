//! # Casetrail Protocols
//!
//! Data model, message shapes and collaborator traits shared by the
//! casetrail crates. Contains only definitions - the orchestration lives in
//! `casetrail-core` and the browser backend in `casetrail-browser-cdp`.
//!
//! ## Core Traits
//!
//! - [`TabHost`] - Ephemeral tab capability (open, inject, close, event feeds)
//! - [`ProgressSink`] - Receiver of per-item progress notifications
//! - [`RecordSource`] - The hosting record page (header + related listings)
//! - [`ReportSink`] - Consumer of the rendered report document

pub mod bus;
pub mod error;
pub mod item;
pub mod message;
pub mod progress;
pub mod source;
pub mod tab;

pub use bus::{EventBus, Subscription};
pub use error::{ProgressError, ReportError, SourceError, TabError};
pub use item::{
    EmailPayload, ExtractionPayload, FetchRequestItem, FetchedDetail, ItemContent, ItemKind,
    NotePayload, TimelineItem,
};
pub use message::{
    BatchResponse, DispatchRequest, ExtractionResultMessage, HeaderRecord, ObjectType,
    ProgressNotification, ResultKind, TabId, TabStatus, TabUpdate,
};
pub use progress::{ChannelProgressSink, ProgressSink, TracingProgressSink};
pub use source::{RecordSource, ReportSink};
pub use tab::{ExtractorScript, ExtractorSet, TabHost};
