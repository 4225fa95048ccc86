//! Error types for the casetrail protocol layer.

mod progress;
mod report;
mod source;
mod tab;

pub use progress::*;
pub use report::*;
pub use source::*;
pub use tab::*;
