//! Page scripts shipped with the backend.
//!
//! Extractors run inside ephemeral tabs and report through the
//! [`RESULT_BINDING`](crate::RESULT_BINDING) binding. The header and listing
//! scripts are evaluated in the record's own tab and return their data.

use casetrail_protocols::{ExtractorSet, ItemKind};

pub const NOTE_EXTRACTOR: &str = include_str!("scripts/note_extractor.js");
pub const EMAIL_EXTRACTOR: &str = include_str!("scripts/email_extractor.js");
pub const HEADER: &str = include_str!("scripts/header.js");
pub const NOTES_LISTING: &str = include_str!("scripts/notes_listing.js");
pub const EMAILS_LISTING: &str = include_str!("scripts/emails_listing.js");

/// Extractors for Note and Email detail pages.
pub fn default_extractors() -> ExtractorSet {
    ExtractorSet::new(NOTE_EXTRACTOR, EMAIL_EXTRACTOR)
}

/// Listing script for the related list of `kind`.
pub fn listing_script(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Note => NOTES_LISTING,
        ItemKind::Email => EMAILS_LISTING,
    }
}
