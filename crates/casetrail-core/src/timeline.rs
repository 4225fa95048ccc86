//! Turning batch outcomes into one chronological timeline.

use std::collections::HashMap;

use casetrail_protocols::{
    EmailPayload, ExtractionPayload, FetchRequestItem, FetchedDetail, ItemContent, ItemKind,
    NotePayload, TimelineItem,
};
use tracing::debug;

use crate::date::parse_date;

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;

const NOT_APPLICABLE: &str = "N/A";

/// Build timeline entries for `items` (listing order) from their outcomes.
///
/// Items without a usable date are left out.
pub fn assemble(
    items: &[FetchRequestItem],
    details: &HashMap<String, FetchedDetail>,
) -> Vec<TimelineItem> {
    items
        .iter()
        .filter_map(|item| {
            let detail = details.get(&item.url);
            let entry = match item.kind {
                ItemKind::Note => note_entry(item, detail),
                ItemKind::Email => email_entry(item, detail),
            };
            if entry.date_object.is_none() {
                debug!("Dropping {} {}: unparseable date {:?}", item.kind, item.url, item.date_str);
                return None;
            }
            Some(entry)
        })
        .collect()
}

/// Combine notes and emails, oldest first.
///
/// Undated entries go last. The sort is stable, so equal instants keep their
/// order from `notes` followed by `emails`.
pub fn merge(notes: Vec<TimelineItem>, emails: Vec<TimelineItem>) -> Vec<TimelineItem> {
    let mut all = notes;
    all.extend(emails);
    all.sort_by_key(|item| (item.date_object.is_none(), item.date_object));
    all
}

fn base_entry(item: &FetchRequestItem, detail: Option<&FetchedDetail>) -> TimelineItem {
    TimelineItem {
        kind: item.kind,
        url: item.url.clone(),
        title: item.title.clone(),
        author: item.author.clone(),
        to: item.to.clone(),
        date_str: item.date_str.clone(),
        date_object: detail
            .and_then(FetchedDetail::date_object)
            .or_else(|| parse_date(&item.date_str)),
        content: ItemContent::Notice(String::new()),
        is_public: None,
        attachments: NOT_APPLICABLE.to_string(),
    }
}

fn note_entry(item: &FetchRequestItem, detail: Option<&FetchedDetail>) -> TimelineItem {
    let mut entry = base_entry(item, detail);
    let snippet = item.description_snippet.as_deref().filter(|s| !s.is_empty());

    entry.content = match detail {
        Some(FetchedDetail::Fetched {
            payload: ExtractionPayload::Note(NotePayload { description, is_public }),
            ..
        }) => {
            entry.is_public = *is_public;
            if !description.trim().is_empty() {
                ItemContent::Html(description.clone())
            } else if let Some(snippet) = snippet {
                ItemContent::Notice(format!("[Content Empty, Snippet: {}]", snippet))
            } else {
                ItemContent::Notice("[Content Empty or Not Fetched]".to_string())
            }
        }
        Some(FetchedDetail::Failed { reason, .. }) => ItemContent::Notice(match snippet {
            Some(snippet) => format!("Fetch Error: {} [Snippet: {}]", reason, snippet),
            None => format!("Fetch Error: {}", reason),
        }),
        Some(FetchedDetail::Fetched { .. }) | None => ItemContent::Notice(match snippet {
            Some(snippet) => format!("[Content Not Fetched] [Snippet: {}]", snippet),
            None => "[Content Not Fetched]".to_string(),
        }),
    };
    entry
}

fn email_entry(item: &FetchRequestItem, detail: Option<&FetchedDetail>) -> TimelineItem {
    let mut entry = base_entry(item, detail);

    entry.content = match detail {
        Some(FetchedDetail::Fetched {
            payload: ExtractionPayload::Email(email),
            ..
        }) => {
            apply_scraped_headers(&mut entry, email);
            if !email.body_html.trim().is_empty() {
                ItemContent::Html(email.body_html.clone())
            } else {
                ItemContent::Notice(format!(
                    "Subject: {}. [Body Not Fetched or Empty]",
                    entry.title
                ))
            }
        }
        Some(FetchedDetail::Failed { reason, .. }) => ItemContent::Notice(format!(
            "Subject: {}. Body Fetch Error: {}",
            entry.title, reason
        )),
        Some(FetchedDetail::Fetched { .. }) | None => ItemContent::Notice(format!(
            "Subject: {}. [Body Not Fetched or Empty]",
            entry.title
        )),
    };
    entry
}

/// Scraped header fields win over listing values when present.
fn apply_scraped_headers(entry: &mut TimelineItem, email: &EmailPayload) {
    if !email.subject.trim().is_empty() {
        entry.title = email.subject.clone();
    }
    if !email.from.trim().is_empty() {
        entry.author = email.from.clone();
    }
    if !email.to.trim().is_empty() {
        entry.to = Some(email.to.clone());
    }
}
