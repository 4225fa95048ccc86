//! Item data model: fetch requests, extraction payloads, per-item outcomes
//! and timeline entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;

/// Kind of related item listed on a record page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Note,
    Email,
}

impl ItemKind {
    /// Lowercase form used in CSS classes and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Note => "note",
            ItemKind::Email => "email",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Note => f.write_str("Note"),
            ItemKind::Email => f.write_str("Email"),
        }
    }
}

/// One row of a related listing, describing a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequestItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Absolute URL of the item's detail page. Identity key within a batch.
    pub url: String,
    /// Raw date text from the listing. Authoritative for the item's instant.
    pub date_str: String,
    pub title: String,
    pub author: String,
    /// Recipient list (Email only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Short description shown in the listing (Note only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_snippet: Option<String>,
}

impl FetchRequestItem {
    pub fn note(
        url: impl Into<String>,
        date_str: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            kind: ItemKind::Note,
            url: url.into(),
            date_str: date_str.into(),
            title: title.into(),
            author: author.into(),
            to: None,
            description_snippet: None,
        }
    }

    pub fn email(
        url: impl Into<String>,
        date_str: impl Into<String>,
        subject: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            kind: ItemKind::Email,
            url: url.into(),
            date_str: date_str.into(),
            title: subject.into(),
            author: from.into(),
            to: Some(to.into()),
            description_snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.description_snippet = Some(snippet.into());
        self
    }
}

/// Fields scraped from a Note detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotePayload {
    pub description: String,
    pub is_public: Option<bool>,
}

/// Fields scraped from an Email detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailPayload {
    #[serde(rename = "bodyHTML")]
    pub body_html: String,
    pub subject: String,
    pub from: String,
    pub to: String,
}

/// Normalized extraction result for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtractionPayload {
    Note(NotePayload),
    Email(EmailPayload),
}

/// Terminal outcome of processing one item. Never partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchedDetail {
    Fetched {
        payload: ExtractionPayload,
        date_object: Option<DateTime<Utc>>,
    },
    Failed {
        reason: String,
        date_object: Option<DateTime<Utc>>,
    },
}

impl FetchedDetail {
    pub fn date_object(&self) -> Option<DateTime<Utc>> {
        match self {
            FetchedDetail::Fetched { date_object, .. } | FetchedDetail::Failed { date_object, .. } => {
                *date_object
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchedDetail::Failed { .. })
    }
}

/// Body of a timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ItemContent {
    /// Scraped rich content, embedded as-is.
    Html(String),
    /// Plain-text placeholder or failure message. Always escaped on output.
    Notice(String),
}

impl ItemContent {
    pub fn is_notice(&self) -> bool {
        matches!(self, ItemContent::Notice(_))
    }
}

/// A display-ready entry of the merged timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub url: String,
    pub title: String,
    pub author: String,
    pub to: Option<String>,
    pub date_str: String,
    pub date_object: Option<DateTime<Utc>>,
    pub content: ItemContent,
    /// Note visibility; unknown for Emails and failed fetches.
    pub is_public: Option<bool>,
    pub attachments: String,
}
