//! Messages exchanged between the coordinator and its collaborators.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::item::{FetchRequestItem, FetchedDetail, ItemKind};

/// Opaque identifier of an ephemeral browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load status reported by a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TabStatus {
    Loading,
    Complete,
    Error(String),
}

/// A change in a tab's load state or address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabUpdate {
    pub tab_id: TabId,
    pub status: TabStatus,
    /// Address the tab resolved to, when known.
    pub url: Option<String>,
}

impl TabUpdate {
    pub fn new(tab_id: TabId, status: TabStatus, url: Option<String>) -> Self {
        Self { tab_id, status, url }
    }
}

/// Declared kind of an extraction-result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    NoteResult,
    EmailResult,
}

impl From<ItemKind> for ResultKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Note => ResultKind::NoteResult,
            ItemKind::Email => ResultKind::EmailResult,
        }
    }
}

/// Message posted by an extraction routine running inside a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResultMessage {
    pub kind: ResultKind,
    /// Tab the message came from. Stamped by the host, not by the page.
    pub origin: TabId,
    pub payload: Value,
}

/// Progress notification sent before an item's work starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNotification {
    pub url: String,
    pub item_type: ItemKind,
    /// 1-based position within the batch.
    pub index: usize,
    pub total: usize,
}

/// Requests accepted by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum DispatchRequest {
    FetchBatch {
        items: Vec<FetchRequestItem>,
    },
    OpenReport {
        #[serde(rename = "htmlContent")]
        html_content: String,
    },
}

/// Response to a fetch-batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchResponse {
    Success {
        details: HashMap<String, FetchedDetail>,
    },
    Error {
        message: String,
    },
}

impl BatchResponse {
    pub fn error(message: impl Into<String>) -> Self {
        BatchResponse::Error {
            message: message.into(),
        }
    }
}

/// Kind of the record the report is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    Case,
    WorkOrder,
    Record,
}

impl ObjectType {
    /// Infer the record kind from its page address.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/Case/") {
            ObjectType::Case
        } else if url.contains("/WorkOrder/") {
            ObjectType::WorkOrder
        } else {
            ObjectType::Record
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Case => "Case",
            ObjectType::WorkOrder => "WorkOrder",
            ObjectType::Record => "Record",
        };
        f.write_str(name)
    }
}

/// Header fields of the record, rendered above the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRecord {
    pub object_type: ObjectType,
    pub record_number: String,
    pub subject: String,
    pub account_name: String,
    pub status: String,
    pub owner: String,
    pub creator_name: String,
    pub created_date_str: String,
    /// Rich description HTML, embedded unescaped.
    pub description: String,
}

impl HeaderRecord {
    /// A header with every plain field set to `N/A`.
    pub fn unknown(object_type: ObjectType) -> Self {
        let na = || "N/A".to_string();
        Self {
            object_type,
            record_number: na(),
            subject: na(),
            account_name: na(),
            status: na(),
            owner: na(),
            creator_name: na(),
            created_date_str: na(),
            description: String::new(),
        }
    }
}
