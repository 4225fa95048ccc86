//! [`RecordSource`] backed by the browser tab showing the record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use casetrail_protocols::{
    FetchRequestItem, HeaderRecord, ItemKind, ObjectType, RecordSource, SourceError,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::cdp::{CdpClient, PageSession};
use crate::error::BrowserError;
use crate::scripts;

/// Header fields as the header script returns them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawHeader {
    record_number: String,
    subject: String,
    account_name: String,
    status: String,
    owner: String,
    creator_name: String,
    created_date_str: String,
    description: String,
}

/// One row of a related listing as the listing scripts return it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListingRow {
    href: Option<String>,
    title: String,
    author: String,
    to: Option<String>,
    date_str: String,
    snippet: Option<String>,
}

fn or_na(value: String) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value
    }
}

fn header_from_raw(object_type: ObjectType, raw: RawHeader) -> HeaderRecord {
    HeaderRecord {
        object_type,
        record_number: or_na(raw.record_number),
        subject: or_na(raw.subject),
        account_name: or_na(raw.account_name),
        status: or_na(raw.status),
        owner: or_na(raw.owner),
        creator_name: or_na(raw.creator_name),
        created_date_str: or_na(raw.created_date_str),
        description: raw.description,
    }
}

/// Turn listing rows into fetch requests, resolving links against `base`.
///
/// Rows without a link or a date cannot be fetched or placed on the
/// timeline and are skipped, as are Email rows without a subject.
fn items_from_rows(base: &Url, kind: ItemKind, rows: Vec<ListingRow>) -> Vec<FetchRequestItem> {
    let total = rows.len();
    let items: Vec<FetchRequestItem> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let href = row.href.filter(|h| !h.trim().is_empty());
            let (Some(href), false) = (href, row.date_str.trim().is_empty()) else {
                warn!("Skipping {} row {}: missing link or date", kind, index + 1);
                return None;
            };
            if kind == ItemKind::Email && row.title.trim().is_empty() {
                warn!("Skipping {} row {}: missing subject", kind, index + 1);
                return None;
            }
            let url = match base.join(&href) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping {} row {}: bad link {}: {}", kind, index + 1, href, e);
                    return None;
                }
            };

            let item = match kind {
                ItemKind::Note => {
                    let item =
                        FetchRequestItem::note(url.as_str(), row.date_str, row.title, row.author);
                    match row.snippet.filter(|s| !s.trim().is_empty()) {
                        Some(snippet) => item.with_snippet(snippet),
                        None => item,
                    }
                }
                ItemKind::Email => FetchRequestItem::email(
                    url.as_str(),
                    row.date_str,
                    row.title,
                    row.author,
                    row.to.unwrap_or_else(|| "N/A".to_string()),
                ),
            };
            Some(item)
        })
        .collect();

    debug!("{} of {} {} row(s) usable", items.len(), total, kind);
    items
}

/// The record's page, attached through CDP.
pub struct CdpRecordPage {
    session: Arc<PageSession>,
    url: String,
    base: Url,
}

impl CdpRecordPage {
    /// Attach to the tab showing `record_url`, opening one if none does, and
    /// wait until it has loaded.
    pub async fn open(
        client: &CdpClient,
        record_url: &str,
        load_timeout: Duration,
    ) -> Result<Self, BrowserError> {
        let base = Url::parse(record_url)
            .map_err(|e| BrowserError::RecordPageUnavailable(format!("{}: {}", record_url, e)))?;

        let wanted = record_url.trim_end_matches('/');
        let existing = client
            .list_pages()
            .await?
            .into_iter()
            .find(|page| page.page_type == "page" && page.url.trim_end_matches('/') == wanted);

        let target_id = match existing {
            Some(page) => {
                info!("Attaching to open record tab {}", page.id);
                page.id
            }
            None => {
                info!("Opening record page {}", record_url);
                client.create_target(record_url, false).await?
            }
        };

        let session = client.attach(&target_id).await?;
        // Only commands are used on the record tab; its events are not needed.
        client.detach(session.session_id());
        session.wait_for_ready(load_timeout).await?;

        Ok(Self {
            session: Arc::new(session),
            url: record_url.to_string(),
            base,
        })
    }
}

#[async_trait]
impl RecordSource for CdpRecordPage {
    fn record_url(&self) -> &str {
        &self.url
    }

    async fn header(&self) -> Result<Option<HeaderRecord>, SourceError> {
        let value = self
            .session
            .evaluate(scripts::HEADER)
            .await
            .map_err(|e| SourceError::ScriptFailed(e.to_string()))?;

        if value.is_null() {
            return Ok(None);
        }

        let raw: RawHeader = serde_json::from_value(value)?;
        Ok(Some(header_from_raw(ObjectType::from_url(&self.url), raw)))
    }

    async fn list_items(&self, kind: ItemKind) -> Result<Vec<FetchRequestItem>, SourceError> {
        let value = self
            .session
            .evaluate(scripts::listing_script(kind))
            .await
            .map_err(|e| SourceError::ScriptFailed(e.to_string()))?;

        let rows: Vec<ListingRow> = serde_json::from_value(value)?;
        Ok(items_from_rows(&self.base, kind, rows))
    }
}
